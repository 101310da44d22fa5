use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;
use vantage_core::{
    AgentLoop, BackendClient, Config, ContextBuilder, Gateway, InMemorySessionStore,
    InboundEvent, SessionId, ToolRegistry, config, providers,
    traits::{Channel, DocumentRef},
};

mod console;
mod logging;
mod telegram;

#[derive(Parser)]
#[command(name = "vantage")]
#[command(about = "vantage - project assistant gateway between chat and a tool-calling model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram gateway.
    Serve,
    /// Talk to the assistant from the terminal.
    Chat {
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Print the tool catalog sent to the model.
    Tools,
    /// Write a default config file.
    Init,
}

/// `/upload <path> [caption]` sends a local file the way a chat upload would.
fn console_event(session: &SessionId, input: &str) -> InboundEvent {
    let Some(rest) = input.strip_prefix("/upload ") else {
        return InboundEvent::text(session.clone(), input);
    };

    let (path, caption) = match rest.trim().split_once(char::is_whitespace) {
        Some((path, caption)) => (path, Some(caption.trim().to_string())),
        None => (rest.trim(), None),
    };
    let filename = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    InboundEvent {
        session: session.clone(),
        text: caption.filter(|c| !c.is_empty()),
        document: Some(DocumentRef {
            filename,
            file_ref: path.to_string(),
        }),
    }
}

fn build_gateway(config: &Config, channel: Arc<dyn Channel>) -> Result<Gateway> {
    config.ensure_media_inbox()?;

    let provider = Arc::new(providers::create_provider(config));
    let registry = Arc::new(ToolRegistry::from_catalog(&config.scripts));
    let agent = AgentLoop::new(provider, registry).with_max_iterations(config.max_iterations);
    let context = ContextBuilder::new(&config.workspace_dir)
        .with_history_window(config.exchange_history);
    let sessions = Arc::new(InMemorySessionStore::new(config.max_history));
    let backend = Arc::new(BackendClient::new(config.backend_url.clone()));

    Ok(Gateway::new(agent, context, backend, sessions, channel)
        .with_project(config.default_project.clone())
        .with_inbox(&config.media_inbox)
        .with_upload_policy(config.upload_policy))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);

    if let Commands::Init = command {
        if config::config_exists() {
            println!("Config already exists at {}", config::get_config_path().display());
        } else {
            config::save_config(&Config::default())?;
            println!("Wrote {}", config::get_config_path().display());
        }
        return Ok(());
    }

    let config = Config::load_or_init()?;
    logging::init(&config.log_level);

    match command {
        Commands::Init => {}
        Commands::Tools => {
            let registry = ToolRegistry::from_catalog(&config.scripts);
            println!("{}", serde_json::to_string_pretty(registry.definitions())?);
        }
        Commands::Serve => {
            let token = config
                .telegram_token
                .clone()
                .context("TELEGRAM_BOT_TOKEN environment variable is required")?;

            tracing::info!("Starting Vantage Telegram Gateway...");
            tracing::info!(model = %config.model, "Using model");
            tracing::info!(url = %config.backend_url, "Backend API");
            tracing::info!(url = %config.model_url, "Model endpoint");
            tracing::info!(project = %config.default_project, "Default project");

            let channel = Arc::new(telegram::TelegramChannel::new(&token));
            let gateway = Arc::new(build_gateway(&config, channel.clone())?);
            channel.start(gateway).await;
        }
        Commands::Chat { message } => {
            let gateway = build_gateway(&config, Arc::new(console::ConsoleChannel))?;
            let session = SessionId::new("console");

            if let Some(msg) = message {
                println!("\n🤔 Processing...\n");
                gateway.handle_event(console_event(&session, &msg)).await;
            } else {
                println!("🏗️  Vantage");
                println!("Type your message, or /upload <path> [caption] (Ctrl+D to exit):\n");
                use std::io::{self, BufRead};
                let stdin = io::stdin();

                loop {
                    print!("> ");
                    let _ = io::stdout().flush();

                    let mut input = String::new();
                    match stdin.lock().read_line(&mut input) {
                        Ok(0) | Err(_) => {
                            println!("\n👋 Goodbye!");
                            break;
                        }
                        Ok(_) => {
                            let input = input.trim();
                            if input.is_empty() {
                                continue;
                            }

                            gateway
                                .handle_event(console_event(&session, input))
                                .await;
                            println!();
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
