use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const VANTAGE_DIR: &str = ".vantage";

/// What to do with a document that arrives without a caption.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadPolicy {
    /// Ask the user what to do with the file.
    #[default]
    AskUser,
    /// Look for "task N" in the last two exchanges and analyze the file for
    /// that task; ask the user when nothing matches.
    InferTask,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScriptsConfig {
    pub interpreter: String,
    pub tasks_dir: PathBuf,
    pub rfp_dir: PathBuf,
    pub projects_dir: PathBuf,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        let root = get_vantage_dir().join("scripts");
        Self {
            interpreter: "python3".to_string(),
            tasks_dir: root.join("task-tracker"),
            rfp_dir: root.join("rfp-analyzer"),
            projects_dir: root.join("projects"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telegram_token: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub model_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub max_iterations: usize,
    pub max_history: usize,
    pub exchange_history: usize,
    pub backend_url: String,
    pub default_project: String,
    pub media_inbox: PathBuf,
    pub upload_policy: UploadPolicy,
    pub log_level: String,
    pub scripts: ScriptsConfig,
    #[serde(skip)]
    pub workspace_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            telegram_token: None,
            api_key: None,
            model: "Qwen/Qwen3-8B".to_string(),
            model_url: "http://localhost:8003/v1/chat/completions".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            max_iterations: 5,
            max_history: 20,
            exchange_history: 10,
            backend_url: "http://localhost:8000/api".to_string(),
            default_project: "demo-project".to_string(),
            media_inbox: home_dir().join(".openclaw").join("media").join("inbound"),
            upload_policy: UploadPolicy::default(),
            log_level: "info".to_string(),
            scripts: ScriptsConfig::default(),
            workspace_dir: get_vantage_dir().join("workspace"),
        }
    }
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}

pub fn get_vantage_dir() -> PathBuf {
    home_dir().join(VANTAGE_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_vantage_dir().join("config.toml")
}

pub fn ensure_vantage_dir() -> Result<PathBuf> {
    let vantage_dir = get_vantage_dir();

    if !vantage_dir.exists() {
        std::fs::create_dir_all(&vantage_dir).with_context(|| {
            format!(
                "Failed to create vantage directory at {}",
                vantage_dir.display()
            )
        })?;
    }

    Ok(vantage_dir)
}

impl Config {
    /// Config file if present, defaults otherwise, then environment overrides.
    pub fn load_or_init() -> Result<Self> {
        let mut config = if config_exists() {
            load_config()?
        } else {
            Config::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram_token = Some(token);
        }
        if let Some(key) = lookup("VANTAGE_MODEL_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("VLLM_URL") {
            self.model_url = url;
        }
        if let Some(url) = lookup("VANTAGE_API_URL") {
            self.backend_url = format!("{}/api", url.trim_end_matches('/'));
        }
        if let Some(slug) = lookup("DEFAULT_PROJECT_SLUG") {
            self.default_project = slug;
        }
        if let Some(dir) = lookup("TASK_SCRIPTS_DIR") {
            self.scripts.tasks_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("RFP_SCRIPTS_DIR") {
            self.scripts.rfp_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("PROJECT_SCRIPTS_DIR") {
            self.scripts.projects_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
    }

    pub fn ensure_media_inbox(&self) -> Result<()> {
        std::fs::create_dir_all(&self.media_inbox).with_context(|| {
            format!(
                "Failed to create media inbox at {}",
                self.media_inbox.display()
            )
        })
    }
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!("Config file not found. Run 'vantage init' to create one.")
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.workspace_dir = get_vantage_dir().join("workspace");

    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_vantage_dir()?;

    let config_path = get_config_path();
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_deployed_gateway() {
        let config = Config::default();
        assert_eq!(config.model, "Qwen/Qwen3-8B");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.max_history, 20);
        assert_eq!(config.exchange_history, 10);
        assert_eq!(config.upload_policy, UploadPolicy::AskUser);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            model = "Qwen/Qwen3-14B"
            upload_policy = "infer_task"

            [scripts]
            interpreter = "python3.12"
            "#,
        )
        .unwrap();

        assert_eq!(config.model, "Qwen/Qwen3-14B");
        assert_eq!(config.upload_policy, UploadPolicy::InferTask);
        assert_eq!(config.scripts.interpreter, "python3.12");
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.default_project, "demo-project");
    }

    #[test]
    fn environment_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("VLLM_URL", "http://10.0.8.2:8003/v1/chat/completions"),
            ("VANTAGE_API_URL", "http://backend:8000/"),
            ("DEFAULT_PROJECT_SLUG", "harbor-bridge"),
            ("TASK_SCRIPTS_DIR", "/opt/tasks"),
            ("LOG_LEVEL", "DEBUG"),
            ("RFP_SCRIPTS_DIR", "   "),
        ]);

        let mut config = Config::default();
        let rfp_default = config.scripts.rfp_dir.clone();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.telegram_token.as_deref(), Some("123:abc"));
        assert_eq!(config.model_url, "http://10.0.8.2:8003/v1/chat/completions");
        assert_eq!(config.backend_url, "http://backend:8000/api");
        assert_eq!(config.default_project, "harbor-bridge");
        assert_eq!(config.scripts.tasks_dir, PathBuf::from("/opt/tasks"));
        assert_eq!(config.scripts.rfp_dir, rfp_default);
        assert_eq!(config.log_level, "debug");
    }
}
