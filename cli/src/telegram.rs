use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ParseMode};
use tracing::{info, warn};
use vantage_core::Gateway;
use vantage_core::traits::{Channel, DocumentRef, InboundEvent, SessionId};

pub struct TelegramChannel {
    bot: Bot,
    bot_token: String,
    http: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
            bot_token: bot_token.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Long-polls Telegram and hands every message to the gateway. Updates
    /// from one chat are delivered in order; chats run concurrently.
    pub async fn start(self: Arc<Self>, gateway: Arc<Gateway>) {
        info!("Bot started successfully. Ready to receive messages.");

        let handler = Update::filter_message().endpoint(move |msg: Message| {
            let gateway = Arc::clone(&gateway);
            async move {
                if let Some(event) = inbound_event(&msg) {
                    gateway.handle_event(event).await;
                }
                respond(())
            }
        });

        Dispatcher::builder(self.bot.clone(), handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

fn chat_id(session: &SessionId) -> anyhow::Result<ChatId> {
    let id = session
        .as_str()
        .parse::<i64>()
        .with_context(|| format!("'{}' is not a Telegram chat id", session))?;
    Ok(ChatId(id))
}

/// Text and document messages become gateway events; bot commands and other
/// message kinds are ignored.
fn inbound_event(msg: &Message) -> Option<InboundEvent> {
    let document = msg.document().map(|doc| DocumentRef {
        filename: doc
            .file_name
            .clone()
            .unwrap_or_else(|| "document".to_string()),
        file_ref: doc.file.id.clone(),
    });

    event_for(msg.chat.id.0, msg.text(), msg.caption(), document)
}

fn event_for(
    chat_id: i64,
    text: Option<&str>,
    caption: Option<&str>,
    document: Option<DocumentRef>,
) -> Option<InboundEvent> {
    let text = match (&document, text) {
        (None, Some(text)) if text.starts_with('/') => return None,
        (None, Some(text)) => Some(text.to_string()),
        (Some(_), _) => caption.map(str::to_string),
        (None, None) => return None,
    };

    Some(InboundEvent {
        session: SessionId::from(chat_id),
        text,
        document,
    })
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_typing(&self, session: &SessionId) -> anyhow::Result<()> {
        self.bot
            .send_chat_action(chat_id(session)?, ChatAction::Typing)
            .await?;
        Ok(())
    }

    async fn send_text(&self, session: &SessionId, text: &str) -> anyhow::Result<()> {
        let chat = chat_id(session)?;
        let html = self
            .bot
            .send_message(chat, text)
            .parse_mode(ParseMode::Html)
            .await;

        if let Err(e) = html {
            warn!(%session, "HTML reply rejected, resending as plain text: {}", e);
            self.bot.send_message(chat, text).await?;
        }
        Ok(())
    }

    async fn download_document(&self, document: &DocumentRef, dest: &Path) -> anyhow::Result<()> {
        let file = self
            .bot
            .get_file(document.file_ref.clone())
            .await?;

        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot_token, file.path
        );
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to download file from Telegram: HTTP {}",
                response.status()
            );
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        info!(file = %dest.display(), size = bytes.len(), "Downloaded document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(file_id: &str) -> DocumentRef {
        DocumentRef {
            filename: "rfp.pdf".to_string(),
            file_ref: file_id.to_string(),
        }
    }

    #[test]
    fn text_message_keys_the_session_by_chat() {
        let event = event_for(-100123, Some("status of task 20"), None, None).unwrap();
        assert_eq!(event.session, SessionId::new("-100123"));
        assert_eq!(event.text.as_deref(), Some("status of task 20"));
        assert!(event.document.is_none());
    }

    #[test]
    fn document_takes_its_caption_as_text() {
        let event = event_for(42, None, Some("Process this RFP"), Some(pdf("BQACAgQ"))).unwrap();
        assert_eq!(event.text.as_deref(), Some("Process this RFP"));
        assert_eq!(event.document, Some(pdf("BQACAgQ")));

        let bare = event_for(42, None, None, Some(pdf("BQACAgQ"))).unwrap();
        assert!(bare.text.is_none());
    }

    #[test]
    fn commands_and_empty_messages_are_ignored() {
        assert!(event_for(42, Some("/start"), None, None).is_none());
        assert!(event_for(42, None, None, None).is_none());
    }
}
