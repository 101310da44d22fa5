use async_trait::async_trait;
use std::path::Path;
use vantage_core::traits::{Channel, DocumentRef, SessionId};

/// Terminal stand-in for a chat channel.
pub struct ConsoleChannel;

#[async_trait]
impl Channel for ConsoleChannel {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_typing(&self, _session: &SessionId) -> anyhow::Result<()> {
        println!("🤔 Processing...");
        Ok(())
    }

    async fn send_text(&self, _session: &SessionId, text: &str) -> anyhow::Result<()> {
        println!("\n{}", text);
        Ok(())
    }

    async fn download_document(&self, document: &DocumentRef, dest: &Path) -> anyhow::Result<()> {
        tokio::fs::copy(&document.file_ref, dest).await?;
        Ok(())
    }
}
