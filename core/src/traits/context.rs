use async_trait::async_trait;

/// Supplies the enriched project context injected into every exchange.
/// Failures degrade to an empty string; they never abort a turn.
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn fetch(&self, project_slug: &str) -> String;
}
