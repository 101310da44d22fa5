use crate::traits::ContextSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ContextResponse {
    #[serde(default)]
    context: String,
}

/// Fetches enriched project context from the project backend.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn context_url(&self, project_slug: &str) -> String {
        format!("{}/projects/{}/chat/context", self.base_url, project_slug)
    }
}

#[async_trait]
impl ContextSource for BackendClient {
    async fn fetch(&self, project_slug: &str) -> String {
        let response = match self.client.get(self.context_url(project_slug)).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(project = project_slug, "Error fetching context: {}", e);
                return String::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                project = project_slug,
                status = %response.status(),
                "Failed to fetch context"
            );
            return String::new();
        }

        match response.json::<ContextResponse>().await {
            Ok(body) => body.context,
            Err(e) => {
                tracing::error!(project = project_slug, "Malformed context response: {}", e);
                String::new()
            }
        }
    }
}
