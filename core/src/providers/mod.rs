pub mod openai;

pub use openai::OpenAIProvider;

use crate::config::Config;

/// The model client described by the process configuration.
pub fn create_provider(config: &Config) -> OpenAIProvider {
    let mut provider = OpenAIProvider::new(config.model_url.clone())
        .with_model(config.model.clone())
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);
    if let Some(api_key) = &config.api_key {
        provider = provider.with_api_key(api_key.clone());
    }
    provider
}
