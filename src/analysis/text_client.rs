// src/analysis/text_client.rs
use crate::config::AppConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

/// The remote text-generation collaborator. One prompt in, one free-text
/// body out; no authentication, no retries.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// HTTP client for a text-generation endpoint that takes the prompt as a
/// percent-encoded request path.
pub struct TextGenClient {
    client: Client,
    base_url: String,
}

impl TextGenClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.text_gen_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for TextGenClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(prompt));

        info!("Sending prompt to text generation endpoint");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach text generation endpoint")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Text generation endpoint returned error: {}",
                response.status()
            );
        }

        response
            .text()
            .await
            .context("Failed to read text generation response body")
    }
}
