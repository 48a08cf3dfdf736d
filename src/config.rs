// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Runtime configuration for the job search pipeline.
///
/// Every tunable the pipeline touches lives here: endpoint base URLs, the
/// search seed tag, the per-post truncation length and the page scan
/// interval. Defaults mirror the production deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Text generation endpoint. The percent-encoded prompt is appended as
    /// the request path.
    pub text_gen_base_url: String,
    /// Content search results page, keywords query left open.
    pub search_base_url: String,
    /// Tag every search query starts from.
    pub seed_tag: String,
    /// Stored when hashtag generation yields no usable token.
    pub fallback_hashtag: String,
    /// Per-post prefix length sent to the classifier.
    pub max_post_chars: usize,
    /// Seconds between page scans.
    pub scan_interval_secs: u64,
    /// HTTP client timeout in seconds.
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub database_path: PathBuf,
    /// CSS selector matching one post container element.
    pub post_selector: String,
    /// CSS selector for the author label inside a container.
    pub author_selector: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            text_gen_base_url: "https://text.pollinations.ai".to_string(),
            search_base_url: "https://www.linkedin.com/search/results/content/?keywords="
                .to_string(),
            seed_tag: "#hiring".to_string(),
            fallback_hashtag: "#professional".to_string(),
            max_post_chars: 1600,
            scan_interval_secs: 4,
            request_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            database_path: PathBuf::from("data/jobscout.db"),
            post_selector: r#"[data-urn^="urn:li:activity"]"#.to_string(),
            author_selector: r#"span[dir="ltr"]"#.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: AppConfig,
    production: AppConfig,
}

impl AppConfig {
    /// Load configuration based on environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);
        Self::load_from_file(&environment)
    }

    fn get_environment() -> String {
        std::env::var("JOBSCOUT_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_from_file(environment: &str) -> Result<Self> {
        let config_path = PathBuf::from("config.yaml");
        if !config_path.exists() {
            anyhow::bail!("config.yaml not found in current directory");
        }

        let config_content =
            std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?;

        let config_file: ConfigFile =
            serde_yaml::from_str(&config_content).context("Failed to parse config.yaml")?;

        Ok(match environment {
            "production" => config_file.production,
            _ => config_file.local,
        })
    }

    pub fn with_database_path(mut self, path: PathBuf) -> Self {
        self.database_path = path;
        self
    }

    pub fn with_text_gen_base_url(mut self, url: String) -> Self {
        self.text_gen_base_url = url;
        self
    }

    pub fn with_scan_interval(mut self, secs: u64) -> Self {
        self.scan_interval_secs = secs;
        self
    }

    pub fn with_max_post_chars(mut self, chars: usize) -> Self {
        self.max_post_chars = chars;
        self
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
