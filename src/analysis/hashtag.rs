// src/analysis/hashtag.rs
use crate::analysis::text_client::TextGenerator;
use crate::config::AppConfig;
use crate::profile::Profile;
use crate::storage::{profile_keys, KeyValueStore};
use anyhow::{Context, Result};
use regex::Regex;
use std::sync::Arc;
use std::sync::OnceLock;
use tracing::info;

/// First `#word` token in a free-text reply, if any. The endpoint rarely
/// answers with the bare tag, so everything around it is ignored.
pub fn extract_hashtag(text: &str) -> Option<String> {
    static HASHTAG: OnceLock<Regex> = OnceLock::new();
    let pattern = HASHTAG.get_or_init(|| Regex::new(r"#\w+").expect("valid hashtag pattern"));

    pattern.find(text).map(|m| m.as_str().to_string())
}

/// Derives one topical hashtag from the profile and persists it.
///
/// The stored tag seeds the content search query; regeneration happens on
/// every profile save so the tag tracks the current skills.
pub struct HashtagGenerator {
    client: Arc<dyn TextGenerator>,
    store: Arc<dyn KeyValueStore>,
    fallback: String,
}

impl HashtagGenerator {
    pub fn new(
        client: Arc<dyn TextGenerator>,
        store: Arc<dyn KeyValueStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            client,
            store,
            fallback: config.fallback_hashtag.clone(),
        }
    }

    /// Regenerate and store the hashtag. Overwrites any previous value; a
    /// reply with no usable token stores the fallback instead. Errors are
    /// for the caller to log and swallow — a failed refresh leaves the
    /// previously stored tag untouched.
    pub async fn refresh(&self, profile: &Profile) -> Result<String> {
        let prompt = build_prompt(profile);

        let reply = self
            .client
            .generate(&prompt)
            .await
            .context("Hashtag generation request failed")?;

        let hashtag = extract_hashtag(&reply).unwrap_or_else(|| self.fallback.clone());

        self.store
            .set(profile_keys::GENERATED_HASHTAG, &hashtag)
            .await
            .context("Failed to store generated hashtag")?;

        info!("Hashtag stored: {}", hashtag);
        Ok(hashtag)
    }
}

fn build_prompt(profile: &Profile) -> String {
    format!(
        "Suggest one popular and specific hashtag (like #react, #uiux, #sales, \
         #productmanager, #java, #datascience, #marketing) that best represents a \
         person's core skills. \
         The person has these skills: {}. \
         Bio: {}. \
         Experience: {} years. \
         Return only one hashtag that is relevant to their field (tech or non-tech). \
         Do not use generic tags like #jobsearch or #career. Just one specific hashtag.",
        profile.skills, profile.description, profile.experience
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, ScriptedTextGen};

    fn profile() -> Profile {
        Profile {
            name: "Jane Doe".to_string(),
            resume_url: "https://link.to/resume.pdf".to_string(),
            skills: "Rust, Kafka".to_string(),
            description: "Backend developer".to_string(),
            experience: "4".to_string(),
        }
    }

    #[test]
    fn test_extract_first_token() {
        assert_eq!(
            extract_hashtag("Sure! #backenddev is great").as_deref(),
            Some("#backenddev")
        );
        assert_eq!(
            extract_hashtag("#rustlang or maybe #golang").as_deref(),
            Some("#rustlang")
        );
        assert_eq!(extract_hashtag("no tag in here"), None);
        assert_eq!(extract_hashtag("dangling # alone"), None);
    }

    #[test]
    fn test_prompt_embeds_profile_fields() {
        let prompt = build_prompt(&profile());
        assert!(prompt.contains("Rust, Kafka"));
        assert!(prompt.contains("Experience: 4 years"));
    }

    #[tokio::test]
    async fn test_refresh_stores_extracted_tag() {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(ScriptedTextGen::new().reply("Sure! #backenddev is great"));
        let generator = HashtagGenerator::new(client, store.clone(), &AppConfig::default());

        let tag = generator.refresh(&profile()).await.unwrap();
        assert_eq!(tag, "#backenddev");
        assert_eq!(
            store.get(profile_keys::GENERATED_HASHTAG).await.unwrap().as_deref(),
            Some("#backenddev")
        );
    }

    #[tokio::test]
    async fn test_refresh_falls_back_without_token() {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(ScriptedTextGen::new().reply("I cannot pick just one."));
        let generator = HashtagGenerator::new(client, store.clone(), &AppConfig::default());

        let tag = generator.refresh(&profile()).await.unwrap();
        assert_eq!(tag, "#professional");
    }

    #[tokio::test]
    async fn test_failed_request_leaves_stored_tag_untouched() {
        let store = Arc::new(MemoryStore::new());
        store.set(profile_keys::GENERATED_HASHTAG, "#rustlang").await.unwrap();

        let client = Arc::new(ScriptedTextGen::new().fail("connection refused"));
        let generator = HashtagGenerator::new(client, store.clone(), &AppConfig::default());

        assert!(generator.refresh(&profile()).await.is_err());
        assert_eq!(
            store.get(profile_keys::GENERATED_HASHTAG).await.unwrap().as_deref(),
            Some("#rustlang")
        );
    }
}
