// src/profile.rs
use crate::analysis::hashtag::HashtagGenerator;
use crate::storage::{profile_keys, KeyValueStore};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The saved user profile. All fields are free text; `experience` is a
/// number of years entered as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub resume_url: String,
    pub skills: String,
    pub description: String,
    pub experience: String,
}

impl Profile {
    /// A profile is complete only when every field has content. Anything
    /// less is treated as no profile at all.
    pub fn is_complete(&self) -> bool {
        [
            &self.name,
            &self.resume_url,
            &self.skills,
            &self.description,
            &self.experience,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// Where the host should land on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRoute {
    Main,
    ProfileSetup,
}

/// Reads and writes the profile through the injected key-value store.
pub struct ProfileRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the stored profile. Absent fields come back empty.
    pub async fn load(&self) -> Result<Profile> {
        let mut values = self
            .store
            .get_many(&profile_keys::PROFILE_FIELDS)
            .await
            .context("Failed to read stored profile")?;

        let mut take = |key: &str| values.remove(key).unwrap_or_default();

        Ok(Profile {
            name: take(profile_keys::NAME),
            resume_url: take(profile_keys::RESUME_URL),
            skills: take(profile_keys::SKILLS),
            description: take(profile_keys::DESCRIPTION),
            experience: take(profile_keys::EXPERIENCE),
        })
    }

    /// Persist the profile wholesale. Incomplete profiles are rejected
    /// before anything is written.
    pub async fn save(&self, profile: &Profile) -> Result<()> {
        if !profile.is_complete() {
            anyhow::bail!("Profile is incomplete; all fields are required");
        }

        self.store
            .set_many(&[
                (profile_keys::NAME, profile.name.as_str()),
                (profile_keys::RESUME_URL, profile.resume_url.as_str()),
                (profile_keys::SKILLS, profile.skills.as_str()),
                (profile_keys::DESCRIPTION, profile.description.as_str()),
                (profile_keys::EXPERIENCE, profile.experience.as_str()),
            ])
            .await
            .context("Failed to save profile")?;

        info!("Profile saved for: {}", profile.name);
        Ok(())
    }

    pub async fn stored_hashtag(&self) -> Result<Option<String>> {
        self.store
            .get(profile_keys::GENERATED_HASHTAG)
            .await
            .context("Failed to read stored hashtag")
    }

    pub async fn store_hashtag(&self, hashtag: &str) -> Result<()> {
        self.store
            .set(profile_keys::GENERATED_HASHTAG, hashtag)
            .await
            .context("Failed to store hashtag")
    }

    /// Startup routing: straight to the main screen when a complete profile
    /// exists, otherwise profile setup. A storage failure is logged and
    /// treated as "no profile yet".
    pub async fn initial_route(&self) -> StartRoute {
        match self.load().await {
            Ok(profile) if profile.is_complete() => StartRoute::Main,
            Ok(_) => StartRoute::ProfileSetup,
            Err(e) => {
                error!("Failed to read stored profile: {:#}", e);
                StartRoute::ProfileSetup
            }
        }
    }
}

/// The setup and settings save flow: persist the profile wholesale, then
/// refresh the derived hashtag. The refresh is best-effort; its failure is
/// logged and the previously stored tag stays in place.
pub async fn save_profile(
    repo: &ProfileRepository,
    generator: &HashtagGenerator,
    profile: &Profile,
) -> Result<()> {
    repo.save(profile).await?;

    if let Err(e) = generator.refresh(profile).await {
        warn!("Hashtag refresh failed, keeping previous tag: {:#}", e);
    }

    Ok(())
}
