// src/analysis/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One anchor found inside a post container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostLink {
    pub href: String,
    pub text: String,
}

/// Raw post content as scraped from the page, before classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub links: Vec<PostLink>,
}

/// One batch of raw posts, emitted by the page watcher whenever the visible
/// post count grows. Crosses the guest-to-host channel as JSON, hence the
/// camelCase count field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSnapshot {
    pub title: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "postCount")]
    pub post_count: usize,
    pub posts: Vec<RawPost>,
}

/// A post the classifier confirmed as a hiring offer with at least one
/// contact channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPost {
    pub author: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Classification result for a whole snapshot: the snapshot's metadata with
/// the raw posts replaced by the confirmed offers, input order preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedFeed {
    pub title: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "postCount")]
    pub post_count: usize,
    pub posts: Vec<ClassifiedPost>,
}
