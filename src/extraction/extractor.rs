// src/extraction/extractor.rs
use crate::analysis::types::{PostLink, PostSnapshot, RawPost};
use crate::config::AppConfig;
use anyhow::Result;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Scans a page's HTML for post containers and pulls out the pieces the
/// classifier needs: visible text, an author label, and every anchor.
pub struct PostExtractor {
    post_selector: Selector,
    author_selector: Selector,
    link_selector: Selector,
    title_selector: Selector,
}

impl PostExtractor {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let post_selector = parse_selector(&config.post_selector)?;
        let author_selector = parse_selector(&config.author_selector)?;
        let link_selector = parse_selector("a")?;
        let title_selector = parse_selector("title")?;

        Ok(Self {
            post_selector,
            author_selector,
            link_selector,
            title_selector,
        })
    }

    /// All post-like elements currently in the document, in document order.
    pub fn extract_posts(&self, html: &str) -> Vec<RawPost> {
        let document = Html::parse_document(html);

        document
            .select(&self.post_selector)
            .map(|container| {
                let author = container
                    .select(&self.author_selector)
                    .next()
                    .map(visible_text)
                    .unwrap_or_default();

                let links = container
                    .select(&self.link_selector)
                    .map(|anchor| PostLink {
                        href: anchor.value().attr("href").unwrap_or_default().to_string(),
                        text: visible_text(anchor),
                    })
                    .collect();

                RawPost {
                    author,
                    text: visible_text(container),
                    links,
                }
            })
            .collect()
    }

    pub fn page_title(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        document
            .select(&self.title_selector)
            .next()
            .map(visible_text)
            .unwrap_or_default()
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| {
        warn!("Rejecting selector {:?}: {}", selector, e);
        anyhow::anyhow!("Invalid CSS selector {:?}: {}", selector, e)
    })
}

/// Visible text of an element, line per text node, blank runs dropped.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Monotonic post-count tracker. A snapshot is produced only when the count
/// strictly grows; unchanged or shrinking counts produce nothing and never
/// move the tracked count backward, so a recovering page cannot cause a
/// duplicate emission.
#[derive(Debug, Default)]
pub struct SnapshotTracker {
    last_count: usize,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, title: String, url: String, posts: Vec<RawPost>) -> Option<PostSnapshot> {
        let count = posts.len();
        if count <= self.last_count {
            return None;
        }
        self.last_count = count;

        Some(PostSnapshot {
            title,
            url,
            timestamp: Utc::now(),
            post_count: count,
            posts,
        })
    }

    pub fn last_count(&self) -> usize {
        self.last_count
    }
}
