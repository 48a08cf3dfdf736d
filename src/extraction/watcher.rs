// src/extraction/watcher.rs
use crate::analysis::types::PostSnapshot;
use crate::config::AppConfig;
use crate::extraction::extractor::{PostExtractor, SnapshotTracker};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The embedded browser page the host navigated to. The watcher only ever
/// reads the current document and nudges the page to load more.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Serialized current document.
    async fn html(&self) -> Result<String>;

    /// Address the page is currently on.
    async fn current_url(&self) -> Result<String>;

    /// Scroll to the bottom so lazily loaded content appears.
    async fn scroll_to_bottom(&self) -> Result<()>;
}

/// Watches a page session for growing post content.
///
/// Scans once immediately, then on a fixed interval: scroll to the bottom,
/// rescan, and emit a [`PostSnapshot`] into the channel whenever the post
/// count grew. Emission is fire-and-forget; the host-side consumer owns any
/// backpressure. The loop ends on cancellation (page teardown) or when the
/// receiving side is gone, so no timer outlives the page.
pub struct PageWatcher {
    extractor: PostExtractor,
    tracker: SnapshotTracker,
    interval: Duration,
}

impl PageWatcher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            extractor: PostExtractor::new(config)?,
            tracker: SnapshotTracker::new(),
            interval: config.scan_interval(),
        })
    }

    pub async fn run(
        mut self,
        session: Arc<dyn PageSession>,
        snapshots: mpsc::Sender<PostSnapshot>,
        cancel: CancellationToken,
    ) {
        if let Err(e) = self.scan(session.as_ref(), &snapshots).await {
            warn!("Initial page scan failed: {:#}", e);
        }

        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately; the initial scan already ran.
        ticker.tick().await;

        loop {
            if snapshots.is_closed() {
                info!("Snapshot channel closed, stopping page watcher");
                return;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Page torn down, stopping page watcher");
                    return;
                }
                _ = ticker.tick() => {}
            }

            if let Err(e) = session.scroll_to_bottom().await {
                warn!("Scroll failed: {:#}", e);
                continue;
            }

            if let Err(e) = self.scan(session.as_ref(), &snapshots).await {
                warn!("Page scan failed: {:#}", e);
            }
        }
    }

    async fn scan(
        &mut self,
        session: &dyn PageSession,
        snapshots: &mpsc::Sender<PostSnapshot>,
    ) -> Result<()> {
        let html = session.html().await?;
        let url = session.current_url().await?;

        let posts = self.extractor.extract_posts(&html);
        let title = self.extractor.page_title(&html);

        if let Some(snapshot) = self.tracker.observe(title, url, posts) {
            info!("Emitting snapshot with {} posts", snapshot.post_count);
            // Fire and forget: a closed channel is caught on the next pass.
            let _ = snapshots.send(snapshot).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPage;

    fn page_with(posts: usize) -> String {
        let mut html = String::from("<html><head><title>feed</title></head><body>");
        for i in 0..posts {
            html.push_str(&format!(
                r#"<div data-urn="urn:li:activity:{i}"><span dir="ltr">A{i}</span><p>post {i}</p></div>"#
            ));
        }
        html.push_str("</body></html>");
        html
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_on_growth_then_stops_on_cancel() {
        let session = Arc::new(ScriptedPage::new(
            "https://example.test/search",
            vec![page_with(2), page_with(2), page_with(3)],
        ));
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let watcher = PageWatcher::new(&AppConfig::default()).unwrap();
        let handle = tokio::spawn(watcher.run(session.clone(), tx, cancel.clone()));

        // Immediate scan: 2 posts
        let first = rx.recv().await.unwrap();
        assert_eq!(first.post_count, 2);
        assert_eq!(first.title, "feed");
        assert_eq!(first.url, "https://example.test/search");

        // Next ticks: unchanged count emits nothing, growth emits once
        let second = rx.recv().await.unwrap();
        assert_eq!(second.post_count, 3);

        assert!(session.scroll_count() >= 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_receiver_dropped() {
        let session = Arc::new(ScriptedPage::new(
            "https://example.test/search",
            vec![page_with(1), page_with(2)],
        ));
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        let watcher = PageWatcher::new(&AppConfig::default()).unwrap();
        let handle = tokio::spawn(watcher.run(session, tx, CancellationToken::new()));

        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_failure_keeps_the_loop_alive() {
        let session = Arc::new(
            ScriptedPage::new("https://example.test/search", vec![page_with(1)]).fail_first_html(),
        );
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let watcher = PageWatcher::new(&AppConfig::default()).unwrap();
        let handle = tokio::spawn(watcher.run(session, tx, cancel.clone()));

        // First scan errors; the next tick still delivers
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.post_count, 1);

        cancel.cancel();
        handle.await.unwrap();
    }
}
