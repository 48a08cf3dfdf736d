// src/session.rs
use crate::analysis::classifier::PostClassifier;
use crate::analysis::types::{ClassifiedFeed, ClassifiedPost, PostSnapshot};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What the card list should show.
#[derive(Debug, Clone, Copy)]
pub enum FeedView<'a> {
    /// No snapshot has been classified yet.
    NoDataYet,
    /// A run finished and confirmed nothing.
    NoOffersFound,
    /// Confirmed offers, in extraction order.
    Offers(&'a ClassifiedFeed),
}

/// A contact action the host can hand to the platform opener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactLink {
    pub kind: ContactKind,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Email,
    Phone,
}

/// Click-to-contact links for one offer card.
pub fn contact_links(post: &ClassifiedPost) -> Vec<ContactLink> {
    let mut links = Vec::new();

    if let Some(email) = &post.email {
        links.push(ContactLink {
            kind: ContactKind::Email,
            url: format!("mailto:{}", email),
        });
    }
    if let Some(phone) = &post.phone {
        links.push(ContactLink {
            kind: ContactKind::Phone,
            url: format!("tel:{}", phone),
        });
    }

    links
}

/// Host-side consumer of the snapshot channel.
///
/// Owns the classifier and the latest classified feed. One snapshot is
/// processed to completion at a time; a newly arriving snapshot replaces the
/// previous results only once its own run finishes. Stale results are
/// cleared the moment a new run starts so the host never renders cards from
/// a superseded snapshot.
pub struct JobSearchSession {
    classifier: PostClassifier,
    snapshots: mpsc::Receiver<PostSnapshot>,
    latest: Option<ClassifiedFeed>,
}

impl JobSearchSession {
    pub fn new(classifier: PostClassifier, snapshots: mpsc::Receiver<PostSnapshot>) -> Self {
        Self {
            classifier,
            snapshots,
            latest: None,
        }
    }

    /// Observe whether a classification run is in progress.
    pub fn busy(&self) -> watch::Receiver<bool> {
        self.classifier.busy()
    }

    /// Wait for the next snapshot and classify it. Returns the new feed, or
    /// `None` when the channel closed or the session was cancelled first.
    /// Cancellation mid-run keeps the offers confirmed so far.
    pub async fn process_next(&mut self, cancel: &CancellationToken) -> Option<&ClassifiedFeed> {
        let snapshot = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Session cancelled while waiting for snapshots");
                return None;
            }
            snapshot = self.snapshots.recv() => snapshot?,
        };

        self.latest = None;

        let feed = self.classifier.classify_snapshot(snapshot, cancel).await;
        self.latest = Some(feed);
        self.latest.as_ref()
    }

    /// Drain and classify snapshots until the channel closes or the session
    /// is cancelled.
    pub async fn run(&mut self, cancel: CancellationToken) {
        while self.process_next(&cancel).await.is_some() {}
    }

    pub fn view(&self) -> FeedView<'_> {
        match &self.latest {
            None => FeedView::NoDataYet,
            Some(feed) if feed.posts.is_empty() => FeedView::NoOffersFound,
            Some(feed) => FeedView::Offers(feed),
        }
    }

    /// Forget the current results, e.g. when the user closes the browser view.
    pub fn clear(&mut self) {
        self.latest = None;
    }
}
