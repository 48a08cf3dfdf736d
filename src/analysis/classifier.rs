// src/analysis/classifier.rs
use crate::analysis::text_client::TextGenerator;
use crate::analysis::types::{ClassifiedFeed, ClassifiedPost, PostSnapshot, RawPost};
use crate::config::AppConfig;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::OnceLock;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The literal reply meaning "this post is not a hiring offer".
pub const IGNORE_TOKEN: &str = "IGNORE";

/// First brace-delimited substring of a free-text reply. Non-greedy, so a
/// reply that wraps the object in prose still yields just the object.
pub fn extract_json_object(text: &str) -> Option<&str> {
    static OBJECT: OnceLock<Regex> = OnceLock::new();
    let pattern = OBJECT.get_or_init(|| Regex::new(r"(?s)\{.*?\}").expect("valid object pattern"));

    pattern.find(text).map(|m| m.as_str())
}

/// Why a post was left out of the classified feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The endpoint replied with the ignore literal, or with no object at all.
    NotAnOffer,
    /// A brace was present but no parseable object could be pulled out.
    MalformedReply,
    /// The object parsed but lacks a title, a description, or any contact channel.
    IncompleteOffer,
}

/// Per-post classification result. Failures are values, not exceptions: the
/// aggregate feed is a reduction over these.
#[derive(Debug, Clone)]
pub enum PostOutcome {
    Offer(ClassifiedPost),
    Skipped(SkipReason),
    Failed(String),
}

/// What the classifier is asked to put in its JSON reply.
#[derive(Debug, Deserialize)]
struct OfferReply {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Classifies one snapshot of raw posts at a time, sequentially, against the
/// text-generation endpoint.
///
/// Posts are processed in input order and one failing post never aborts the
/// rest. The busy flag is observable through [`PostClassifier::busy`] so the
/// host can show progress; cancellation stops the loop between posts and
/// drops the in-flight request.
pub struct PostClassifier {
    client: Arc<dyn TextGenerator>,
    max_post_chars: usize,
    busy_tx: watch::Sender<bool>,
}

impl PostClassifier {
    pub fn new(client: Arc<dyn TextGenerator>, config: &AppConfig) -> Self {
        let (busy_tx, _) = watch::channel(false);
        Self {
            client,
            max_post_chars: config.max_post_chars,
            busy_tx,
        }
    }

    /// Observe whether a classification run is in progress.
    pub fn busy(&self) -> watch::Receiver<bool> {
        self.busy_tx.subscribe()
    }

    /// Classify every post in the snapshot, in order. Returns the snapshot's
    /// metadata with the confirmed offers; skipped and failed posts are
    /// logged and omitted. Takes `&mut self`: overlapping runs are not a
    /// supported state.
    pub async fn classify_snapshot(
        &mut self,
        snapshot: PostSnapshot,
        cancel: &CancellationToken,
    ) -> ClassifiedFeed {
        let run_id = Uuid::new_v4();
        let _busy = BusyGuard::raise(&self.busy_tx);

        info!(
            "Classifying snapshot of {} posts (run {})",
            snapshot.posts.len(),
            run_id
        );

        let mut offers = Vec::new();
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for (index, post) in snapshot.posts.iter().enumerate() {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Classification run {} cancelled at post {}", run_id, index);
                    break;
                }
                outcome = self.classify_post(post) => outcome,
            };

            match outcome {
                PostOutcome::Offer(offer) => offers.push(offer),
                PostOutcome::Skipped(reason) => {
                    skipped += 1;
                    debug!("Post {} skipped: {:?}", index, reason);
                }
                PostOutcome::Failed(message) => {
                    failed += 1;
                    warn!("Skipping post {} due to error: {}", index, message);
                }
            }
        }

        info!(
            "Run {} finished: {} offers, {} skipped, {} failed",
            run_id,
            offers.len(),
            skipped,
            failed
        );

        ClassifiedFeed {
            title: snapshot.title,
            url: snapshot.url,
            timestamp: snapshot.timestamp,
            post_count: snapshot.post_count,
            posts: offers,
        }
    }

    async fn classify_post(&self, post: &RawPost) -> PostOutcome {
        let prompt = self.build_prompt(&post.text);

        match self.client.generate(&prompt).await {
            Ok(reply) => evaluate_reply(&post.author, &reply),
            Err(e) => PostOutcome::Failed(format!("{:#}", e)),
        }
    }

    fn build_prompt(&self, post_text: &str) -> String {
        let truncated: String = post_text.trim().chars().take(self.max_post_chars).collect();

        format!(
            r#"You are an AI assistant that filters LinkedIn posts.
Your task is to detect ONLY posts made by people OFFERING a job or internship. These must be written by **recruiters, companies, hiring managers, or HR professionals**.
### VERY IMPORTANT ###
Do NOT return posts from:
- Job seekers
- Students or freshers looking for work
- Anyone "open to work", "seeking opportunities", or "interested in roles"

### INSTRUCTIONS ###
If and ONLY if the post is from someone offering a job/internship, return the following JSON:

{{
  "title": "Job title or role",
  "email": "If mentioned",
  "phone": "If mentioned",
  "description": "Summary of the job offer"
}}

Otherwise, return EXACTLY the string: {IGNORE_TOKEN}

### POST ###
{truncated}"#
        )
    }
}

/// Decide a single post's fate from the endpoint's raw reply. Pure, so the
/// whole decision table is testable without a network.
pub fn evaluate_reply(author: &str, reply: &str) -> PostOutcome {
    let reply = reply.trim();

    if reply.eq_ignore_ascii_case(IGNORE_TOKEN) || !reply.contains('{') {
        return PostOutcome::Skipped(SkipReason::NotAnOffer);
    }

    let Some(object) = extract_json_object(reply) else {
        return PostOutcome::Skipped(SkipReason::MalformedReply);
    };

    let parsed: OfferReply = match serde_json::from_str(object) {
        Ok(parsed) => parsed,
        Err(_) => return PostOutcome::Skipped(SkipReason::MalformedReply),
    };

    let title = non_empty(parsed.title);
    let description = non_empty(parsed.description);
    let email = non_empty(parsed.email);
    let phone = non_empty(parsed.phone);

    let (Some(title), Some(description)) = (title, description) else {
        return PostOutcome::Skipped(SkipReason::IncompleteOffer);
    };
    if email.is_none() && phone.is_none() {
        return PostOutcome::Skipped(SkipReason::IncompleteOffer);
    }

    PostOutcome::Offer(ClassifiedPost {
        author: author.lines().next().unwrap_or("").trim().to_string(),
        title,
        description,
        email,
        phone,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Flips the busy flag up for the lifetime of a run and back down on every
/// exit path, cancellation included.
struct BusyGuard<'a> {
    tx: &'a watch::Sender<bool>,
}

impl<'a> BusyGuard<'a> {
    fn raise(tx: &'a watch::Sender<bool>) -> Self {
        let _ = tx.send(true);
        Self { tx }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let _ = self.tx.send(false);
    }
}
