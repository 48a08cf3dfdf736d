// src/testing.rs
//
// Mocks for the three injected boundaries: the key-value store, the
// text-generation endpoint, and the embedded page session. Everything is
// in-memory and deterministic; no test needs a network or a database file.
use crate::analysis::text_client::TextGenerator;
use crate::extraction::watcher::PageSession;
use crate::storage::KeyValueStore;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// HashMap-backed key-value store. `failing()` errors on every call, for
/// exercising the storage failure paths.
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            fail: true,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        if self.fail {
            bail!("storage unavailable");
        }

        let data = self.data.lock().expect("store lock poisoned");
        Ok(keys
            .iter()
            .filter_map(|key| data.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        if self.fail {
            bail!("storage unavailable");
        }

        let mut data = self.data.lock().expect("store lock poisoned");
        for (key, value) in pairs {
            data.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// Scripted text-generation endpoint: replies are consumed in order, one per
/// `generate` call. Builder style, matching how a test reads:
/// `ScriptedTextGen::new().reply("IGNORE").fail("timeout")`.
pub struct ScriptedTextGen {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
}

impl ScriptedTextGen {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .push_back(Err(message.to_string()));
        self
    }

    /// How many prompts were sent.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedTextGen {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for ScriptedTextGen {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self
            .replies
            .lock()
            .expect("replies lock poisoned")
            .pop_front();

        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!("{}", message)),
            None => bail!("no scripted reply left"),
        }
    }
}

/// Scripted page session: serves a fixed sequence of documents, sticking on
/// the last one. Counts scrolls so tests can assert the loop kept nudging.
pub struct ScriptedPage {
    url: String,
    pages: Mutex<VecDeque<String>>,
    current: Mutex<String>,
    scrolls: AtomicUsize,
    fail_first_html: AtomicBool,
}

impl ScriptedPage {
    pub fn new(url: &str, pages: Vec<String>) -> Self {
        Self {
            url: url.to_string(),
            pages: Mutex::new(pages.into()),
            current: Mutex::new(String::new()),
            scrolls: AtomicUsize::new(0),
            fail_first_html: AtomicBool::new(false),
        }
    }

    /// Make the first `html()` call error, to exercise scan-failure paths.
    pub fn fail_first_html(self) -> Self {
        self.fail_first_html.store(true, Ordering::SeqCst);
        self
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSession for ScriptedPage {
    async fn html(&self) -> Result<String> {
        if self.fail_first_html.swap(false, Ordering::SeqCst) {
            bail!("document not ready");
        }

        let mut current = self.current.lock().expect("page lock poisoned");
        if let Some(next) = self.pages.lock().expect("pages lock poisoned").pop_front() {
            *current = next;
        }
        Ok(current.clone())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
