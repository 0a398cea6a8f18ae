use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Instant, sleep};

use scanner_core::model::{ClaimedAccount, ContentItem, ToxicityAttribute, ToxicityScores};

use crate::sources::{AccountFinder, ContentSource, ToxicityScorer};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub(crate) struct FakeFinder {
    accounts: Vec<ClaimedAccount>,
    fail: bool,
    delay: Duration,
    pub(crate) calls: Arc<AtomicUsize>,
}

impl FakeFinder {
    pub(crate) fn found(platforms: &[&str]) -> Self {
        let accounts = platforms
            .iter()
            .map(|platform| ClaimedAccount {
                platform: (*platform).to_owned(),
                url: format!("https://{}.example/user", platform.to_lowercase()),
                status: "Claimed".to_owned(),
                response_time: Some(0.2),
            })
            .collect();

        Self {
            accounts,
            fail: false,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::found(&[])
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl AccountFinder for FakeFinder {
    async fn find_accounts(&self, _username: &str) -> anyhow::Result<Vec<ClaimedAccount>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        sleep(self.delay).await;

        if self.fail {
            anyhow::bail!("sherlock exited with status 1");
        }
        Ok(self.accounts.clone())
    }
}

pub(crate) struct FakeContent {
    items: Vec<ContentItem>,
    fail: bool,
}

impl FakeContent {
    pub(crate) fn new(items: Vec<ContentItem>) -> Self {
        Self { items, fail: false }
    }

    pub(crate) fn failing() -> Self {
        Self {
            items: Vec::new(),
            fail: true,
        }
    }
}

impl ContentSource for FakeContent {
    async fn recent_items(
        &self,
        _username: &str,
        _comment_limit: usize,
        _post_limit: usize,
    ) -> anyhow::Result<Vec<ContentItem>> {
        if self.fail {
            anyhow::bail!("reddit returned 403");
        }
        Ok(self.items.clone())
    }
}

/// Scores "bad" text as toxic, errors on "error", and records when it was called.
#[derive(Default)]
pub(crate) struct FakeScorer {
    pub(crate) calls: Arc<Mutex<Vec<Instant>>>,
}

impl ToxicityScorer for FakeScorer {
    async fn score(&self, text: &str) -> anyhow::Result<ToxicityScores> {
        self.calls
            .lock()
            .expect("scorer call log poisoned")
            .push(Instant::now());

        if text.contains("error") {
            anyhow::bail!("perspective returned 429");
        }

        let toxicity = if text.contains("bad") { 0.9 } else { 0.1 };
        Ok([
            (ToxicityAttribute::Toxicity, toxicity),
            (ToxicityAttribute::Insult, 0.3),
            (ToxicityAttribute::Profanity, 0.05),
            (ToxicityAttribute::SexuallyExplicit, 0.01),
        ]
        .into_iter()
        .collect())
    }
}
