use std::fmt;
use std::sync::Arc;

use anyhow::Context as _;
use futures::future::join_all;
use tracing::{info, warn};

use scanner_core::model::{ClaimedAccount, ContentItem, FlaggedItem, ScanReport, ToxicityScores};
use scanner_core::{ConfigError, ScanKey, ScanMode, ScannerConfig};
use scanner_guard::{ComputeFailure, RateLimiter, ResultCache};
use scanner_utils::formatting::truncate_chars;

use crate::sources::{AccountFinder, ContentSource, ToxicityScorer, Unconfigured};

/// Flagged content is stored with at most this many characters.
pub const FLAGGED_CONTENT_MAX_CHARS: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceUnavailable {
    Sherlock,
    Reddit,
}

impl fmt::Display for SourceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceUnavailable::Sherlock => f.write_str("Sherlock not available on this bot"),
            SourceUnavailable::Reddit => f.write_str("Reddit scanning not configured on this bot"),
        }
    }
}

struct RedditPipeline<C, T> {
    source: C,
    scorer: T,
}

/// Runs Sherlock and Reddit scans behind the shared result cache, pacing
/// every toxicity call through one rate limiter.
pub struct ScanOrchestrator<A = Unconfigured, C = Unconfigured, T = Unconfigured> {
    finder: Option<A>,
    reddit: Option<RedditPipeline<C, T>>,
    limiter: Arc<RateLimiter>,
    cache: ResultCache<ScanKey, Arc<ScanReport>>,
    toxicity_threshold: f64,
    comment_limit: usize,
    post_limit: usize,
}

impl ScanOrchestrator {
    /// An orchestrator with no sources attached yet.
    pub fn new(config: &ScannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let limiter = RateLimiter::per_minute(config.rate_per_minute)?;

        Ok(Self {
            finder: None,
            reddit: None,
            limiter: Arc::new(limiter),
            cache: ResultCache::new(config.cache_max_size, config.cache_ttl),
            toxicity_threshold: config.toxicity_threshold,
            comment_limit: config.comment_limit,
            post_limit: config.post_limit,
        })
    }
}

impl<A, C, T> ScanOrchestrator<A, C, T> {
    pub fn with_sherlock<F>(self, finder: F) -> ScanOrchestrator<F, C, T> {
        ScanOrchestrator {
            finder: Some(finder),
            reddit: self.reddit,
            limiter: self.limiter,
            cache: self.cache,
            toxicity_threshold: self.toxicity_threshold,
            comment_limit: self.comment_limit,
            post_limit: self.post_limit,
        }
    }

    pub fn with_reddit<S, R>(self, source: S, scorer: R) -> ScanOrchestrator<A, S, R> {
        ScanOrchestrator {
            finder: self.finder,
            reddit: Some(RedditPipeline { source, scorer }),
            limiter: self.limiter,
            cache: self.cache,
            toxicity_threshold: self.toxicity_threshold,
            comment_limit: self.comment_limit,
            post_limit: self.post_limit,
        }
    }

    /// Share one limiter between orchestrators that call the same API.
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn cache(&self) -> &ResultCache<ScanKey, Arc<ScanReport>> {
        &self.cache
    }
}

impl<A, C, T> ScanOrchestrator<A, C, T>
where
    A: AccountFinder,
    C: ContentSource,
    T: ToxicityScorer,
{
    pub fn supports(&self, mode: ScanMode) -> Result<(), SourceUnavailable> {
        if mode.includes_reddit() && self.reddit.is_none() {
            return Err(SourceUnavailable::Reddit);
        }
        if mode.includes_sherlock() && self.finder.is_none() {
            return Err(SourceUnavailable::Sherlock);
        }
        Ok(())
    }

    /// Scan `username`, reusing a fresh cached report or an in-progress scan
    /// of the same target and mode.
    pub async fn scan(&self, username: &str, mode: ScanMode) -> Result<Arc<ScanReport>, ComputeFailure> {
        let username = username.trim();
        let key = ScanKey::new(username, mode);
        self.cache
            .get_or_compute(key, || self.run_scan(username, mode))
            .await
    }

    pub fn invalidate(&self, username: &str, mode: ScanMode) {
        self.cache.invalidate(&ScanKey::new(username, mode));
    }

    async fn run_scan(&self, username: &str, mode: ScanMode) -> anyhow::Result<Arc<ScanReport>> {
        info!(username, %mode, "starting scan");

        let sherlock = async {
            if mode.includes_sherlock() {
                Some(self.scan_sherlock(username).await)
            } else {
                None
            }
        };
        let reddit = async {
            if mode.includes_reddit() {
                Some(self.scan_reddit(username).await)
            } else {
                None
            }
        };
        let (sherlock, reddit) = tokio::join!(sherlock, reddit);

        let mut report = ScanReport::default();
        let mut requested = 0;

        if let Some(result) = sherlock {
            requested += 1;
            match result {
                Ok(accounts) => report.sherlock = Some(accounts),
                Err(source) => {
                    warn!(?source, username, "sherlock scan failed");
                    report.errors.push(format!("Sherlock: {source:#}"));
                }
            }
        }

        if let Some(result) = reddit {
            requested += 1;
            match result {
                Ok(flagged) => report.reddit = Some(flagged),
                Err(source) => {
                    warn!(?source, username, "reddit scan failed");
                    report.errors.push(format!("Reddit: {source:#}"));
                }
            }
        }

        if requested > 0 && report.errors.len() == requested {
            anyhow::bail!("every requested source failed: {}", report.errors.join("; "));
        }

        info!(
            username,
            %mode,
            claimed = report.claimed_count(),
            flagged = report.flagged_count(),
            errors = report.errors.len(),
            "scan finished"
        );
        Ok(Arc::new(report))
    }

    async fn scan_sherlock(&self, username: &str) -> anyhow::Result<Vec<ClaimedAccount>> {
        let Some(finder) = &self.finder else {
            anyhow::bail!("{}", SourceUnavailable::Sherlock);
        };

        finder
            .find_accounts(username)
            .await
            .with_context(|| format!("failed to enumerate accounts for `{username}`"))
    }

    async fn scan_reddit(&self, username: &str) -> anyhow::Result<Vec<FlaggedItem>> {
        let Some(reddit) = &self.reddit else {
            anyhow::bail!("{}", SourceUnavailable::Reddit);
        };

        let items = reddit
            .source
            .recent_items(username, self.comment_limit, self.post_limit)
            .await
            .with_context(|| format!("failed to fetch reddit content for u/{username}"))?;

        let scores = join_all(items.iter().map(|item| self.score_item(&reddit.scorer, item))).await;

        Ok(items
            .into_iter()
            .zip(scores)
            .filter(|(_, scores)| is_flagged(scores, self.toxicity_threshold))
            .map(|(item, scores)| FlaggedItem {
                kind: item.kind,
                content: truncate_chars(&item.text, FLAGGED_CONTENT_MAX_CHARS).to_owned(),
                subreddit: item.subreddit,
                created_utc: item.created_utc,
                scores,
            })
            .collect())
    }

    /// Blank text is never sent. A failed call counts as unscored.
    async fn score_item(&self, scorer: &T, item: &ContentItem) -> ToxicityScores {
        if item.text.trim().is_empty() {
            return ToxicityScores::new();
        }

        self.limiter.acquire().await;
        match scorer.score(&item.text).await {
            Ok(scores) => scores,
            Err(source) => {
                warn!(?source, subreddit = %item.subreddit, "toxicity scoring failed; item left unscored");
                ToxicityScores::new()
            }
        }
    }
}

fn is_flagged(scores: &ToxicityScores, threshold: f64) -> bool {
    scores.values().any(|score| *score >= threshold)
}
