use std::future::Future;

use scanner_core::model::{ClaimedAccount, ContentItem, ToxicityScores};

/// Enumerates platforms where a username is registered.
pub trait AccountFinder: Send + Sync {
    fn find_accounts(
        &self,
        username: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<ClaimedAccount>>> + Send;
}

/// Fetches a user's most recent comments and posts.
pub trait ContentSource: Send + Sync {
    fn recent_items(
        &self,
        username: &str,
        comment_limit: usize,
        post_limit: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<ContentItem>>> + Send;
}

/// Scores a single text against the toxicity attributes.
///
/// Callers pace every invocation through the shared rate limiter.
pub trait ToxicityScorer: Send + Sync {
    fn score(&self, text: &str) -> impl Future<Output = anyhow::Result<ToxicityScores>> + Send;
}

/// Placeholder for a source the deployment did not configure.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unconfigured;

impl AccountFinder for Unconfigured {
    async fn find_accounts(&self, _username: &str) -> anyhow::Result<Vec<ClaimedAccount>> {
        Err(anyhow::anyhow!("account enumeration is not configured"))
    }
}

impl ContentSource for Unconfigured {
    async fn recent_items(
        &self,
        _username: &str,
        _comment_limit: usize,
        _post_limit: usize,
    ) -> anyhow::Result<Vec<ContentItem>> {
        Err(anyhow::anyhow!("content source is not configured"))
    }
}

impl ToxicityScorer for Unconfigured {
    async fn score(&self, _text: &str) -> anyhow::Result<ToxicityScores> {
        Err(anyhow::anyhow!("toxicity scoring is not configured"))
    }
}
