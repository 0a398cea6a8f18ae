use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attributes requested from the toxicity API, serialized with their API names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToxicityAttribute {
    Toxicity,
    Insult,
    Profanity,
    SexuallyExplicit,
}

impl ToxicityAttribute {
    pub const ALL: [ToxicityAttribute; 4] = [
        ToxicityAttribute::Toxicity,
        ToxicityAttribute::Insult,
        ToxicityAttribute::Profanity,
        ToxicityAttribute::SexuallyExplicit,
    ];

    pub fn api_name(self) -> &'static str {
        match self {
            ToxicityAttribute::Toxicity => "TOXICITY",
            ToxicityAttribute::Insult => "INSULT",
            ToxicityAttribute::Profanity => "PROFANITY",
            ToxicityAttribute::SexuallyExplicit => "SEXUALLY_EXPLICIT",
        }
    }
}

/// Summary score per attribute, each within `0.0..=1.0`.
pub type ToxicityScores = BTreeMap<ToxicityAttribute, f64>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Comment,
    Post,
}

/// One recent comment or post pulled for scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub kind: ContentKind,
    pub subreddit: String,
    pub text: String,
    pub created_utc: i64,
}

impl ContentItem {
    pub fn comment(subreddit: impl Into<String>, body: impl Into<String>, created_utc: i64) -> Self {
        Self {
            kind: ContentKind::Comment,
            subreddit: subreddit.into(),
            text: body.into(),
            created_utc,
        }
    }

    /// Posts are scored on `title` and `selftext` joined by a newline.
    pub fn post(subreddit: impl Into<String>, title: &str, selftext: &str, created_utc: i64) -> Self {
        Self {
            kind: ContentKind::Post,
            subreddit: subreddit.into(),
            text: format!("{}\n{}", title, selftext),
            created_utc,
        }
    }
}

/// A scored item that crossed the toxicity threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlaggedItem {
    pub kind: ContentKind,
    pub subreddit: String,
    pub content: String,
    pub created_utc: i64,
    pub scores: ToxicityScores,
}

impl FlaggedItem {
    pub fn max_score(&self) -> f64 {
        self.scores.values().copied().fold(0.0, f64::max)
    }
}

/// A platform where the username appears to be registered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClaimedAccount {
    pub platform: String,
    pub url: String,
    pub status: String,
    pub response_time: Option<f64>,
}

/// Combined result of one scan. `None` means the source was not part of the mode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub sherlock: Option<Vec<ClaimedAccount>>,
    pub reddit: Option<Vec<FlaggedItem>>,
    pub errors: Vec<String>,
}

impl ScanReport {
    pub fn claimed_count(&self) -> usize {
        self.sherlock.as_ref().map_or(0, Vec::len)
    }

    pub fn flagged_count(&self) -> usize {
        self.reddit.as_ref().map_or(0, Vec::len)
    }
}
