use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, timeout};
use tracing::{error, info, warn};

use scanner_core::model::ScanReport;
use scanner_core::{ScanMode, ScannerConfig};
use scanner_guard::{ComputeFailure, CooldownDecision, CooldownTracker};
use scanner_utils::formatting::{format_compact_duration, format_retry_after};

use crate::orchestrator::ScanOrchestrator;
use crate::sources::{AccountFinder, ContentSource, ToxicityScorer};

/// What a frontend should tell the requester.
#[derive(Clone, Debug)]
pub enum DispatchOutcome {
    Completed(Arc<ScanReport>),
    Rejected(String),
    CoolingDown { remaining: Duration },
    TimedOut { after: Duration },
    Failed(ComputeFailure),
}

impl DispatchOutcome {
    pub fn report(&self) -> Option<&Arc<ScanReport>> {
        match self {
            DispatchOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    /// User-facing text for anything other than a completed scan.
    pub fn message(&self) -> Option<String> {
        match self {
            DispatchOutcome::Completed(_) => None,
            DispatchOutcome::Rejected(reason) => Some(reason.clone()),
            DispatchOutcome::CoolingDown { remaining } => {
                Some(format!("Cooldown: {}", format_retry_after(*remaining)))
            }
            DispatchOutcome::TimedOut { after } => Some(format!(
                "Scan timed out after {}. Try a simpler scan mode.",
                format_compact_duration(*after)
            )),
            DispatchOutcome::Failed(_) => {
                Some("Scan failed. Check bot logs for details.".to_owned())
            }
        }
    }
}

/// Gatekeeper in front of the orchestrator: validates the request, applies
/// the per-requester cooldown, and bounds the scan with a deadline.
pub struct ScanDispatcher<A, C, T> {
    orchestrator: Arc<ScanOrchestrator<A, C, T>>,
    cooldowns: CooldownTracker<u64>,
    scan_timeout: Duration,
    max_username_length: usize,
}

impl<A, C, T> ScanDispatcher<A, C, T>
where
    A: AccountFinder,
    C: ContentSource,
    T: ToxicityScorer,
{
    pub fn new(orchestrator: Arc<ScanOrchestrator<A, C, T>>, config: &ScannerConfig) -> Self {
        Self {
            orchestrator,
            cooldowns: CooldownTracker::new(config.cooldown_window),
            scan_timeout: config.scan_timeout,
            max_username_length: config.max_username_length,
        }
    }

    pub fn orchestrator(&self) -> &Arc<ScanOrchestrator<A, C, T>> {
        &self.orchestrator
    }

    pub fn cooldowns(&self) -> &CooldownTracker<u64> {
        &self.cooldowns
    }

    /// Handle one scan request. An empty `mode` means `both`.
    pub async fn dispatch(&self, requester_id: u64, username: &str, mode: &str) -> DispatchOutcome {
        let (username, mode) = match self.validate(username, mode) {
            Ok(valid) => valid,
            Err(reason) => return DispatchOutcome::Rejected(reason),
        };

        if let CooldownDecision::Denied { remaining } =
            self.cooldowns.try_acquire(&requester_id, Instant::now())
        {
            return DispatchOutcome::CoolingDown { remaining };
        }

        info!(requester_id, username, %mode, "scan requested");

        match timeout(self.scan_timeout, self.orchestrator.scan(username, mode)).await {
            Ok(Ok(report)) => DispatchOutcome::Completed(report),
            Ok(Err(failure)) => {
                error!(?failure, username, %mode, "scan failed");
                DispatchOutcome::Failed(failure)
            }
            Err(_) => {
                warn!(username, %mode, timeout_secs = self.scan_timeout.as_secs(), "scan timed out");
                DispatchOutcome::TimedOut {
                    after: self.scan_timeout,
                }
            }
        }
    }

    fn validate<'a>(&self, username: &'a str, mode: &str) -> Result<(&'a str, ScanMode), String> {
        let username = username.trim();
        if username.is_empty() {
            return Err("Username must not be empty".to_owned());
        }
        if username.chars().count() > self.max_username_length {
            return Err(format!(
                "Username too long (max {} characters)",
                self.max_username_length
            ));
        }

        let mode = if mode.trim().is_empty() {
            ScanMode::default()
        } else {
            mode.parse::<ScanMode>()
                .map_err(|_| "Mode must be: sherlock, reddit, or both".to_owned())?
        };

        self.orchestrator
            .supports(mode)
            .map_err(|unavailable| unavailable.to_string())?;

        Ok((username, mode))
    }
}
