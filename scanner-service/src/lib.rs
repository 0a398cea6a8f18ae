//! Scan orchestration and request dispatch built on `scanner-guard`.

pub mod dispatcher;
pub mod orchestrator;
pub mod sources;

pub use dispatcher::{DispatchOutcome, ScanDispatcher};
pub use orchestrator::{ScanOrchestrator, SourceUnavailable};
pub use sources::{AccountFinder, ContentSource, ToxicityScorer, Unconfigured};

#[cfg(test)]
pub(crate) mod testing;
