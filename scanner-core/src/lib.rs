pub mod config;
pub mod error;
pub mod model;
pub mod scan;

pub use config::ScannerConfig;
pub use error::ConfigError;
pub use scan::{ScanKey, ScanMode};

pub type Error = anyhow::Error;
