//! Orchestration: one message in, at most one record out.

pub mod config;
pub mod context;
pub mod error;
pub mod runner;

pub use config::{Config, PipelineConfig};
pub use context::MessageContext;
pub use error::PipelineWarning;
pub use runner::{BatchSummary, Outcome, Pipeline};
