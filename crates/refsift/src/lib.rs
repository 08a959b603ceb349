//! refsift — referral-request extraction from inbox messages.
//!
//! Feed it raw messages (text plus attachments); it classifies each as a
//! referral request or not, recovers an attached or linked resume, extracts
//! structured candidate fields through a language-model service, dedups per
//! sender, and emits one [`CandidateRecord`] per referral.
//!
//! ```no_run
//! use std::sync::Arc;
//! use refsift::ai::AiClient;
//! use refsift::dedup::RecordLedger;
//! use refsift::pipeline::{Config, Pipeline};
//! use refsift::report::VecSink;
//! use refsift::resume::HttpFetcher;
//!
//! # async fn run(messages: Vec<refsift::message::RawMessage>) -> refsift::error::Result<()> {
//! let config = Config::from_file("refsift.json")?;
//! let model = Arc::new(AiClient::new(config.ai.clone())?);
//! let fetcher = Arc::new(HttpFetcher::new(config.pipeline.fetch_timeout())?);
//! let ledger = Arc::new(RecordLedger::new());
//!
//! let pipeline = Pipeline::new(&config.pipeline, model, fetcher, ledger);
//! let mut sink = VecSink::new();
//! let summary = pipeline.process_batch(messages, &mut sink).await;
//! println!("{} referrals found", summary.referrals);
//! # Ok(())
//! # }
//! ```

pub mod ai;
pub mod dedup;
pub mod error;
pub mod message;
pub mod pipeline;
pub mod processor;
pub mod record;
pub mod report;
pub mod resume;
pub mod telemetry;

pub use dedup::{MergeOutcome, RecordLedger};
pub use error::{RefsiftError, Result};
pub use message::{Attachment, RawMessage};
pub use pipeline::{BatchSummary, Config, Outcome, Pipeline, PipelineConfig};
pub use record::CandidateRecord;
pub use report::{JsonLinesSink, ReportSink, VecSink};
