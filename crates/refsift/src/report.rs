//! Output boundary for extracted records.
//!
//! The pipeline calls `append` exactly once per emitted record, in
//! message-processing order. The actual report format (spreadsheet, database,
//! whatever) belongs to the collaborator behind the trait; sinks here exist
//! for tests and for simple embedding.

use std::io::Write;

use log::warn;

use crate::record::CandidateRecord;

/// Where emitted records go. Implementations must accept records with any
/// subset of optional fields unset.
pub trait ReportSink: Send {
    fn append(&mut self, record: &CandidateRecord);
}

/// Collects records in memory. The default sink for tests and for callers
/// that post-process a batch themselves.
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<CandidateRecord>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for VecSink {
    fn append(&mut self, record: &CandidateRecord) {
        self.records.push(record.clone());
    }
}

/// Writes one JSON object per line. Serialization failures are logged and
/// skipped; a broken sink must not abort the batch.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ReportSink for JsonLinesSink<W> {
    fn append(&mut self, record: &CandidateRecord) {
        match serde_json::to_string(record) {
            Ok(line) => {
                if let Err(e) = writeln!(self.writer, "{}", line) {
                    warn!("Failed to write record for sender '{}': {}", record.sender_id, e);
                }
            }
            Err(e) => {
                warn!("Failed to serialize record for sender '{}': {}", record.sender_id, e);
            }
        }
    }
}
