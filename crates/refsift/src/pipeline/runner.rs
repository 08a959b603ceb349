//! The message-processing pipeline.
//!
//! One message flows through four steps: classify, resolve resume, extract
//! fields, dedup. A failure inside a step degrades that step's output and
//! records a warning; it never aborts the message, and one bad message never
//! aborts the batch.

use std::sync::Arc;

use log::warn;
use tracing::{info, info_span, Instrument};

use crate::ai::{Classification, FieldExtractor, LanguageModel, ReferralClassifier};
use crate::dedup::RecordLedger;
use crate::message::RawMessage;
use crate::processor::{DocumentTextExtractor, PdfTextExtractor};
use crate::record::CandidateRecord;
use crate::report::ReportSink;
use crate::resume::{LinkFetcher, ResumeDocument, ResumeLocator, ResumeReference, ResumeStore};

use super::config::PipelineConfig;
use super::context::MessageContext;
use super::error::PipelineWarning;

/// Result of processing one message.
#[derive(Debug)]
pub enum Outcome {
    /// Classifier said no (or text was empty); nothing was emitted.
    NotReferral,
    /// A record was merged into the ledger; the post-merge snapshot.
    Emitted(CandidateRecord),
}

/// Per-batch counters for logging and callers that want a quick verdict.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub referrals: usize,
    pub resumes_saved: usize,
    pub warnings: usize,
}

pub struct Pipeline {
    classifier: ReferralClassifier,
    field_extractor: FieldExtractor,
    locator: ResumeLocator,
    link_fetcher: Arc<dyn LinkFetcher>,
    text_extractor: Box<dyn DocumentTextExtractor>,
    store: ResumeStore,
    ledger: Arc<RecordLedger>,
}

impl Pipeline {
    pub fn new(
        config: &PipelineConfig,
        model: Arc<dyn LanguageModel>,
        link_fetcher: Arc<dyn LinkFetcher>,
        ledger: Arc<RecordLedger>,
    ) -> Self {
        let retry = config.retry_policy();
        Self {
            classifier: ReferralClassifier::new(Arc::clone(&model), retry),
            field_extractor: FieldExtractor::new(model, retry),
            locator: ResumeLocator::default(),
            link_fetcher,
            text_extractor: Box::new(PdfTextExtractor),
            store: ResumeStore::new(&config.resumes_directory),
            ledger,
        }
    }

    /// Processes a batch in receipt order. Messages are sorted by
    /// `received_at` (stable, so source order breaks ties) before processing,
    /// which makes the merge order, and therefore the final ledger state,
    /// deterministic. One record is appended to `sink` per emitted outcome.
    pub async fn process_batch(
        &self,
        mut messages: Vec<RawMessage>,
        sink: &mut dyn ReportSink,
    ) -> BatchSummary {
        messages.sort_by_key(|m| m.received_at);

        let mut summary = BatchSummary::default();
        for message in messages {
            let (outcome, context) = self.process_message(message).await;

            summary.processed += 1;
            summary.warnings += context.warnings.len();
            if context.resume_path.is_some() {
                summary.resumes_saved += 1;
            }
            if let Outcome::Emitted(record) = outcome {
                summary.referrals += 1;
                sink.append(&record);
            }
        }

        info!(
            processed = summary.processed,
            referrals = summary.referrals,
            resumes_saved = summary.resumes_saved,
            warnings = summary.warnings,
            "Batch complete"
        );
        summary
    }

    /// Runs one message through all steps, returning the outcome together
    /// with the full step context for inspection.
    pub async fn process_message(&self, message: RawMessage) -> (Outcome, MessageContext) {
        let span = info_span!("pipeline", sender_id = %message.sender_id);
        self.run_message(message).instrument(span).await
    }

    async fn run_message(&self, message: RawMessage) -> (Outcome, MessageContext) {
        let mut ctx = MessageContext::new(message);

        let classification = self.step_classify(&mut ctx).await;
        if !classification.is_referral {
            info!("Message is not a referral request");
            return (Outcome::NotReferral, ctx);
        }

        self.step_resolve_resume(&mut ctx).await;
        self.step_extract_fields(&mut ctx).await;
        let snapshot = self.step_dedup(&mut ctx);

        (Outcome::Emitted(snapshot), ctx)
    }

    /// Classification. A failed classifier degrades to "not a referral" so an
    /// outage never produces phantom records.
    async fn step_classify(&self, ctx: &mut MessageContext) -> Classification {
        let span = info_span!("pipeline.classify");
        let result = self
            .classifier
            .classify(&ctx.message.text)
            .instrument(span)
            .await;

        let classification = match result {
            Ok(c) => c,
            Err(e) => {
                warn!("Classifier unavailable for sender '{}': {}", ctx.message.sender_id, e);
                ctx.warn(PipelineWarning::ClassifierUnavailable {
                    reason: e.to_string(),
                });
                Classification::not_referral()
            }
        };

        ctx.classification = Some(classification.clone());
        classification
    }

    /// Resume recovery: locate, fetch, persist, extract text. Any failure
    /// degrades to "no resume" and the message proceeds on its text alone.
    async fn step_resolve_resume(&self, ctx: &mut MessageContext) {
        let span = info_span!("pipeline.resume");

        async {
            let reference = match self.locator.locate(&ctx.message) {
                Some(r) => r,
                None => {
                    info!("No resume found in message");
                    return;
                }
            };
            ctx.resume_reference = Some(reference.clone());

            let bytes = match self.fetch_reference(ctx, &reference).await {
                Some(b) => b,
                None => return,
            };

            match self.store.save(&ctx.message.sender_id, &bytes, "pdf") {
                Ok(path) => {
                    info!("Resume saved to {}", path.display());
                    ctx.resume_path = Some(path);
                }
                Err(e) => {
                    warn!("Failed to save resume: {}", e);
                    ctx.warn(PipelineWarning::ResumeSaveFailed {
                        reason: e.to_string(),
                    });
                }
            }

            let extracted_text = match self.text_extractor.extract(&bytes) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Resume unreadable: {}", e);
                    ctx.warn(PipelineWarning::ResumeUnreadable {
                        reason: e.to_string(),
                    });
                    String::new()
                }
            };

            ctx.resume = Some(ResumeDocument {
                bytes,
                extracted_text,
            });
        }
        .instrument(span)
        .await
    }

    async fn fetch_reference(
        &self,
        ctx: &mut MessageContext,
        reference: &ResumeReference,
    ) -> Option<Vec<u8>> {
        match reference {
            ResumeReference::Attachment { filename } => {
                // The locator selected it from this message, so it is present.
                ctx.message
                    .attachments
                    .iter()
                    .find(|a| &a.filename == filename)
                    .map(|a| a.content.clone())
            }
            ResumeReference::ExternalLink { url } => {
                match self.link_fetcher.fetch(url).await {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        warn!("Resume fetch failed for '{}': {}", url, e);
                        ctx.warn(PipelineWarning::ResumeFetchFailed {
                            locator: url.clone(),
                            reason: e.to_string(),
                        });
                        None
                    }
                }
            }
        }
    }

    /// Field extraction. A failed extraction degrades to a bare record: the
    /// sender identity alone is still worth emitting.
    async fn step_extract_fields(&self, ctx: &mut MessageContext) {
        let span = info_span!("pipeline.extract");

        let resume_text = ctx
            .resume
            .as_ref()
            .map(|r| r.extracted_text.as_str())
            .filter(|t| !t.trim().is_empty());

        let result = self
            .field_extractor
            .extract_fields(&ctx.message.text, resume_text, &ctx.message.sender_id)
            .instrument(span)
            .await;

        let mut record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Field extraction failed for sender '{}': {}",
                    ctx.message.sender_id, e
                );
                ctx.warn(PipelineWarning::FieldExtractionFailed {
                    reason: e.to_string(),
                });
                CandidateRecord::new(&ctx.message.sender_id)
            }
        };

        record.resume_path = ctx.resume_path.clone();
        ctx.record = Some(record);
    }

    /// Merges the record into the ledger and returns the post-merge snapshot.
    fn step_dedup(&self, ctx: &mut MessageContext) -> CandidateRecord {
        let _span = info_span!("pipeline.dedup").entered();

        let record = ctx
            .record
            .clone()
            .unwrap_or_else(|| CandidateRecord::new(&ctx.message.sender_id));
        let (outcome, snapshot) = self.ledger.merge(record);
        info!(?outcome, "Record merged");
        snapshot
    }
}
