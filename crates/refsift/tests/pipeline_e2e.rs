//! Full-pipeline tests with deterministic service and network doubles.

use std::sync::Arc;

use async_trait::async_trait;
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;

use refsift::ai::{LanguageModel, PromptTemplate};
use refsift::dedup::RecordLedger;
use refsift::error::{AiError, FetchError};
use refsift::message::{Attachment, RawMessage};
use refsift::pipeline::{Outcome, Pipeline, PipelineConfig};
use refsift::report::VecSink;
use refsift::resume::{is_pdf_bytes, LinkFetcher};

/// Language-model double: fixed reply per template, `None` simulating a
/// persistent transient outage.
struct StubModel {
    classify_response: Option<String>,
    fields_response: Option<String>,
}

impl StubModel {
    fn new(classify: &str, fields: &str) -> Self {
        Self {
            classify_response: Some(classify.to_string()),
            fields_response: Some(fields.to_string()),
        }
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, template: PromptTemplate, _input: &str) -> Result<String, AiError> {
        let reply = match template {
            PromptTemplate::ReferralClassification => &self.classify_response,
            PromptTemplate::FieldExtraction => &self.fields_response,
        };
        reply
            .clone()
            .ok_or_else(|| AiError::Transient("service down".to_string()))
    }
}

/// Network double serving fixed bytes for any recognized link, honoring the
/// same document-signature contract as the real fetcher.
struct StubFetcher {
    bytes: Vec<u8>,
}

#[async_trait]
impl LinkFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if !is_pdf_bytes(&self.bytes) {
            return Err(FetchError::NotADocument(url.to_string()));
        }
        Ok(self.bytes.clone())
    }
}

/// Unreachable network for tests that must not touch links.
struct NoNetwork;

#[async_trait]
impl LinkFetcher for NoNetwork {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Unreachable(format!("no network in test: {}", url)))
    }
}

fn build_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", text);
    let content_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {},
        content.into_bytes(),
    )));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => resources_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn test_config(dir: &TempDir) -> PipelineConfig {
    PipelineConfig {
        resumes_directory: dir.path().join("resumes"),
        retry_backoff_ms: 1,
        ..Default::default()
    }
}

fn pipeline(
    config: &PipelineConfig,
    model: StubModel,
    fetcher: Arc<dyn LinkFetcher>,
    ledger: Arc<RecordLedger>,
) -> Pipeline {
    Pipeline::new(config, Arc::new(model), fetcher, ledger)
}

const YES: &str = r#"{"is_referral_request": true, "confidence": 0.95}"#;
const NO: &str = r#"{"is_referral_request": false, "confidence": 0.9}"#;

#[tokio::test]
async fn referral_with_attached_resume_yields_full_record() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let ledger = Arc::new(RecordLedger::new());

    let fields = r#"{"name": "Jane Doe", "email": "jane@example.com", "phone": "+1 555 0100",
"years_of_experience": 6, "job_id": "12345", "position": "Backend Engineer", "company": "Acme"}"#;
    let p = pipeline(
        &config,
        StubModel::new(YES, fields),
        Arc::new(NoNetwork),
        Arc::clone(&ledger),
    );

    let message = RawMessage::new(
        "jane@example.com",
        "Hi! Could you refer me for Job ID 12345 at Acme? Resume attached.",
    )
    .with_attachment(Attachment {
        filename: "resume.pdf".to_string(),
        content: build_pdf("Jane Doe - Backend Engineer"),
        mime_type: "application/pdf".to_string(),
    });

    let (outcome, ctx) = p.process_message(message).await;

    let record = match outcome {
        Outcome::Emitted(r) => r,
        other => panic!("Expected emitted record, got {:?}", other),
    };
    assert_eq!(record.sender_id, "jane@example.com");
    assert_eq!(record.job_id.as_deref(), Some("12345"));
    assert_eq!(record.name.as_deref(), Some("Jane Doe"));
    assert_eq!(record.years_experience, Some(6.0));

    let resume_path = record.resume_path.expect("resume persisted");
    assert!(resume_path.exists());
    assert!(is_pdf_bytes(&std::fs::read(&resume_path).unwrap()));

    assert!(ctx.warnings.is_empty());
    assert!(ctx
        .resume
        .as_ref()
        .unwrap()
        .extracted_text
        .contains("Jane Doe"));
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn non_referral_is_dropped_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let ledger = Arc::new(RecordLedger::new());

    let p = pipeline(
        &config,
        StubModel::new(NO, "{}"),
        Arc::new(NoNetwork),
        Arc::clone(&ledger),
    );

    // Attachment present, but a non-referral message must not fetch or save.
    let message = RawMessage::new("bob@example.com", "Great meeting you at the conference!")
        .with_attachment(Attachment {
            filename: "photos.pdf".to_string(),
            content: build_pdf("holiday photos"),
            mime_type: "application/pdf".to_string(),
        });

    let (outcome, ctx) = p.process_message(message).await;

    assert!(matches!(outcome, Outcome::NotReferral));
    assert!(ctx.resume_path.is_none());
    assert!(ledger.is_empty());
    assert!(!config.resumes_directory.exists());
}

#[tokio::test]
async fn linked_resume_that_is_not_a_document_degrades_to_no_resume() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let ledger = Arc::new(RecordLedger::new());

    let fields = r#"{"name": "Sam Lee", "email": "Not found", "phone": "Not found",
"years_of_experience": "Not found", "job_id": "987", "position": "Not found", "company": "Not found"}"#;
    // Fetcher serves HTML (a permission interstitial), not a document.
    let p = pipeline(
        &config,
        StubModel::new(YES, fields),
        Arc::new(StubFetcher {
            bytes: b"<!DOCTYPE html><html>request access</html>".to_vec(),
        }),
        Arc::clone(&ledger),
    );

    let message = RawMessage::new(
        "sam@example.com",
        "Please refer me for job 987, resume: https://drive.google.com/file/d/abc123/view",
    );

    let (outcome, ctx) = p.process_message(message).await;

    // The record is still emitted from message text alone.
    let record = match outcome {
        Outcome::Emitted(r) => r,
        other => panic!("Expected emitted record, got {:?}", other),
    };
    assert_eq!(record.job_id.as_deref(), Some("987"));
    assert!(record.resume_path.is_none());

    assert_eq!(ctx.warnings.len(), 1);
    assert!(ctx.warnings[0].to_string().contains("fetch failed"));
}

#[tokio::test]
async fn field_extraction_outage_emits_bare_record() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let ledger = Arc::new(RecordLedger::new());

    let model = StubModel {
        classify_response: Some(YES.to_string()),
        fields_response: None,
    };
    let p = pipeline(&config, model, Arc::new(NoNetwork), Arc::clone(&ledger));

    let message = RawMessage::new("pat@example.com", "Please refer me for the open role.");
    let (outcome, ctx) = p.process_message(message).await;

    let record = match outcome {
        Outcome::Emitted(r) => r,
        other => panic!("Expected emitted record, got {:?}", other),
    };
    assert_eq!(record.sender_id, "pat@example.com");
    assert!(record.is_bare());
    assert_eq!(ctx.warnings.len(), 1);
}

#[tokio::test]
async fn classifier_outage_drops_message_with_warning() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let ledger = Arc::new(RecordLedger::new());

    let model = StubModel {
        classify_response: None,
        fields_response: Some("{}".to_string()),
    };
    let p = pipeline(&config, model, Arc::new(NoNetwork), Arc::clone(&ledger));

    let message = RawMessage::new("kim@example.com", "Please refer me!");
    let (outcome, ctx) = p.process_message(message).await;

    assert!(matches!(outcome, Outcome::NotReferral));
    assert_eq!(ctx.warnings.len(), 1);
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn repeat_sender_fills_unset_fields_only() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let ledger = Arc::new(RecordLedger::new());

    // First message: job id only.
    let first_fields = r#"{"name": "Not found", "email": "Not found", "phone": "Not found",
"years_of_experience": "Not found", "job_id": "111", "position": "Not found", "company": "Not found"}"#;
    let p1 = pipeline(
        &config,
        StubModel::new(YES, first_fields),
        Arc::new(NoNetwork),
        Arc::clone(&ledger),
    );
    let mut sink = VecSink::new();
    let summary = p1
        .process_batch(
            vec![RawMessage::new("rep@example.com", "refer me for 111?")],
            &mut sink,
        )
        .await;
    assert_eq!(summary.referrals, 1);

    // Second message from the same sender: adds a name, tries to change job id.
    let second_fields = r#"{"name": "Ada Lovelace", "email": "Not found", "phone": "Not found",
"years_of_experience": "Not found", "job_id": "999", "position": "Not found", "company": "Not found"}"#;
    let p2 = pipeline(
        &config,
        StubModel::new(YES, second_fields),
        Arc::new(NoNetwork),
        Arc::clone(&ledger),
    );
    let summary = p2
        .process_batch(
            vec![RawMessage::new("rep@example.com", "following up, job 999")],
            &mut sink,
        )
        .await;
    assert_eq!(summary.referrals, 1);

    // One append per referral message; the second snapshot is the merged state.
    assert_eq!(sink.records.len(), 2);
    assert_eq!(sink.records[1].job_id.as_deref(), Some("111"));
    assert_eq!(sink.records[1].name.as_deref(), Some("Ada Lovelace"));

    // The ledger still holds exactly one record for the sender.
    assert_eq!(ledger.len(), 1);
    let merged = ledger.get("rep@example.com").unwrap();
    assert_eq!(merged.job_id.as_deref(), Some("111"));
    assert_eq!(merged.name.as_deref(), Some("Ada Lovelace"));

    // The full-ledger snapshot agrees with the keyed lookup.
    let all = ledger.records();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], merged);
}

#[tokio::test]
async fn reprocessing_same_message_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let ledger = Arc::new(RecordLedger::new());

    let fields = r#"{"name": "Jane Doe", "email": "jane@example.com", "phone": "Not found",
"years_of_experience": 6, "job_id": "12345", "position": "Not found", "company": "Not found"}"#;

    let message = RawMessage::new("jane@example.com", "refer me for 12345").with_attachment(
        Attachment {
            filename: "resume.pdf".to_string(),
            content: build_pdf("Jane Doe"),
            mime_type: "application/pdf".to_string(),
        },
    );

    let p = pipeline(
        &config,
        StubModel::new(YES, fields),
        Arc::new(NoNetwork),
        Arc::clone(&ledger),
    );

    let (first, _) = p.process_message(message.clone()).await;
    let (second, _) = p.process_message(message).await;

    let (first, second) = match (first, second) {
        (Outcome::Emitted(a), Outcome::Emitted(b)) => (a, b),
        other => panic!("Expected two emitted records, got {:?}", other),
    };

    // Same resume path both times, one file, one ledger entry.
    assert_eq!(first.resume_path, second.resume_path);
    assert_eq!(first, second);
    assert_eq!(ledger.len(), 1);
    assert_eq!(
        std::fs::read_dir(&config.resumes_directory).unwrap().count(),
        1
    );
}

#[tokio::test]
async fn batch_processes_in_receipt_order_and_isolates_failures() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let ledger = Arc::new(RecordLedger::new());

    let fields = r#"{"name": "X", "email": "Not found", "phone": "Not found",
"years_of_experience": "Not found", "job_id": "1", "position": "Not found", "company": "Not found"}"#;
    let p = pipeline(
        &config,
        StubModel::new(YES, fields),
        // Any linked resume fetch fails; messages must still complete.
        Arc::new(NoNetwork),
        Arc::clone(&ledger),
    );

    let base = chrono::Utc::now();
    let mut older = RawMessage::new(
        "a@example.com",
        "refer me, resume at https://drive.google.com/open?id=abc",
    );
    older.received_at = base - chrono::Duration::minutes(5);
    let mut newer = RawMessage::new("b@example.com", "refer me too");
    newer.received_at = base;

    let mut sink = VecSink::new();
    // Deliberately out of order; the batch sorts by receipt time.
    let summary = p.process_batch(vec![newer, older], &mut sink).await;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.referrals, 2);
    assert_eq!(summary.resumes_saved, 0);
    assert_eq!(summary.warnings, 1);

    assert_eq!(sink.records[0].sender_id, "a@example.com");
    assert_eq!(sink.records[1].sender_id, "b@example.com");
}
