//! End-to-end ingestion runs against an in-memory database.

mod common;

use common::{CONTRACT_REPLY, INVOICE_REPLY, LEASE_REPLY, Page, ScriptedOcr, docx, ingestor, pdf};
use pretty_assertions::assert_eq;
use sqlx::SqlitePool;

use propdoc_core::error::{ExtractionError, Failure, MappingError, ResolutionError};
use propdoc_core::models::records::{PropertyRecord, VendorRecord};
use propdoc_core::store;
use propdoc_core::{
    DocumentKind, FailureClass, IngestRequest, IngestedRecord, MockReasoning, OcrEngines, Stage,
};

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    store::count_rows(&mut conn, table).await.unwrap()
}

async fn counts(pool: &SqlitePool) -> Vec<(&'static str, i64)> {
    let mut rows = Vec::new();
    for table in [
        "properties",
        "vendors",
        "tenants",
        "leases",
        "invoices",
        "invoice_items",
        "expenses",
        "contracts",
        "documents",
    ] {
        rows.push((table, count(pool, table).await));
    }
    rows
}

async fn seed_property(pool: &SqlitePool, owner_id: i64) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    let record = PropertyRecord {
        address: "40 Harbor Way".to_string(),
        num_bedrooms: None,
        num_bathrooms: None,
        num_floors: Some(3),
        is_commercial: true,
        property_type: "office".to_string(),
    };
    store::insert_property(&mut conn, owner_id, &record)
        .await
        .unwrap()
        .id
}

fn request(kind: DocumentKind, filename: &str, bytes: Vec<u8>, property_id: Option<i64>) -> IngestRequest {
    IngestRequest {
        bytes,
        filename: filename.to_string(),
        document_type: kind,
        property_id,
        owner_id: 1,
    }
}

#[tokio::test]
async fn test_text_pdf_lease_creates_property_tenant_lease_document() {
    let mock = MockReasoning::new(LEASE_REPLY);
    let ingestor = ingestor(&mock, OcrEngines::none()).await;
    let bytes = pdf(&[
        Page::Text("RESIDENTIAL LEASE AGREEMENT"),
        Page::Text("Tenant: Jane Doe. Monthly rent $1,200.00"),
    ]);

    let record = ingestor
        .ingest(request(DocumentKind::Lease, "lease.pdf", bytes, None))
        .await
        .unwrap();

    let IngestedRecord::Lease(view) = record else {
        panic!("expected a lease");
    };
    assert_eq!(view.property.address, "12 Elm Street, Springfield");
    assert_eq!(view.property.num_bedrooms, Some(2));
    assert_eq!(view.lease.property_id, view.property.id);
    assert_eq!(view.lease.rent_amount_monthly, Some(1200.0));
    assert_eq!(view.lease.rent_amount_total, Some(14400.0));
    assert_eq!(view.lease.start_date.unwrap().to_string(), "2024-01-01");
    assert_eq!(view.tenants.len(), 1);
    assert_eq!(view.tenants[0].lease_id, Some(view.lease.id));
    assert_eq!(view.tenants[0].property_id, Some(view.property.id));
    assert_eq!(view.tenants[0].email.as_deref(), Some("jane@example.com"));

    let document = view.document.as_ref().unwrap();
    assert_eq!(document.document_type, "Lease");
    assert_eq!(document.tenant_id, Some(view.tenants[0].id));

    let prompt = mock.last_request().unwrap();
    assert!(prompt[1].content.contains("RESIDENTIAL LEASE AGREEMENT"));

    assert_eq!(
        counts(ingestor.pool()).await,
        [
            ("properties", 1),
            ("vendors", 0),
            ("tenants", 1),
            ("leases", 1),
            ("invoices", 0),
            ("invoice_items", 0),
            ("expenses", 0),
            ("contracts", 0),
            ("documents", 1),
        ]
    );
}

#[tokio::test]
async fn test_second_lease_reuses_property_and_tenant() {
    let mock = MockReasoning::new(LEASE_REPLY);
    let ingestor = ingestor(&mock, OcrEngines::none()).await;

    for _ in 0..2 {
        let bytes = pdf(&[Page::Text("RESIDENTIAL LEASE AGREEMENT")]);
        ingestor
            .ingest(request(DocumentKind::Lease, "lease.pdf", bytes, None))
            .await
            .unwrap();
    }

    let pool = ingestor.pool();
    assert_eq!(count(pool, "properties").await, 1);
    assert_eq!(count(pool, "tenants").await, 1);
    assert_eq!(count(pool, "leases").await, 2);
    assert_eq!(count(pool, "documents").await, 2);
}

#[tokio::test]
async fn test_scanned_lease_page_uses_ocr() {
    let mock = MockReasoning::new(LEASE_REPLY);
    let ocr = OcrEngines::new(
        Box::new(ScriptedOcr("")),
        Some(Box::new(ScriptedOcr("Signed by tenant Jane Doe"))),
    );
    let ingestor = ingestor(&mock, ocr).await;
    let bytes = pdf(&[Page::Text("RESIDENTIAL LEASE AGREEMENT"), Page::Scan]);

    ingestor
        .ingest(request(DocumentKind::Lease, "scan.PDF", bytes, None))
        .await
        .unwrap();

    let prompt = mock.last_request().unwrap();
    assert!(prompt[1].content.contains("Signed by tenant Jane Doe"));
}

#[tokio::test]
async fn test_invoice_for_existing_vendor() {
    let mock = MockReasoning::new(INVOICE_REPLY);
    let ingestor = ingestor(&mock, OcrEngines::none()).await;
    let property_id = seed_property(ingestor.pool(), 1).await;

    let existing = {
        let mut conn = ingestor.pool().acquire().await.unwrap();
        let vendor = VendorRecord {
            name: "Acme Plumbing".to_string(),
            address: None,
            contact_person: Some("Sam".to_string()),
            phone_number: None,
            email: None,
        };
        store::insert_vendor(&mut conn, 1, &vendor).await.unwrap()
    };

    let bytes = pdf(&[Page::Text("INVOICE INV-2024-031 Amount due $1,500.00")]);
    let record = ingestor
        .ingest(request(DocumentKind::Invoice, "invoice.pdf", bytes, Some(property_id)))
        .await
        .unwrap();

    let IngestedRecord::Invoice(view) = record else {
        panic!("expected an invoice");
    };
    assert_eq!(view.invoice.vendor_id, Some(existing.id));
    assert_eq!(view.vendor.as_ref().map(|v| v.id), Some(existing.id));
    assert_eq!(view.invoice.amount, 1500.0);
    assert_eq!(view.invoice.paid_amount, 500.25);
    assert_eq!(view.invoice.remaining_balance, 999.75);
    assert_eq!(view.line_items.len(), 2);
    assert_eq!(view.line_items[1].quantity, Some(3.0));

    let expense = view.expense.as_ref().unwrap();
    assert_eq!(expense.category.as_deref(), Some("Invoice Expense"));
    assert_eq!(expense.amount, 1500.0);
    assert_eq!(expense.vendor_id, Some(existing.id));
    assert_eq!(expense.transaction_date, view.invoice.invoice_date);
    assert_eq!(expense.description.as_deref(), Some("Water heater replacement"));

    let pool = ingestor.pool();
    assert_eq!(count(pool, "invoices").await, 1);
    assert_eq!(count(pool, "expenses").await, 1);
    assert_eq!(count(pool, "documents").await, 1);
    assert_eq!(count(pool, "vendors").await, 1);
}

#[tokio::test]
async fn test_invoice_without_date_expense_uses_today() {
    let reply = INVOICE_REPLY.replace("\"03/15/2024\"", "\"Not Found\"");
    let mock = MockReasoning::new(reply);
    let ingestor = ingestor(&mock, OcrEngines::none()).await;
    let property_id = seed_property(ingestor.pool(), 1).await;

    let bytes = pdf(&[Page::Text("INVOICE")]);
    let IngestedRecord::Invoice(view) = ingestor
        .ingest(request(DocumentKind::Invoice, "invoice.pdf", bytes, Some(property_id)))
        .await
        .unwrap()
    else {
        panic!("expected an invoice");
    };

    assert_eq!(view.invoice.invoice_date, None);
    assert_eq!(
        view.expense.unwrap().transaction_date,
        Some(chrono::Utc::now().date_naive())
    );
}

#[tokio::test]
async fn test_non_json_reply_fails_mapping_without_writes() {
    let mock = MockReasoning::new("I'm sorry, I can't help with that document.");
    let ingestor = ingestor(&mock, OcrEngines::none()).await;

    let bytes = pdf(&[Page::Text("RESIDENTIAL LEASE AGREEMENT")]);
    let err = ingestor
        .ingest(request(DocumentKind::Lease, "lease.pdf", bytes, None))
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::MapFields);
    assert!(matches!(err.failure, Failure::Mapping(MappingError::NothingExtracted)));
    assert_eq!(err.class(), FailureClass::NotUnderstood);
    assert!(counts(ingestor.pool()).await.iter().all(|(_, n)| *n == 0));
}

#[tokio::test]
async fn test_textless_pdf_fails_before_reasoning() {
    let mock = MockReasoning::new(LEASE_REPLY);
    let ocr = OcrEngines::new(Box::new(ScriptedOcr("")), Some(Box::new(ScriptedOcr(" "))));
    let ingestor = ingestor(&mock, ocr).await;

    let bytes = pdf(&[Page::Scan, Page::Scan]);
    let err = ingestor
        .ingest(request(DocumentKind::Lease, "blank.pdf", bytes, None))
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::ExtractText);
    assert!(matches!(
        err.failure,
        Failure::Extraction(ExtractionError::NoTextExtracted)
    ));
    assert_eq!(err.class().message(), "could not read document");
    assert_eq!(mock.call_count(), 0);
    assert_eq!(count(ingestor.pool(), "documents").await, 0);
}

#[tokio::test]
async fn test_docx_contract() {
    let mock = MockReasoning::new(CONTRACT_REPLY);
    let ingestor = ingestor(&mock, OcrEngines::none()).await;
    let property_id = seed_property(ingestor.pool(), 1).await;

    let bytes = docx(&["SERVICE AGREEMENT", "Provider: Cool Air LLC", "Fee: $300 per visit"]);
    let record = ingestor
        .ingest(request(DocumentKind::Contract, "hvac.docx", bytes, Some(property_id)))
        .await
        .unwrap();

    let IngestedRecord::Contract(view) = record else {
        panic!("expected a contract");
    };
    assert_eq!(view.contract.contract_type, "Service Agreement");
    assert!(view.contract.is_active);
    assert_eq!(view.contract.end_date, None);
    assert_eq!(view.property.id, property_id);
    assert_eq!(view.vendor.as_ref().map(|v| v.name.as_str()), Some("Cool Air LLC"));
    assert_eq!(view.vendor.as_ref().unwrap().email, None);

    let parties = view.contract.parties_involved.as_ref().unwrap();
    assert_eq!(parties.0.as_array().map(Vec::len), Some(1));
    assert_eq!(view.document.as_ref().unwrap().contract_id, Some(view.contract.id));

    let prompt = mock.last_request().unwrap();
    assert!(prompt[1].content.contains("Provider: Cool Air LLC\nFee: $300 per visit"));
}

#[tokio::test]
async fn test_foreign_property_is_rejected_and_rolled_back() {
    let mock = MockReasoning::new(CONTRACT_REPLY);
    let ingestor = ingestor(&mock, OcrEngines::none()).await;
    let foreign = seed_property(ingestor.pool(), 99).await;

    let bytes = docx(&["SERVICE AGREEMENT"]);
    let err = ingestor
        .ingest(request(DocumentKind::Contract, "hvac.docx", bytes, Some(foreign)))
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::ResolveProperty);
    assert_eq!(err.class(), FailureClass::PermissionDenied);

    let missing = ingestor
        .ingest(request(DocumentKind::Contract, "hvac.docx", docx(&["x"]), Some(12345)))
        .await
        .unwrap_err();
    assert!(matches!(
        missing.failure,
        Failure::Resolution(ResolutionError::NotFound { id: 12345, .. })
    ));
    assert_eq!(missing.class(), FailureClass::NotFound);

    let pool = ingestor.pool();
    assert_eq!(count(pool, "vendors").await, 0);
    assert_eq!(count(pool, "contracts").await, 0);
}

#[tokio::test]
async fn test_failed_document_insert_rolls_back_new_entities() {
    let mock = MockReasoning::new(LEASE_REPLY);
    let ingestor = ingestor(&mock, OcrEngines::none()).await;
    sqlx::query(
        "CREATE TRIGGER reject_documents BEFORE INSERT ON documents \
         BEGIN SELECT RAISE(ABORT, 'documents are read-only'); END",
    )
    .execute(ingestor.pool())
    .await
    .unwrap();

    let bytes = pdf(&[Page::Text("RESIDENTIAL LEASE AGREEMENT")]);
    let err = ingestor
        .ingest(request(DocumentKind::Lease, "lease.pdf", bytes, None))
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::CreateDocumentRecord);
    assert_eq!(err.class(), FailureClass::NotSaved);
    assert!(err.to_string().contains("documents are read-only"));

    let pool = ingestor.pool();
    assert_eq!(count(pool, "properties").await, 0);
    assert_eq!(count(pool, "tenants").await, 0);
    assert_eq!(count(pool, "leases").await, 0);
    assert_eq!(count(pool, "documents").await, 0);
}

#[tokio::test]
async fn test_lease_without_any_address() {
    let reply = LEASE_REPLY.replace("\"12 Elm Street, Springfield\"", "\"Not Found\"");
    let mock = MockReasoning::new(reply);
    let ingestor = ingestor(&mock, OcrEngines::none()).await;

    let bytes = pdf(&[Page::Text("LEASE")]);
    let err = ingestor
        .ingest(request(DocumentKind::Lease, "lease.pdf", bytes, None))
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::ResolveProperty);
    assert!(matches!(
        err.failure,
        Failure::Resolution(ResolutionError::PropertyRequired)
    ));
    assert!(counts(ingestor.pool()).await.iter().all(|(_, n)| *n == 0));
}

#[tokio::test]
async fn test_ingest_json_and_classify() {
    let mock = MockReasoning::new(INVOICE_REPLY);
    let ingestor = ingestor(&mock, OcrEngines::none()).await;
    let property_id = seed_property(ingestor.pool(), 1).await;

    let bytes = pdf(&[Page::Text("INVOICE")]);
    let json = ingestor
        .ingest_json(request(DocumentKind::Invoice, "invoice.pdf", bytes, Some(property_id)))
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["invoice"]["invoice_number"], "INV-2024-031");
    assert_eq!(value["invoice"]["expense"]["category"], "Invoice Expense");

    mock.push_reply("```json\n{\"document_type\": \"Invoice\"}\n```");
    let kind = ingestor
        .classify(pdf(&[Page::Text("INVOICE")]), "invoice.pdf")
        .await
        .unwrap();
    assert_eq!(kind, Some(DocumentKind::Invoice));
}
