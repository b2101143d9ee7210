//! Integration tests for the dispatch pipeline.
//!
//! Run against in-memory fakes of the recipient store, push gateway, and
//! delivery ledger, so no database or network is required:
//!
//! ```bash
//! cargo test -p courier-dispatch --test integration
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use courier_common::error::AppError;
use courier_common::types::{DeliveryEntry, DeliveryRecord, PushMessage, PushReceipt, Recipient};
use courier_dispatch::{DeliveryLedger, Dispatcher, RecipientStore};
use courier_gateway::{PushGateway, is_valid_push_token};

// ============================================================
// Fakes
// ============================================================

struct FakeRecipientStore {
    recipients: Vec<Recipient>,
}

#[async_trait]
impl RecipientStore for FakeRecipientStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Recipient>, AppError> {
        Ok(self.recipients.iter().find(|r| r.id == id).cloned())
    }

    async fn get_many_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Recipient>, AppError> {
        Ok(self
            .recipients
            .iter()
            .filter(|r| ids.contains(&r.id) && r.push_token.is_some())
            .cloned()
            .collect())
    }

    async fn get_all_with_endpoint(&self) -> Result<Vec<Recipient>, AppError> {
        Ok(self
            .recipients
            .iter()
            .filter(|r| r.push_token.is_some())
            .cloned()
            .collect())
    }

    async fn set_push_token(&self, _id: Uuid, _token: &str) -> Result<(), AppError> {
        unimplemented!("not exercised by dispatch tests")
    }
}

/// Gateway fake that records every submitted chunk and answers with one
/// receipt per message whose ticket id echoes the target token.
struct FakeGateway {
    max: usize,
    chunk_sizes: Mutex<Vec<usize>>,
    submitted: Mutex<Vec<PushMessage>>,
    /// Receipts to withhold from each chunk (mismatch simulation)
    drop_receipts: usize,
}

impl FakeGateway {
    fn new(max: usize) -> Self {
        Self {
            max,
            chunk_sizes: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            drop_receipts: 0,
        }
    }
}

#[async_trait]
impl PushGateway for FakeGateway {
    fn is_valid_endpoint(&self, token: &str) -> bool {
        is_valid_push_token(token)
    }

    fn max_chunk_size(&self) -> usize {
        self.max
    }

    async fn submit(&self, chunk: &[PushMessage]) -> Result<Vec<PushReceipt>, AppError> {
        self.chunk_sizes.lock().await.push(chunk.len());
        self.submitted.lock().await.extend_from_slice(chunk);

        let mut receipts: Vec<PushReceipt> = chunk
            .iter()
            .map(|m| PushReceipt::ok(format!("ticket-{}", m.to)))
            .collect();
        receipts.truncate(receipts.len().saturating_sub(self.drop_receipts));
        Ok(receipts)
    }
}

#[derive(Default)]
struct FakeLedger {
    records: Mutex<Vec<DeliveryEntry>>,
    fail: bool,
}

#[async_trait]
impl DeliveryLedger for FakeLedger {
    async fn record_many(&self, entries: &[DeliveryEntry]) -> Result<Vec<Uuid>, AppError> {
        if self.fail {
            // Transactional contract: a failed write leaves nothing behind.
            return Err(AppError::Internal("simulated storage failure".to_string()));
        }
        self.records.lock().await.extend_from_slice(entries);
        Ok(entries.iter().map(|_| Uuid::new_v4()).collect())
    }

    async fn history(&self, recipient_id: Uuid) -> Result<Vec<DeliveryRecord>, AppError> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .rev()
            .filter(|e| e.recipient_id == recipient_id)
            .take(50)
            .map(|e| DeliveryRecord {
                id: Uuid::new_v4(),
                recipient_id: e.recipient_id,
                title: e.title.clone(),
                body: e.body.clone(),
                data: e.data.clone(),
                status: e.status,
                ticket_id: e.ticket_id.clone(),
                sent_at: e.sent_at,
                created_at: e.sent_at,
            })
            .collect())
    }
}

// ============================================================
// Helpers
// ============================================================

fn recipient(token: Option<&str>) -> Recipient {
    let id = Uuid::new_v4();
    let now = Utc::now();
    Recipient {
        id,
        email: format!("{}@example.com", id),
        push_token: token.map(|t| t.to_string()),
        created_at: now,
        updated_at: now,
    }
}

fn valid_recipient(n: usize) -> Recipient {
    recipient(Some(&format!("ExponentPushToken[device-{}]", n)))
}

struct Harness {
    dispatcher: Dispatcher,
    gateway: Arc<FakeGateway>,
    ledger: Arc<FakeLedger>,
}

fn harness(recipients: Vec<Recipient>, gateway: FakeGateway, ledger: FakeLedger) -> Harness {
    let gateway = Arc::new(gateway);
    let ledger = Arc::new(ledger);
    let dispatcher = Dispatcher::new(
        Arc::new(FakeRecipientStore { recipients }),
        gateway.clone(),
        ledger.clone(),
    );
    Harness {
        dispatcher,
        gateway,
        ledger,
    }
}

// ============================================================
// Single-recipient send
// ============================================================

#[tokio::test]
async fn test_send_persists_one_record_with_gateway_receipt() {
    let target = valid_recipient(0);
    let token = target.push_token.clone().unwrap();
    let h = harness(vec![target.clone()], FakeGateway::new(100), FakeLedger::default());

    let outcome = h
        .dispatcher
        .send_to_recipient(target.id, "Title", "Body", None)
        .await
        .unwrap();

    assert_eq!(outcome.receipt.id.as_deref(), Some(format!("ticket-{}", token).as_str()));

    let records = h.ledger.records.lock().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].recipient_id, target.id);
    assert_eq!(records[0].ticket_id, outcome.receipt.id);
}

#[tokio::test]
async fn test_send_unknown_recipient_persists_nothing() {
    let h = harness(vec![valid_recipient(0)], FakeGateway::new(100), FakeLedger::default());

    let err = h
        .dispatcher
        .send_to_recipient(Uuid::new_v4(), "Title", "Body", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RecipientNotFound(_)));
    assert!(h.ledger.records.lock().await.is_empty());
    assert!(h.gateway.chunk_sizes.lock().await.is_empty());
}

#[tokio::test]
async fn test_send_without_token_fails_before_submission() {
    let target = recipient(None);
    let h = harness(vec![target.clone()], FakeGateway::new(100), FakeLedger::default());

    let err = h
        .dispatcher
        .send_to_recipient(target.id, "Title", "Body", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoEndpoint(id) if id == target.id));
    assert!(h.gateway.chunk_sizes.lock().await.is_empty());
}

#[tokio::test]
async fn test_send_with_malformed_token_fails_before_submission() {
    let target = recipient(Some("not-a-push-token"));
    let h = harness(vec![target.clone()], FakeGateway::new(100), FakeLedger::default());

    let err = h
        .dispatcher
        .send_to_recipient(target.id, "Title", "Body", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidEndpoint(id) if id == target.id));
    assert!(h.gateway.chunk_sizes.lock().await.is_empty());
}

// ============================================================
// Bulk send
// ============================================================

#[tokio::test]
async fn test_bulk_receipts_align_with_recipients_across_chunks() {
    let targets: Vec<Recipient> = (0..7).map(valid_recipient).collect();
    let ids: Vec<Uuid> = targets.iter().map(|r| r.id).collect();
    // max 3 → chunks of 3 + 3 + 1
    let h = harness(targets.clone(), FakeGateway::new(3), FakeLedger::default());

    let outcome = h
        .dispatcher
        .send_bulk(&ids, "Title", "Body", None)
        .await
        .unwrap();

    assert_eq!(outcome.sent_count, 7);
    assert_eq!(*h.gateway.chunk_sizes.lock().await, vec![3, 3, 1]);

    // receipt[i] must carry the ticket minted for recipient[i]'s token
    let records = h.ledger.records.lock().await;
    assert_eq!(records.len(), 7);
    for (record, target) in records.iter().zip(&targets) {
        assert_eq!(record.recipient_id, target.id);
        assert_eq!(
            record.ticket_id.as_deref(),
            Some(format!("ticket-{}", target.push_token.as_deref().unwrap()).as_str())
        );
    }
}

#[tokio::test]
async fn test_bulk_skips_invalid_recipients_and_persists_survivors_only() {
    let a = valid_recipient(0);
    let b = recipient(None);
    let c = recipient(Some("garbage-token"));
    let ids = vec![a.id, b.id, c.id];
    let h = harness(vec![a.clone(), b, c], FakeGateway::new(100), FakeLedger::default());

    let outcome = h
        .dispatcher
        .send_bulk(&ids, "T", "B", None)
        .await
        .unwrap();

    assert_eq!(outcome.sent_count, 1);
    assert_eq!(*h.gateway.chunk_sizes.lock().await, vec![1]);

    let records = h.ledger.records.lock().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].recipient_id, a.id);
}

#[tokio::test]
async fn test_bulk_with_no_valid_recipients_writes_nothing() {
    let a = recipient(None);
    let b = recipient(Some("garbage-token"));
    let ids = vec![a.id, b.id];
    let h = harness(vec![a, b], FakeGateway::new(100), FakeLedger::default());

    let err = h
        .dispatcher
        .send_bulk(&ids, "Title", "Body", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoValidRecipients));
    assert!(h.ledger.records.lock().await.is_empty());
    assert!(h.gateway.chunk_sizes.lock().await.is_empty());
}

#[tokio::test]
async fn test_bulk_embeds_recipient_id_into_payload() {
    let target = valid_recipient(0);
    let ids = vec![target.id];
    let gateway = FakeGateway::new(100);
    let h = harness(vec![target.clone()], gateway, FakeLedger::default());

    h.dispatcher
        .send_bulk(&ids, "Title", "Body", Some(serde_json::json!({"kind": "promo"})))
        .await
        .unwrap();

    // The submitted message carries the caller's data plus the recipient id
    let submitted = h.gateway.submitted.lock().await;
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].data["kind"], "promo");
    assert_eq!(submitted[0].data["recipient_id"], target.id.to_string());

    // The persisted payload keeps the caller's data verbatim
    let records = h.ledger.records.lock().await;
    assert_eq!(records[0].data, serde_json::json!({"kind": "promo"}));
}

#[tokio::test]
async fn test_bulk_receipt_count_mismatch_aborts_without_persisting() {
    let targets: Vec<Recipient> = (0..3).map(valid_recipient).collect();
    let ids: Vec<Uuid> = targets.iter().map(|r| r.id).collect();
    let gateway = FakeGateway {
        drop_receipts: 1,
        ..FakeGateway::new(100)
    };
    let h = harness(targets, gateway, FakeLedger::default());

    let err = h
        .dispatcher
        .send_bulk(&ids, "Title", "Body", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::GatewayResultMismatch { expected: 3, got: 2 }
    ));
    assert!(h.ledger.records.lock().await.is_empty());
}

#[tokio::test]
async fn test_bulk_ledger_failure_leaves_no_records_visible() {
    let targets: Vec<Recipient> = (0..4).map(valid_recipient).collect();
    let ids: Vec<Uuid> = targets.iter().map(|r| r.id).collect();
    let ledger = FakeLedger {
        fail: true,
        ..FakeLedger::default()
    };
    let h = harness(targets, FakeGateway::new(100), ledger);

    let err = h
        .dispatcher
        .send_bulk(&ids, "Title", "Body", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Internal(_)));
    assert!(h.ledger.records.lock().await.is_empty());
    for id in ids {
        assert!(h.dispatcher.history(id).await.unwrap().is_empty());
    }
}

// ============================================================
// Broadcast
// ============================================================

#[tokio::test]
async fn test_broadcast_splits_120_recipients_into_two_ordered_chunks() {
    let targets: Vec<Recipient> = (0..120).map(valid_recipient).collect();
    let h = harness(targets, FakeGateway::new(100), FakeLedger::default());

    let outcome = h
        .dispatcher
        .send_broadcast("Title", "Body", None)
        .await
        .unwrap();

    assert_eq!(outcome.sent_count, 120);
    assert_eq!(*h.gateway.chunk_sizes.lock().await, vec![100, 20]);
}

#[tokio::test]
async fn test_broadcast_does_not_persist_records() {
    let targets: Vec<Recipient> = (0..5).map(valid_recipient).collect();
    let h = harness(targets, FakeGateway::new(100), FakeLedger::default());

    h.dispatcher
        .send_broadcast("Title", "Body", None)
        .await
        .unwrap();

    assert!(h.ledger.records.lock().await.is_empty());
}

#[tokio::test]
async fn test_broadcast_with_no_valid_recipients_fails() {
    let h = harness(
        vec![recipient(Some("garbage"))],
        FakeGateway::new(100),
        FakeLedger::default(),
    );

    let err = h
        .dispatcher
        .send_broadcast("Title", "Body", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoValidRecipients));
}

// ============================================================
// History
// ============================================================

#[tokio::test]
async fn test_history_returns_only_the_recipients_records() {
    let a = valid_recipient(0);
    let b = valid_recipient(1);
    let ids = vec![a.id, b.id];
    let h = harness(vec![a.clone(), b.clone()], FakeGateway::new(100), FakeLedger::default());

    h.dispatcher
        .send_bulk(&ids, "Title", "Body", None)
        .await
        .unwrap();

    let history = h.dispatcher.history(a.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].recipient_id, a.id);
}
