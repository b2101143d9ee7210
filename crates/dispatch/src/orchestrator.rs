//! Dispatch orchestrator — the core notification pipeline.
//!
//! One request runs as one sequential pipeline:
//! resolve recipients → filter by endpoint validity → build messages →
//! chunk → submit chunks in order → zip receipts with recipients →
//! commit the delivery records in one transaction.
//!
//! Chunks are submitted strictly in order, one at a time: the gateway
//! returns receipts positionally, so interleaved completions would make
//! receipt-to-recipient correlation ambiguous.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use courier_common::error::AppError;
use courier_common::types::{
    DeliveryEntry, DeliveryRecord, PushMessage, PushReceipt, Recipient, TicketStatus,
};
use courier_gateway::PushGateway;

use crate::batcher::chunk_messages;
use crate::ledger::DeliveryLedger;
use crate::recipients::RecipientStore;

/// Outcome of a single-recipient send.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SendOutcome {
    pub record_id: Uuid,
    pub receipt: PushReceipt,
}

/// Outcome of a bulk send to an explicit recipient set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BulkOutcome {
    pub sent_count: usize,
    pub receipts: Vec<PushReceipt>,
}

/// Outcome of a broadcast. Fire-and-report: no per-recipient records.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BroadcastOutcome {
    pub sent_count: usize,
}

/// Central dispatch pipeline over injected recipient store, push gateway,
/// and delivery ledger.
pub struct Dispatcher {
    recipients: Arc<dyn RecipientStore>,
    gateway: Arc<dyn PushGateway>,
    ledger: Arc<dyn DeliveryLedger>,
}

impl Dispatcher {
    pub fn new(
        recipients: Arc<dyn RecipientStore>,
        gateway: Arc<dyn PushGateway>,
        ledger: Arc<dyn DeliveryLedger>,
    ) -> Self {
        Self {
            recipients,
            gateway,
            ledger,
        }
    }

    /// Send one notification to one recipient and persist its outcome.
    ///
    /// Unlike the bulk paths, a missing or malformed endpoint fails the whole
    /// request instead of silently skipping the recipient.
    pub async fn send_to_recipient(
        &self,
        recipient_id: Uuid,
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
    ) -> Result<SendOutcome, AppError> {
        let recipient = self
            .recipients
            .get_by_id(recipient_id)
            .await?
            .ok_or(AppError::RecipientNotFound(recipient_id))?;

        let token = recipient
            .push_token
            .filter(|t| !t.is_empty())
            .ok_or(AppError::NoEndpoint(recipient_id))?;

        if !self.gateway.is_valid_endpoint(&token) {
            return Err(AppError::InvalidEndpoint(recipient_id));
        }

        let payload = data.unwrap_or_else(|| serde_json::json!({}));
        let message = PushMessage::new(token, title, body, payload.clone());
        let receipts = self.submit_in_order(vec![message]).await?;

        // One message in, one receipt out under the gateway contract; treat
        // a missing receipt as a delivery error rather than trusting it.
        let receipt = receipts.into_iter().next().unwrap_or(PushReceipt {
            status: TicketStatus::Error,
            id: None,
            message: None,
        });

        let entry = DeliveryEntry {
            recipient_id,
            title: title.to_string(),
            body: body.to_string(),
            data: payload,
            status: receipt.status,
            ticket_id: receipt.id.clone(),
            sent_at: Utc::now(),
        };
        let record_ids = self.ledger.record_many(std::slice::from_ref(&entry)).await?;
        let record_id = record_ids
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Ledger returned no record id".to_string()))?;

        tracing::info!(
            recipient_id = %recipient_id,
            record_id = %record_id,
            status = %receipt.status,
            "Notification sent"
        );

        Ok(SendOutcome { record_id, receipt })
    }

    /// Send one notification to each of the given recipients, skipping those
    /// without a valid endpoint, and persist every outcome in one transaction.
    pub async fn send_bulk(
        &self,
        recipient_ids: &[Uuid],
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
    ) -> Result<BulkOutcome, AppError> {
        let candidates = self.recipients.get_many_by_ids(recipient_ids).await?;
        let targets = self.filter_valid(candidates)?;

        let messages = self.build_messages(&targets, title, body, &data);
        let receipts = self.submit_in_order(messages).await?;

        if receipts.len() != targets.len() {
            return Err(AppError::GatewayResultMismatch {
                expected: targets.len(),
                got: receipts.len(),
            });
        }

        // receipt[i] belongs to targets[i]: messages were built in target
        // order and chunks submitted sequentially.
        let sent_at = Utc::now();
        let entries: Vec<DeliveryEntry> = targets
            .iter()
            .zip(&receipts)
            .map(|(recipient, receipt)| DeliveryEntry {
                recipient_id: recipient.id,
                title: title.to_string(),
                body: body.to_string(),
                data: data.clone().unwrap_or_else(|| serde_json::json!({})),
                status: receipt.status,
                ticket_id: receipt.id.clone(),
                sent_at,
            })
            .collect();

        self.ledger.record_many(&entries).await?;

        tracing::info!(
            requested = recipient_ids.len(),
            dispatched = targets.len(),
            "Bulk notification sent"
        );

        Ok(BulkOutcome {
            sent_count: receipts.len(),
            receipts,
        })
    }

    /// Send one notification to every recipient with a valid endpoint.
    ///
    /// Broadcast trades auditability for throughput: receipts are counted
    /// but no delivery records are written.
    pub async fn send_broadcast(
        &self,
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
    ) -> Result<BroadcastOutcome, AppError> {
        let candidates = self.recipients.get_all_with_endpoint().await?;
        let targets = self.filter_valid(candidates)?;

        let messages = self.build_messages(&targets, title, body, &data);
        let receipts = self.submit_in_order(messages).await?;

        if receipts.len() != targets.len() {
            return Err(AppError::GatewayResultMismatch {
                expected: targets.len(),
                got: receipts.len(),
            });
        }

        tracing::info!(dispatched = receipts.len(), "Broadcast sent");

        Ok(BroadcastOutcome {
            sent_count: receipts.len(),
        })
    }

    /// A recipient's delivery records, newest first, capped at one page.
    pub async fn history(&self, recipient_id: Uuid) -> Result<Vec<DeliveryRecord>, AppError> {
        self.ledger.history(recipient_id).await
    }

    /// Keep only recipients whose token passes the gateway's grammar check.
    /// An empty survivor set fails the whole request before any submission.
    fn filter_valid(&self, candidates: Vec<Recipient>) -> Result<Vec<Recipient>, AppError> {
        let targets: Vec<Recipient> = candidates
            .into_iter()
            .filter(|r| {
                r.push_token
                    .as_deref()
                    .is_some_and(|t| self.gateway.is_valid_endpoint(t))
            })
            .collect();

        if targets.is_empty() {
            return Err(AppError::NoValidRecipients);
        }
        Ok(targets)
    }

    /// Build one message per target, in target order, embedding the
    /// recipient id into the payload.
    fn build_messages(
        &self,
        targets: &[Recipient],
        title: &str,
        body: &str,
        data: &Option<serde_json::Value>,
    ) -> Vec<PushMessage> {
        targets
            .iter()
            .map(|recipient| {
                let mut payload = data.clone().unwrap_or_else(|| serde_json::json!({}));
                if let Some(object) = payload.as_object_mut() {
                    object.insert(
                        "recipient_id".to_string(),
                        serde_json::json!(recipient.id),
                    );
                }
                // filter_valid guarantees the token is present
                let token = recipient.push_token.clone().unwrap_or_default();
                PushMessage::new(token, title, body, payload)
            })
            .collect()
    }

    /// Chunk and submit messages strictly in order, flattening the per-chunk
    /// receipts into one list aligned with the input messages.
    async fn submit_in_order(
        &self,
        messages: Vec<PushMessage>,
    ) -> Result<Vec<PushReceipt>, AppError> {
        let total = messages.len();
        let chunks = chunk_messages(messages, self.gateway.max_chunk_size());

        let mut receipts = Vec::with_capacity(total);
        for chunk in &chunks {
            let chunk_receipts = self.gateway.submit(chunk).await?;
            receipts.extend(chunk_receipts);
        }

        tracing::debug!(
            messages = total,
            chunks = chunks.len(),
            receipts = receipts.len(),
            "All chunks submitted"
        );

        Ok(receipts)
    }
}
