//! Notification dispatch engine.
//!
//! Takes an addressing request (one, many, or all recipients), resolves valid
//! delivery endpoints, partitions the recipient set into gateway-compliant
//! chunks, submits them in order, correlates each chunk's per-recipient
//! receipts back to recipient identity, and records the outcome per recipient
//! in a single transaction.

pub mod batcher;
pub mod ledger;
pub mod orchestrator;
pub mod recipients;

pub use batcher::chunk_messages;
pub use ledger::{DeliveryLedger, PgDeliveryLedger};
pub use orchestrator::{BroadcastOutcome, BulkOutcome, Dispatcher, SendOutcome};
pub use recipients::{PgRecipientStore, RecipientStore};
