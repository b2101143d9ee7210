//! Push gateway client.
//!
//! The dispatch engine consumes the gateway through the [`PushGateway`] trait:
//! an endpoint-grammar predicate, a batch-size limit, and one ordered result
//! per submitted message. [`ExpoPushGateway`] is the HTTP implementation
//! speaking the Expo push API wire shape.

mod http;
mod token;

use async_trait::async_trait;

use courier_common::error::AppError;
use courier_common::types::{PushMessage, PushReceipt};

pub use http::ExpoPushGateway;
pub use token::is_valid_push_token;

/// Maximum number of messages the gateway accepts in one submission.
pub const MAX_CHUNK_SIZE: usize = 100;

/// Capability contract of the third-party push gateway.
///
/// `submit` must return exactly one receipt per message, in message order;
/// the dispatch engine correlates receipts to recipients by position.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Whether `token` conforms to the gateway's push-token grammar.
    /// Pure predicate, no I/O.
    fn is_valid_endpoint(&self, token: &str) -> bool;

    /// Maximum batch size accepted per submission. Always ≥ 1.
    fn max_chunk_size(&self) -> usize;

    /// Submit one chunk of messages, returning one receipt per message
    /// in the same order.
    async fn submit(&self, chunk: &[PushMessage]) -> Result<Vec<PushReceipt>, AppError>;
}
