//! HTTP push gateway client speaking the Expo push API wire shape.

use async_trait::async_trait;
use serde::Deserialize;

use courier_common::error::AppError;
use courier_common::types::{PushMessage, PushReceipt};

use crate::token::is_valid_push_token;
use crate::{MAX_CHUNK_SIZE, PushGateway};

/// Response envelope returned by the push API: one receipt per message,
/// in submission order.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    data: Vec<PushReceipt>,
}

/// Push gateway client backed by the Expo push HTTP API.
pub struct ExpoPushGateway {
    client: reqwest::Client,
    url: String,
    access_token: Option<String>,
}

impl ExpoPushGateway {
    pub fn new(url: String, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            access_token,
        }
    }
}

#[async_trait]
impl PushGateway for ExpoPushGateway {
    fn is_valid_endpoint(&self, token: &str) -> bool {
        is_valid_push_token(token)
    }

    fn max_chunk_size(&self) -> usize {
        MAX_CHUNK_SIZE
    }

    async fn submit(&self, chunk: &[PushMessage]) -> Result<Vec<PushReceipt>, AppError> {
        let mut request = self.client.post(&self.url).json(chunk);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Push submission failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "Push gateway returned {}: {}",
                status, detail
            )));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Malformed gateway response: {}", e)))?;

        tracing::debug!(
            submitted = chunk.len(),
            receipts = body.data.len(),
            "Chunk submitted to push gateway"
        );

        Ok(body.data)
    }
}
