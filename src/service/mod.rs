pub mod http;

pub use http::HttpExtractionClient;

use crate::error::Result;
use crate::model::OperationRequest;
use async_trait::async_trait;

/// Raw answer to one upload: status plus body bytes.
///
/// The body is only read for success statuses; classifying it is the
/// dispatcher's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ServiceResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Sends exactly one request for `request.kind` carrying the document.
    ///
    /// Returns `Err` only for transport-level failures; a non-success status
    /// is still an `Ok` response.
    async fn submit(&self, request: &OperationRequest) -> Result<ServiceResponse>;
}
