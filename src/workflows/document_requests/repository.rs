use async_trait::async_trait;

use super::domain::{DocumentRequest, NewDocumentRequest, RequestId, RequestStatus};

/// Storage abstraction so the service module can be exercised in isolation.
#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn insert(&self, request: NewDocumentRequest) -> Result<DocumentRequest, RepositoryError>;
    /// Unknown ids are `Ok(None)`.
    async fn fetch(&self, id: RequestId) -> Result<Option<DocumentRequest>, RepositoryError>;
    async fn list(&self) -> Result<Vec<DocumentRequest>, RepositoryError>;
    async fn set_status(&self, id: RequestId, status: RequestStatus) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
