use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use tracing::{info, warn};

use super::domain::{
    DocumentRequest, NewDocumentRequest, RequestId, RequestStatus, RequestSubmission,
    ValidationError,
};
use super::notifier::{Attachment, DeliveryError, Notification, NotificationSender};
use super::repository::{RepositoryError, RequestRepository};
use super::resolver::{DocumentLookup, DocumentResolver};

/// Service composing the request store, document resolver, and mail transport.
pub struct DocumentRequestService<R, N> {
    repository: Arc<R>,
    resolver: DocumentResolver,
    notifier: Arc<N>,
}

/// What an approval delivered, for logging and API responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalReceipt {
    pub request_id: RequestId,
    pub recipient: String,
    pub document: PathBuf,
}

impl<R, N> DocumentRequestService<R, N>
where
    R: RequestRepository + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(repository: Arc<R>, resolver: DocumentResolver, notifier: Arc<N>) -> Self {
        Self {
            repository,
            resolver,
            notifier,
        }
    }

    /// Record a new pending request. Nothing is stored when a field is missing.
    pub async fn submit(
        &self,
        submission: RequestSubmission,
    ) -> Result<DocumentRequest, RequestServiceError> {
        let request = NewDocumentRequest::try_from(submission)?;
        let stored = self.repository.insert(request).await?;
        info!(
            request_id = %stored.id,
            email = %stored.email,
            document = %stored.document_name,
            "document request submitted"
        );
        Ok(stored)
    }

    pub async fn list(&self) -> Result<Vec<DocumentRequest>, RequestServiceError> {
        Ok(self.repository.list().await?)
    }

    /// Approve a request and email the matching PDF to the requester.
    ///
    /// The status is written before the document is looked up, so a failed
    /// lookup or delivery still leaves the request `approved`. Concurrent
    /// approvals of one request are not serialized: the last status write wins
    /// and each call sends its own email.
    pub async fn approve(&self, id: RequestId) -> Result<ApprovalReceipt, RequestServiceError> {
        let record = self.fetch_existing(id).await?;
        self.repository.set_status(id, RequestStatus::Approved).await?;

        let path = match self.resolver.lookup(&record.document_name).await {
            DocumentLookup::Found(path) => path,
            DocumentLookup::Missing(path) => {
                warn!(request_id = %id, path = %path.display(), "requested document not found");
                return Err(RequestServiceError::DocumentMissing(path));
            }
            DocumentLookup::OutsideBase(_) => {
                return Err(RequestServiceError::DocumentOutsideBase(record.document_name));
            }
        };

        let content = tokio::fs::read(&path).await.map_err(|source| {
            RequestServiceError::DocumentRead {
                path: path.clone(),
                source,
            }
        })?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DocumentResolver::file_name_for(&record.document_name));

        let notification = Notification {
            recipient: record.email.clone(),
            subject: format!("Document Request Approved: {}", record.document_name),
            body: format!(
                "Hello,\n\nYour requested document '{}' has been approved. The document is attached below.",
                record.document_name
            ),
            attachment: Some(Attachment::pdf(filename, content)),
        };

        if let Err(err) = self.notifier.send(notification).await {
            warn!(request_id = %id, recipient = %record.email, error = %err, "email send failed");
            return Err(err.into());
        }

        info!(
            request_id = %id,
            recipient = %record.email,
            document = %record.document_name,
            "sent approved document"
        );

        Ok(ApprovalReceipt {
            request_id: id,
            recipient: record.email,
            document: path,
        })
    }

    /// Reject a request. No notification is sent.
    pub async fn reject(&self, id: RequestId) -> Result<(), RequestServiceError> {
        self.fetch_existing(id).await?;
        self.repository.set_status(id, RequestStatus::Rejected).await?;
        info!(request_id = %id, "document request rejected");
        Ok(())
    }

    async fn fetch_existing(&self, id: RequestId) -> Result<DocumentRequest, RequestServiceError> {
        self.repository
            .fetch(id)
            .await?
            .ok_or(RequestServiceError::RequestNotFound(id))
    }
}

/// Error raised by the request service.
#[derive(Debug, thiserror::Error)]
pub enum RequestServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Request not found")]
    RequestNotFound(RequestId),
    #[error("Document not found on server: {}", .0.display())]
    DocumentMissing(PathBuf),
    #[error("Document name '{0}' resolves outside the document directory")]
    DocumentOutsideBase(String),
    #[error("failed to read document {}: {source}", .path.display())]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RequestServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestServiceError::Validation(_) | RequestServiceError::DocumentOutsideBase(_) => {
                StatusCode::BAD_REQUEST
            }
            RequestServiceError::RequestNotFound(_) | RequestServiceError::DocumentMissing(_) => {
                StatusCode::NOT_FOUND
            }
            RequestServiceError::DocumentRead { .. }
            | RequestServiceError::Delivery(_)
            | RequestServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
