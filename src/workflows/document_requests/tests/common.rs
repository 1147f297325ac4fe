use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tempfile::TempDir;

use crate::workflows::document_requests::domain::{
    DocumentRequest, NewDocumentRequest, RequestId, RequestStatus, RequestSubmission,
};
use crate::workflows::document_requests::notifier::{
    DeliveryError, Notification, NotificationSender,
};
use crate::workflows::document_requests::repository::{RepositoryError, RequestRepository};
use crate::workflows::document_requests::resolver::DocumentResolver;
use crate::workflows::document_requests::service::DocumentRequestService;

pub(super) const PDF_BYTES: &[u8] = b"%PDF-1.4\n% test document\n";

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<BTreeMap<RequestId, DocumentRequest>>,
}

impl MemoryRepository {
    pub(super) fn snapshot(&self) -> Vec<DocumentRequest> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub(super) fn status_of(&self, id: RequestId) -> Option<RequestStatus> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&id)
            .map(|record| record.status)
    }
}

#[async_trait]
impl RequestRepository for MemoryRepository {
    async fn insert(
        &self,
        request: NewDocumentRequest,
    ) -> Result<DocumentRequest, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let next = guard.keys().next_back().map_or(1, |last| last.0 + 1);
        let record = DocumentRequest {
            id: RequestId(next),
            email: request.email().to_string(),
            document_name: request.document_name().to_string(),
            status: RequestStatus::Pending,
        };
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: RequestId) -> Result<Option<DocumentRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<DocumentRequest>, RepositoryError> {
        Ok(self.snapshot())
    }

    async fn set_status(
        &self,
        id: RequestId,
        status: RequestStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&id) {
            Some(record) => {
                record.status = status;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

pub(super) struct UnavailableRepository;

#[async_trait]
impl RequestRepository for UnavailableRepository {
    async fn insert(
        &self,
        _request: NewDocumentRequest,
    ) -> Result<DocumentRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn fetch(&self, _id: RequestId) -> Result<Option<DocumentRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn list(&self) -> Result<Vec<DocumentRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn set_status(
        &self,
        _id: RequestId,
        _status: RequestStatus,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct FailingNotifier {
    attempts: Mutex<usize>,
}

impl FailingNotifier {
    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("notifier mutex poisoned")
    }
}

#[async_trait]
impl NotificationSender for FailingNotifier {
    async fn send(&self, _notification: Notification) -> Result<(), DeliveryError> {
        *self.attempts.lock().expect("notifier mutex poisoned") += 1;
        Err(DeliveryError::Transport(
            "535 authentication rejected".to_string(),
        ))
    }
}

/// Temporary document directory holding the named files.
pub(super) fn documents_dir(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    for name in files {
        std::fs::write(dir.path().join(name), PDF_BYTES).expect("write document");
    }
    dir
}

pub(super) fn submission(email: &str, document: &str) -> RequestSubmission {
    RequestSubmission::new(email, document)
}

pub(super) type TestService<N> = DocumentRequestService<MemoryRepository, N>;

pub(super) fn build_service(
    docs: &TempDir,
) -> (
    TestService<RecordingNotifier>,
    Arc<MemoryRepository>,
    Arc<RecordingNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = DocumentRequestService::new(
        repository.clone(),
        DocumentResolver::new(docs.path()),
        notifier.clone(),
    );
    (service, repository, notifier)
}

pub(super) fn build_failing_service(
    docs: &TempDir,
) -> (
    TestService<FailingNotifier>,
    Arc<MemoryRepository>,
    Arc<FailingNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(FailingNotifier::default());
    let service = DocumentRequestService::new(
        repository.clone(),
        DocumentResolver::new(docs.path()),
        notifier.clone(),
    );
    (service, repository, notifier)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
