use super::common::*;
use crate::workflows::document_requests::domain::{
    RequestId, RequestStatus, RequestSubmission, ValidationError,
};
use crate::workflows::document_requests::notifier::DeliveryError;
use crate::workflows::document_requests::resolver::DocumentResolver;
use crate::workflows::document_requests::service::{
    DocumentRequestService, RequestServiceError,
};
use axum::http::StatusCode;
use std::sync::Arc;

#[tokio::test]
async fn submit_rejects_missing_fields_without_storing() {
    let docs = documents_dir(&[]);
    let (service, repository, _) = build_service(&docs);

    let missing_email = RequestSubmission {
        email: None,
        document_name: Some("Spec1".to_string()),
    };
    match service.submit(missing_email).await {
        Err(RequestServiceError::Validation(ValidationError::MissingField("email"))) => {}
        other => panic!("expected missing email, got {other:?}"),
    }

    let missing_document = RequestSubmission {
        email: Some("a@x.com".to_string()),
        document_name: None,
    };
    match service.submit(missing_document).await {
        Err(RequestServiceError::Validation(ValidationError::MissingField("document_name"))) => {}
        other => panic!("expected missing document name, got {other:?}"),
    }

    assert!(repository.snapshot().is_empty());
}

#[tokio::test]
async fn submit_creates_pending_record() {
    let docs = documents_dir(&[]);
    let (service, _, notifier) = build_service(&docs);

    let record = service
        .submit(submission("a@x.com", "Spec1"))
        .await
        .expect("submission succeeds");

    let listed = service.list().await.expect("list succeeds");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, record.id);
    assert_eq!(listed[0].status, RequestStatus::Pending);
    assert!(notifier.sent().is_empty(), "intake sends no mail");
}

#[tokio::test]
async fn approve_unknown_id_is_not_found() {
    let docs = documents_dir(&["Spec1.pdf"]);
    let (service, repository, notifier) = build_service(&docs);
    let record = service
        .submit(submission("a@x.com", "Spec1"))
        .await
        .expect("submission succeeds");

    let err = service
        .approve(RequestId(record.id.0 + 100))
        .await
        .expect_err("unknown id");
    assert!(matches!(err, RequestServiceError::RequestNotFound(_)));
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(repository.status_of(record.id), Some(RequestStatus::Pending));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn approve_missing_document_still_marks_approved() {
    let docs = documents_dir(&[]);
    let (service, repository, notifier) = build_service(&docs);
    let record = service
        .submit(submission("a@x.com", "Spec1"))
        .await
        .expect("submission succeeds");

    match service.approve(record.id).await {
        Err(RequestServiceError::DocumentMissing(path)) => {
            assert_eq!(path, docs.path().join("Spec1.pdf"));
        }
        other => panic!("expected missing document, got {other:?}"),
    }

    assert_eq!(repository.status_of(record.id), Some(RequestStatus::Approved));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn approve_sends_document_to_requester() {
    let docs = documents_dir(&["Spec1.pdf"]);
    let (service, repository, notifier) = build_service(&docs);
    let record = service
        .submit(submission("a@x.com", "Spec1"))
        .await
        .expect("submission succeeds");

    let receipt = service.approve(record.id).await.expect("approval succeeds");
    assert_eq!(receipt.recipient, "a@x.com");
    assert_eq!(receipt.document, docs.path().join("Spec1.pdf"));
    assert_eq!(repository.status_of(record.id), Some(RequestStatus::Approved));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message.recipient, "a@x.com");
    assert_eq!(message.subject, "Document Request Approved: Spec1");
    assert!(message.body.contains("'Spec1' has been approved"));

    let attachment = message.attachment.as_ref().expect("attachment present");
    assert_eq!(attachment.filename, "Spec1.pdf");
    assert_eq!(attachment.content_type, mime::APPLICATION_PDF);
    assert_eq!(attachment.content, PDF_BYTES);
}

#[tokio::test]
async fn approve_keeps_existing_pdf_suffix() {
    let docs = documents_dir(&["Manual.PDF"]);
    let (service, _, notifier) = build_service(&docs);
    let record = service
        .submit(submission("b@x.com", "Manual.PDF"))
        .await
        .expect("submission succeeds");

    service.approve(record.id).await.expect("approval succeeds");
    let sent = notifier.sent();
    assert_eq!(
        sent[0].attachment.as_ref().map(|a| a.filename.as_str()),
        Some("Manual.PDF")
    );
}

#[tokio::test]
async fn approve_delivery_failure_surfaces_and_keeps_status() {
    let docs = documents_dir(&["Spec1.pdf"]);
    let (service, repository, notifier) = build_failing_service(&docs);
    let record = service
        .submit(submission("a@x.com", "Spec1"))
        .await
        .expect("submission succeeds");

    let err = service.approve(record.id).await.expect_err("delivery fails");
    match &err {
        RequestServiceError::Delivery(DeliveryError::Transport(cause)) => {
            assert!(cause.contains("535"));
        }
        other => panic!("expected delivery error, got {other:?}"),
    }
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(notifier.attempts(), 1, "delivery is not retried");
    assert_eq!(repository.status_of(record.id), Some(RequestStatus::Approved));
}

#[tokio::test]
async fn reapproving_resends_the_document() {
    let docs = documents_dir(&["Spec1.pdf"]);
    let (service, _, notifier) = build_service(&docs);
    let record = service
        .submit(submission("a@x.com", "Spec1"))
        .await
        .expect("submission succeeds");

    service.approve(record.id).await.expect("first approval");
    service.approve(record.id).await.expect("second approval");

    assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn reject_sets_status_without_mail() {
    let docs = documents_dir(&["Spec1.pdf"]);
    let (service, repository, notifier) = build_service(&docs);
    let record = service
        .submit(submission("a@x.com", "Spec1"))
        .await
        .expect("submission succeeds");

    service.reject(record.id).await.expect("reject succeeds");
    service.reject(record.id).await.expect("re-reject is a no-op");

    assert_eq!(repository.status_of(record.id), Some(RequestStatus::Rejected));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn reject_unknown_id_is_not_found() {
    let docs = documents_dir(&[]);
    let (service, _, _) = build_service(&docs);

    match service.reject(RequestId(42)).await {
        Err(RequestServiceError::RequestNotFound(RequestId(42))) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn traversal_names_are_refused_after_status_write() {
    let docs = documents_dir(&[]);
    let (service, repository, notifier) = build_service(&docs);
    let record = service
        .submit(submission("a@x.com", "../secrets"))
        .await
        .expect("submission succeeds");

    let err = service.approve(record.id).await.expect_err("escape refused");
    assert!(matches!(err, RequestServiceError::DocumentOutsideBase(_)));
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(repository.status_of(record.id), Some(RequestStatus::Approved));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn repository_failures_map_to_server_errors() {
    let docs = documents_dir(&[]);
    let service = DocumentRequestService::new(
        Arc::new(UnavailableRepository),
        DocumentResolver::new(docs.path()),
        Arc::new(RecordingNotifier::default()),
    );

    let err = service.list().await.expect_err("store offline");
    assert!(matches!(err, RequestServiceError::Repository(_)));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}
