//! Document request intake, administrative review, and PDF delivery.
//!
//! Requests start `pending`; an administrator approves or rejects them. Approval
//! looks the document up under the configured directory and emails it to the
//! requester.

pub mod domain;
pub mod notifier;
pub mod repository;
pub mod resolver;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    DocumentRequest, DocumentRequestView, NewDocumentRequest, RequestId, RequestStatus,
    RequestSubmission, ValidationError,
};
pub use notifier::{
    Attachment, ConfiguredNotifier, ConsoleNotifier, DeliveryError, Notification,
    NotificationSender, SmtpNotifier,
};
pub use repository::{RepositoryError, RequestRepository};
pub use resolver::{DocumentLookup, DocumentResolver};
pub use router::request_router;
pub use service::{ApprovalReceipt, DocumentRequestService, RequestServiceError};
pub use store::SqliteRequestStore;
