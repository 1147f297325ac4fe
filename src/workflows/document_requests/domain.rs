use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the store when a request is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub i64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a document request. Only `Pending` is ever assigned by intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Intake payload as received from clients. Both fields may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSubmission {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub document_name: Option<String>,
}

impl RequestSubmission {
    pub fn new(email: impl Into<String>, document_name: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            document_name: Some(document_name.into()),
        }
    }
}

/// A validated submission, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocumentRequest {
    email: String,
    document_name: String,
}

impl NewDocumentRequest {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }
}

impl TryFrom<RequestSubmission> for NewDocumentRequest {
    type Error = ValidationError;

    fn try_from(submission: RequestSubmission) -> Result<Self, Self::Error> {
        let email = required(submission.email, "email")?;
        let document_name = required(submission.document_name, "document_name")?;
        Ok(Self {
            email,
            document_name,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
        .ok_or(ValidationError::MissingField(field))
}

/// Persisted document request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub id: RequestId,
    pub email: String,
    pub document_name: String,
    pub status: RequestStatus,
}

impl DocumentRequest {
    pub fn view(&self) -> DocumentRequestView {
        DocumentRequestView {
            id: self.id,
            email: self.email.clone(),
            document: self.document_name.clone(),
            status: self.status.label(),
        }
    }
}

/// Listing projection returned by `GET /get-requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRequestView {
    pub id: RequestId,
    pub email: String,
    pub document: String,
    pub status: &'static str,
}

/// Rejected intake input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid request body: {0}")]
    MalformedBody(String),
}
