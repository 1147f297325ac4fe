use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{DocumentRequestView, RequestId, RequestSubmission, ValidationError};
use super::notifier::NotificationSender;
use super::repository::RequestRepository;
use super::service::{DocumentRequestService, RequestServiceError};

/// Routes advertised by the banner endpoint.
pub const ROUTES: [&str; 5] = [
    "GET /",
    "POST /request-document",
    "GET /get-requests",
    "POST /approve-request/{id}",
    "POST /reject-request/{id}",
];

/// Router builder exposing HTTP endpoints for intake and administration.
pub fn request_router<R, N>(service: Arc<DocumentRequestService<R, N>>) -> Router
where
    R: RequestRepository + 'static,
    N: NotificationSender + 'static,
{
    Router::new()
        .route("/", get(banner_handler))
        .route("/request-document", post(submit_handler::<R, N>))
        .route("/get-requests", get(list_handler::<R, N>))
        .route("/approve-request/:id", post(approve_handler::<R, N>))
        .route("/reject-request/:id", post(reject_handler::<R, N>))
        .with_state(service)
}

pub(crate) async fn banner_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": "document request desk",
        "status": "running",
        "routes": ROUTES,
    }))
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<DocumentRequestService<R, N>>>,
    payload: Result<Json<RequestSubmission>, JsonRejection>,
) -> Result<Response, RequestServiceError>
where
    R: RequestRepository + 'static,
    N: NotificationSender + 'static,
{
    let Json(submission) =
        payload.map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()))?;

    let record = service.submit(submission).await?;
    let payload = json!({
        "message": "Request submitted",
        "id": record.id,
    });
    Ok((StatusCode::OK, Json(payload)).into_response())
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<Arc<DocumentRequestService<R, N>>>,
) -> Result<Json<Vec<DocumentRequestView>>, RequestServiceError>
where
    R: RequestRepository + 'static,
    N: NotificationSender + 'static,
{
    let records = service.list().await?;
    Ok(Json(records.iter().map(|record| record.view()).collect()))
}

pub(crate) async fn approve_handler<R, N>(
    State(service): State<Arc<DocumentRequestService<R, N>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, RequestServiceError>
where
    R: RequestRepository + 'static,
    N: NotificationSender + 'static,
{
    let Ok(Path(id)) = id else {
        return Ok(not_found_response());
    };

    service.approve(RequestId(id)).await?;
    Ok(message_response("Approved and email sent"))
}

pub(crate) async fn reject_handler<R, N>(
    State(service): State<Arc<DocumentRequestService<R, N>>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, RequestServiceError>
where
    R: RequestRepository + 'static,
    N: NotificationSender + 'static,
{
    let Ok(Path(id)) = id else {
        return Ok(not_found_response());
    };

    service.reject(RequestId(id)).await?;
    Ok(message_response("Request rejected"))
}

fn message_response(message: &str) -> Response {
    (StatusCode::OK, Json(json!({ "message": message }))).into_response()
}

// Non-numeric ids never match a record.
fn not_found_response() -> Response {
    let payload = json!({ "error": "Request not found" });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

impl IntoResponse for RequestServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request operation failed");
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
