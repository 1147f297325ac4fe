use axum::http::{header, HeaderValue, Method};
use docdesk::config::{AppConfig, CorsConfig};
use docdesk::error::AppError;
use docdesk::workflows::document_requests::store::connect;
use docdesk::workflows::document_requests::{
    ConfiguredNotifier, DocumentRequestService, DocumentResolver, SqliteRequestStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub(crate) type AppService = DocumentRequestService<SqliteRequestStore, ConfiguredNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the SQLite store, document directory, and mail transport into a service.
pub(crate) async fn build_service(config: &AppConfig) -> Result<Arc<AppService>, AppError> {
    tokio::fs::create_dir_all(&config.documents.base_dir).await?;

    let pool = connect(&config.database).await?;
    let store = SqliteRequestStore::new(pool);
    store.migrate().await?;

    let notifier = ConfiguredNotifier::from_config(&config.mail)?;
    if matches!(notifier, ConfiguredNotifier::Console(_)) {
        warn!("no SMTP credentials configured, approval emails are only logged");
    }

    info!(
        database = %config.database.url,
        documents = %config.documents.base_dir.display(),
        mail_transport = notifier.transport_name(),
        "document request service initialised"
    );

    Ok(Arc::new(DocumentRequestService::new(
        Arc::new(store),
        DocumentResolver::new(config.documents.base_dir.clone()),
        Arc::new(notifier),
    )))
}

/// Restricts browser access to the configured origins; credentials are allowed.
pub(crate) fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            if origin.contains('*') {
                warn!(%origin, "ignoring wildcard CORS origin");
                return None;
            }
            match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "ignoring unparsable CORS origin");
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
