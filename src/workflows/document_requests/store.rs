//! SQLite-backed request store.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use super::domain::{DocumentRequest, NewDocumentRequest, RequestId, RequestStatus};
use super::repository::{RepositoryError, RequestRepository};
use crate::config::DatabaseConfig;

/// Opens a pool for the configured database, creating the file if needed.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
}

/// Database enum for request status, stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
enum RequestStatusDb {
    Pending,
    Approved,
    Rejected,
}

impl From<RequestStatus> for RequestStatusDb {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Pending => RequestStatusDb::Pending,
            RequestStatus::Approved => RequestStatusDb::Approved,
            RequestStatus::Rejected => RequestStatusDb::Rejected,
        }
    }
}

impl From<RequestStatusDb> for RequestStatus {
    fn from(status: RequestStatusDb) -> Self {
        match status {
            RequestStatusDb::Pending => RequestStatus::Pending,
            RequestStatusDb::Approved => RequestStatus::Approved,
            RequestStatusDb::Rejected => RequestStatus::Rejected,
        }
    }
}

/// Row mapping for the document_requests table.
#[derive(Debug, FromRow)]
struct DocumentRequestRow {
    id: i64,
    email: String,
    document_name: String,
    status: RequestStatusDb,
}

impl From<DocumentRequestRow> for DocumentRequest {
    fn from(row: DocumentRequestRow) -> Self {
        DocumentRequest {
            id: RequestId(row.id),
            email: row.email,
            document_name: row.document_name,
            status: row.status.into(),
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Unavailable(err.to_string())
    }
}

/// Repository for document request rows.
#[derive(Clone)]
pub struct SqliteRequestStore {
    pool: SqlitePool,
}

impl SqliteRequestStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl RequestRepository for SqliteRequestStore {
    async fn insert(
        &self,
        request: NewDocumentRequest,
    ) -> Result<DocumentRequest, RepositoryError> {
        let row = sqlx::query_as::<_, DocumentRequestRow>(
            r#"
            INSERT INTO document_requests (email, document_name, status)
            VALUES (?, ?, ?)
            RETURNING id, email, document_name, status
            "#,
        )
        .bind(request.email())
        .bind(request.document_name())
        .bind(RequestStatusDb::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn fetch(&self, id: RequestId) -> Result<Option<DocumentRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, DocumentRequestRow>(
            r#"
            SELECT id, email, document_name, status
            FROM document_requests
            WHERE id = ?
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DocumentRequest::from))
    }

    async fn list(&self) -> Result<Vec<DocumentRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, DocumentRequestRow>(
            r#"
            SELECT id, email, document_name, status
            FROM document_requests
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DocumentRequest::from).collect())
    }

    async fn set_status(
        &self,
        id: RequestId,
        status: RequestStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE document_requests SET status = ? WHERE id = ?")
            .bind(RequestStatusDb::from(status))
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
