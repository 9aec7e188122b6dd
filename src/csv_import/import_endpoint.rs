//! Endpoint for uploading CSV files of transactions.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use axum::{
    Json,
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{AppState, Error, csv_import::import_transactions_files};

static UPLOAD_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where uploads are stored until they are imported.
    pub upload_dir: PathBuf,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            upload_dir: state.upload_dir.clone(),
        }
    }
}

/// Route handler for importing transactions from CSV files.
///
/// Every file in the multipart form is saved to the upload directory and then
/// all files are imported together, which deletes them. All fields are read
/// before anything is saved, so a form with a non-CSV file imports nothing.
/// If the import fails, no file is imported and the saved uploads are removed.
///
/// Responds with the imported transactions of all files.
pub async fn import_transactions_endpoint(
    State(state): State<ImportState>,
    mut multipart: Multipart,
) -> Result<Response, Error> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?
    {
        uploads.push(read_csv_field(field).await?);
    }

    let mut paths = Vec::with_capacity(uploads.len());

    for data in &uploads {
        match save_upload(&state.upload_dir, data).await {
            Ok(path) => paths.push(path),
            Err(error) => {
                discard_uploads(&paths).await;
                return Err(error);
            }
        }
    }

    let result = match state.db_connection.lock() {
        Ok(connection) => import_transactions_files(&paths, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match result {
        Ok(transactions) => Ok((StatusCode::CREATED, Json(transactions)).into_response()),
        Err(error) => {
            tracing::error!("Failed to import {} uploaded files: {error}", paths.len());
            discard_uploads(&paths).await;
            Err(error)
        }
    }
}

async fn read_csv_field(field: Field<'_>) -> Result<Vec<u8>, Error> {
    let is_csv_file_name = field
        .file_name()
        .is_some_and(|file_name| file_name.to_lowercase().ends_with(".csv"));

    if field.content_type() != Some("text/csv") && !is_csv_file_name {
        return Err(Error::NotCSV);
    }

    let file_name = field.file_name().unwrap_or("<unnamed>").to_owned();
    let data = field.bytes().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError("Could not read data from multipart form field.".to_owned())
    })?;

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok(data.to_vec())
}

async fn save_upload(upload_dir: &Path, data: &[u8]) -> Result<PathBuf, Error> {
    let file_name = format!(
        "{}-{}.csv",
        OffsetDateTime::now_utc().unix_timestamp_nanos(),
        UPLOAD_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let path = upload_dir.join(file_name);

    tokio::fs::write(&path, data)
        .await
        .map_err(|error| Error::FileError(path.clone(), error.to_string()))?;

    Ok(path)
}

async fn discard_uploads(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!("Could not remove upload {}: {error}", path.display());
            }
        }
    }
}
