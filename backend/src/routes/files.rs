use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Path, Extension, Json};
use backend_storage::{
    file_record::{FileRecord, FileRecordCreateRequest, FileRecordStore},
    queue::{UploadNotification, UploadNotifier},
};
use chrono::DateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::{
    file_storage::FileStorage,
    types::{AppError, Environment, ValidatedJson},
};

/// Request to register a new file and obtain an upload URL
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct CreateFileRequest {
    /// Logical file name; becomes the suffix of the storage key
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Optional type/category tag
    #[serde(rename = "type", default)]
    #[validate(length(max = 100))]
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CreateFileResponse {
    /// Presigned PUT URL the client uploads the bytes to
    pub upload_url: String,
    /// Storage key of the object, used to request a download URL later
    pub path: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct FileResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    /// RFC 3339 creation time
    pub created_at: String,
    pub path: String,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        let created_at = DateTime::from_timestamp(record.created_at, 0)
            .map_or_else(String::new, |dt| dt.to_rfc3339());

        Self {
            id: record.id,
            name: record.name,
            file_type: record.file_type,
            created_at,
            path: record.path,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ListFilesResponse {
    pub files: Vec<FileResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DownloadFileResponse {
    /// Presigned GET URL for the object
    pub download_url: String,
}

/// Delay applied to every upload notification, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadNotificationDelay(pub Duration);

/// Issues an upload URL, schedules the upload notification and records the file
///
/// The notification is scheduled before the record is written, so a queue
/// failure leaves no record behind. Nothing is scheduled or persisted when
/// the upload URL cannot be issued.
#[instrument(skip(environment, delay, file_storage, file_records, upload_notifier))]
pub async fn create_file(
    Extension(environment): Extension<Environment>,
    Extension(delay): Extension<UploadNotificationDelay>,
    Extension(file_storage): Extension<Arc<FileStorage>>,
    Extension(file_records): Extension<Arc<dyn FileRecordStore>>,
    Extension(upload_notifier): Extension<Arc<dyn UploadNotifier>>,
    ValidatedJson(payload): ValidatedJson<CreateFileRequest>,
) -> Result<Json<CreateFileResponse>, AppError> {
    let upload = file_storage
        .generate_presigned_put_url_with_expiry(
            &payload.name,
            environment.presigned_url_expiry_secs(),
        )
        .await?;
    let path = upload.storage_key.into_inner();

    upload_notifier
        .schedule(
            &UploadNotification {
                path: path.clone(),
                name: payload.name.clone(),
            },
            delay.0,
        )
        .await?;

    // The object may never be uploaded; the record is written optimistically
    file_records
        .create(FileRecordCreateRequest {
            name: payload.name,
            file_type: payload.file_type,
            path: path.clone(),
        })
        .await?;

    tracing::info!("Issued upload URL for {path}");

    Ok(Json(CreateFileResponse {
        upload_url: upload.url,
        path,
    }))
}

/// Lists every registered file, oldest first
#[instrument(skip_all)]
pub async fn list_files(
    Extension(file_records): Extension<Arc<dyn FileRecordStore>>,
) -> Result<Json<ListFilesResponse>, AppError> {
    let files: Vec<FileResponse> = file_records
        .list()
        .await?
        .into_iter()
        .map(FileResponse::from)
        .collect();

    Ok(Json(ListFilesResponse {
        count: files.len(),
        files,
    }))
}

/// Issues a download URL for a storage key
///
/// The key is not checked for existence; an unknown key yields a URL that
/// fails when fetched.
#[instrument(skip(environment, file_storage))]
pub async fn download_file(
    Extension(environment): Extension<Environment>,
    Extension(file_storage): Extension<Arc<FileStorage>>,
    Path(file_path): Path<String>,
) -> Result<Json<DownloadFileResponse>, AppError> {
    let download_url = file_storage
        .generate_presigned_get_url_with_expiry(
            &file_path,
            environment.presigned_url_expiry_secs(),
        )
        .await?;

    Ok(Json(DownloadFileResponse { download_url }))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_file_response_formats_created_at() {
        let response = FileResponse::from(FileRecord {
            id: "id-1".to_string(),
            name: "invoice.pdf".to_string(),
            file_type: Some("invoice".to_string()),
            path: "abc_invoice.pdf".to_string(),
            created_at: 1_700_000_000,
        });

        assert_eq!(response.created_at, "2023-11-14T22:13:20+00:00");
        assert_eq!(
            serde_json::to_value(&response).unwrap()["type"],
            serde_json::json!("invoice")
        );
    }

    #[test]
    fn test_create_request_validation() {
        let parse = |body: serde_json::Value| -> CreateFileRequest {
            serde_json::from_value(body).unwrap()
        };

        assert!(parse(serde_json::json!({ "name": "a.txt" })).validate().is_ok());
        assert!(parse(serde_json::json!({ "name": "" })).validate().is_err());
        assert!(parse(serde_json::json!({ "name": "x".repeat(256) }))
            .validate()
            .is_err());
        assert!(
            parse(serde_json::json!({ "name": "a.txt", "type": "t".repeat(101) }))
                .validate()
                .is_err()
        );
    }
}
