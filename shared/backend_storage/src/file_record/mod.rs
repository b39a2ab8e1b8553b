//! File metadata storage module for `DynamoDB` operations

mod error;

use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
pub use error::{FileRecordStorageError, FileRecordStorageResult};
use serde::{Deserialize, Serialize};
use serde_dynamo::{from_items, to_item};

/// Metadata of a file registered through the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Primary key - unique record ID (UUID v4)
    pub id: String,
    /// Logical file name supplied by the client
    pub name: String,
    /// Optional type/category tag supplied by the client
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Storage key of the object in the bucket
    pub path: String,
    /// Timestamp of record creation (unix seconds)
    pub created_at: i64,
}

/// Request to create a new file record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecordCreateRequest {
    /// Logical file name
    pub name: String,
    /// Optional type/category tag
    pub file_type: Option<String>,
    /// Storage key issued for the object
    pub path: String,
}

/// Persistence of file metadata records
#[async_trait::async_trait]
pub trait FileRecordStore: Send + Sync {
    /// Persists a new record, assigning its id and creation timestamp
    async fn create(
        &self,
        request: FileRecordCreateRequest,
    ) -> FileRecordStorageResult<FileRecord>;

    /// Returns every record, oldest first
    async fn list(&self) -> FileRecordStorageResult<Vec<FileRecord>>;
}

/// Storage client for file record operations
pub struct FileRecordStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl FileRecordStorage {
    /// Creates a new storage instance
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for file records
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }
}

#[async_trait::async_trait]
impl FileRecordStore for FileRecordStorage {
    /// Create a new file record with generated UUID
    ///
    /// # Errors
    ///
    /// Returns `FileRecordStorageError` if the `DynamoDB` put operation fails
    async fn create(
        &self,
        request: FileRecordCreateRequest,
    ) -> FileRecordStorageResult<FileRecord> {
        let record = FileRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name,
            file_type: request.file_type,
            path: request.path,
            created_at: chrono::Utc::now().timestamp(),
        };

        let item = to_item(&record)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await?;

        tracing::debug!("Stored file record {} for path {}", record.id, record.path);

        Ok(record)
    }

    /// Scan the whole table, following pagination
    ///
    /// # Errors
    ///
    /// Returns `FileRecordStorageError` if the `DynamoDB` scan fails or an item cannot be parsed
    async fn list(&self) -> FileRecordStorageResult<Vec<FileRecord>> {
        let mut records = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let response = self
                .dynamodb_client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await?;

            if let Some(items) = response.items {
                records.extend(from_items::<_, FileRecord>(items)?);
            }

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        records.sort_by_key(|record| record.created_at);

        Ok(records)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::sync::Mutex;

    use super::{
        FileRecord, FileRecordCreateRequest, FileRecordStorageError, FileRecordStorageResult,
        FileRecordStore,
    };

    /// In-memory record store for tests
    #[derive(Default)]
    pub struct InMemoryFileRecords {
        records: Mutex<Vec<FileRecord>>,
        fail: bool,
    }

    impl InMemoryFileRecords {
        /// Store whose every call fails without touching its records
        #[must_use]
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn check_available(&self) -> FileRecordStorageResult<()> {
            if self.fail {
                return Err(FileRecordStorageError::SerializationError(
                    "record store unavailable".to_string(),
                ));
            }
            Ok(())
        }

        /// Creates a store pre-populated with `records`
        #[must_use]
        pub fn with_records(records: Vec<FileRecord>) -> Self {
            Self {
                records: Mutex::new(records),
                fail: false,
            }
        }

        /// Snapshot of every stored record
        ///
        /// # Panics
        ///
        /// Panics if the lock is poisoned
        #[must_use]
        pub fn records(&self) -> Vec<FileRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl FileRecordStore for InMemoryFileRecords {
        async fn create(
            &self,
            request: FileRecordCreateRequest,
        ) -> FileRecordStorageResult<FileRecord> {
            self.check_available()?;
            let record = FileRecord {
                id: uuid::Uuid::new_v4().to_string(),
                name: request.name,
                file_type: request.file_type,
                path: request.path,
                created_at: chrono::Utc::now().timestamp(),
            };
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn list(&self) -> FileRecordStorageResult<Vec<FileRecord>> {
            self.check_available()?;
            let mut records = self.records();
            records.sort_by_key(|record| record.created_at);
            Ok(records)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::mock::InMemoryFileRecords;
    use super::*;

    fn sample_record() -> FileRecord {
        FileRecord {
            id: "test-id".to_string(),
            name: "invoice.pdf".to_string(),
            file_type: Some("application/pdf".to_string()),
            path: "7c9e6679-7425-40de-944b-e07fc1f90ae7_invoice.pdf".to_string(),
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_file_record_uses_type_as_attribute_name() {
        let json = serde_json::to_value(sample_record()).unwrap();

        assert_eq!(json["type"], "application/pdf");
        assert!(json.get("file_type").is_none());
    }

    #[test]
    fn test_file_record_without_type() {
        let record = FileRecord {
            file_type: None,
            ..sample_record()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("type").is_none());

        let deserialized: FileRecord = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized, record);
    }

    #[test]
    fn test_file_record_dynamo_item_roundtrip() {
        let record = sample_record();

        let item: std::collections::HashMap<String, aws_sdk_dynamodb::types::AttributeValue> =
            to_item(&record).unwrap();
        assert!(item.contains_key("type"));
        assert!(item.contains_key("created_at"));

        let parsed: Vec<FileRecord> = from_items(vec![item]).unwrap();
        assert_eq!(parsed, vec![record]);
    }

    #[tokio::test]
    async fn test_in_memory_store_lists_oldest_first() {
        let newer = FileRecord {
            id: "newer".to_string(),
            created_at: 1_700_000_100,
            ..sample_record()
        };
        let older = FileRecord {
            id: "older".to_string(),
            created_at: 1_700_000_000,
            ..sample_record()
        };
        let store = InMemoryFileRecords::with_records(vec![newer, older]);

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();

        assert_eq!(ids, vec!["older".to_string(), "newer".to_string()]);
    }
}
