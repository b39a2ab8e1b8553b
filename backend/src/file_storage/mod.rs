//! Presigned URL issuance for the file bucket
//!
//! File bytes never pass through the API. Clients receive short-lived signed
//! URLs and talk to the bucket directly; this module only decides the object
//! key and asks the storage backend to sign the request.

mod error;
mod s3;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::primitives::ByteStream;
use uuid::Uuid;

pub use error::{BucketError, BucketResult};

/// Expiry applied to presigned URLs when the caller does not pick one (1 hour)
pub const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u64 = 60 * 60;

/// Key of an object in the bucket
///
/// Issued keys are `<uuid v4>_<file name>`. Uniqueness comes from the random
/// UUID, so two uploads of the same file name never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Generates a fresh key for `file_name`
    #[must_use]
    pub fn generate(file_name: &str) -> Self {
        Self(format!("{}_{file_name}", Uuid::new_v4()))
    }

    /// The key as sent to the backend
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the owned string
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for StorageKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upload URL together with the key it was issued for
#[derive(Debug, Clone)]
pub struct PresignedUpload {
    /// Presigned PUT URL
    pub url: String,
    /// Key the object will be stored under; callers persist it
    pub storage_key: StorageKey,
}

/// Object storage backend able to sign time-limited requests
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Signs a PUT request for `key` in `bucket`, valid for `expires_in`
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> BucketResult<String>;

    /// Signs a GET request for `key` in `bucket`, valid for `expires_in`
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> BucketResult<String>;

    /// Fetches the body of `key` in `bucket`
    async fn fetch_object(&self, bucket: &str, key: &str) -> BucketResult<ByteStream>;
}

/// File storage client issuing presigned URLs
///
/// Holds nothing but its backend handle and bucket name, so a single instance
/// can be shared across any number of concurrent requests.
pub struct FileStorage {
    bucket_client: Arc<dyn ObjectStore>,
    bucket_name: String,
}

impl FileStorage {
    /// Creates a new file storage client
    ///
    /// # Arguments
    ///
    /// * `bucket_client` - Pre-configured storage backend
    /// * `bucket_name` - Bucket holding the files
    #[must_use]
    pub fn new(bucket_client: Arc<dyn ObjectStore>, bucket_name: String) -> Self {
        Self {
            bucket_client,
            bucket_name,
        }
    }

    /// Name of the bucket this client signs for
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Generates a presigned PUT URL for a new object named after `file_name`
    ///
    /// Uses `DEFAULT_PRESIGNED_URL_EXPIRY_SECS`.
    ///
    /// # Errors
    ///
    /// Returns the backend's `BucketError` unchanged if signing fails
    pub async fn generate_presigned_put_url(
        &self,
        file_name: &str,
    ) -> BucketResult<PresignedUpload> {
        self.generate_presigned_put_url_with_expiry(file_name, DEFAULT_PRESIGNED_URL_EXPIRY_SECS)
            .await
    }

    /// Generates a presigned PUT URL valid for `expiry_secs`
    ///
    /// A fresh `StorageKey` is generated for every call. The returned key is
    /// the only reference to the future object and must be persisted by the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns the backend's `BucketError` unchanged if signing fails
    pub async fn generate_presigned_put_url_with_expiry(
        &self,
        file_name: &str,
        expiry_secs: u64,
    ) -> BucketResult<PresignedUpload> {
        let storage_key = StorageKey::generate(file_name);

        let url = self
            .bucket_client
            .presign_put(
                &self.bucket_name,
                storage_key.as_str(),
                Duration::from_secs(expiry_secs),
            )
            .await?;

        tracing::debug!("Generated presigned PUT URL for {}", storage_key);

        Ok(PresignedUpload { url, storage_key })
    }

    /// Generates a presigned GET URL for `storage_key`
    ///
    /// Uses `DEFAULT_PRESIGNED_URL_EXPIRY_SECS`.
    ///
    /// # Errors
    ///
    /// Returns the backend's `BucketError` unchanged if signing fails
    pub async fn generate_presigned_get_url(&self, storage_key: &str) -> BucketResult<String> {
        self.generate_presigned_get_url_with_expiry(storage_key, DEFAULT_PRESIGNED_URL_EXPIRY_SECS)
            .await
    }

    /// Generates a presigned GET URL valid for `expiry_secs`
    ///
    /// The object is not checked for existence. A key that was never uploaded
    /// still yields a URL, which fails only when dereferenced.
    ///
    /// # Errors
    ///
    /// Returns the backend's `BucketError` unchanged if signing fails
    pub async fn generate_presigned_get_url_with_expiry(
        &self,
        storage_key: &str,
        expiry_secs: u64,
    ) -> BucketResult<String> {
        self.bucket_client
            .presign_get(
                &self.bucket_name,
                storage_key,
                Duration::from_secs(expiry_secs),
            )
            .await
    }

    /// Fetches the object stored under `storage_key`
    ///
    /// # Errors
    ///
    /// Returns the backend's `BucketError` unchanged if the fetch fails
    pub async fn get_file(&self, storage_key: &str) -> BucketResult<ByteStream> {
        self.bucket_client
            .fetch_object(&self.bucket_name, storage_key)
            .await
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::sync::Mutex;
    use std::time::Duration;

    use aws_sdk_s3::primitives::ByteStream;

    use super::{BucketError, BucketResult, ObjectStore};

    /// A call received by `MockObjectStore`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ObjectStoreCall {
        /// `presign_put`
        PresignPut {
            /// Bucket
            bucket: String,
            /// Object key
            key: String,
            /// Requested validity
            expires_in: Duration,
        },
        /// `presign_get`
        PresignGet {
            /// Bucket
            bucket: String,
            /// Object key
            key: String,
            /// Requested validity
            expires_in: Duration,
        },
        /// `fetch_object`
        FetchObject {
            /// Bucket
            bucket: String,
            /// Object key
            key: String,
        },
    }

    /// Storage backend double returning fixed URLs and recording every call
    pub struct MockObjectStore {
        put_url: String,
        get_url: String,
        object_body: Option<Vec<u8>>,
        fail: bool,
        calls: Mutex<Vec<ObjectStoreCall>>,
    }

    impl MockObjectStore {
        /// Backend that signs every PUT as `put_url` and every GET as `get_url`
        #[must_use]
        pub fn new(put_url: impl Into<String>, get_url: impl Into<String>) -> Self {
            Self {
                put_url: put_url.into(),
                get_url: get_url.into(),
                object_body: None,
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Backend whose every call fails with `BucketError::UpstreamError`
        #[must_use]
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new("", "")
            }
        }

        /// Serves `body` for any fetched key
        #[must_use]
        pub fn with_object(mut self, body: impl Into<Vec<u8>>) -> Self {
            self.object_body = Some(body.into());
            self
        }

        /// Every call received so far, in order
        ///
        /// # Panics
        ///
        /// Panics if the lock is poisoned
        #[must_use]
        pub fn calls(&self) -> Vec<ObjectStoreCall> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: ObjectStoreCall) -> BucketResult<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                return Err(BucketError::UpstreamError(
                    "storage backend unavailable".to_string(),
                ));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl ObjectStore for MockObjectStore {
        async fn presign_put(
            &self,
            bucket: &str,
            key: &str,
            expires_in: Duration,
        ) -> BucketResult<String> {
            self.record(ObjectStoreCall::PresignPut {
                bucket: bucket.to_string(),
                key: key.to_string(),
                expires_in,
            })?;
            Ok(self.put_url.clone())
        }

        async fn presign_get(
            &self,
            bucket: &str,
            key: &str,
            expires_in: Duration,
        ) -> BucketResult<String> {
            self.record(ObjectStoreCall::PresignGet {
                bucket: bucket.to_string(),
                key: key.to_string(),
                expires_in,
            })?;
            Ok(self.get_url.clone())
        }

        async fn fetch_object(&self, bucket: &str, key: &str) -> BucketResult<ByteStream> {
            self.record(ObjectStoreCall::FetchObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
            self.object_body
                .clone()
                .map(ByteStream::from)
                .ok_or_else(|| BucketError::ObjectNotFound(key.to_string()))
        }
    }
}
