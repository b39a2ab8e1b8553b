use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use backend_storage::{
    file_record::mock::InMemoryFileRecords, queue::upload_notification::mock::RecordingNotifier,
};
use filedrop_api::{
    file_storage::{mock::MockObjectStore, FileStorage},
    server,
    types::Environment,
};
use tower::ServiceExt;

use super::{DOWNLOAD_URL, UPLOAD_URL};

pub const TEST_BUCKET: &str = "test-files";

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router wired to in-memory doubles, with handles to inspect them
pub struct TestContext {
    pub router: Router,
    pub environment: Environment,
    pub object_store: Arc<MockObjectStore>,
    pub file_records: Arc<InMemoryFileRecords>,
    pub upload_notifier: Arc<RecordingNotifier>,
}

impl TestContext {
    /// Context whose storage backend signs every request successfully
    pub fn new() -> Self {
        Self::with_object_store(MockObjectStore::new(UPLOAD_URL, DOWNLOAD_URL))
    }

    /// Context whose storage backend fails every call
    pub fn with_failing_backend() -> Self {
        Self::with_object_store(MockObjectStore::failing())
    }

    /// Context whose notification queue rejects every message
    pub fn with_failing_notifier() -> Self {
        Self::build(
            MockObjectStore::new(UPLOAD_URL, DOWNLOAD_URL),
            InMemoryFileRecords::default(),
            RecordingNotifier::failing(),
        )
    }

    /// Context whose record store fails every call
    pub fn with_failing_records() -> Self {
        Self::with_records(InMemoryFileRecords::failing())
    }

    pub fn with_object_store(object_store: MockObjectStore) -> Self {
        Self::build(
            object_store,
            InMemoryFileRecords::default(),
            RecordingNotifier::default(),
        )
    }

    pub fn with_records(file_records: InMemoryFileRecords) -> Self {
        Self::build(
            MockObjectStore::new(UPLOAD_URL, DOWNLOAD_URL),
            file_records,
            RecordingNotifier::default(),
        )
    }

    fn build(
        object_store: MockObjectStore,
        file_records: InMemoryFileRecords,
        upload_notifier: RecordingNotifier,
    ) -> Self {
        setup_test_env();

        let environment = Environment::Development {
            presign_expiry_override: None,
        };
        let object_store = Arc::new(object_store);
        let file_records = Arc::new(file_records);
        let upload_notifier = Arc::new(upload_notifier);

        let file_storage = Arc::new(FileStorage::new(
            object_store.clone(),
            TEST_BUCKET.to_string(),
        ));

        let router = server::app(
            environment.clone(),
            file_storage,
            file_records.clone(),
            upload_notifier.clone(),
        );

        Self {
            router,
            environment,
            object_store,
            file_records,
            upload_notifier,
        }
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_raw_post_request(route, Some("application/json"), payload.to_string())
            .await
    }

    pub async fn send_raw_post_request(
        &self,
        route: &str,
        content_type: Option<&str>,
        body: String,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut builder = Request::builder().uri(route).method("POST");
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }

        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::from(body))?)
            .await?;
        Ok(response)
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}
