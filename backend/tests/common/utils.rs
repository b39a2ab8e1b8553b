use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::json;

pub const UPLOAD_URL: &str = "https://bucket.example/upload?X-Amz-Signature=put";
pub const DOWNLOAD_URL: &str = "https://bucket.example/download?X-Amz-Signature=get";

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Body of a create-file request
pub fn create_file_request(name: &str, file_type: Option<&str>) -> serde_json::Value {
    match file_type {
        Some(file_type) => json!({ "name": name, "type": file_type }),
        None => json!({ "name": name }),
    }
}
