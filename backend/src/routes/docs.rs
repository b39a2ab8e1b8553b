//! Interactive API reference, mounted only where docs are public

use aide::{axum::ApiRouter, openapi::OpenApi, scalar::Scalar};
use axum::{routing::get, Extension, Json};

const OPENAPI_PATH: &str = "/openapi.json";

pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .route(
            "/docs",
            Scalar::new(OPENAPI_PATH)
                .with_title("Filedrop API Docs")
                .axum_route(),
        )
        .route(OPENAPI_PATH, get(openapi_schema))
}

#[allow(clippy::unused_async)]
async fn openapi_schema(Extension(openapi): Extension<OpenApi>) -> Json<OpenApi> {
    Json(openapi)
}
