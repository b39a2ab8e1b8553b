mod docs;
pub mod files;
pub mod health;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};

/// Creates the router with all handler routes
///
/// `/docs` and `/openapi.json` are only mounted when `show_docs` is set.
pub fn handler(show_docs: bool) -> ApiRouter {
    let router = ApiRouter::new()
        .api_route("/health", get(health::handler))
        .api_route("/files", post(files::create_file).get(files::list_files))
        .api_route("/files/{file_path}", get(files::download_file));

    if show_docs {
        router.merge(docs::handler())
    } else {
        router
    }
}
