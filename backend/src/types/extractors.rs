//! Custom extractors for request validation

use aide::operation::OperationInput;
use aide::OperationOutput;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use schemars::JsonSchema;
use validator::Validate;

use crate::types::error::AppError;

/// JSON extractor that validates the payload
///
/// Every rejection, malformed JSON and failed validation alike, becomes a
/// 400 with the standard error envelope. Axum's own `Json` would answer 422
/// for payloads that parse but do not match the target type.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate + JsonSchema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| match err {
                JsonRejection::MissingJsonContentType(_) => AppError::bad_request(
                    "invalid_content_type",
                    "Missing Content-Type: application/json header",
                ),
                other => {
                    tracing::debug!("Rejected JSON body: {other}");
                    AppError::bad_request("invalid_json", "Invalid JSON payload")
                }
            })?;

        payload.validate().map_err(|errors| {
            tracing::debug!("Request validation failed: {errors}");
            if errors.field_errors().contains_key("name") {
                AppError::bad_request("invalid_name", "File name must be 1 to 255 characters")
            } else {
                AppError::bad_request("validation_error", "Request validation failed")
            }
        })?;

        Ok(Self(payload))
    }
}

impl<T> OperationInput for ValidatedJson<T>
where
    T: JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        Json::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AppError::inferred_responses(ctx, operation)
    }
}
