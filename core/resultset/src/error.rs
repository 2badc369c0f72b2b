//! FILENAME: core/resultset/src/error.rs
//! Result-Set Errors - Failures while loading a response.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResultSetError {
    /// The response body was not valid JSON, or did not match the
    /// expected response shape.
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with an error payload instead of a result.
    /// The message is shown to the user as-is.
    #[error("query failed: {message}")]
    Api { message: String },
}
