use shared::registration::{FormField, UnknownField};
use thiserror::Error;

/// Failures talking to the registration backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned HTTP {status}")]
    Status { status: u16 },
    #[error("{0}")]
    GraphQl(String),
    #[error("response carried no data for {0}")]
    MissingData(&'static str),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Rejected field updates. The form state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{field} expects a {expected} value")]
    ValueKind {
        field: FormField,
        expected: &'static str,
    },
    #[error("'{value}' is not an available option for {field}")]
    UnknownOption { field: FormField, value: String },
    #[error(transparent)]
    UnknownField(#[from] UnknownField),
}
