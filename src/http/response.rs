//! Response decoding and error mapping.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BellbookError, Result, GENERIC_FAILURE};

/// Outcome of a successful API call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    /// 204, or a success with an empty body.
    NoContent,
}

impl ApiResponse {
    pub fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }

    /// Decode into `T`. No-content decodes as JSON `null`, so `()` and
    /// `Option<_>` accept it.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        let value = match self {
            Self::Json(value) => value,
            Self::NoContent => Value::Null,
        };
        Ok(serde_json::from_value(value)?)
    }
}

/// Build the error for a non-success status from its body's `detail` field.
pub fn status_to_error(status: u16, body: &[u8]) -> BellbookError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
    BellbookError::api(status, message)
}

pub(crate) fn parse_success(body: &[u8]) -> Result<ApiResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApiResponse::NoContent);
    }
    Ok(ApiResponse::Json(serde_json::from_slice(body)?))
}
