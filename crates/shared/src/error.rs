use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the inventory backend on non-2xx responses.
///
/// `detail` is usually a string ("SKU already exists") but request
/// validation failures carry a list of objects instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub detail: Value,
}

impl ApiErrorBody {
    /// Builds the body a backend (or an in-process stub of one) sends back.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Value::String(detail.into()),
        }
    }

    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    /// Best-effort extraction of a human readable detail from a raw body.
    pub fn detail_from_body(body: &str) -> String {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => parsed.message(),
            Err(_) => body.trim().to_string(),
        }
    }
}
