//! Backend wire types and the transport seam used by submission and polling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use veriai_core::{AnalysisRequest, AnalysisResult};

use crate::ClientError;

/// `status` field of a `POST /api/analyze` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzeStatus {
    Queued,
    Duplicate,
    Error,
    #[serde(other)]
    Unknown,
}

/// Body of a `POST /api/analyze` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: AnalyzeStatus,
    /// Server-normalised text the eventual result will carry as `query_text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Generic `{status, message}` acknowledgement used by the mutating endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl Acknowledgement {
    /// Turn an explicit `status: "error"` into a [`ClientError::Backend`].
    pub fn into_result(self) -> Result<Option<String>, ClientError> {
        if self.status == "error" {
            Err(ClientError::Backend(
                self.message.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        } else {
            Ok(self.message)
        }
    }
}

/// Interpret the reply of a mutating endpoint.
///
/// The backend pairs `status: "error"` with a 4xx/5xx code, so a failed
/// request carrying a JSON `message` becomes [`ClientError::Backend`] too.
pub fn acknowledge(reply: Result<Value, ClientError>) -> Result<Option<String>, ClientError> {
    let body = match reply {
        Ok(body) => body,
        Err(err) => {
            return Err(match err.server_message() {
                Some(message) => ClientError::Backend(message),
                None => err,
            });
        }
    };
    let ack: Acknowledgement = serde_json::from_value(body)?;
    ack.into_result()
}

/// Response of `GET /api/latest_result`.
///
/// The endpoint exposes a single global slot: whatever was stored last,
/// regardless of which submission produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum LatestResult {
    Empty,
    Ready(Box<AnalysisResult>),
}

impl LatestResult {
    /// Decode either `{"status": "empty"}` or a full result record.
    pub fn from_value(value: Value) -> Result<Self, ClientError> {
        let Value::Object(map) = &value else {
            return Err(ClientError::Protocol(format!(
                "latest result is not an object: {value}"
            )));
        };
        if map.get("status").and_then(Value::as_str) == Some("empty") {
            return Ok(Self::Empty);
        }
        if !map.contains_key("query_text") {
            return Err(ClientError::Protocol(
                "latest result has no query_text".to_string(),
            ));
        }
        let result: AnalysisResult = serde_json::from_value(value)?;
        Ok(Self::Ready(Box::new(result)))
    }

    pub fn as_result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Empty => None,
            Self::Ready(result) => Some(&**result),
        }
    }

    pub fn into_result(self) -> Option<AnalysisResult> {
        match self {
            Self::Empty => None,
            Self::Ready(result) => Some(*result),
        }
    }
}

/// Decode a `GET /api/history` body. Anything but an array is a protocol violation.
pub fn parse_history(value: Value) -> Result<Vec<AnalysisResult>, ClientError> {
    if !value.is_array() {
        return Err(ClientError::Protocol(format!(
            "history is not an array: {}",
            json_type(&value)
        )));
    }
    Ok(serde_json::from_value(value)?)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The two backend calls submission and reconciliation depend on.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /api/analyze`. A non-2xx status is an error, not a response.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalyzeResponse, ClientError>;

    /// `GET /api/latest_result`.
    async fn latest_result(&self) -> Result<LatestResult, ClientError>;
}

/// Stored-history calls behind the cached history list.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// `GET /api/history`. A non-array body is a protocol violation.
    async fn history(&self) -> Result<Vec<AnalysisResult>, ClientError>;

    /// `POST /api/clear_history`. Returns the confirmation message, if any.
    async fn clear_history(&self) -> Result<Option<String>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analyze_response_statuses() {
        let queued: AnalyzeResponse = serde_json::from_value(json!({
            "status": "queued",
            "message": "Analysis queued.",
            "analyzed_text": "The moon is made of cheese"
        }))
        .unwrap();
        assert_eq!(queued.status, AnalyzeStatus::Queued);
        assert_eq!(
            queued.analyzed_text.as_deref(),
            Some("The moon is made of cheese")
        );

        let dup: AnalyzeResponse = serde_json::from_value(json!({"status": "duplicate"})).unwrap();
        assert_eq!(dup.status, AnalyzeStatus::Duplicate);
        assert!(dup.analyzed_text.is_none());

        let odd: AnalyzeResponse = serde_json::from_value(json!({"status": "accepted"})).unwrap();
        assert_eq!(odd.status, AnalyzeStatus::Unknown);
    }

    #[test]
    fn latest_empty() {
        let latest =
            LatestResult::from_value(json!({"status": "empty", "message": "No results yet."}))
                .unwrap();
        assert_eq!(latest, LatestResult::Empty);
        assert!(latest.as_result().is_none());
    }

    #[test]
    fn latest_record() {
        let latest = LatestResult::from_value(json!({
            "id": 3,
            "query_text": "Water boils at 100C",
            "rating": "True",
            "gemini_flag": 0,
            "timestamp": "2025-10-03T14:22:05"
        }))
        .unwrap();
        let result = latest.into_result().unwrap();
        assert_eq!(result.query_text, "Water boils at 100C");
        assert_eq!(result.id, Some(3));
    }

    #[test]
    fn latest_without_query_text_is_protocol_violation() {
        let err = LatestResult::from_value(json!({"error": "db locked"})).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));

        let err = LatestResult::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn history_must_be_array() {
        let err = parse_history(json!({"error": "boom"})).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(ref m) if m.contains("object")));

        let items = parse_history(json!([
            {"query_text": "a", "rating": "False"},
            {"query_text": "b", "final_verdict": "VERIFIED_TRUE"}
        ]))
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].query_text, "b");
    }

    #[test]
    fn acknowledgement() {
        let ok: Acknowledgement =
            serde_json::from_value(json!({"status": "success", "message": "History cleared."}))
                .unwrap();
        assert_eq!(ok.into_result().unwrap().as_deref(), Some("History cleared."));

        let err: Acknowledgement =
            serde_json::from_value(json!({"status": "error", "message": "Item not found."}))
                .unwrap();
        assert!(matches!(err.into_result(), Err(ClientError::Backend(m)) if m == "Item not found."));
    }

    #[test]
    fn acknowledge_lifts_error_status_bodies() {
        let not_found = Err(ClientError::Server {
            status: 404,
            body: r#"{"status": "error", "message": "Item not found."}"#.into(),
        });
        assert!(matches!(
            acknowledge(not_found),
            Err(ClientError::Backend(m)) if m == "Item not found."
        ));

        let gateway = Err(ClientError::Server {
            status: 502,
            body: "<html>Bad Gateway</html>".into(),
        });
        assert!(matches!(
            acknowledge(gateway),
            Err(ClientError::Server { status: 502, .. })
        ));

        let ok = acknowledge(Ok(json!({"status": "success", "message": "Deleted."}))).unwrap();
        assert_eq!(ok.as_deref(), Some("Deleted."));
    }
}
