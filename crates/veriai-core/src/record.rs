//! Analysis records as produced by the backend worker.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server-computed classification that overrides locally bucketed ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalVerdict {
    VerifiedTrue,
    FlaggedFalse,
    Inconclusive,
    /// Any verdict string this client does not know about.
    #[serde(other)]
    Unrecognized,
}

/// AI credibility flag.
///
/// The backend stores it as a nullable SQLite boolean, so it arrives as
/// `true`/`false`, `1`/`0`, or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiFlag {
    Misleading,
    Credible,
    #[default]
    Unsure,
}

impl AiFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Misleading => "Misleading",
            Self::Credible => "Credible",
            Self::Unsure => "Unsure",
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(true) => Self::Misleading,
            Value::Bool(false) => Self::Credible,
            Value::Number(n) if n.as_i64() == Some(1) => Self::Misleading,
            Value::Number(n) if n.as_i64() == Some(0) => Self::Credible,
            _ => Self::Unsure,
        }
    }
}

impl Serialize for AiFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Misleading => serializer.serialize_bool(true),
            Self::Credible => serializer.serialize_bool(false),
            Self::Unsure => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for AiFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().map(Self::from_value).unwrap_or_default())
    }
}

/// One completed analysis.
///
/// Read-only on the client. `query_text` is the join key against a
/// submission's match key and is compared byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub query_text: String,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    /// ISO 8601 timestamp string, usually without an offset.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub final_verdict: Option<FinalVerdict>,
    #[serde(default)]
    pub gemini_flag: AiFlag,
    #[serde(default)]
    pub gemini_confidence: Option<f64>,
    #[serde(default)]
    pub gemini_reasoning: Option<String>,
    #[serde(default)]
    pub merkle_root_hash: Option<String>,
}

impl AnalysisResult {
    /// Minimal record with only the join key set.
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            id: None,
            query_text: query_text.into(),
            rating: None,
            publisher: None,
            domain: None,
            timestamp: String::new(),
            original_url: None,
            final_verdict: None,
            gemini_flag: AiFlag::Unsure,
            gemini_confidence: None,
            gemini_reasoning: None,
            merkle_root_hash: None,
        }
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub fn with_verdict(mut self, verdict: FinalVerdict) -> Self {
        self.final_verdict = Some(verdict);
        self
    }

    /// Whether this record answers the submission keyed by `match_key`.
    pub fn matches(&self, match_key: &str) -> bool {
        self.query_text == match_key
    }
}
