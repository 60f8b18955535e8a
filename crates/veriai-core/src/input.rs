//! Input classification and URL canonicalisation.
//!
//! A submission is either free text or a URL. The dashboard has two entry
//! modes: in URL mode the input is always treated as a URL; in text mode a
//! pasted URL is detected and promoted to a URL request.
//!
//! # URL shape
//!
//! - Optional `http://` or `https://` scheme
//! - One or more `label.` segments, then a top-level label of 2+ letters
//! - Optional `:port`
//! - Optional `/path` without whitespace
//! - At most 2048 characters after trimming

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Longest input (in characters, after trimming) still considered a URL.
pub const MAX_URL_LEN: usize = 2048;

/// Characters of free text kept in a locally built snippet.
pub const SNIPPET_CHARS: usize = 30;

const ELLIPSIS: &str = "...";

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:[a-z0-9_-]+\.)+[a-z]{2,}(?::[0-9]+)?(?:/\S*)?$")
        .expect("URL pattern is valid")
});

/// What a piece of user input is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Url,
}

/// The entry mode active when the user submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    #[default]
    Text,
    Url,
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Url => "url",
        }
    }
}

/// Classify raw input as free text or a URL.
pub fn classify(raw: &str) -> InputKind {
    if is_probably_url(raw) {
        InputKind::Url
    } else {
        InputKind::Text
    }
}

/// Whether `raw`, once trimmed, looks like a URL.
pub fn is_probably_url(raw: &str) -> bool {
    let s = raw.trim();
    if s.is_empty() || s.chars().count() > MAX_URL_LEN {
        return false;
    }
    URL_RE.is_match(s)
}

/// Trim and prefix `https://` unless an http(s) scheme is already present.
///
/// Idempotent: `normalize_url(&normalize_url(x)) == normalize_url(x)`.
pub fn normalize_url(url: &str) -> String {
    let u = url.trim();
    if has_http_scheme(u) {
        u.to_string()
    } else {
        format!("https://{u}")
    }
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// First `max_chars` characters of `text` followed by `...`.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}{ELLIPSIS}")
}

/// Outbound request body for `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnalysisPayload {
    Text { article_text: String },
    Url { article_url: String },
}

/// A submission, built once from the raw input and never modified after sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub mode: EntryMode,
    pub raw_input: String,
    pub payload: AnalysisPayload,
}

impl AnalysisRequest {
    /// Build the request for `raw` submitted in `mode`.
    ///
    /// URL mode normalises unconditionally. Text mode sends trimmed text unless
    /// the input looks like a URL, in which case it is promoted.
    pub fn build(raw: &str, mode: EntryMode) -> Self {
        let payload = match mode {
            EntryMode::Url => AnalysisPayload::Url {
                article_url: normalize_url(raw),
            },
            EntryMode::Text => match classify(raw) {
                InputKind::Url => AnalysisPayload::Url {
                    article_url: normalize_url(raw),
                },
                InputKind::Text => AnalysisPayload::Text {
                    article_text: raw.trim().to_string(),
                },
            },
        };
        Self {
            mode,
            raw_input: raw.to_string(),
            payload,
        }
    }

    /// What was actually sent.
    pub fn kind(&self) -> InputKind {
        match self.payload {
            AnalysisPayload::Text { .. } => InputKind::Text,
            AnalysisPayload::Url { .. } => InputKind::Url,
        }
    }

    /// Match key derived from local input, used when the backend does not echo one.
    pub fn local_key(&self) -> String {
        match &self.payload {
            AnalysisPayload::Text { article_text } => snippet(article_text, SNIPPET_CHARS),
            AnalysisPayload::Url { article_url } => article_url.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw_input.trim().is_empty()
    }
}
