//! Submission of a claim or URL to `POST /api/analyze`.
//!
//! A submission always resolves to exactly one [`SubmissionOutcome`]; transport
//! and backend failures become [`SubmissionOutcome::Error`] rather than
//! propagating. Nothing here retries: only the result is polled for, never
//! the submission.

use tracing::{info, warn};
use veriai_core::{AnalysisRequest, EntryMode};

use crate::ClientError;
use crate::backend::{AnalyzeResponse, AnalyzeStatus, Backend};
use crate::reconcile::{PollConfig, PollSession};

/// Shown when a failed request carries no usable message.
pub const GENERIC_FAILURE: &str = "Analysis request failed";

/// The backend's own wording for an empty submission.
pub const EMPTY_INPUT: &str = "No text or URL";

/// How a submission was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Accepted; poll for a result carrying `match_key`.
    Queued { match_key: String },
    /// Already analysed; fetch the existing result once.
    Duplicate { match_key: String },
    Error { message: String },
}

impl SubmissionOutcome {
    pub fn match_key(&self) -> Option<&str> {
        match self {
            Self::Queued { match_key } | Self::Duplicate { match_key } => Some(match_key),
            Self::Error { .. } => None,
        }
    }

    /// Whether the caller should clear the input field for the active mode.
    pub fn clears_input(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }

    /// The poll session this outcome calls for, if any.
    pub fn poll_session(&self, config: PollConfig) -> Option<PollSession> {
        match self {
            Self::Queued { match_key } => Some(PollSession::new(match_key.clone(), config)),
            Self::Duplicate { match_key } => {
                Some(PollSession::single_shot(match_key.clone(), config))
            }
            Self::Error { .. } => None,
        }
    }
}

/// Builds, sends, and interprets submissions.
pub struct SubmissionController<'a, B: Backend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: Backend + ?Sized> SubmissionController<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Normalise `raw` for `mode`, send it, and interpret the response.
    pub async fn submit(&self, raw: &str, mode: EntryMode) -> SubmissionOutcome {
        let request = AnalysisRequest::build(raw, mode);
        self.send(&request).await
    }

    /// Send an already built request.
    pub async fn send(&self, request: &AnalysisRequest) -> SubmissionOutcome {
        if request.is_empty() {
            warn!(mode = request.mode.as_str(), "refusing empty submission");
            return SubmissionOutcome::Error {
                message: EMPTY_INPUT.to_string(),
            };
        }

        info!(mode = request.mode.as_str(), kind = ?request.kind(), "submitting for analysis");
        match self.backend.analyze(request).await {
            Ok(response) => interpret(request, response),
            Err(err) => {
                warn!(error = %err, "analysis request failed");
                SubmissionOutcome::Error {
                    message: failure_message(&err),
                }
            }
        }
    }
}

/// Map a successful `POST /api/analyze` response onto an outcome.
///
/// The match key is the server-echoed `analyzed_text` when present, otherwise
/// the key derived from the local request.
pub fn interpret(request: &AnalysisRequest, response: AnalyzeResponse) -> SubmissionOutcome {
    let match_key = || {
        response
            .analyzed_text
            .clone()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| request.local_key())
    };

    match response.status {
        AnalyzeStatus::Queued => SubmissionOutcome::Queued {
            match_key: match_key(),
        },
        AnalyzeStatus::Duplicate => SubmissionOutcome::Duplicate {
            match_key: match_key(),
        },
        AnalyzeStatus::Error => SubmissionOutcome::Error {
            message: response
                .message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string()),
        },
        AnalyzeStatus::Unknown => {
            warn!("analyze response carried an unknown status");
            SubmissionOutcome::Error {
                message: format!("{GENERIC_FAILURE}: unexpected response status"),
            }
        }
    }
}

/// User-facing message for a failed request, preferring the body's `message`.
fn failure_message(err: &ClientError) -> String {
    if let Some(message) = err.server_message() {
        return message;
    }
    match err {
        ClientError::Server { status, .. } => format!("{GENERIC_FAILURE} (HTTP {status})"),
        ClientError::Backend(message) => message.clone(),
        other => format!("{GENERIC_FAILURE}: {other}"),
    }
}
