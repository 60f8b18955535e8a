use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Backend(String),

    #[error("unexpected response shape: {0}")]
    Protocol(String),

    #[error("no matching result after {attempts} attempts")]
    PollTimeout { attempts: u32 },
}

/// Coarse error classes. The CLI picks its notice wording from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure, non-2xx status, or unparseable body.
    Transport,
    /// The backend answered with an explicit `status: "error"`.
    Backend,
    /// The response parsed but had the wrong shape.
    Protocol,
    /// Bounded polling ended without a matching result.
    PollTimeout,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(feature = "http")]
            Self::Http(_) => ErrorKind::Transport,
            Self::Server { .. } | Self::Json(_) => ErrorKind::Transport,
            Self::Backend(_) => ErrorKind::Backend,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::PollTimeout { .. } => ErrorKind::PollTimeout,
        }
    }

    /// The `message` field of a JSON error body, when the server sent one.
    pub fn server_message(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        match self {
            Self::Server { body, .. } => serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.is_empty()),
            _ => None,
        }
    }
}
