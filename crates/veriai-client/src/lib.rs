//! Client-side orchestration: submission, result reconciliation, and backend transport.

mod error;
pub use error::{ClientError, ErrorKind};

pub mod backend;
pub mod reconcile;
pub mod submit;

pub use backend::{AnalyzeResponse, AnalyzeStatus, Backend, HistoryBackend, LatestResult};
pub use reconcile::{PollConfig, PollSession, PollTracker, Reconciliation, ResultReconciler};
pub use submit::{SubmissionController, SubmissionOutcome};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::ApiClient;
