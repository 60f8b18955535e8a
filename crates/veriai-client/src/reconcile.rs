//! Bounded polling that joins an asynchronous backend result to its submission.
//!
//! The backend only exposes the most recent result globally, so each poll
//! fetches that slot and compares its `query_text` with the submission's
//! match key. A result for somebody else's submission is "not yet", never an
//! error; the loop just waits and tries again until attempts run out.
//!
//! ```text
//! Polling(0) ──match──▶ Matched
//!     │ no match, attempt + 1 < max
//!     ▼
//! Polling(1) ── ... ──▶ Polling(max - 1) ──no match──▶ TimedOut
//! ```
//!
//! [`PollSession`] is the pure state machine; [`ResultReconciler`] drives it
//! against a [`Backend`]; [`PollTracker`] keeps at most one driven session
//! alive per UI session.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use veriai_core::AnalysisResult;

use crate::ClientError;
use crate::backend::{Backend, LatestResult};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(3000);

/// Polling bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Total fetches before giving up. Always at least 1.
    pub max_attempts: u32,
    /// Wait between fetches.
    pub delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_POLL_DELAY,
        }
    }
}

impl PollConfig {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Where a session stands after observing a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Polling { attempt: u32 },
    Matched(Box<AnalysisResult>),
    TimedOut,
}

/// Ephemeral polling state for one submission.
#[derive(Debug, Clone)]
pub struct PollSession {
    match_key: String,
    attempt: u32,
    config: PollConfig,
}

impl PollSession {
    /// Full bounded loop, starting at attempt 0.
    pub fn new(match_key: impl Into<String>, config: PollConfig) -> Self {
        Self {
            match_key: match_key.into(),
            attempt: 0,
            config,
        }
    }

    /// One fetch and no retries, for submissions the backend already has.
    pub fn single_shot(match_key: impl Into<String>, config: PollConfig) -> Self {
        Self {
            match_key: match_key.into(),
            attempt: config.max_attempts.saturating_sub(1),
            config,
        }
    }

    pub fn match_key(&self) -> &str {
        &self.match_key
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Fetches left in this session, the current one included.
    pub fn remaining(&self) -> u32 {
        self.config.max_attempts.saturating_sub(self.attempt)
    }

    /// Advance the state machine with whatever the latest fetch returned.
    pub fn observe(&mut self, latest: Option<&AnalysisResult>) -> PollState {
        if let Some(result) = latest
            && result.matches(&self.match_key)
        {
            return PollState::Matched(Box::new(result.clone()));
        }
        if self.attempt + 1 < self.config.max_attempts {
            self.attempt += 1;
            PollState::Polling {
                attempt: self.attempt,
            }
        } else {
            PollState::TimedOut
        }
    }
}

/// Terminal outcome of driving a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    Matched(AnalysisResult),
    /// No matching result; nothing should be shown.
    TimedOut { attempts: u32 },
}

impl Reconciliation {
    pub fn into_result(self) -> Result<AnalysisResult, ClientError> {
        match self {
            Self::Matched(result) => Ok(result),
            Self::TimedOut { attempts } => Err(ClientError::PollTimeout { attempts }),
        }
    }
}

/// Drives a [`PollSession`] against the backend's latest-result slot.
pub struct ResultReconciler<'a, B: Backend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: Backend + ?Sized> ResultReconciler<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Poll until the session matches or runs out of attempts.
    ///
    /// A failed fetch counts as a non-matching attempt.
    pub async fn run(&self, mut session: PollSession) -> Reconciliation {
        let mut fetches = 0u32;
        loop {
            fetches += 1;
            debug!(
                attempt = session.attempt() + 1,
                max = session.config().max_attempts,
                key = %session.match_key(),
                "polling for result"
            );

            let latest = match self.backend.latest_result().await {
                Ok(latest) => latest,
                Err(err) => {
                    warn!(error = %err, "latest result fetch failed");
                    LatestResult::Empty
                }
            };

            match session.observe(latest.as_result()) {
                PollState::Matched(result) => {
                    info!(attempts = fetches, "result matched submission");
                    return Reconciliation::Matched(*result);
                }
                PollState::Polling { .. } => {
                    tokio::time::sleep(session.config().delay).await;
                }
                PollState::TimedOut => {
                    warn!(attempts = fetches, key = %session.match_key(), "polling timed out");
                    return Reconciliation::TimedOut { attempts: fetches };
                }
            }
        }
    }
}

/// Identifier of a tracked poll session.
pub type SessionId = u64;

struct ActiveSession {
    id: SessionId,
    match_key: String,
    handle: JoinHandle<()>,
}

/// Holds the single in-flight poll task for a UI session.
///
/// Starting a new session aborts the previous task, so a superseded
/// submission can never deliver a result. Dropping the tracker aborts
/// whatever is still running.
#[derive(Default)]
pub struct PollTracker {
    next_id: SessionId,
    current: Option<ActiveSession>,
}

impl PollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` as the session for `match_key`, cancelling any previous one.
    pub fn start<F>(&mut self, match_key: &str, task: F) -> SessionId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.next_id += 1;
        let id = self.next_id;
        info!(session = id, key = %match_key, "starting poll session");
        self.current = Some(ActiveSession {
            id,
            match_key: match_key.to_string(),
            handle: tokio::spawn(task),
        });
        id
    }

    /// Abort the current session. Returns whether a running task was stopped.
    pub fn cancel(&mut self) -> bool {
        let Some(active) = self.current.take() else {
            return false;
        };
        if active.handle.is_finished() {
            return false;
        }
        info!(session = active.id, key = %active.match_key, "cancelling poll session");
        active.handle.abort();
        true
    }

    pub fn is_active(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Match key of the running session, if any.
    pub fn current_key(&self) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|active| !active.handle.is_finished())
            .map(|active| active.match_key.as_str())
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.current.as_ref().map(|active| active.id)
    }
}

impl Drop for PollTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}
