//! Line-oriented session: each non-command line is a submission in the current
//! entry mode. Only the newest submission is polled for; sending another one
//! abandons the previous poll.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use veriai_client::{
    ApiClient, HistoryBackend, PollConfig, PollTracker, Reconciliation, ResultReconciler,
    SubmissionController,
};
use veriai_core::{EntryMode, HistoryCache, StatusFilter};

use crate::display;

const HELP: &str = "\
Type a claim or URL and press enter to analyze it.
  /text            switch to claim entry
  /url             switch to URL entry
  /history [term]  list stored results, optionally filtered
  /clear yes       delete every stored result
  /retry           resend the last input that failed
  /quit            leave";

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Blank,
    Submit(String),
    Mode(EntryMode),
    History(String),
    Clear { confirmed: bool },
    Retry,
    Help,
    Quit,
    Unknown(String),
}

fn parse_line(line: &str) -> Line {
    let line = line.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Line::Submit(line.to_string());
    };
    let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    match name {
        "text" => Line::Mode(EntryMode::Text),
        "url" => Line::Mode(EntryMode::Url),
        "history" => Line::History(rest.trim().to_string()),
        "clear" => Line::Clear {
            confirmed: rest.trim().eq_ignore_ascii_case("yes"),
        },
        "retry" => Line::Retry,
        "help" => Line::Help,
        "quit" | "exit" => Line::Quit,
        other => Line::Unknown(other.to_string()),
    }
}

fn prompt(mode: EntryMode) {
    print!("{}> ", mode.as_str());
    let _ = std::io::stdout().flush();
}

/// Run until stdin closes or `/quit`.
pub async fn run(client: Arc<ApiClient>, poll: PollConfig) -> anyhow::Result<()> {
    let mut mode = EntryMode::default();
    let mut tracker = PollTracker::new();
    let mut cache = HistoryCache::new();
    // Last failed input and the mode it was sent in.
    let mut pending: Option<(EntryMode, String)> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    prompt(mode);
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match parse_line(&line) {
            Line::Blank => {}
            Line::Submit(text) => {
                pending = submit(&client, &mut tracker, poll, &text, mode).await;
            }
            Line::Retry => match pending.take() {
                Some((retry_mode, text)) => {
                    pending = submit(&client, &mut tracker, poll, &text, retry_mode).await;
                }
                None => println!("Nothing to retry."),
            },
            Line::Mode(next) => {
                mode = next;
                println!("Entry mode: {}", mode.as_str());
            }
            Line::History(term) => print!("{}", show_history(client.as_ref(), &mut cache, &term).await),
            Line::Clear { confirmed: false } => println!("Type /clear yes to delete everything."),
            Line::Clear { confirmed: true } => {
                println!("{}", clear_history(client.as_ref(), &mut cache).await);
            }
            Line::Help => println!("{HELP}"),
            Line::Quit => break,
            Line::Unknown(name) => println!("Unknown command /{name}. Try /help."),
        }
        prompt(mode);
    }

    tracker.cancel();
    Ok(())
}

/// Submit `text` and start polling for it in the background.
///
/// Returns the input back when it should stay available for `/retry`.
async fn submit(
    client: &Arc<ApiClient>,
    tracker: &mut PollTracker,
    poll: PollConfig,
    text: &str,
    mode: EntryMode,
) -> Option<(EntryMode, String)> {
    let outcome = SubmissionController::new(client.as_ref())
        .submit(text, mode)
        .await;
    println!("{}", display::outcome_notice(&outcome));

    if let Some(session) = outcome.poll_session(poll) {
        let key = session.match_key().to_string();
        let client = Arc::clone(client);
        let timeout = display::timeout_notice(&outcome);
        tracker.start(&key, async move {
            match ResultReconciler::new(client.as_ref()).run(session).await {
                Reconciliation::Matched(result) => {
                    print!("\n{}", display::render_result_card(&result));
                }
                Reconciliation::TimedOut { .. } => println!("\n{timeout}"),
            }
        });
    }

    (!outcome.clears_input()).then(|| (mode, text.to_string()))
}

/// Refresh the cache and render the filtered list.
///
/// A failed refresh yields only the error; the cache keeps its previous contents.
async fn show_history<H>(backend: &H, cache: &mut HistoryCache, term: &str) -> String
where
    H: HistoryBackend + ?Sized,
{
    match backend.history().await {
        Ok(items) => cache.replace(items),
        Err(err) => {
            warn!(error = %err, "history refresh failed");
            return format!("{}\n", display::error_notice("loading history", &err));
        }
    }
    let view: Vec<_> = cache.view(term, StatusFilter::All).collect();
    display::render_history(&view)
}

/// Clear the backend, then the cache. The cache is untouched on failure.
async fn clear_history<H>(backend: &H, cache: &mut HistoryCache) -> String
where
    H: HistoryBackend + ?Sized,
{
    match backend.clear_history().await {
        Ok(message) => {
            cache.clear();
            message.unwrap_or_else(|| "History cleared.".to_string())
        }
        Err(err) => {
            warn!(error = %err, "clear history failed");
            display::error_notice("clearing history", &err)
        }
    }
}
