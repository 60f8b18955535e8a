mod display;
mod interactive;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use veriai_client::{
    ApiClient, LatestResult, PollConfig, Reconciliation, ResultReconciler, SubmissionController,
    SubmissionOutcome,
};
use veriai_core::verdict::RATING_VOCABULARY_VERSION;
use veriai_core::{AnalysisResult, EntryMode, HistoryCache, StatusFilter};

#[derive(Parser)]
#[command(
    name = "veriai",
    version,
    about = "Fact-check claims and article URLs against a VeriAI backend"
)]
struct Cli {
    /// Backend base URL.
    #[arg(
        long,
        global = true,
        env = "VERIAI_SERVER",
        default_value = "http://127.0.0.1:5001"
    )]
    server: String,

    /// Fetches of the latest result before giving up on a submission.
    #[arg(long, global = true, env = "VERIAI_POLL_ATTEMPTS", default_value_t = 5)]
    poll_attempts: u32,

    /// Delay between result fetches, in milliseconds.
    #[arg(long, global = true, env = "VERIAI_POLL_DELAY_MS", default_value_t = 3000)]
    poll_delay_ms: u64,

    /// Refresh interval for `stats --watch`, in milliseconds.
    #[arg(
        long,
        global = true,
        env = "VERIAI_STATS_INTERVAL_MS",
        default_value_t = 5000
    )]
    stats_interval_ms: u64,

    /// Per-request HTTP timeout, in seconds.
    #[arg(long, global = true, env = "VERIAI_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a claim or URL and wait for its verdict.
    Analyze {
        /// Treat the input as an article URL.
        #[arg(long)]
        url: bool,
        /// Claim text or URL. Multiple words are joined with spaces.
        #[arg(required = true)]
        input: Vec<String>,
    },
    /// Show the most recently stored result.
    Latest,
    /// List stored results, newest first.
    History {
        /// Case-insensitive substring of the claim text.
        #[arg(long, default_value = "")]
        search: String,
        /// all, true, false or not-found.
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Print the filtered list as JSON.
        #[arg(long)]
        json: bool,
        /// Also write the filtered list to this file as JSON.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Show dashboard counters.
    Stats {
        /// Keep refreshing until interrupted.
        #[arg(long)]
        watch: bool,
    },
    /// Delete every stored result.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Delete one stored result by id.
    Delete { id: i64 },
    /// Read claims from stdin, one per line.
    Interactive,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        rating_vocabulary = RATING_VOCABULARY_VERSION,
        server = %cli.server,
        "veriai starting"
    );

    let client = ApiClient::with_timeout(cli.server.clone(), Duration::from_secs(cli.timeout_secs))
        .context("building HTTP client")?;
    let poll = PollConfig::new(
        cli.poll_attempts,
        Duration::from_millis(cli.poll_delay_ms),
    );

    match cli.command {
        Command::Analyze { url, input } => {
            let mode = if url { EntryMode::Url } else { EntryMode::Text };
            analyze(&client, poll, &input.join(" "), mode).await
        }
        Command::Latest => latest(&client).await,
        Command::History {
            search,
            status,
            json,
            export,
        } => history(&client, &search, status, json, export).await,
        Command::Stats { watch } => {
            stats(&client, watch.then(|| Duration::from_millis(cli.stats_interval_ms))).await
        }
        Command::Clear { yes } => clear(&client, yes).await,
        Command::Delete { id } => delete(&client, id).await,
        Command::Interactive => {
            interactive::run(Arc::new(client), poll).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn analyze(
    client: &ApiClient,
    poll: PollConfig,
    input: &str,
    mode: EntryMode,
) -> anyhow::Result<ExitCode> {
    let outcome = SubmissionController::new(client).submit(input, mode).await;
    let Some(session) = outcome.poll_session(poll) else {
        eprintln!("{}", display::outcome_notice(&outcome));
        return Ok(ExitCode::FAILURE);
    };
    println!("{}", display::outcome_notice(&outcome));

    match ResultReconciler::new(client).run(session).await {
        Reconciliation::Matched(result) => {
            print!("{}", display::render_result_card(&result));
            Ok(ExitCode::SUCCESS)
        }
        Reconciliation::TimedOut { .. } => {
            eprintln!("{}", display::timeout_notice(&outcome));
            // A duplicate that is no longer the latest result is still a success.
            if matches!(outcome, SubmissionOutcome::Duplicate { .. }) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2))
            }
        }
    }
}

async fn latest(client: &ApiClient) -> anyhow::Result<ExitCode> {
    match client.latest_result().await.context("fetching latest result")? {
        LatestResult::Empty => println!("No results yet."),
        LatestResult::Ready(result) => print!("{}", display::render_result_card(&result)),
    }
    Ok(ExitCode::SUCCESS)
}

async fn history(
    client: &ApiClient,
    search: &str,
    status: StatusFilter,
    json: bool,
    export: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let mut cache = HistoryCache::new();
    match client.history().await {
        Ok(items) => cache.replace(items),
        Err(err) => {
            warn!(error = %err, "history load failed");
            eprintln!("{}", display::error_notice("loading history", &err));
            return Ok(ExitCode::FAILURE);
        }
    }

    let view: Vec<&AnalysisResult> = cache.view(search, status).collect();
    info!(total = cache.len(), shown = view.len(), filter = %status, "history filtered");

    if let Some(path) = export {
        display::export_json(&path, &view)?;
        eprintln!("Exported {} results to {}", view.len(), path.display());
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", display::render_history(&view));
    }
    Ok(ExitCode::SUCCESS)
}

async fn stats(client: &ApiClient, watch: Option<Duration>) -> anyhow::Result<ExitCode> {
    let Some(interval) = watch else {
        let stats = client.stats().await.context("fetching stats")?;
        print!("{}", display::render_stats(&stats));
        return Ok(ExitCode::SUCCESS);
    };

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => match client.stats().await {
                Ok(stats) => println!("{}", display::render_stats(&stats)),
                // Keep the previous numbers on screen and try again next tick.
                Err(err) => warn!(error = %err, "stats refresh failed"),
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn clear(client: &ApiClient, yes: bool) -> anyhow::Result<ExitCode> {
    if !yes && !confirm("Delete ALL saved analyses? This cannot be undone. [y/N] ")? {
        println!("Aborted.");
        return Ok(ExitCode::SUCCESS);
    }
    match client.clear_history().await {
        Ok(message) => {
            println!("{}", message.as_deref().unwrap_or("History cleared."));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", display::error_notice("clearing history", &err));
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn delete(client: &ApiClient, id: i64) -> anyhow::Result<ExitCode> {
    match client.delete_history(id).await {
        Ok(message) => {
            println!("{}", message.as_deref().unwrap_or("Deleted."));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!(
                "{}",
                display::error_notice(&format!("deleting history item {id}"), &err)
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["veriai", "latest"]).unwrap();
        assert_eq!(cli.server, "http://127.0.0.1:5001");
        assert_eq!(cli.poll_attempts, 5);
        assert_eq!(cli.poll_delay_ms, 3000);
        assert_eq!(cli.stats_interval_ms, 5000);
        assert_eq!(cli.timeout_secs, 30);
    }

    #[test]
    fn analyze_joins_words() {
        let cli = Cli::try_parse_from(["veriai", "analyze", "--url", "example.com/a", "b"]).unwrap();
        match cli.command {
            Command::Analyze { url, input } => {
                assert!(url);
                assert_eq!(input.join(" "), "example.com/a b");
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn history_status_parses() {
        let cli = Cli::try_parse_from(["veriai", "history", "--status", "not-found"]).unwrap();
        match cli.command {
            Command::History { status, .. } => assert_eq!(status, StatusFilter::NotFound),
            _ => panic!("expected history"),
        }
        assert!(Cli::try_parse_from(["veriai", "history", "--status", "maybe"]).is_err());
    }

    #[test]
    fn analyze_requires_input() {
        assert!(Cli::try_parse_from(["veriai", "analyze"]).is_err());
    }
}
