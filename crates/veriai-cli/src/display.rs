//! Terminal rendering for verdict cards, history lists, and dashboard stats.
//!
//! Everything here formats into a `String`; callers decide where it goes.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime};
use veriai_client::{ClientError, ErrorKind, SubmissionOutcome};
use veriai_core::input::snippet;
use veriai_core::verdict::{self, ConfidenceTier};
use veriai_core::{AnalysisResult, DashboardStats};

const LABEL_WIDTH: usize = 14;
const BAR_CELLS: usize = 20;
const NOTICE_SNIPPET_CHARS: usize = 50;
const SHORT_HASH_CHARS: usize = 16;
const NA: &str = "N/A";

pub const TIMEOUT_NOTICE: &str =
    "Analysis is taking longer than expected. Check the history later.";

// ── Submission notices ──

/// One-line acknowledgement for a submission outcome.
pub fn outcome_notice(outcome: &SubmissionOutcome) -> String {
    match outcome {
        SubmissionOutcome::Queued { match_key } => format!(
            "Analysis for \"{}\" queued! Result will appear below.",
            snippet(match_key, NOTICE_SNIPPET_CHARS)
        ),
        SubmissionOutcome::Duplicate { match_key } => format!(
            "\"{}\" already analyzed. Result shown below.",
            snippet(match_key, NOTICE_SNIPPET_CHARS)
        ),
        SubmissionOutcome::Error { message } => format!("Error: {message}"),
    }
}

/// Notice shown when no matching result was found for `outcome`.
pub fn timeout_notice(outcome: &SubmissionOutcome) -> &'static str {
    match outcome {
        SubmissionOutcome::Duplicate { .. } => {
            "The existing result is no longer the latest one. Search the history for it."
        }
        _ => TIMEOUT_NOTICE,
    }
}

/// Inline notice for a failed backend call, worded by error class.
pub fn error_notice(action: &str, err: &ClientError) -> String {
    match err.kind() {
        ErrorKind::Transport => format!("Error {action}: could not reach the backend ({err})"),
        ErrorKind::Backend => format!("Error {action}: {err}"),
        ErrorKind::Protocol => format!("Error {action}: unexpected response from the backend ({err})"),
        ErrorKind::PollTimeout => TIMEOUT_NOTICE.to_string(),
    }
}

// ── Detail card ──

/// Render a single result as a vertical card.
pub fn render_result_card(result: &AnalysisResult) -> String {
    let v = verdict::describe(result);
    let mut out = String::new();

    let _ = writeln!(out, "=== {} {} ===", v.class.icon(), v.title);
    for line in v.subtext.lines() {
        let _ = writeln!(out, "  {line}");
    }
    let _ = writeln!(
        out,
        "  {:<LABEL_WIDTH$} {} {}%{}",
        "Confidence",
        confidence_bar(v.confidence),
        v.confidence,
        tier_suffix(v.tier)
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Details");
    field(&mut out, "Headline", non_empty(&result.query_text).unwrap_or(NA));
    field(&mut out, "Source", result.publisher.as_deref().unwrap_or(NA));
    field(&mut out, "Domain", result.domain.as_deref().unwrap_or(NA));
    field(&mut out, "Date", &format_timestamp(&result.timestamp));
    if let Some(url) = result.original_url.as_deref() {
        field(&mut out, "URL", url);
    }
    field(
        &mut out,
        "Merkle hash",
        result.merkle_root_hash.as_deref().unwrap_or(NA),
    );
    out
}

fn field(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "  {label:<LABEL_WIDTH$} {value}");
}

fn tier_suffix(tier: ConfidenceTier) -> &'static str {
    match tier {
        ConfidenceTier::High => "",
        ConfidenceTier::Medium => " (medium)",
        ConfidenceTier::Low => " (low)",
    }
}

/// Fixed-width text bar for a 0..=100 percentage.
pub fn confidence_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_CELLS).div_ceil(100);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_CELLS - filled)
    )
}

// ── History list ──

/// Render a filtered history view, one card per entry.
pub fn render_history(items: &[&AnalysisResult]) -> String {
    if items.is_empty() {
        return "No matching analysis history found.\n".to_string();
    }

    let mut out = String::new();
    for item in items {
        let class = verdict::classify(item);
        let _ = write!(out, "[{}]", class.badge());
        if let Some(conf) = item.gemini_confidence {
            let _ = write!(
                out,
                "  AI: {} ({}%)",
                item.gemini_flag.as_str(),
                verdict::display_confidence(Some(conf))
            );
        }
        if let Some(id) = item.id {
            let _ = write!(out, "  #{id}");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "  {}", non_empty(&item.query_text).unwrap_or(NA));
        let _ = writeln!(
            out,
            "  Publisher: {} | Analyzed: {}",
            item.publisher.as_deref().unwrap_or(NA),
            format_timestamp(&item.timestamp)
        );
        let _ = writeln!(
            out,
            "  Domain: {} | URL: {}",
            item.domain.as_deref().unwrap_or(NA),
            item.original_url.as_deref().unwrap_or(NA)
        );
        let _ = writeln!(out, "  Merkle Hash: {}", short_hash(item.merkle_root_hash.as_deref()));
        let _ = writeln!(out);
    }
    out
}

fn short_hash(hash: Option<&str>) -> String {
    match hash {
        Some(h) if !h.is_empty() => {
            let head: String = h.chars().take(SHORT_HASH_CHARS).collect();
            format!("{head}...")
        }
        _ => NA.to_string(),
    }
}

// ── Stats ──

/// Render dashboard counters with their share of the total.
pub fn render_stats(stats: &DashboardStats) -> String {
    let count = |v: Option<u64>| v.map_or_else(|| NA.to_string(), |n| n.to_string());
    let mut out = String::new();
    let _ = writeln!(out, "Dashboard");
    field(&mut out, "Analyzed", &count(stats.total_analyzed));
    field(
        &mut out,
        "Verified true",
        &format!("{} ({}% of total)", count(stats.verified_true), stats.true_percent()),
    );
    field(
        &mut out,
        "Flagged false",
        &format!("{} ({}% of total)", count(stats.flagged_false), stats.false_percent()),
    );
    out
}

// ── Export ──

/// Write `items` to `path` as a pretty-printed JSON array.
pub fn export_json(path: &Path, items: &[&AnalysisResult]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, items)
        .with_context(|| format!("writing {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

// ── Helpers ──

/// Human-readable timestamp. The backend writes naive ISO 8601 strings.
pub fn format_timestamp(raw: &str) -> String {
    const OUT: &str = "%Y-%m-%d %H:%M:%S";
    let raw = raw.trim();
    if raw.is_empty() {
        return NA.to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format(OUT).to_string();
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format(OUT).to_string();
    }
    "Invalid Date".to_string()
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriai_core::{AiFlag, FinalVerdict};

    fn sample() -> AnalysisResult {
        let mut r = AnalysisResult::new("The moon is made of cheese").with_rating("Pants on Fire");
        r.id = Some(7);
        r.publisher = Some("PolitiFact".into());
        r.timestamp = "2025-10-03T14:22:05.123456".into();
        r.gemini_flag = AiFlag::Misleading;
        r.gemini_confidence = Some(91.0);
        r.gemini_reasoning = Some("No lunar dairy detected.".into());
        r.merkle_root_hash = Some("9f86d081884c7d659a2feaa0c55ad015a3bf4f1b".into());
        r
    }

    #[test]
    fn card_shows_verdict_and_details() {
        let card = render_result_card(&sample());
        assert!(card.starts_with("=== ❌ Flagged as Potentially Misleading ==="));
        assert!(card.contains("FC Rating: Pants on Fire by PolitiFact."));
        assert!(card.contains("AI Reason: No lunar dairy detected."));
        assert!(card.contains("91% (low)"));
        assert!(card.contains("2025-10-03 14:22:05"));
        assert!(!card.contains("URL"));
    }

    #[test]
    fn card_shows_url_when_present() {
        let mut r = sample();
        r.original_url = Some("https://example.com/story".into());
        assert!(render_result_card(&r).contains("https://example.com/story"));
    }

    #[test]
    fn history_entries() {
        let a = sample();
        let b = AnalysisResult::new("Water boils at 100C")
            .with_rating("Mixture")
            .with_verdict(FinalVerdict::VerifiedTrue);
        let out = render_history(&[&a, &b]);
        assert!(out.contains("[Flagged False]  AI: Misleading (91%)  #7"));
        assert!(out.contains("Merkle Hash: 9f86d081884c7d65..."));
        assert!(out.contains("[Verified True]\n"));
        assert!(out.contains("Merkle Hash: N/A"));
    }

    #[test]
    fn empty_history() {
        assert_eq!(render_history(&[]), "No matching analysis history found.\n");
    }

    #[test]
    fn stats_percentages() {
        let stats = DashboardStats {
            total_analyzed: Some(4),
            verified_true: Some(1),
            flagged_false: Some(3),
        };
        let out = render_stats(&stats);
        assert!(out.contains("1 (25% of total)"));
        assert!(out.contains("3 (75% of total)"));
        assert!(render_stats(&DashboardStats::default()).contains("N/A (0% of total)"));
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp("2025-10-03T14:22:05"), "2025-10-03 14:22:05");
        assert_eq!(
            format_timestamp("2025-10-03T14:22:05+02:00"),
            "2025-10-03 14:22:05"
        );
        assert_eq!(format_timestamp(""), "N/A");
        assert_eq!(format_timestamp("yesterday"), "Invalid Date");
    }

    #[test]
    fn bars() {
        assert_eq!(confidence_bar(0), "[--------------------]");
        assert_eq!(confidence_bar(100), "[####################]");
        assert_eq!(confidence_bar(50), "[##########----------]");
        assert_eq!(confidence_bar(1), "[#-------------------]");
    }

    #[test]
    fn notices() {
        let queued = SubmissionOutcome::Queued {
            match_key: "The moon is made of cheese".into(),
        };
        assert_eq!(
            outcome_notice(&queued),
            "Analysis for \"The moon is made of cheese...\" queued! Result will appear below."
        );
        assert_eq!(timeout_notice(&queued), TIMEOUT_NOTICE);

        let err = SubmissionOutcome::Error {
            message: "No text or URL".into(),
        };
        assert_eq!(outcome_notice(&err), "Error: No text or URL");
    }

    #[test]
    fn export_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let a = sample();
        export_json(&path, &[&a]).unwrap();

        let written: Vec<AnalysisResult> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, vec![a]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn export_reports_failed_writes() {
        // Small payloads stay in the buffer until the final flush.
        let a = sample();
        let err = export_json(Path::new("/dev/full"), &[&a]).unwrap_err();
        assert!(err.to_string().contains("/dev/full"), "{err:#}");
    }

    #[test]
    fn error_notices_follow_error_kind() {
        let backend = ClientError::Backend("Item not found.".into());
        assert_eq!(
            error_notice("deleting item 4", &backend),
            "Error deleting item 4: Item not found."
        );

        let protocol = ClientError::Protocol("history is not an array: object".into());
        assert!(
            error_notice("loading history", &protocol)
                .starts_with("Error loading history: unexpected response from the backend")
        );

        let server = ClientError::Server {
            status: 500,
            body: "boom".into(),
        };
        assert!(error_notice("loading history", &server).contains("could not reach the backend"));
        assert_eq!(
            error_notice("polling", &ClientError::PollTimeout { attempts: 5 }),
            TIMEOUT_NOTICE
        );
    }
}
