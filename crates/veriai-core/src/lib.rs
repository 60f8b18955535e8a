//! Shared VeriAI types: analysis records, input normalisation, verdict classification.

pub mod history;
pub mod input;
pub mod record;
pub mod stats;
pub mod verdict;

pub use history::{HistoryCache, StatusFilter};
pub use input::{AnalysisPayload, AnalysisRequest, EntryMode, InputKind, normalize_url};
pub use record::{AiFlag, AnalysisResult, FinalVerdict};
pub use stats::DashboardStats;
pub use verdict::{ConfidenceTier, RatingBucket, Verdict, VerdictClass};
