//! Search and status filtering over a fetched history list.

use std::fmt;
use std::str::FromStr;

use crate::record::AnalysisResult;
use crate::verdict::{self, VerdictClass};

/// Status selector for the history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    True,
    False,
    /// Everything that is neither true nor false, API errors included.
    NotFound,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::True => "true",
            Self::False => "false",
            Self::NotFound => "not-found",
        }
    }

    pub fn accepts(&self, class: VerdictClass) -> bool {
        match self {
            Self::All => true,
            Self::True => class == VerdictClass::VerifiedTrue,
            Self::False => class == VerdictClass::FlaggedFalse,
            Self::NotFound => !class.is_conclusive(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            "not-found" | "not_found" | "notfound" => Ok(Self::NotFound),
            other => Err(format!(
                "unknown status filter '{other}' (expected all, true, false or not-found)"
            )),
        }
    }
}

/// Lazily filter `items`, preserving order. Both predicates must hold.
///
/// `search` matches case-insensitively anywhere in `query_text`; an empty
/// term matches everything. The returned iterator is `Clone`, so the view
/// can be restarted without touching the input.
pub fn filter<'a>(
    items: &'a [AnalysisResult],
    search: &str,
    status: StatusFilter,
) -> impl Iterator<Item = &'a AnalysisResult> + Clone + use<'a> {
    let needle = search.to_lowercase();
    items.iter().filter(move |item| {
        (needle.is_empty() || item.query_text.to_lowercase().contains(&needle))
            && status.accepts(verdict::classify(item))
    })
}

/// Locally cached history list.
///
/// Replaced wholesale on a successful load, emptied on a successful clear,
/// and left untouched when either fails.
#[derive(Debug, Default, Clone)]
pub struct HistoryCache {
    items: Vec<AnalysisResult>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, items: Vec<AnalysisResult>) {
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[AnalysisResult] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Filtered view over the cached list.
    pub fn view<'a>(
        &'a self,
        search: &str,
        status: StatusFilter,
    ) -> impl Iterator<Item = &'a AnalysisResult> + Clone + use<'a> {
        filter(&self.items, search, status)
    }
}
