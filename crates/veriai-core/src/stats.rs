//! Dashboard counters from `GET /api/stats`.

use serde::{Deserialize, Serialize};

/// Aggregate counts over all stored results. Missing fields stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_analyzed: Option<u64>,
    #[serde(default)]
    pub verified_true: Option<u64>,
    #[serde(default)]
    pub flagged_false: Option<u64>,
}

impl DashboardStats {
    /// Share of verified-true results, rounded to a whole percent.
    pub fn true_percent(&self) -> u64 {
        percent(self.verified_true, self.total_analyzed)
    }

    /// Share of flagged-false results, rounded to a whole percent.
    pub fn false_percent(&self) -> u64 {
        percent(self.flagged_false, self.total_analyzed)
    }
}

fn percent(part: Option<u64>, total: Option<u64>) -> u64 {
    match (part, total) {
        (Some(part), Some(total)) if total > 0 => {
            (part as f64 / total as f64 * 100.0).round() as u64
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages() {
        let stats: DashboardStats = serde_json::from_str(
            r#"{"total_analyzed": 3, "verified_true": 2, "flagged_false": 1}"#,
        )
        .unwrap();
        assert_eq!(stats.true_percent(), 67);
        assert_eq!(stats.false_percent(), 33);
    }

    #[test]
    fn zero_total_is_zero_percent() {
        let stats = DashboardStats {
            total_analyzed: Some(0),
            verified_true: Some(0),
            flagged_false: Some(0),
        };
        assert_eq!(stats.true_percent(), 0);
        assert_eq!(stats.false_percent(), 0);
    }

    #[test]
    fn missing_fields() {
        let stats: DashboardStats = serde_json::from_str(r#"{"total_analyzed": 4}"#).unwrap();
        assert_eq!(stats.verified_true, None);
        assert_eq!(stats.true_percent(), 0);
    }
}
