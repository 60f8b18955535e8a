//! Reduction of a fact-check rating and server verdict into one display class.
//!
//! Precedence, highest first:
//!
//! 1. `final_verdict == VERIFIED_TRUE` → [`VerdictClass::VerifiedTrue`]
//! 2. `final_verdict == FLAGGED_FALSE` → [`VerdictClass::FlaggedFalse`]
//! 3. rating in [`TRUE_RATINGS`] / [`FALSE_RATINGS`] (case-insensitive)
//! 4. rating `"not found"` → `NotFound`, `"api error"` → `ApiError`
//! 5. anything else → `CheckDetails`
//!
//! The AI confidence is shown next to the verdict but never changes it.

use serde::Serialize;
use tracing::debug;

use crate::record::{AnalysisResult, FinalVerdict};

/// Bumped whenever either rating vocabulary changes.
pub const RATING_VOCABULARY_VERSION: u32 = 2;

/// Ratings that bucket as true. Shared by the detail view and history filters.
pub const TRUE_RATINGS: &[&str] = &[
    "true",
    "mostly true",
    "correct attribution",
    "accurate",
    "correct",
    "verified",
];

/// Ratings that bucket as false.
pub const FALSE_RATINGS: &[&str] = &[
    "false",
    "pants on fire",
    "mostly false",
    "scam",
    "fake",
    "incorrect",
    "not true",
    "debunked",
];

/// Confidence shown when the AI produced no score.
pub const FALLBACK_CONFIDENCE: u8 = 20;

/// Classification of a bare rating string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingBucket {
    True,
    False,
    Unrecognized,
}

/// Bucket a rating against the shared vocabularies, ignoring case.
pub fn bucket_rating(rating: &str) -> RatingBucket {
    let lower = rating.to_lowercase();
    if TRUE_RATINGS.contains(&lower.as_str()) {
        RatingBucket::True
    } else if FALSE_RATINGS.contains(&lower.as_str()) {
        RatingBucket::False
    } else {
        RatingBucket::Unrecognized
    }
}

/// The single display class for a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictClass {
    VerifiedTrue,
    FlaggedFalse,
    NotFound,
    ApiError,
    CheckDetails,
}

impl VerdictClass {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::VerifiedTrue => "✅",
            Self::FlaggedFalse => "❌",
            Self::NotFound | Self::ApiError => "❓",
            Self::CheckDetails => "⚠️",
        }
    }

    /// Banner title for the detail view.
    pub fn title(&self) -> &'static str {
        match self {
            Self::VerifiedTrue => "Verified as Truthful",
            Self::FlaggedFalse => "Flagged as Potentially Misleading",
            Self::NotFound => "No Fact-Checks Found",
            Self::ApiError => "Analysis Error",
            Self::CheckDetails => "Rating: Check Details",
        }
    }

    /// Short badge label for history entries.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::VerifiedTrue => "Verified True",
            Self::FlaggedFalse => "Flagged False",
            Self::ApiError => "API Error",
            Self::NotFound | Self::CheckDetails => "Inconclusive",
        }
    }

    pub fn is_conclusive(&self) -> bool {
        matches!(self, Self::VerifiedTrue | Self::FlaggedFalse)
    }
}

/// Colour band for the confidence bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

/// Everything the presentation layer needs to show one result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub class: VerdictClass,
    pub title: &'static str,
    pub subtext: String,
    /// AI confidence (or the fallback), clamped to 0..=100.
    pub confidence: u8,
    pub tier: ConfidenceTier,
}

/// Classify a result. Pure: depends only on the record's fields.
pub fn classify(result: &AnalysisResult) -> VerdictClass {
    match result.final_verdict {
        Some(FinalVerdict::VerifiedTrue) => return VerdictClass::VerifiedTrue,
        Some(FinalVerdict::FlaggedFalse) => return VerdictClass::FlaggedFalse,
        _ => {}
    }

    let rating = result.rating.as_deref().unwrap_or_default();
    match bucket_rating(rating) {
        RatingBucket::True => VerdictClass::VerifiedTrue,
        RatingBucket::False => VerdictClass::FlaggedFalse,
        RatingBucket::Unrecognized => match rating.to_lowercase().as_str() {
            "not found" => VerdictClass::NotFound,
            "api error" => VerdictClass::ApiError,
            _ => {
                debug!(rating, "rating outside vocabulary v{RATING_VOCABULARY_VERSION}");
                VerdictClass::CheckDetails
            }
        },
    }
}

/// Clamp an optional AI confidence score for display.
pub fn display_confidence(score: Option<f64>) -> u8 {
    match score {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 100.0) as u8,
        Some(_) => 0,
        None => FALLBACK_CONFIDENCE,
    }
}

/// Classify and build the detail-view presentation for a result.
pub fn describe(result: &AnalysisResult) -> Verdict {
    let class = classify(result);
    let tier = match class {
        VerdictClass::VerifiedTrue => ConfidenceTier::High,
        VerdictClass::FlaggedFalse => ConfidenceTier::Low,
        _ => ConfidenceTier::Medium,
    };

    let rating = result.rating.as_deref().unwrap_or("N/A");
    let publisher = result.publisher.as_deref().unwrap_or("N/A");
    let reason = result
        .gemini_reasoning
        .as_deref()
        .unwrap_or("N/A (AI analysis unavailable)");

    Verdict {
        class,
        title: class.title(),
        subtext: format!("FC Rating: {rating} by {publisher}.\nAI Reason: {reason}"),
        confidence: display_confidence(result.gemini_confidence),
        tier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AiFlag;

    fn rated(rating: &str) -> AnalysisResult {
        AnalysisResult::new("claim").with_rating(rating)
    }

    #[test]
    fn server_verdict_wins_over_rating() {
        let r = rated("false").with_verdict(FinalVerdict::VerifiedTrue);
        assert_eq!(classify(&r), VerdictClass::VerifiedTrue);

        let r = rated("True").with_verdict(FinalVerdict::FlaggedFalse);
        assert_eq!(classify(&r), VerdictClass::FlaggedFalse);
    }

    #[test]
    fn inconclusive_verdict_falls_back_to_rating() {
        let r = rated("Mostly True").with_verdict(FinalVerdict::Inconclusive);
        assert_eq!(classify(&r), VerdictClass::VerifiedTrue);

        let r = rated("scam").with_verdict(FinalVerdict::Unrecognized);
        assert_eq!(classify(&r), VerdictClass::FlaggedFalse);
    }

    #[test]
    fn rating_buckets_ignore_case() {
        assert_eq!(classify(&rated("Pants on Fire")), VerdictClass::FlaggedFalse);
        assert_eq!(classify(&rated("DEBUNKED")), VerdictClass::FlaggedFalse);
        assert_eq!(classify(&rated("Correct Attribution")), VerdictClass::VerifiedTrue);
        assert_eq!(classify(&rated("verified")), VerdictClass::VerifiedTrue);
    }

    #[test]
    fn every_vocabulary_entry_buckets() {
        for r in TRUE_RATINGS {
            assert_eq!(bucket_rating(r), RatingBucket::True, "{r}");
            assert_eq!(bucket_rating(&r.to_uppercase()), RatingBucket::True, "{r}");
        }
        for r in FALSE_RATINGS {
            assert_eq!(bucket_rating(r), RatingBucket::False, "{r}");
        }
    }

    #[test]
    fn not_found_and_api_error() {
        assert_eq!(classify(&rated("Not Found")), VerdictClass::NotFound);
        assert_eq!(classify(&rated("API Error")), VerdictClass::ApiError);
    }

    #[test]
    fn unrecognised_ratings_need_details() {
        assert_eq!(classify(&rated("Half True")), VerdictClass::CheckDetails);
        assert_eq!(classify(&rated("misleading")), VerdictClass::CheckDetails);
        assert_eq!(classify(&rated("")), VerdictClass::CheckDetails);
        assert_eq!(classify(&AnalysisResult::new("claim")), VerdictClass::CheckDetails);
    }

    #[test]
    fn ai_signal_never_overrides() {
        let mut r = rated("True");
        r.gemini_flag = AiFlag::Misleading;
        r.gemini_confidence = Some(99.0);
        assert_eq!(classify(&r), VerdictClass::VerifiedTrue);
    }

    #[test]
    fn confidence_fallback_and_clamp() {
        assert_eq!(display_confidence(None), 20);
        assert_eq!(display_confidence(Some(72.4)), 72);
        assert_eq!(display_confidence(Some(150.0)), 100);
        assert_eq!(display_confidence(Some(-3.0)), 0);
        assert_eq!(display_confidence(Some(f64::NAN)), 0);
    }

    #[test]
    fn describe_fills_placeholders() {
        let v = describe(&AnalysisResult::new("claim"));
        assert_eq!(v.class, VerdictClass::CheckDetails);
        assert_eq!(v.title, "Rating: Check Details");
        assert_eq!(v.confidence, 20);
        assert_eq!(v.tier, ConfidenceTier::Medium);
        assert!(v.subtext.contains("FC Rating: N/A by N/A."));
        assert!(v.subtext.contains("N/A (AI analysis unavailable)"));
    }

    #[test]
    fn describe_uses_record_fields() {
        let mut r = rated("False");
        r.publisher = Some("Snopes".into());
        r.gemini_reasoning = Some("Contradicted by NASA.".into());
        r.gemini_confidence = Some(88.0);
        let v = describe(&r);
        assert_eq!(v.class, VerdictClass::FlaggedFalse);
        assert_eq!(v.tier, ConfidenceTier::Low);
        assert_eq!(v.confidence, 88);
        assert_eq!(
            v.subtext,
            "FC Rating: False by Snopes.\nAI Reason: Contradicted by NASA."
        );
    }

    #[test]
    fn history_badges() {
        assert_eq!(VerdictClass::NotFound.badge(), "Inconclusive");
        assert_eq!(VerdictClass::CheckDetails.badge(), "Inconclusive");
        assert_eq!(VerdictClass::ApiError.badge(), "API Error");
        assert!(VerdictClass::FlaggedFalse.is_conclusive());
        assert!(!VerdictClass::ApiError.is_conclusive());
    }
}
