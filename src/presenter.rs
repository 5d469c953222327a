// Display configuration for verification status badges, scores and the verification report

use serde::Serialize;

use crate::{
    format::format_score,
    models::{VerificationResult, VerificationStatus},
};

const SUCCESS_THRESHOLD: f64 = 70.0;
const WARNING_THRESHOLD: f64 = 50.0;
const PLATE_EXACT_MATCH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Danger,
    Info,
    Neutral,
}

impl Severity {
    // CSS modifier used by the templates: badge--success, score--danger, ...
    pub fn css(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
            Severity::Info => "info",
            Severity::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDescriptor {
    pub label: &'static str,
    pub icon: &'static str,
    pub severity: Severity,
    pub tooltip: &'static str,
}

/// Compact badge for a status, as shown on listing cards.
///
/// Unknown statuses get the pending treatment; the backend may add states before this front end learns them.
pub fn describe(status: VerificationStatus) -> StatusDescriptor {
    match status {
        VerificationStatus::Verified => StatusDescriptor {
            label: "Verified",
            icon: "✓",
            severity: Severity::Success,
            tooltip: "AI Verified Listing",
        },
        VerificationStatus::ManualReview => StatusDescriptor {
            label: "Under Review",
            icon: "⚠",
            severity: Severity::Warning,
            tooltip: "Pending Manual Review",
        },
        VerificationStatus::Failed => StatusDescriptor {
            label: "Failed",
            icon: "✗",
            severity: Severity::Danger,
            tooltip: "Verification Failed",
        },
        VerificationStatus::InProgress => StatusDescriptor {
            label: "Verifying...",
            icon: "⟳",
            severity: Severity::Info,
            tooltip: "Verification in Progress",
        },
        VerificationStatus::Pending | VerificationStatus::Unrecognized => StatusDescriptor {
            label: "Pending",
            icon: "⏳",
            severity: Severity::Neutral,
            tooltip: "Awaiting Verification",
        },
    }
}

/// Long-form badge used on the owner's listing rows.
pub fn describe_detailed(status: VerificationStatus) -> StatusDescriptor {
    let base = describe(status);
    match status {
        VerificationStatus::Verified => StatusDescriptor {
            label: "AI Verified",
            tooltip: "AI Verified Listing - Quality Assured",
            ..base
        },
        VerificationStatus::Failed => StatusDescriptor {
            label: "Verification Failed",
            tooltip: "Verification Failed - Please check details",
            ..base
        },
        _ => base,
    }
}

/// Colour band of a 0-100 confidence score.
pub fn band(score: f64) -> Severity {
    if score >= SUCCESS_THRESHOLD {
        Severity::Success
    } else if score >= WARNING_THRESHOLD {
        Severity::Warning
    } else {
        Severity::Danger
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreView {
    pub value: f64,
    pub text: String,
    pub severity: Severity,
    // Bar width in percent, clamped for rendering
    pub width: f64,
}

/// `None` means "no score yet" and renders nothing; a score of 0 still renders.
pub fn score_view(score: Option<f64>) -> Option<ScoreView> {
    let value = score.filter(|s| s.is_finite())?;
    Some(ScoreView {
        value,
        text: format_score(value),
        severity: band(value),
        width: value.clamp(0.0, 100.0),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateMatch {
    Matches,
    Mismatch,
}

impl PlateMatch {
    pub fn is_match(&self) -> bool {
        matches!(self, PlateMatch::Matches)
    }

    pub fn note(&self) -> &'static str {
        match self {
            PlateMatch::Matches => "✓ Matches provided plate number",
            PlateMatch::Mismatch => "⚠ Does not match provided plate number",
        }
    }
}

pub fn plate_match(score: Option<f64>) -> Option<PlateMatch> {
    let score = score.filter(|s| s.is_finite())?;
    if score == PLATE_EXACT_MATCH {
        Some(PlateMatch::Matches)
    } else {
        Some(PlateMatch::Mismatch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub status: StatusDescriptor,
    pub score: Option<ScoreView>,
}

/// Badge plus banded confidence score for a listing.
pub fn present(status: VerificationStatus, score: Option<f64>) -> Presentation {
    Presentation {
        status: describe(status),
        score: score_view(score),
    }
}

// --- Verification report ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportHeader {
    pub title: &'static str,
    pub subtitle: Option<&'static str>,
    pub icon: &'static str,
    pub severity: Severity,
    pub show_spinner: bool,
}

fn header(status: VerificationStatus) -> ReportHeader {
    match status {
        VerificationStatus::InProgress => ReportHeader {
            title: "Verifying Your Vehicle...",
            subtitle: Some("Please wait while we verify your vehicle details..."),
            icon: "🔍",
            severity: Severity::Info,
            show_spinner: true,
        },
        VerificationStatus::Verified => ReportHeader {
            title: "Verification Successful!",
            subtitle: Some("Your vehicle listing has been verified and is ready to publish"),
            icon: "✅",
            severity: Severity::Success,
            show_spinner: false,
        },
        VerificationStatus::ManualReview => ReportHeader {
            title: "Manual Review Required",
            subtitle: Some("Your listing is pending admin review and will be published once approved"),
            icon: "⚠️",
            severity: Severity::Warning,
            show_spinner: false,
        },
        VerificationStatus::Failed => ReportHeader {
            title: "Verification Failed",
            subtitle: Some("Your listing needs corrections before it can be verified"),
            icon: "❌",
            severity: Severity::Danger,
            show_spinner: false,
        },
        VerificationStatus::Pending | VerificationStatus::Unrecognized => ReportHeader {
            title: "Pending Verification",
            subtitle: None,
            icon: "⏳",
            severity: Severity::Neutral,
            show_spinner: false,
        },
    }
}

fn interpret(score: &ScoreView) -> &'static str {
    match score.severity {
        Severity::Success => "✓ Excellent match! Your listing has been verified successfully.",
        Severity::Warning => "⚠ Good match, but requires manual review for final approval.",
        _ => {
            "✗ The confidence score is below the required threshold. Please review the issues below and update your listing details or images."
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedAttribute {
    pub label: &'static str,
    pub value: String,
    pub plate: Option<PlateMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubScoreRow {
    pub label: &'static str,
    pub score: ScoreView,
    pub plate: Option<PlateMatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportAction {
    VerifyNow,
    Retry,
    ContinueToMyAds,
    ContinuePendingReview,
    ReviewAndEdit,
    Refresh,
    Close,
}

impl ReportAction {
    pub fn label(&self) -> &'static str {
        match self {
            ReportAction::VerifyNow => "🔍 Verify Now",
            ReportAction::Retry => "🔄 Retry Verification",
            ReportAction::ContinueToMyAds => "✓ Continue to My Ads",
            ReportAction::ContinuePendingReview => "Continue (Pending Review)",
            ReportAction::ReviewAndEdit => "Review & Edit Listing",
            ReportAction::Refresh => "Check Again",
            ReportAction::Close => "Close",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ReportAction::VerifyNow | ReportAction::Retry => Severity::Info,
            ReportAction::ContinueToMyAds => Severity::Success,
            ReportAction::ContinuePendingReview => Severity::Warning,
            ReportAction::ReviewAndEdit => Severity::Danger,
            ReportAction::Refresh | ReportAction::Close => Severity::Neutral,
        }
    }

    // Verify and retry change backend state
    pub fn is_post(&self) -> bool {
        matches!(self, ReportAction::VerifyNow | ReportAction::Retry)
    }

    pub fn href(&self, vehicle_id: i64) -> String {
        match self {
            ReportAction::VerifyNow => format!("/vehicles/{vehicle_id}/verify"),
            ReportAction::Retry => format!("/vehicles/{vehicle_id}/retry-verification"),
            ReportAction::ContinueToMyAds | ReportAction::ContinuePendingReview => "/my-ads".to_string(),
            ReportAction::ReviewAndEdit => format!("/vehicles/{vehicle_id}/edit"),
            ReportAction::Refresh => format!("/vehicles/{vehicle_id}/verification"),
            ReportAction::Close => format!("/vehicles/{vehicle_id}"),
        }
    }
}

fn actions(status: VerificationStatus, is_owner: bool) -> Vec<ReportAction> {
    let mut actions = Vec::new();
    match status {
        VerificationStatus::Verified => actions.push(ReportAction::ContinueToMyAds),
        VerificationStatus::ManualReview => {
            if is_owner {
                actions.push(ReportAction::Retry);
            }
            actions.push(ReportAction::ContinuePendingReview);
        }
        VerificationStatus::Failed => {
            if is_owner {
                actions.push(ReportAction::Retry);
            }
            actions.push(ReportAction::ReviewAndEdit);
        }
        VerificationStatus::InProgress => actions.push(ReportAction::Refresh),
        VerificationStatus::Pending | VerificationStatus::Unrecognized => {
            if is_owner {
                actions.push(ReportAction::VerifyNow);
            }
            actions.push(ReportAction::Close);
        }
    }
    actions
}

/// Everything the verification page shows for one listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub status: VerificationStatus,
    pub header: ReportHeader,
    pub overall: Option<ScoreView>,
    pub interpretation: Option<&'static str>,
    pub detected: Vec<DetectedAttribute>,
    pub sub_scores: Vec<SubScoreRow>,
    pub discrepancies: Vec<String>,
    pub error_details: Option<String>,
    pub not_vehicle_image: bool,
    pub suggestions: Option<String>,
    pub actions: Vec<ReportAction>,
}

impl VerificationReport {
    /// `is_owner` unlocks the actions that trigger a new verification run.
    pub fn build(status: VerificationStatus, result: Option<&VerificationResult>, is_owner: bool) -> Self {
        let overall = result.and_then(|r| score_view(r.overall_confidence_score));
        let interpretation = overall.as_ref().map(interpret);
        let failed = status == VerificationStatus::Failed;

        let mut report = VerificationReport {
            status,
            header: header(status),
            overall,
            interpretation,
            detected: Vec::new(),
            sub_scores: Vec::new(),
            discrepancies: Vec::new(),
            error_details: None,
            not_vehicle_image: false,
            suggestions: None,
            actions: actions(status, is_owner),
        };

        let Some(result) = result else {
            return report;
        };

        let plate = plate_match(result.plate_number_match_score);
        let detected = [
            ("Detected Brand", &result.ai_detected_brand, None),
            ("Detected Model", &result.ai_detected_model, None),
            ("Detected Type", &result.ai_detected_vehicle_type, None),
            ("Detected Fuel Type", &result.ai_detected_fuel_type, None),
            ("Detected Year", &result.ai_detected_year, None),
            ("Detected Plate Number", &result.ai_detected_plate_number, plate),
        ];
        report.detected = detected
            .into_iter()
            .filter_map(|(label, value, plate)| {
                let value = value.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
                Some(DetectedAttribute { label, value: value.to_string(), plate })
            })
            .collect();

        let scores = [
            ("Brand Match", result.brand_match_score, None),
            ("Model Match", result.model_match_score, None),
            ("Vehicle Type Match", result.vehicle_type_match_score, None),
            ("Fuel Type Match", result.fuel_type_match_score, None),
            ("Plate Number Match", result.plate_number_match_score, plate),
        ];
        report.sub_scores = scores
            .into_iter()
            .filter_map(|(label, score, plate)| Some(SubScoreRow { label, score: score_view(score)?, plate }))
            .collect();

        report.discrepancies = result
            .discrepancies
            .iter()
            .flatten()
            .filter(|d| !d.trim().is_empty())
            .cloned()
            .collect();

        if failed {
            report.error_details = result.error_message.clone().filter(|m| !m.trim().is_empty());
            report.not_vehicle_image = result.is_vehicle_image == Some(false);
        }
        report.suggestions = result.ai_suggestions.clone().filter(|s| !s.trim().is_empty());
        report
    }

    pub fn show_next_steps(&self) -> bool {
        self.status == VerificationStatus::Failed
    }

    pub fn plate_mismatch(&self) -> bool {
        self.sub_scores
            .iter()
            .any(|row| row.plate == Some(PlateMatch::Mismatch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verified_with_high_score() {
        let presentation = present(VerificationStatus::Verified, Some(85.0));
        assert_eq!(presentation.status.severity, Severity::Success);
        assert!(presentation.status.label.contains("Verified"));
        assert_eq!(presentation.score.unwrap().severity, Severity::Success);
    }

    #[test]
    fn test_manual_review_with_middling_score() {
        let presentation = present(VerificationStatus::ManualReview, Some(55.0));
        assert_eq!(presentation.status.severity, Severity::Warning);
        assert_eq!(presentation.status.label, "Under Review");
        assert_eq!(presentation.score.unwrap().severity, Severity::Warning);
    }

    #[test]
    fn test_unknown_status_falls_back_to_pending() {
        let status: VerificationStatus = serde_json::from_str(r#""bogus_value""#).unwrap();
        let descriptor = describe(status);
        assert_eq!(descriptor, describe(VerificationStatus::Pending));
        assert_eq!(descriptor.label, "Pending");
        assert_eq!(descriptor.severity, Severity::Neutral);
    }

    #[test]
    fn test_every_status_has_a_descriptor() {
        let expected = [
            (VerificationStatus::Verified, Severity::Success),
            (VerificationStatus::ManualReview, Severity::Warning),
            (VerificationStatus::Failed, Severity::Danger),
            (VerificationStatus::InProgress, Severity::Info),
            (VerificationStatus::Pending, Severity::Neutral),
            (VerificationStatus::Unrecognized, Severity::Neutral),
        ];
        for (status, severity) in expected {
            assert_eq!(describe(status).severity, severity, "{status:?}");
            assert_eq!(describe_detailed(status).severity, severity, "{status:?}");
        }
        assert_eq!(describe_detailed(VerificationStatus::Failed).label, "Verification Failed");
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(band(100.0), Severity::Success);
        assert_eq!(band(70.0), Severity::Success);
        assert_eq!(band(69.9), Severity::Warning);
        assert_eq!(band(50.0), Severity::Warning);
        assert_eq!(band(49.99), Severity::Danger);
        assert_eq!(band(0.0), Severity::Danger);
    }

    #[test]
    fn test_missing_score_is_omitted_not_zero() {
        assert!(score_view(None).is_none());
        let zero = score_view(Some(0.0)).unwrap();
        assert_eq!(zero.severity, Severity::Danger);
        assert_eq!(zero.text, "0.0%");
        assert!(present(VerificationStatus::Pending, None).score.is_none());
    }

    #[test]
    fn test_score_width_is_clamped() {
        assert_eq!(score_view(Some(140.0)).unwrap().width, 100.0);
        assert_eq!(score_view(Some(-3.0)).unwrap().width, 0.0);
    }

    #[test]
    fn test_plate_match_rules() {
        assert_eq!(plate_match(Some(100.0)), Some(PlateMatch::Matches));
        assert_eq!(plate_match(Some(40.0)), Some(PlateMatch::Mismatch));
        assert_eq!(plate_match(Some(99.9)), Some(PlateMatch::Mismatch));
        assert_eq!(plate_match(None), None);
    }

    #[test]
    fn test_report_plate_mismatch_bands_as_danger() {
        let result = VerificationResult {
            ai_detected_plate_number: Some("CAB-1234".into()),
            plate_number_match_score: Some(40.0),
            ..Default::default()
        };
        let report = VerificationReport::build(VerificationStatus::ManualReview, Some(&result), true);
        let row = report.sub_scores.iter().find(|r| r.label == "Plate Number Match").unwrap();
        assert_eq!(row.plate, Some(PlateMatch::Mismatch));
        assert_eq!(row.score.severity, Severity::Danger);
        assert!(report.plate_mismatch());
        assert_eq!(report.detected[0].plate, Some(PlateMatch::Mismatch));

        let result = VerificationResult { plate_number_match_score: Some(100.0), ..Default::default() };
        let report = VerificationReport::build(VerificationStatus::Verified, Some(&result), true);
        assert_eq!(report.sub_scores[0].plate, Some(PlateMatch::Matches));
        assert!(!report.plate_mismatch());
    }

    #[test]
    fn test_report_skips_null_scores_and_empty_fields() {
        let result = VerificationResult {
            ai_detected_brand: Some("Toyota".into()),
            ai_detected_model: Some("   ".into()),
            brand_match_score: Some(90.0),
            model_match_score: None,
            fuel_type_match_score: Some(0.0),
            overall_confidence_score: Some(72.4),
            discrepancies: Some(vec!["Model mismatch".into(), "".into()]),
            ..Default::default()
        };
        let report = VerificationReport::build(VerificationStatus::Verified, Some(&result), true);
        assert_eq!(report.detected.len(), 1);
        let labels: Vec<&str> = report.sub_scores.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["Brand Match", "Fuel Type Match"]);
        assert_eq!(report.discrepancies, vec!["Model mismatch".to_string()]);
        assert_eq!(report.overall.as_ref().unwrap().text, "72.4%");
        assert!(report.interpretation.unwrap().starts_with("✓"));
        assert_eq!(report.actions, vec![ReportAction::ContinueToMyAds]);
    }

    #[test]
    fn test_failed_report_carries_error_details() {
        let result = VerificationResult {
            is_vehicle_image: Some(false),
            error_message: Some("No vehicle detected".into()),
            overall_confidence_score: Some(12.0),
            ..Default::default()
        };
        let report = VerificationReport::build(VerificationStatus::Failed, Some(&result), true);
        assert!(report.not_vehicle_image);
        assert_eq!(report.error_details.as_deref(), Some("No vehicle detected"));
        assert!(report.show_next_steps());
        assert_eq!(report.actions, vec![ReportAction::Retry, ReportAction::ReviewAndEdit]);

        // Same payload under a non-failed status does not raise the failure notices
        let report = VerificationReport::build(VerificationStatus::ManualReview, Some(&result), false);
        assert!(!report.not_vehicle_image);
        assert!(report.error_details.is_none());
        assert_eq!(report.actions, vec![ReportAction::ContinuePendingReview]);
    }

    #[test]
    fn test_report_without_result() {
        let report = VerificationReport::build(VerificationStatus::InProgress, None, true);
        assert!(report.header.show_spinner);
        assert!(report.overall.is_none());
        assert!(report.sub_scores.is_empty());
        assert_eq!(report.actions, vec![ReportAction::Refresh]);

        let report = VerificationReport::build(VerificationStatus::Unrecognized, None, true);
        assert_eq!(report.header.title, "Pending Verification");
        assert_eq!(report.actions, vec![ReportAction::VerifyNow, ReportAction::Close]);

        let report = VerificationReport::build(VerificationStatus::Pending, None, false);
        assert_eq!(report.actions, vec![ReportAction::Close]);
    }

    #[test]
    fn test_action_targets() {
        assert_eq!(ReportAction::Retry.href(4), "/vehicles/4/retry-verification");
        assert!(ReportAction::Retry.is_post());
        assert!(ReportAction::VerifyNow.is_post());
        assert_eq!(ReportAction::VerifyNow.href(4), "/vehicles/4/verify");
        assert_eq!(ReportAction::ReviewAndEdit.href(4), "/vehicles/4/edit");
        assert!(!ReportAction::ContinueToMyAds.is_post());
    }
}
