// Flat, template-ready views of listings and verification reports

use askama::Template;
use axum::response::Html;

use crate::{
    error::{AppError, AppResult},
    format::{format_date, format_price},
    models::{User, VehicleImage, VehicleListing, VerificationStatus},
    presenter::{describe, describe_detailed, score_view, ScoreView, Severity, StatusDescriptor, VerificationReport},
    session::AuthState,
};

pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Failed to render template: {}", e);
        AppError::InternalServerError(anyhow::Error::new(e))
    })
}

/// Navigation bar state plus an optional alert line, shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    pub signed_in: bool,
    pub user_name: String,
    pub alert: String,
    pub alert_kind: &'static str,
}

impl Chrome {
    pub fn new(auth: &AuthState) -> Self {
        Chrome {
            signed_in: auth.is_authenticated(),
            user_name: auth.user.as_ref().map(|u| u.display_name().to_string()).unwrap_or_default(),
            alert: String::new(),
            alert_kind: Severity::Info.css(),
        }
    }

    pub fn for_user(user: &User) -> Self {
        Chrome {
            signed_in: true,
            user_name: user.display_name().to_string(),
            alert: String::new(),
            alert_kind: Severity::Info.css(),
        }
    }

    pub fn with_alert(mut self, severity: Severity, message: impl Into<String>) -> Self {
        self.alert = message.into();
        self.alert_kind = severity.css();
        self
    }

    // `?notice=` codes set by redirects after a successful action
    pub fn with_notice(self, notice: Option<&str>) -> Self {
        let message = match notice.unwrap_or_default() {
            "posted" => "Vehicle posted successfully!",
            "updated" => "Vehicle updated successfully!",
            "deleted" => "Vehicle ad deleted successfully!",
            "signed_out" => "You have been signed out.",
            _ => return self,
        };
        self.with_alert(Severity::Success, message)
    }
}

// Score fields flattened for templates; `has_score` false renders nothing
#[derive(Debug, Clone, Default)]
pub struct ScoreBar {
    pub has_score: bool,
    pub text: String,
    pub css: &'static str,
    pub width: f64,
}

impl From<Option<&ScoreView>> for ScoreBar {
    fn from(score: Option<&ScoreView>) -> Self {
        match score {
            Some(score) => ScoreBar {
                has_score: true,
                text: score.text.clone(),
                css: score.severity.css(),
                width: score.width,
            },
            None => ScoreBar::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListingCard {
    pub id: i64,
    pub href: String,
    pub title: String,
    pub image_url: String,
    pub has_image: bool,
    pub year: String,
    pub tags: Vec<String>,
    pub city: String,
    pub mileage: String,
    pub engine_capacity: String,
    pub price: String,
    pub has_price: bool,
    pub posted: String,
    pub badge: StatusDescriptor,
    pub badge_detailed: StatusDescriptor,
    pub is_verified: bool,
    pub score: ScoreBar,
}

impl From<&VehicleListing> for ListingCard {
    fn from(listing: &VehicleListing) -> Self {
        let text = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
        let status = listing.status();
        let image_url = listing.display_image_url().unwrap_or_default().to_string();
        let tags = [&listing.vehicle_type, &listing.transmission, &listing.fuel_type]
            .into_iter()
            .flatten()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        ListingCard {
            id: listing.id,
            href: format!("/vehicles/{}", listing.id),
            title: listing.title(),
            has_image: !image_url.is_empty(),
            image_url,
            year: listing.year.map(|y| y.to_string()).unwrap_or_default(),
            tags,
            city: text(&listing.city),
            mileage: text(&listing.mileage),
            engine_capacity: text(&listing.engine_capacity),
            price: format_price(listing.price.as_deref()),
            has_price: listing.price.as_deref().is_some_and(|p| !p.trim().is_empty()),
            posted: format_date(listing.created_at.as_deref()),
            badge: describe(status),
            badge_detailed: describe_detailed(status),
            is_verified: status == VerificationStatus::Verified,
            score: ScoreBar::from(score_view(listing.verification_score).as_ref()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageView {
    pub id: i64,
    pub url: String,
    pub is_primary: bool,
}

pub fn image_views(images: &[VehicleImage]) -> Vec<ImageView> {
    images
        .iter()
        .filter_map(|img| {
            let url = img.image_url.as_deref().filter(|u| !u.is_empty())?;
            Some(ImageView { id: img.id, url: url.to_string(), is_primary: img.is_primary })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct DetectedRow {
    pub label: &'static str,
    pub value: String,
    pub note: &'static str,
    pub note_css: &'static str,
}

#[derive(Debug, Clone)]
pub struct ScoreRow {
    pub label: &'static str,
    pub score: ScoreBar,
    pub flag: &'static str,
    pub flag_css: &'static str,
}

#[derive(Debug, Clone)]
pub struct ActionButton {
    pub label: &'static str,
    pub href: String,
    pub is_post: bool,
    pub css: &'static str,
}

#[derive(Debug, Clone)]
pub struct ReportView {
    pub vehicle_id: i64,
    pub vehicle_title: String,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub icon: &'static str,
    pub css: &'static str,
    pub show_spinner: bool,
    pub overall: ScoreBar,
    pub interpretation: &'static str,
    pub detected: Vec<DetectedRow>,
    pub sub_scores: Vec<ScoreRow>,
    pub plate_mismatch: bool,
    pub discrepancies: Vec<String>,
    pub error_details: String,
    pub not_vehicle_image: bool,
    pub suggestions: String,
    pub show_next_steps: bool,
    pub attempts: String,
    pub actions: Vec<ActionButton>,
}

impl ReportView {
    pub fn new(listing: &VehicleListing, report: &VerificationReport, attempts: Option<u32>) -> Self {
        let plate_note = |plate: Option<crate::presenter::PlateMatch>| match plate {
            Some(p) if p.is_match() => (p.note(), "success"),
            Some(p) => (p.note(), "warning"),
            None => ("", ""),
        };

        ReportView {
            vehicle_id: listing.id,
            vehicle_title: listing.title(),
            title: report.header.title,
            subtitle: report.header.subtitle.unwrap_or_default(),
            icon: report.header.icon,
            css: report.header.severity.css(),
            show_spinner: report.header.show_spinner,
            overall: ScoreBar::from(report.overall.as_ref()),
            interpretation: report.interpretation.unwrap_or_default(),
            detected: report
                .detected
                .iter()
                .map(|d| {
                    let (note, note_css) = plate_note(d.plate);
                    DetectedRow { label: d.label, value: d.value.clone(), note, note_css }
                })
                .collect(),
            sub_scores: report
                .sub_scores
                .iter()
                .map(|row| {
                    let (flag, flag_css) = match row.plate {
                        Some(p) if p.is_match() => ("✓", "success"),
                        Some(_) => ("⚠", "warning"),
                        None => ("", ""),
                    };
                    ScoreRow { label: row.label, score: ScoreBar::from(Some(&row.score)), flag, flag_css }
                })
                .collect(),
            plate_mismatch: report.plate_mismatch(),
            discrepancies: report.discrepancies.clone(),
            error_details: report.error_details.clone().unwrap_or_default(),
            not_vehicle_image: report.not_vehicle_image,
            suggestions: report.suggestions.clone().unwrap_or_default(),
            show_next_steps: report.show_next_steps(),
            attempts: attempts.filter(|a| *a > 0).map(|a| a.to_string()).unwrap_or_default(),
            actions: report
                .actions
                .iter()
                .map(|action| ActionButton {
                    label: action.label(),
                    href: action.href(listing.id),
                    is_post: action.is_post(),
                    css: action.severity().css(),
                })
                .collect(),
        }
    }
}
