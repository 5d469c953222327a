// Data structures exchanged with the listings backend

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Backend-assigned state of the AI image/data cross-check for a listing.
// Values this front end does not know yet land in `Unrecognized` instead of failing the whole payload.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    InProgress,
    ManualReview,
    Verified,
    Failed,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VehicleImage {
    pub id: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

// A single vehicle-for-sale record as served by GET /api/vehicles/
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct VehicleListing {
    pub id: i64,
    pub posted_by: Option<i64>,
    pub category: Option<i64>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub city: Option<String>,
    pub plate_number: Option<String>,
    pub year: Option<i32>,
    pub vehicle_type: Option<String>,
    pub engine_capacity: Option<String>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub mileage: Option<String>,
    #[serde(deserialize_with = "decimal_as_string")]
    pub price: Option<String>, // Decimal serialized as string, e.g. "2500000.00"
    pub description: Option<String>,
    pub images: Vec<VehicleImage>,
    pub primary_image: Option<VehicleImage>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub verification_status: Option<VerificationStatus>,
    pub verification_score: Option<f64>,
}

impl VehicleListing {
    pub fn status(&self) -> VerificationStatus {
        self.verification_status.unwrap_or_default()
    }

    pub fn title(&self) -> String {
        let parts: Vec<&str> = [self.manufacturer.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            "Untitled listing".to_string()
        } else {
            parts.join(" ")
        }
    }

    // Primary image first, then the first uploaded image
    pub fn display_image_url(&self) -> Option<&str> {
        self.primary_image
            .as_ref()
            .and_then(|img| img.image_url.as_deref())
            .or_else(|| self.images.first().and_then(|img| img.image_url.as_deref()))
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.posted_by == Some(user_id)
    }
}

// Backends configured without decimal coercion send prices as JSON numbers
fn decimal_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// Detailed AI verification output, one row per verification attempt
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct VerificationResult {
    pub id: Option<i64>,
    pub ai_detected_brand: Option<String>,
    pub ai_detected_model: Option<String>,
    pub ai_detected_vehicle_type: Option<String>,
    pub ai_detected_fuel_type: Option<String>,
    pub ai_detected_year: Option<String>,
    pub ai_detected_plate_number: Option<String>,
    pub brand_match_score: Option<f64>,
    pub model_match_score: Option<f64>,
    pub vehicle_type_match_score: Option<f64>,
    pub fuel_type_match_score: Option<f64>,
    pub plate_number_match_score: Option<f64>,
    pub image_quality_score: Option<f64>,
    pub overall_confidence_score: Option<f64>,
    pub is_vehicle_image: Option<bool>,
    pub images_analyzed_count: Option<u32>,
    pub ai_suggestions: Option<String>,
    pub discrepancies: Option<Vec<String>>,
    pub verification_passed: Option<bool>,
    pub requires_manual_review: Option<bool>,
    pub error_message: Option<String>,
    pub created_at: Option<String>,
}

// Body of POST /verify/ and /retry-verification/
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct VerificationResponse {
    pub success: bool,
    pub message: Option<String>,
    pub verification_status: Option<VerificationStatus>,
    pub attempts: Option<u32>,
    pub verification_result: Option<VerificationResult>,
}

// Condensed latest result as embedded in GET /verification-status/
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct LatestVerification {
    pub id: Option<i64>,
    pub detected_brand: Option<String>,
    pub detected_model: Option<String>,
    pub detected_type: Option<String>,
    pub detected_fuel_type: Option<String>,
    pub confidence_score: Option<f64>,
    pub passed: Option<bool>,
    pub requires_manual_review: Option<bool>,
    pub discrepancies: Option<Vec<String>>,
    pub suggestions: Option<String>,
    pub created_at: Option<String>,
}

impl From<LatestVerification> for VerificationResult {
    fn from(latest: LatestVerification) -> Self {
        VerificationResult {
            id: latest.id,
            ai_detected_brand: latest.detected_brand,
            ai_detected_model: latest.detected_model,
            ai_detected_vehicle_type: latest.detected_type,
            ai_detected_fuel_type: latest.detected_fuel_type,
            overall_confidence_score: latest.confidence_score,
            verification_passed: latest.passed,
            requires_manual_review: latest.requires_manual_review,
            discrepancies: latest.discrepancies,
            ai_suggestions: latest.suggestions,
            created_at: latest.created_at,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct VerificationSnapshot {
    pub vehicle_id: i64,
    pub verification_status: Option<VerificationStatus>,
    pub is_verified: bool,
    pub verification_score: Option<f64>,
    pub attempts: u32,
    pub last_verification: Option<String>,
    pub latest_result: Option<LatestVerification>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct VerificationHistory {
    pub vehicle_id: i64,
    pub total_attempts: u32,
    pub current_status: Option<VerificationStatus>,
    pub is_verified: bool,
    pub results: Vec<VerificationResult>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

// Login form fields; also the JSON body sent to /api/auth/login
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub jwt: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    pub password: String,
    #[serde(default, rename = "confirmPassword")]
    pub confirm_password: String,
}

// Generic { message } body returned by logout, register and the e-mail endpoints
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MessageResponse {
    pub message: Option<String>,
}
