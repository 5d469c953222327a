// Client for the listings backend REST API (auth, vehicles, images, AI verification)

use std::time::Duration;

use anyhow::Context;
use cached::{Cached, TimedCache};
use reqwest::{
    header::COOKIE,
    multipart::{Form, Part},
    Client, Method, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    forms::{ImageUpload, VehicleForm},
    models::{
        Category, LoginForm, LoginResponse, MessageResponse, RegisterForm, User, VehicleListing,
        VerificationHistory, VerificationResponse, VerificationSnapshot,
    },
    session::SESSION_COOKIE,
};

const GENERIC_FAILURE: &str = "API request failed";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not reach the listings service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Backend { status: StatusCode, message: String },

    #[error("Unexpected response from the listings service: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::Decode(_) => None,
        }
    }
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    categories: Mutex<TimedCache<(), Vec<Category>>>,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("vehicle_market/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build backend reqwest client")?;
        Ok(Self::with_client(http, &settings.api_base_url, settings.categories_cache_secs))
    }

    pub fn with_client(http: Client, base_url: &str, categories_cache_secs: u64) -> Self {
        ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            categories: Mutex::new(TimedCache::with_lifespan(categories_cache_secs)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // The backend reads the session from its `jwt` cookie, so the token travels as a Cookie header
    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match token {
            Some(token) => builder.header(COOKIE, format!("{SESSION_COOKIE}={token}")),
            None => builder,
        }
    }

    /// Sends the request and returns the raw body of a successful response.
    async fn execute(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();

        if status == StatusCode::NO_CONTENT {
            debug!("{} -> 204 No Content", url);
            return Ok(String::new());
        }

        let body = response.text().await?;
        if status.is_success() {
            debug!("{} -> {}", url, status);
            return Ok(body);
        }

        let message = extract_message(&body);
        // 401 is the normal answer for anonymous visitors
        if status == StatusCode::UNAUTHORIZED {
            debug!("{} -> 401: {}", url, message);
        } else {
            warn!("Backend error on {} ({}): {}", url, status, message);
        }
        Err(ApiError::Backend { status, message })
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(builder).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    // --- Auth ---

    pub async fn register(&self, form: &RegisterForm) -> Result<MessageResponse, ApiError> {
        let payload = json!({
            "name": form.name.trim(),
            "email": form.email.trim(),
            "phone_number": form.phone_number.trim(),
            "password": form.password,
        });
        self.fetch(self.request(Method::POST, "/api/auth/register", None).json(&payload)).await
    }

    /// Returns the session token issued by the backend.
    pub async fn login(&self, form: &LoginForm) -> Result<String, ApiError> {
        let response: LoginResponse = self
            .fetch(self.request(Method::POST, "/api/auth/login", None).json(form))
            .await?;
        info!("Backend issued a session for {}", form.email);
        Ok(response.jwt)
    }

    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, "/api/auth/logout", Some(token))).await?;
        Ok(())
    }

    pub async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        self.fetch(self.request(Method::GET, "/api/auth/user", Some(token))).await
    }

    pub async fn verify_email(&self, verification_token: &str) -> Result<MessageResponse, ApiError> {
        let builder = self
            .request(Method::GET, "/api/auth/verify-email", None)
            .query(&[("token", verification_token)]);
        self.fetch(builder).await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let payload = json!({ "email": email.trim() });
        self.fetch(self.request(Method::POST, "/api/auth/resend-verification", None).json(&payload))
            .await
    }

    // --- Vehicles ---

    /// All public listings, or only the caller's own when `mine` is set.
    pub async fn list_vehicles(&self, token: Option<&str>, mine: bool) -> Result<Vec<VehicleListing>, ApiError> {
        let path = if mine { "/api/vehicles/?mine=true" } else { "/api/vehicles/" };
        let listings: Vec<VehicleListing> = self.fetch(self.request(Method::GET, path, token)).await?;
        debug!("Fetched {} listings (mine: {})", listings.len(), mine);
        Ok(listings)
    }

    pub async fn get_vehicle(&self, token: Option<&str>, id: i64) -> Result<VehicleListing, ApiError> {
        self.fetch(self.request(Method::GET, &format!("/api/vehicles/{id}/"), token)).await
    }

    pub async fn create_vehicle(
        &self,
        token: &str,
        form: &VehicleForm,
        images: Vec<ImageUpload>,
    ) -> Result<VehicleListing, ApiError> {
        let multipart = listing_multipart(form, images)?;
        let builder = self.request(Method::POST, "/api/vehicles/", Some(token)).multipart(multipart);
        let created: VehicleListing = self.fetch(builder).await?;
        info!("Created listing {} ({})", created.id, created.title());
        Ok(created)
    }

    pub async fn update_vehicle(
        &self,
        token: &str,
        id: i64,
        form: &VehicleForm,
        images: Vec<ImageUpload>,
    ) -> Result<VehicleListing, ApiError> {
        let multipart = listing_multipart(form, images)?;
        let builder = self
            .request(Method::PUT, &format!("/api/vehicles/{id}/"), Some(token))
            .multipart(multipart);
        let updated: VehicleListing = self.fetch(builder).await?;
        info!("Updated listing {}", id);
        Ok(updated)
    }

    pub async fn delete_vehicle(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.execute(self.request(Method::DELETE, &format!("/api/vehicles/{id}/"), Some(token)))
            .await?;
        info!("Deleted listing {}", id);
        Ok(())
    }

    pub async fn delete_vehicle_image(&self, token: &str, image_id: i64) -> Result<(), ApiError> {
        self.execute(self.request(Method::DELETE, &format!("/api/vehicles/images/{image_id}/"), Some(token)))
            .await?;
        Ok(())
    }

    /// Vehicle categories; served from a TTL cache since they change rarely.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let mut cache = self.categories.lock().await;
        if let Some(categories) = cache.cache_get(&()) {
            debug!("Using cached vehicle categories.");
            return Ok(categories.clone());
        }

        let categories: Vec<Category> = self
            .fetch(self.request(Method::GET, "/api/vehicles/categories/", None))
            .await?;
        info!("Fetched and cached {} vehicle categories.", categories.len());
        cache.cache_set((), categories.clone());
        Ok(categories)
    }

    // --- Verification ---

    pub async fn verify_vehicle(&self, token: &str, id: i64) -> Result<VerificationResponse, ApiError> {
        self.fetch(self.request(Method::POST, &format!("/api/vehicles/{id}/verify/"), Some(token)))
            .await
    }

    pub async fn retry_verification(&self, token: &str, id: i64) -> Result<VerificationResponse, ApiError> {
        let path = format!("/api/vehicles/{id}/retry-verification/");
        self.fetch(self.request(Method::POST, &path, Some(token))).await
    }

    pub async fn verification_status(&self, token: Option<&str>, id: i64) -> Result<VerificationSnapshot, ApiError> {
        let path = format!("/api/vehicles/{id}/verification-status/");
        self.fetch(self.request(Method::GET, &path, token)).await
    }

    pub async fn verification_history(&self, token: Option<&str>, id: i64) -> Result<VerificationHistory, ApiError> {
        let path = format!("/api/vehicles/{id}/verification-history/");
        self.fetch(self.request(Method::GET, &path, token)).await
    }
}

// Text fields plus one `images` part per uploaded file; the first image becomes the primary one
fn listing_multipart(form: &VehicleForm, images: Vec<ImageUpload>) -> Result<Form, ApiError> {
    let mut multipart = Form::new();
    for (name, value) in form.fields() {
        multipart = multipart.text(name, value);
    }
    for image in images {
        let mut part = Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(content_type) = image.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        multipart = multipart.part("images", part);
    }
    Ok(multipart)
}

/// Human-readable message of an error body.
///
/// Looks at `detail`, `message` and `error` in that order, then at field-keyed validation errors
/// such as `{"plate_number": ["vehicle with this plate number already exists."]}`.
pub fn extract_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return GENERIC_FAILURE.to_string();
    };

    for key in ["detail", "message", "error"] {
        if let Some(message) = value.get(key).and_then(message_text) {
            return message;
        }
    }

    if let Some(fields) = value.as_object() {
        let parts: Vec<String> = fields
            .iter()
            .filter_map(|(field, v)| message_text(v).map(|m| format!("{field}: {m}")))
            .collect();
        if !parts.is_empty() {
            return parts.join("; ");
        }
    }
    GENERIC_FAILURE.to_string()
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let texts: Vec<String> = items.iter().filter_map(message_text).collect();
            if texts.is_empty() { None } else { Some(texts.join(" ")) }
        }
        _ => None,
    }
}
