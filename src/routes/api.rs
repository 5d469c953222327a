// JSON endpoints: filtered listings and verification presentation

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Serialize;

use crate::{
    error::AppResult,
    filter::{apply_filters, FilterCriteria, FilterQuery},
    models::{VehicleListing, VerificationResult, VerificationStatus},
    presenter::{describe, present, score_view, Presentation, ScoreView, StatusDescriptor, VerificationReport},
    session::AuthState,
    AppState,
};

// --- Response Wrappers ---

#[derive(Serialize)]
pub struct ListingWithStatus {
    #[serde(flatten)]
    listing: VehicleListing,
    presentation: Presentation,
}

#[derive(Serialize)]
pub struct ListingsResponse {
    total: usize,
    count: usize,
    criteria: FilterCriteria,
    vehicles: Vec<ListingWithStatus>,
}

#[derive(Serialize)]
pub struct VerificationView {
    vehicle_id: i64,
    status: VerificationStatus,
    is_verified: bool,
    attempts: u32,
    last_verification: Option<String>,
    presentation: Presentation,
    report: VerificationReport,
}

#[derive(Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    result: VerificationResult,
    score: Option<ScoreView>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    vehicle_id: i64,
    total_attempts: u32,
    current_status: StatusDescriptor,
    is_verified: bool,
    results: Vec<HistoryEntry>,
}

// --- API Handlers ---

pub async fn list_vehicles(
    State(state): State<AppState>,
    auth: AuthState,
    Query(query): Query<FilterQuery>,
) -> AppResult<Json<ListingsResponse>> {
    let criteria = FilterCriteria::from(query);
    let listings = state.api.list_vehicles(auth.token(), false).await?;

    let vehicles: Vec<ListingWithStatus> = apply_filters(&listings, &criteria)
        .into_iter()
        .map(|listing| ListingWithStatus {
            presentation: present(listing.status(), listing.verification_score),
            listing: listing.clone(),
        })
        .collect();

    tracing::debug!("/api/vehicles returning {} of {} listings", vehicles.len(), listings.len());
    Ok(Json(ListingsResponse {
        total: listings.len(),
        count: vehicles.len(),
        criteria,
        vehicles,
    }))
}

pub async fn verification(
    State(state): State<AppState>,
    auth: AuthState,
    Path(id): Path<i64>,
) -> AppResult<Json<VerificationView>> {
    let (listing, snapshot) = futures::try_join!(
        state.api.get_vehicle(auth.token(), id),
        state.api.verification_status(auth.token(), id)
    )?;

    let status = snapshot
        .verification_status
        .or(listing.verification_status)
        .unwrap_or_default();
    let score = snapshot.verification_score.or(listing.verification_score);
    let is_owner = auth.user_id().is_some_and(|uid| listing.is_owned_by(uid));
    let result = snapshot.latest_result.map(VerificationResult::from);

    Ok(Json(VerificationView {
        vehicle_id: listing.id,
        status,
        is_verified: snapshot.is_verified,
        attempts: snapshot.attempts,
        last_verification: snapshot.last_verification,
        presentation: present(status, score),
        report: VerificationReport::build(status, result.as_ref(), is_owner),
    }))
}

pub async fn verification_history(
    State(state): State<AppState>,
    auth: AuthState,
    Path(id): Path<i64>,
) -> AppResult<Json<HistoryResponse>> {
    let history = state.api.verification_history(auth.token(), id).await?;

    Ok(Json(HistoryResponse {
        vehicle_id: history.vehicle_id,
        total_attempts: history.total_attempts,
        current_status: describe(history.current_status.unwrap_or_default()),
        is_verified: history.is_verified,
        results: history
            .results
            .into_iter()
            .map(|result| HistoryEntry { score: score_view(result.overall_confidence_score), result })
            .collect(),
    }))
}
