// AI verification: trigger, retry and report pages

use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};

use crate::{
    api_client::ApiError,
    error::AppResult,
    models::{User, VerificationResult},
    presenter::{Severity, VerificationReport},
    session::{AuthState, AuthenticatedUser},
    views::{render, Chrome, ReportView},
    AppState,
};

const ALREADY_RUNNING: &str = "Verification is already running for this listing. Please wait for it to finish.";

#[derive(Template)]
#[template(path = "verification.html")]
struct VerificationTemplate {
    chrome: Chrome,
    report: ReportView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retry,
}

pub async fn verify(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    run_verification(&state, &user, id, Attempt::First).await
}

pub async fn retry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    run_verification(&state, &user, id, Attempt::Retry).await
}

pub async fn report_page(
    State(state): State<AppState>,
    auth: AuthState,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    let mut chrome = Chrome::new(&auth);
    if state.verifications.is_running(id) {
        chrome = chrome.with_alert(Severity::Info, "A verification for this listing is running. Check again shortly.");
    }
    current_report(&state, auth.user.as_ref(), auth.token(), id, chrome).await
}

/// Runs one verification pass for listing `id` and renders the resulting report.
///
/// At most one pass per listing is in flight; a repeated submit gets the current report
/// with a notice instead of a second backend call.
pub async fn run_verification(
    state: &AppState,
    user: &AuthenticatedUser,
    id: i64,
    attempt: Attempt,
) -> AppResult<Html<String>> {
    let chrome = Chrome::for_user(&user.user);
    let Some(_running) = state.verifications.try_begin(id) else {
        let chrome = chrome.with_alert(Severity::Warning, ALREADY_RUNNING);
        return current_report(state, Some(&user.user), Some(&user.token), id, chrome).await;
    };

    tracing::info!("User {} requested verification of listing {} ({:?})", user.user.id, id, attempt);
    let outcome = match attempt {
        Attempt::First => state.api.verify_vehicle(&user.token, id).await,
        Attempt::Retry => state.api.retry_verification(&user.token, id).await,
    };

    match outcome {
        Ok(response) => {
            let listing = state.api.get_vehicle(Some(&user.token), id).await?;
            let status = response.verification_status.unwrap_or_else(|| listing.status());
            tracing::info!("Listing {} verification finished with status {:?}", id, status);
            let report = VerificationReport::build(
                status,
                response.verification_result.as_ref(),
                listing.is_owned_by(user.user.id),
            );
            render(&VerificationTemplate {
                chrome,
                report: ReportView::new(&listing, &report, response.attempts),
            })
        }
        // No images, already running on the backend, not the owner, AI failure: show it on the report
        Err(ApiError::Backend { status, message }) if status != StatusCode::UNAUTHORIZED && status != StatusCode::NOT_FOUND => {
            tracing::warn!("Verification of listing {} rejected ({}): {}", id, status, message);
            let chrome = chrome.with_alert(Severity::Danger, message);
            current_report(state, Some(&user.user), Some(&user.token), id, chrome).await
        }
        Err(e) => Err(e.into()),
    }
}

// Report built from the backend's stored verification state
async fn current_report(
    state: &AppState,
    viewer: Option<&User>,
    token: Option<&str>,
    id: i64,
    chrome: Chrome,
) -> AppResult<Html<String>> {
    let (listing, snapshot) = futures::try_join!(
        state.api.get_vehicle(token, id),
        state.api.verification_status(token, id)
    )?;

    let status = snapshot
        .verification_status
        .or(listing.verification_status)
        .unwrap_or_default();
    let result = snapshot.latest_result.map(VerificationResult::from);
    let is_owner = viewer.is_some_and(|u| listing.is_owned_by(u.id));
    let report = VerificationReport::build(status, result.as_ref(), is_owner);

    render(&VerificationTemplate {
        chrome,
        report: ReportView::new(&listing, &report, Some(snapshot.attempts)),
    })
}
