// Sign-in, registration and e-mail verification pages

use askama::Template;
use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    api_client::ApiError,
    error::AppResult,
    forms::{validate_registration, FormErrors},
    models::{LoginForm, RegisterForm},
    presenter::Severity,
    routes::pages::NoticeQuery,
    session::{clear_session, session_cookie, AuthState},
    views::{render, Chrome},
    AppState,
};

const AFTER_LOGIN: &str = "/vehicles";

// Backend rejections are shown on the form; everything else is a server error
fn inline_message(error: ApiError) -> AppResult<String> {
    match error {
        ApiError::Backend { message, .. } => Ok(message),
        other => Err(other.into()),
    }
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    chrome: Chrome,
    email: String,
}

pub async fn login_page(auth: AuthState, Query(notice): Query<NoticeQuery>) -> AppResult<Response> {
    if auth.is_authenticated() {
        return Ok(Redirect::to(AFTER_LOGIN).into_response());
    }
    let chrome = Chrome::new(&auth).with_notice(notice.notice.as_deref());
    Ok(render(&LoginTemplate { chrome, email: String::new() })?.into_response())
}

pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let chrome = Chrome::new(&AuthState::anonymous());
    if form.email.trim().is_empty() || form.password.is_empty() {
        let chrome = chrome.with_alert(Severity::Danger, "Please enter your email and password.");
        return Ok(render(&LoginTemplate { chrome, email: form.email })?.into_response());
    }

    match state.api.login(&form).await {
        Ok(token) => {
            let jar = jar.add(session_cookie(token, state.settings.cookie_secure));
            Ok((jar, Redirect::to(AFTER_LOGIN)).into_response())
        }
        Err(e) => {
            let message = inline_message(e)?;
            tracing::info!("Login rejected for {}: {}", form.email, message);
            let chrome = chrome.with_alert(Severity::Danger, message);
            Ok(render(&LoginTemplate { chrome, email: form.email })?.into_response())
        }
    }
}

pub async fn handle_logout(State(state): State<AppState>, auth: AuthState, jar: CookieJar) -> Response {
    if let Some(token) = auth.token() {
        // The cookie is cleared either way
        if let Err(e) = state.api.logout(token).await {
            tracing::warn!("Backend logout failed: {}", e);
        }
    }
    (clear_session(jar), Redirect::to("/login?notice=signed_out")).into_response()
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    chrome: Chrome,
    form: RegisterForm,
    errors: FormErrors,
    registered: bool,
}

pub async fn register_page(auth: AuthState) -> AppResult<Response> {
    if auth.is_authenticated() {
        return Ok(Redirect::to(AFTER_LOGIN).into_response());
    }
    Ok(render(&RegisterTemplate {
        chrome: Chrome::new(&auth),
        form: RegisterForm::default(),
        errors: FormErrors::default(),
        registered: false,
    })?
    .into_response())
}

pub async fn handle_register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> AppResult<Response> {
    let chrome = Chrome::new(&AuthState::anonymous());
    let errors = validate_registration(&form);
    if !errors.is_empty() {
        let page = RegisterTemplate { chrome, form: without_passwords(form), errors, registered: false };
        return Ok(render(&page)?.into_response());
    }

    match state.api.register(&form).await {
        Ok(_) => {
            tracing::info!("Registered new account for {}", form.email.trim());
            let page = RegisterTemplate {
                chrome,
                form: without_passwords(form),
                errors: FormErrors::default(),
                registered: true,
            };
            Ok(render(&page)?.into_response())
        }
        Err(e) => {
            let chrome = chrome.with_alert(Severity::Danger, inline_message(e)?);
            let page = RegisterTemplate { chrome, form: without_passwords(form), errors: FormErrors::default(), registered: false };
            Ok(render(&page)?.into_response())
        }
    }
}

// Passwords are never echoed back into the page
fn without_passwords(form: RegisterForm) -> RegisterForm {
    RegisterForm { password: String::new(), confirm_password: String::new(), ..form }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenQuery {
    token: Option<String>,
}

#[derive(Template)]
#[template(path = "verify_email.html")]
struct VerifyEmailTemplate {
    chrome: Chrome,
    outcome: &'static str,
    message: String,
}

pub async fn verify_email(auth: AuthState, State(state): State<AppState>, Query(query): Query<TokenQuery>) -> AppResult<Response> {
    let chrome = Chrome::new(&auth);
    let Some(token) = query.token.filter(|t| !t.trim().is_empty()) else {
        let message = "No verification token provided. Please check your email for the verification link.";
        return Ok(render(&VerifyEmailTemplate { chrome, outcome: "error", message: message.into() })?.into_response());
    };

    let (outcome, message) = match state.api.verify_email(token.trim()).await {
        Ok(response) => (
            "success",
            response
                .message
                .unwrap_or_else(|| "Email verified successfully! You can now log in.".to_string()),
        ),
        Err(e) => {
            let message = inline_message(e)?;
            if message.to_lowercase().contains("expired") {
                ("expired", "Verification token has expired. Please request a new verification email.".to_string())
            } else {
                ("error", message)
            }
        }
    };
    Ok(render(&VerifyEmailTemplate { chrome, outcome, message })?.into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailForm {
    email: String,
}

#[derive(Template)]
#[template(path = "resend_verification.html")]
struct ResendTemplate {
    chrome: Chrome,
    email: String,
    sent: bool,
}

pub async fn resend_verification_page(auth: AuthState, Query(prefill): Query<EmailForm>) -> AppResult<Response> {
    let page = ResendTemplate { chrome: Chrome::new(&auth), email: prefill.email, sent: false };
    Ok(render(&page)?.into_response())
}

pub async fn handle_resend_verification(
    auth: AuthState,
    State(state): State<AppState>,
    Form(form): Form<EmailForm>,
) -> AppResult<Response> {
    let chrome = Chrome::new(&auth);
    if form.email.trim().is_empty() {
        let chrome = chrome.with_alert(Severity::Danger, "Please enter your email address.");
        return Ok(render(&ResendTemplate { chrome, email: form.email, sent: false })?.into_response());
    }

    let page = match state.api.resend_verification(&form.email).await {
        Ok(response) => {
            let message = response
                .message
                .unwrap_or_else(|| "Verification email has been sent. Please check your inbox.".to_string());
            ResendTemplate { chrome: chrome.with_alert(Severity::Success, message), email: form.email, sent: true }
        }
        Err(e) => ResendTemplate {
            chrome: chrome.with_alert(Severity::Danger, inline_message(e)?),
            email: form.email,
            sent: false,
        },
    };
    Ok(render(&page)?.into_response())
}
