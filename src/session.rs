// Browser session: the backend-issued JWT kept in the `jwt` cookie, plus the request extractors built on it

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    extract::cookie::{Cookie, CookieJar, SameSite},
    TypedHeader,
};
use headers::{authorization::Bearer, Authorization};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{config::Settings, error::AppError, models::User, AppState};

/// Cookie name shared with the backend, which reads the same cookie on its own requests.
pub const SESSION_COOKIE: &str = "jwt";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
}

/// Local sanity check of a session token before it is forwarded anywhere.
///
/// With `jwt_secret` configured the HS256 signature is verified too; otherwise only the
/// expiry is looked at and the backend stays the authority on the signature.
pub fn check_token(token: &str, settings: &Settings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    let key = match settings.jwt_secret.as_deref() {
        Some(secret) => DecodingKey::from_secret(secret.as_bytes()),
        None => {
            validation.insecure_disable_signature_validation();
            DecodingKey::from_secret(&[])
        }
    };

    let decoded = decode::<Claims>(token, &key, &validation).map_err(|e| {
        debug!("Session token rejected: {}", e);
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::Unauthorized("Session expired".into()),
            _ => AppError::Unauthorized("Invalid session token".into()),
        }
    })?;
    Ok(decoded.claims)
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

// Cookie first (browser pages), then a Bearer header (scripts hitting the JSON routes)
async fn token_from_parts(parts: &mut Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }
    parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .ok()
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string())
}

/// Who is looking at the page. Anonymous when there is no usable session.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl AuthState {
    pub fn anonymous() -> Self {
        AuthState::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthState
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = token_from_parts(parts).await else {
            return Ok(AuthState::anonymous());
        };

        let app_state = AppState::from_ref(state);
        if check_token(&token, &app_state.settings).is_err() {
            return Ok(AuthState::anonymous());
        }

        // A stale or revoked session just means an anonymous visitor
        match app_state.api.current_user(&token).await {
            Ok(user) => Ok(AuthState { token: Some(token), user: Some(user) }),
            Err(e) => {
                if e.status().is_none() {
                    warn!("Could not resolve session user: {}", e);
                }
                Ok(AuthState::anonymous())
            }
        }
    }
}

/// Extractor for pages that need a signed-in user; anonymous visitors are sent to /login.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(auth) = AuthState::from_request_parts(parts, state).await;
        match (auth.user, auth.token) {
            (Some(user), Some(token)) => Ok(AuthenticatedUser { user, token }),
            _ => Err(AppError::LoginRequired),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::tests::spawn_backend;
    use axum::{
        http::{header::COOKIE, HeaderMap, Request, StatusCode},
        routing::get,
        Json, Router,
    };
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn now() -> usize {
        chrono::Utc::now().timestamp() as usize
    }

    fn token(secret: &str, exp: usize) -> String {
        let claims = Claims { id: 9, exp, iat: Some(now()) };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_check_token_without_secret_only_checks_expiry() {
        let settings = Settings::for_tests("http://backend");
        let claims = check_token(&token("whatever", now() + 3600), &settings).unwrap();
        assert_eq!(claims.id, 9);

        let err = check_token(&token("whatever", now() - 3600), &settings).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Session expired"));
    }

    #[test]
    fn test_check_token_with_secret_verifies_signature() {
        let mut settings = Settings::for_tests("http://backend");
        settings.jwt_secret = Some("s3cret".into());
        assert!(check_token(&token("s3cret", now() + 3600), &settings).is_ok());

        let err = check_token(&token("other", now() + 3600), &settings).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid session token"));
        assert!(check_token("not-a-jwt", &settings).is_err());
    }

    #[test]
    fn test_session_cookie_flags() {
        let cookie = session_cookie("abc".into(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    async fn app_state() -> AppState {
        let backend = Router::new().route(
            "/api/auth/user",
            get(|headers: HeaderMap| async move {
                let cookie = headers.get(COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
                if cookie.starts_with("jwt=") {
                    (StatusCode::OK, Json(serde_json::json!({"id": 9, "email": "kamal@example.lk", "name": "Kamal"})))
                } else {
                    (StatusCode::UNAUTHORIZED, Json(serde_json::json!({"detail": "Unauthenticated!"})))
                }
            }),
        );
        let base = spawn_backend(backend).await;
        AppState::new(Settings::for_tests(&base)).unwrap()
    }

    async fn extract(state: &AppState, request: Request<()>) -> AuthState {
        let (mut parts, _) = request.into_parts();
        let Ok(auth) = AuthState::from_request_parts(&mut parts, state).await;
        auth
    }

    #[tokio::test]
    async fn test_auth_state_from_cookie() {
        let state = app_state().await;
        let jwt = token("k", now() + 600);
        let request = Request::builder()
            .header(COOKIE, format!("theme=dark; jwt={jwt}"))
            .body(())
            .unwrap();
        let auth = extract(&state, request).await;
        assert!(auth.is_authenticated());
        assert_eq!(auth.user_id(), Some(9));
        assert_eq!(auth.token(), Some(jwt.as_str()));
    }

    #[tokio::test]
    async fn test_auth_state_from_bearer_header() {
        let state = app_state().await;
        let jwt = token("k", now() + 600);
        let request = Request::builder()
            .header("authorization", format!("Bearer {jwt}"))
            .body(())
            .unwrap();
        assert!(extract(&state, request).await.is_authenticated());
    }

    #[tokio::test]
    async fn test_expired_or_missing_session_is_anonymous() {
        let state = app_state().await;
        let request = Request::builder()
            .header(COOKIE, format!("jwt={}", token("k", now() - 3600)))
            .body(())
            .unwrap();
        assert!(!extract(&state, request).await.is_authenticated());

        let request = Request::builder().body(()).unwrap();
        let auth = extract(&state, request).await;
        assert!(auth.user.is_none());
        assert!(auth.token().is_none());
    }

    #[tokio::test]
    async fn test_authenticated_user_rejects_anonymous() {
        let state = app_state().await;
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let err = AuthenticatedUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, AppError::LoginRequired));
    }
}
