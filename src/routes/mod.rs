// Route definitions

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::AppState;

mod api;
mod auth;
mod listing_form;
mod pages;
mod verification;

// Listing forms carry photos; axum's 2 MB default is too small for phone pictures
const UPLOAD_LIMIT_BYTES: usize = 25 * 1024 * 1024;

pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/vehicles", get(api::list_vehicles))
        .route("/vehicles/:id/verification", get(api::verification))
        .route("/vehicles/:id/verification-history", get(api::verification_history));

    let form_router = Router::new()
        .route("/post", get(listing_form::new_listing_page).post(listing_form::submit_new_listing))
        .route(
            "/vehicles/:id/edit",
            get(listing_form::edit_listing_page).post(listing_form::submit_edit_listing),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES));

    Router::new()
        .route("/", get(pages::landing_page))
        .route("/vehicles", get(pages::browse_page))
        .route("/vehicles/:id", get(pages::vehicle_page))
        .route("/vehicles/:id/delete", post(pages::delete_listing))
        .route("/vehicles/:id/images/:image_id/delete", post(listing_form::delete_image))
        .route("/my-ads", get(pages::my_ads_page))
        .route("/vehicles/:id/verify", post(verification::verify))
        .route("/vehicles/:id/retry-verification", post(verification::retry))
        .route("/vehicles/:id/verification", get(verification::report_page))
        .route("/login", get(auth::login_page).post(auth::handle_login))
        .route("/register", get(auth::register_page).post(auth::handle_register))
        .route("/logout", post(auth::handle_logout))
        .route("/verify-email", get(auth::verify_email))
        .route(
            "/resend-verification",
            get(auth::resend_verification_page).post(auth::handle_resend_verification),
        )
        .merge(form_router)
        .nest("/api", api_router)
        .with_state(app_state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use reqwest::{redirect::Policy, Client, Response};

    use crate::{api_client::tests::spawn_backend, config::Settings, AppState};

    /// Front end served on a local port, talking to a fake backend.
    pub(crate) struct TestApp {
        base: String,
        client: Client,
    }

    impl TestApp {
        pub(crate) async fn with_backend(backend: Router) -> Self {
            let backend_url = spawn_backend(backend).await;
            let state = AppState::new(Settings::for_tests(&backend_url)).unwrap();
            let base = spawn_backend(super::create_router(state)).await;
            // Redirects are asserted on, not followed
            let client = Client::builder().redirect(Policy::none()).build().unwrap();
            TestApp { base, client }
        }

        pub(crate) async fn get(&self, path: &str, token: Option<&str>) -> Response {
            let mut request = self.client.get(format!("{}{}", self.base, path));
            if let Some(token) = token {
                request = request.header("cookie", format!("jwt={token}"));
            }
            request.send().await.unwrap()
        }

        pub(crate) async fn post_form(&self, path: &str, token: Option<&str>, form: &[(&str, &str)]) -> Response {
            let mut request = self.client.post(format!("{}{}", self.base, path)).form(form);
            if let Some(token) = token {
                request = request.header("cookie", format!("jwt={token}"));
            }
            request.send().await.unwrap()
        }

        pub(crate) fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        pub(crate) fn client(&self) -> &Client {
            &self.client
        }
    }

    pub(crate) fn location(response: &Response) -> &str {
        response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// Unsigned session token accepted by the local expiry check (no secret configured in tests).
    pub(crate) fn session_token(user_id: i64) -> String {
        let claims = crate::session::Claims {
            id: user_id,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            iat: None,
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"test"),
        )
        .unwrap()
    }

    /// `/api/auth/user` handler resolving any `jwt` cookie to user `user_id`.
    pub(crate) fn current_user_route(user_id: i64) -> Router {
        use axum::{http::HeaderMap, routing::get, Json};
        Router::new().route(
            "/api/auth/user",
            get(move |headers: HeaderMap| async move {
                let signed_in = headers
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| v.contains("jwt="));
                if signed_in {
                    Ok(Json(serde_json::json!({"id": user_id, "email": "owner@example.lk", "name": "Sunil"})))
                } else {
                    Err(axum::http::StatusCode::UNAUTHORIZED)
                }
            }),
        )
    }
}
