// Public and owner-facing listing pages

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;

use crate::{
    api_client::ApiClient,
    error::AppResult,
    filter::{apply_filters, FilterCriteria, FilterQuery},
    format::format_date,
    forms::{select_options, SelectOption, VEHICLE_TYPES},
    presenter::Severity,
    session::{AuthState, AuthenticatedUser},
    views::{image_views, render, Chrome, ImageView, ListingCard},
};

const RECENT_LISTINGS: usize = 6;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

pub struct CategoryLink {
    pub name: &'static str,
    pub icon: &'static str,
    pub href: &'static str,
}

const CATEGORY_LINKS: &[CategoryLink] = &[
    CategoryLink { name: "Cars", icon: "🚗", href: "/vehicles?vehicle_type=Car" },
    CategoryLink { name: "SUVs", icon: "🚙", href: "/vehicles?vehicle_type=SUV" },
    CategoryLink { name: "Vans", icon: "🚐", href: "/vehicles?vehicle_type=Van" },
    CategoryLink { name: "Bikes", icon: "🏍️", href: "/vehicles?vehicle_type=Bike" },
    CategoryLink { name: "Three-Wheels", icon: "🛺", href: "/vehicles?vehicle_type=Three-Wheeler" },
    CategoryLink { name: "Trucks", icon: "🚚", href: "/vehicles?vehicle_type=Truck" },
];

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    chrome: Chrome,
    categories: &'static [CategoryLink],
    recent: Vec<ListingCard>,
}

pub async fn landing_page(State(api): State<Arc<ApiClient>>, auth: AuthState) -> AppResult<Html<String>> {
    // The landing page degrades to an empty strip when the backend is down
    let recent = match api.list_vehicles(auth.token(), false).await {
        Ok(listings) => listings.iter().take(RECENT_LISTINGS).map(ListingCard::from).collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch recent listings: {}", e);
            Vec::new()
        }
    };

    render(&LandingTemplate {
        chrome: Chrome::new(&auth),
        categories: CATEGORY_LINKS,
        recent,
    })
}

#[derive(Template)]
#[template(path = "vehicles.html")]
struct BrowseTemplate {
    chrome: Chrome,
    cards: Vec<ListingCard>,
    total: usize,
    search: String,
    min_price: String,
    max_price: String,
    type_options: Vec<SelectOption>,
    is_filtered: bool,
    load_failed: bool,
}

pub async fn browse_page(
    State(api): State<Arc<ApiClient>>,
    auth: AuthState,
    Query(query): Query<FilterQuery>,
) -> AppResult<Html<String>> {
    let min_price = query.min_price.clone().unwrap_or_default();
    let max_price = query.max_price.clone().unwrap_or_default();
    let criteria = FilterCriteria::from(query);

    let (listings, load_failed) = match api.list_vehicles(auth.token(), false).await {
        Ok(listings) => (listings, false),
        Err(e) => {
            tracing::error!("Failed to load vehicles: {}", e);
            (Vec::new(), true)
        }
    };
    let cards = apply_filters(&listings, &criteria).into_iter().map(ListingCard::from).collect();

    let mut chrome = Chrome::new(&auth);
    if load_failed {
        chrome = chrome.with_alert(Severity::Danger, "Failed to load vehicles. Please try again later.");
    }

    render(&BrowseTemplate {
        chrome,
        cards,
        total: listings.len(),
        type_options: select_options(VEHICLE_TYPES, &criteria.vehicle_type, Some("All Types")),
        search: criteria.search_term.clone(),
        min_price,
        max_price,
        is_filtered: !criteria.is_empty(),
        load_failed,
    })
}

pub struct SpecRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Template)]
#[template(path = "vehicle_detail.html")]
struct VehicleTemplate {
    chrome: Chrome,
    card: ListingCard,
    images: Vec<ImageView>,
    specs: Vec<SpecRow>,
    description: String,
    updated: String,
    is_owner: bool,
}

pub async fn vehicle_page(
    State(api): State<Arc<ApiClient>>,
    auth: AuthState,
    Path(id): Path<i64>,
    Query(notice): Query<NoticeQuery>,
) -> AppResult<Html<String>> {
    let listing = api.get_vehicle(auth.token(), id).await?;
    let is_owner = auth.user_id().is_some_and(|uid| listing.is_owned_by(uid));

    let mut specs: Vec<SpecRow> = [
        ("Manufacturer", listing.manufacturer.clone()),
        ("Model", listing.model.clone()),
        ("Year", listing.year.map(|y| y.to_string())),
        ("Vehicle Type", listing.vehicle_type.clone()),
        ("Transmission", listing.transmission.clone()),
        ("Fuel Type", listing.fuel_type.clone()),
        ("Engine Capacity", listing.engine_capacity.clone()),
        ("Mileage", listing.mileage.clone()),
        ("City", listing.city.clone()),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
        Some(SpecRow { label, value })
    })
    .collect();
    // Plate numbers are only shown back to the seller
    if is_owner {
        if let Some(plate) = listing.plate_number.as_deref().filter(|p| !p.trim().is_empty()) {
            specs.push(SpecRow { label: "Plate Number", value: plate.to_string() });
        }
    }

    let updated = if listing.updated_at.is_some() && listing.updated_at != listing.created_at {
        format_date(listing.updated_at.as_deref())
    } else {
        String::new()
    };

    render(&VehicleTemplate {
        chrome: Chrome::new(&auth).with_notice(notice.notice.as_deref()),
        card: ListingCard::from(&listing),
        images: image_views(&listing.images),
        specs,
        description: listing.description.clone().unwrap_or_default(),
        updated,
        is_owner,
    })
}

#[derive(Template)]
#[template(path = "my_ads.html")]
struct MyAdsTemplate {
    chrome: Chrome,
    cards: Vec<ListingCard>,
    load_failed: bool,
}

pub async fn my_ads_page(
    State(api): State<Arc<ApiClient>>,
    user: AuthenticatedUser,
    Query(notice): Query<NoticeQuery>,
) -> AppResult<Html<String>> {
    let mut chrome = Chrome::for_user(&user.user).with_notice(notice.notice.as_deref());
    let (cards, load_failed) = match api.list_vehicles(Some(&user.token), true).await {
        Ok(listings) => (listings.iter().map(ListingCard::from).collect(), false),
        Err(e) => {
            tracing::error!("Failed to load listings of user {}: {}", user.user.id, e);
            chrome = chrome.with_alert(Severity::Danger, "Failed to load your vehicles. Please try again later.");
            (Vec::new(), true)
        }
    };

    render(&MyAdsTemplate { chrome, cards, load_failed })
}

pub async fn delete_listing(
    State(api): State<Arc<ApiClient>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    api.delete_vehicle(&user.token, id).await?;
    tracing::info!("User {} deleted listing {}", user.user.id, id);
    Ok(Redirect::to("/my-ads?notice=deleted"))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{current_user_route, location, session_token, TestApp};
    use axum::{
        http::StatusCode,
        routing::{delete, get},
        Json, Router,
    };
    use scraper::{Html as Document, Selector};

    fn backend() -> Router {
        Router::new()
            .route(
                "/api/vehicles/",
                get(|| async {
                    Json(serde_json::json!([
                        {"id": 1, "manufacturer": "Toyota", "model": "Prius", "city": "Colombo", "vehicle_type": "Car",
                         "mileage": "45000", "engine_capacity": "1800cc", "price": "2500000.00", "verification_status": "verified", "verification_score": 91.0, "posted_by": 4},
                        {"id": 2, "manufacturer": "Honda", "model": "Vezel", "city": "Kandy", "vehicle_type": "SUV",
                         "price": "abc", "verification_status": "mystery"},
                        {"id": 3, "manufacturer": "Nissan", "model": "Caravan", "city": "Galle", "vehicle_type": "Van",
                         "price": "6400000", "verification_status": "failed", "verification_score": 31.5}
                    ]))
                }),
            )
            .route(
                "/api/vehicles/1/",
                get(|| async {
                    Json(serde_json::json!({
                        "id": 1, "manufacturer": "Toyota", "model": "Prius", "plate_number": "CAB-1234",
                        "posted_by": 4, "verification_status": "manual_review", "verification_score": 62.0,
                        "created_at": "2026-10-01T10:00:00Z", "updated_at": "2026-10-02T10:00:00Z"
                    }))
                })
                .delete(|| async { StatusCode::NO_CONTENT }),
            )
            .route("/api/vehicles/9/", delete(|| async { StatusCode::FORBIDDEN }))
            .merge(current_user_route(4))
    }

    fn select_texts(html: &str, selector: &str) -> Vec<String> {
        let doc = Document::parse_document(html);
        let sel = Selector::parse(selector).unwrap();
        doc.select(&sel).map(|e| e.text().collect::<String>().trim().to_string()).collect()
    }

    #[tokio::test]
    async fn test_browse_filters_and_counts() {
        let app = TestApp::with_backend(backend()).await;
        let response = app.get("/vehicles?search=o&max_price=3000000", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = response.text().await.unwrap();

        // "abc" prices compare as 0, so the Honda passes the max-only bound
        let titles = select_texts(&html, ".card .card-title");
        assert_eq!(titles, vec!["Toyota Prius", "Honda Vezel"]);
        assert!(select_texts(&html, ".results-count")[0].contains("Showing 2 of 3"));

        let badges = select_texts(&html, ".card .badge");
        assert!(badges[0].contains("Verified"));
        assert!(badges[1].contains("Pending"));
    }

    #[tokio::test]
    async fn test_card_shows_mileage_and_engine_capacity() {
        let app = TestApp::with_backend(backend()).await;
        let html = app.get("/vehicles?search=Prius", None).await.text().await.unwrap();
        let specs = select_texts(&html, ".card .card-spec");
        assert_eq!(specs.len(), 2);
        assert!(specs[0].ends_with("45000 km"));
        assert!(specs[1].ends_with("1800cc"));

        // Listings without either value render no spec line
        let html = app.get("/vehicles?search=Vezel", None).await.text().await.unwrap();
        assert!(select_texts(&html, ".card .card-specs").is_empty());
    }

    #[tokio::test]
    async fn test_browse_type_alias_and_empty_state() {
        let app = TestApp::with_backend(backend()).await;
        let html = app.get("/vehicles?type=lorry", None).await.text().await.unwrap();
        assert!(select_texts(&html, ".card").is_empty());
        assert!(html.contains("No vehicles found"));
    }

    #[tokio::test]
    async fn test_browse_backend_down_shows_alert() {
        let app = TestApp::with_backend(Router::new()).await;
        let html = app.get("/vehicles", None).await.text().await.unwrap();
        assert!(html.contains("Failed to load vehicles"));
    }

    #[tokio::test]
    async fn test_detail_shows_plate_only_to_owner() {
        let app = TestApp::with_backend(backend()).await;
        let html = app.get("/vehicles/1", None).await.text().await.unwrap();
        assert!(!html.contains("CAB-1234"));
        assert!(select_texts(&html, ".badge")[0].contains("Under Review"));
        assert!(html.contains("62.0%"));

        let html = app.get("/vehicles/1", Some(&session_token(4))).await.text().await.unwrap();
        assert!(html.contains("CAB-1234"));
        assert!(html.contains("/vehicles/1/edit"));
        assert!(html.contains("Updated: October 2, 2026"));
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let app = TestApp::with_backend(backend()).await;
        assert_eq!(app.get("/vehicles/77", None).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_my_ads_requires_login() {
        let app = TestApp::with_backend(backend()).await;
        let response = app.get("/my-ads", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_delete_redirects_with_notice() {
        let app = TestApp::with_backend(backend()).await;
        let response = app.post_form("/vehicles/1/delete", Some(&session_token(4)), &[]).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/my-ads?notice=deleted");

        let response = app.post_form("/vehicles/9/delete", Some(&session_token(4)), &[]).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
