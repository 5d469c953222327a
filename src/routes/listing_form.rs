// Post and edit listing forms (multipart, with photos)

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Datelike;

use crate::{
    api_client::ApiError,
    error::{AppError, AppResult},
    forms::{FormErrors, ImageUpload, SelectOption, VehicleForm},
    models::{Category, VehicleListing},
    presenter::Severity,
    routes::verification::{run_verification, Attempt},
    session::AuthenticatedUser,
    views::{image_views, render, Chrome, ImageView},
    AppState,
};

#[derive(Template)]
#[template(path = "vehicle_form.html")]
struct ListingFormTemplate {
    chrome: Chrome,
    heading: &'static str,
    action: String,
    submit_label: &'static str,
    is_edit: bool,
    vehicle_id: i64,
    form: VehicleForm,
    errors: FormErrors,
    type_options: Vec<SelectOption>,
    transmission_options: Vec<SelectOption>,
    fuel_options: Vec<SelectOption>,
    category_options: Vec<SelectOption>,
    existing_images: Vec<ImageView>,
}

fn category_options(categories: &[Category], current: &str) -> Vec<SelectOption> {
    let mut options = vec![SelectOption {
        value: String::new(),
        label: "Select category".to_string(),
        selected: current.trim().is_empty(),
    }];
    options.extend(categories.iter().map(|c| SelectOption {
        value: c.id.to_string(),
        label: c.name.clone(),
        selected: c.id.to_string() == current.trim(),
    }));
    options
}

// Which form is being shown: a new listing, or an existing one being edited
enum Target<'a> {
    New,
    Existing(&'a VehicleListing),
}

struct FormPage {
    chrome: Chrome,
    form: VehicleForm,
    errors: FormErrors,
}

async fn render_form(state: &AppState, target: Target<'_>, page: FormPage) -> AppResult<Response> {
    // Category lookup is optional; the backend accepts listings without one
    let categories = state.api.categories().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to load vehicle categories: {}", e);
        Vec::new()
    });

    let (heading, action, submit_label, vehicle_id, existing_images) = match target {
        Target::New => ("Post Your Vehicle", "/post".to_string(), "Post Vehicle", 0, Vec::new()),
        Target::Existing(listing) => (
            "Edit Vehicle",
            format!("/vehicles/{}/edit", listing.id),
            "Save Changes",
            listing.id,
            image_views(&listing.images),
        ),
    };

    let status = if page.errors.is_empty() { StatusCode::OK } else { StatusCode::UNPROCESSABLE_ENTITY };
    let template = ListingFormTemplate {
        chrome: page.chrome,
        heading,
        action,
        submit_label,
        is_edit: vehicle_id != 0,
        vehicle_id,
        type_options: page.form.vehicle_type_options(),
        transmission_options: page.form.transmission_options(),
        fuel_options: page.form.fuel_type_options(),
        category_options: category_options(&categories, &page.form.category),
        form: page.form,
        errors: page.errors,
        existing_images,
    };
    Ok((status, render(&template)?).into_response())
}

async fn read_listing_form(mut multipart: Multipart) -> AppResult<(VehicleForm, Vec<ImageUpload>)> {
    let bad_request = |e: axum::extract::multipart::MultipartError| {
        tracing::warn!("Malformed listing form: {}", e);
        AppError::BadRequest("Invalid form submission".into())
    };

    let mut form = VehicleForm::default();
    let mut images = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "images" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(bad_request)?;
            // An untouched file input still sends an empty part
            if bytes.is_empty() {
                continue;
            }
            images.push(ImageUpload {
                file_name: if file_name.is_empty() { format!("image-{}", images.len() + 1) } else { file_name },
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(bad_request)?;
            if !form.set_field(&name, value) {
                tracing::debug!("Ignoring unknown listing field '{}'", name);
            }
        }
    }
    Ok((form, images))
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

// Rejections the seller can fix are shown on the form
fn form_rejection(error: ApiError) -> AppResult<String> {
    match error {
        ApiError::Backend { status, message } if status.is_client_error() && status != StatusCode::UNAUTHORIZED => {
            Ok(message)
        }
        other => Err(other.into()),
    }
}

pub async fn new_listing_page(State(state): State<AppState>, user: AuthenticatedUser) -> AppResult<Response> {
    let page = FormPage {
        chrome: Chrome::for_user(&user.user),
        form: VehicleForm::default(),
        errors: FormErrors::default(),
    };
    render_form(&state, Target::New, page).await
}

pub async fn submit_new_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let (form, images) = read_listing_form(multipart).await?;
    let chrome = Chrome::for_user(&user.user);

    let errors = form.validate(current_year());
    if !errors.is_empty() {
        let chrome = chrome.with_alert(Severity::Danger, "Please fix the highlighted fields.");
        return render_form(&state, Target::New, FormPage { chrome, form, errors }).await;
    }

    let has_images = !images.is_empty();
    let created = match state.api.create_vehicle(&user.token, &form, images).await {
        Ok(created) => created,
        Err(e) => {
            let chrome = chrome.with_alert(Severity::Danger, form_rejection(e)?);
            return render_form(&state, Target::New, FormPage { chrome, form, errors }).await;
        }
    };
    tracing::info!("User {} posted listing {}", user.user.id, created.id);

    // Listings with photos go straight into AI verification and the seller sees the report
    if has_images {
        match run_verification(&state, &user, created.id, Attempt::First).await {
            Ok(report) => return Ok(report.into_response()),
            Err(e) => tracing::warn!("Verification after posting listing {} failed: {}", created.id, e),
        }
    }
    Ok(Redirect::to("/my-ads?notice=posted").into_response())
}

async fn owned_listing(state: &AppState, user: &AuthenticatedUser, id: i64) -> AppResult<VehicleListing> {
    let listing = state.api.get_vehicle(Some(&user.token), id).await?;
    if !listing.is_owned_by(user.user.id) {
        tracing::warn!("User {} tried to edit listing {} owned by {:?}", user.user.id, id, listing.posted_by);
        return Err(AppError::Backend {
            status: StatusCode::FORBIDDEN,
            message: "You can only edit your own listings".into(),
        });
    }
    Ok(listing)
}

pub async fn edit_listing_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let listing = owned_listing(&state, &user, id).await?;
    let page = FormPage {
        chrome: Chrome::for_user(&user.user),
        form: VehicleForm::from_listing(&listing),
        errors: FormErrors::default(),
    };
    render_form(&state, Target::Existing(&listing), page).await
}

pub async fn submit_edit_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Response> {
    let listing = owned_listing(&state, &user, id).await?;
    let (form, images) = read_listing_form(multipart).await?;
    let chrome = Chrome::for_user(&user.user);

    let errors = form.validate(current_year());
    if !errors.is_empty() {
        let chrome = chrome.with_alert(Severity::Danger, "Please fix the highlighted fields.");
        return render_form(&state, Target::Existing(&listing), FormPage { chrome, form, errors }).await;
    }

    match state.api.update_vehicle(&user.token, id, &form, images).await {
        Ok(_) => Ok(Redirect::to(&format!("/vehicles/{id}?notice=updated")).into_response()),
        Err(e) => {
            let chrome = chrome.with_alert(Severity::Danger, form_rejection(e)?);
            render_form(&state, Target::Existing(&listing), FormPage { chrome, form, errors }).await
        }
    }
}

pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, image_id)): Path<(i64, i64)>,
) -> AppResult<Redirect> {
    state.api.delete_vehicle_image(&user.token, image_id).await?;
    tracing::info!("User {} removed image {} from listing {}", user.user.id, image_id, id);
    Ok(Redirect::to(&format!("/vehicles/{id}/edit")))
}
