// Listing and registration form state, option lists and validation

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{RegisterForm, VehicleListing};

pub const VEHICLE_TYPES: &[&str] = &["Car", "SUV", "Van", "Bike", "Three-Wheeler", "Truck", "Lorry"];
pub const TRANSMISSION_TYPES: &[&str] = &["Manual", "Automatic", "Semi-Automatic"];
pub const FUEL_TYPES: &[&str] = &["Petrol", "Diesel", "Electric", "Hybrid"];

const MIN_YEAR: i32 = 1900;
const MIN_PASSWORD_LEN: usize = 6;

// An <option> of a select box, with selection already resolved for the template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub fn select_options(values: &[&str], current: &str, any_label: Option<&str>) -> Vec<SelectOption> {
    let mut options = Vec::with_capacity(values.len() + 1);
    if let Some(label) = any_label {
        options.push(SelectOption {
            value: String::new(),
            label: label.to_string(),
            selected: current.is_empty(),
        });
    }
    options.extend(values.iter().map(|v| SelectOption {
        value: v.to_string(),
        label: v.to_string(),
        selected: v.eq_ignore_ascii_case(current),
    }));
    options
}

/// Field-keyed validation messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    // Empty string when the field is fine, so templates can render it unconditionally
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VehicleForm {
    pub manufacturer: String,
    pub model: String,
    pub city: String,
    pub plate_number: String,
    pub year: String,
    pub vehicle_type: String,
    pub engine_capacity: String,
    pub transmission: String,
    pub fuel_type: String,
    pub mileage: String,
    pub price: String,
    pub description: String,
    pub category: String,
}

impl VehicleForm {
    pub fn from_listing(listing: &VehicleListing) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        VehicleForm {
            manufacturer: text(&listing.manufacturer),
            model: text(&listing.model),
            city: text(&listing.city),
            plate_number: text(&listing.plate_number),
            year: listing.year.map(|y| y.to_string()).unwrap_or_default(),
            vehicle_type: text(&listing.vehicle_type),
            engine_capacity: text(&listing.engine_capacity),
            transmission: text(&listing.transmission),
            fuel_type: text(&listing.fuel_type),
            mileage: text(&listing.mileage),
            price: text(&listing.price),
            description: text(&listing.description),
            category: listing.category.map(|c| c.to_string()).unwrap_or_default(),
        }
    }

    /// Stores a submitted text field. Returns false for names that are not part of the form.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "manufacturer" => &mut self.manufacturer,
            "model" => &mut self.model,
            "city" => &mut self.city,
            "plate_number" => &mut self.plate_number,
            "year" => &mut self.year,
            "vehicle_type" => &mut self.vehicle_type,
            "engine_capacity" => &mut self.engine_capacity,
            "transmission" => &mut self.transmission,
            "fuel_type" => &mut self.fuel_type,
            "mileage" => &mut self.mileage,
            "price" => &mut self.price,
            "description" => &mut self.description,
            "category" => &mut self.category,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Non-blank fields as (name, trimmed value) pairs; blank fields are left out of the submission.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        [
            ("manufacturer", &self.manufacturer),
            ("model", &self.model),
            ("city", &self.city),
            ("plate_number", &self.plate_number),
            ("year", &self.year),
            ("vehicle_type", &self.vehicle_type),
            ("engine_capacity", &self.engine_capacity),
            ("transmission", &self.transmission),
            ("fuel_type", &self.fuel_type),
            ("mileage", &self.mileage),
            ("price", &self.price),
            ("description", &self.description),
            ("category", &self.category),
        ]
        .into_iter()
        .map(|(name, value)| (name, value.trim().to_string()))
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }

    pub fn validate(&self, current_year: i32) -> FormErrors {
        let mut errors = FormErrors::default();

        if self.manufacturer.trim().is_empty() {
            errors.add("manufacturer", "Manufacturer is required");
        }
        if self.model.trim().is_empty() {
            errors.add("model", "Model is required");
        }

        let year = self.year.trim();
        if !year.is_empty() {
            match year.parse::<i32>() {
                Ok(y) if (MIN_YEAR..=current_year + 1).contains(&y) => {}
                _ => errors.add("year", "Please enter a valid year"),
            }
        }

        let price = self.price.trim();
        if !price.is_empty() {
            match price.parse::<f64>() {
                Ok(p) if p.is_finite() && p >= 0.0 => {}
                Ok(_) => errors.add("price", "Price must be a positive number"),
                Err(_) => errors.add("price", "Price must be a number"),
            }
        }

        errors
    }

    pub fn vehicle_type_options(&self) -> Vec<SelectOption> {
        select_options(VEHICLE_TYPES, &self.vehicle_type, Some("Select type"))
    }

    pub fn transmission_options(&self) -> Vec<SelectOption> {
        select_options(TRANSMISSION_TYPES, &self.transmission, Some("Select transmission"))
    }

    pub fn fuel_type_options(&self) -> Vec<SelectOption> {
        select_options(FUEL_TYPES, &self.fuel_type, Some("Select fuel type"))
    }
}

/// Image file received from the browser, forwarded to the backend as-is.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub fn validate_registration(form: &RegisterForm) -> FormErrors {
    let mut errors = FormErrors::default();
    if form.email.trim().is_empty() || !form.email.contains('@') {
        errors.add("email", "Please enter a valid email address");
    }
    if form.password != form.confirm_password {
        errors.add("confirm_password", "Passwords do not match");
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", "Password must be at least 6 characters long");
    }
    errors
}
