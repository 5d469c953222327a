// Client-side filtering of the fetched listing set

use serde::{Deserialize, Serialize};

use crate::models::VehicleListing;

/// Filter state of the browse page.
///
/// Every field is optional; an unset field does not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterCriteria {
    pub search_term: String,
    pub vehicle_type: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Raw query-string form of [`FilterCriteria`] as submitted by the filter form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterQuery {
    pub search: Option<String>,
    pub vehicle_type: Option<String>,
    // Older links use `?type=`; `vehicle_type` wins when both are present
    #[serde(rename = "type")]
    pub type_param: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

impl From<FilterQuery> for FilterCriteria {
    fn from(query: FilterQuery) -> Self {
        FilterCriteria {
            // Matched as typed, surrounding spaces included
            search_term: query.search.unwrap_or_default(),
            vehicle_type: query
                .vehicle_type
                .filter(|t| !t.trim().is_empty())
                .or(query.type_param)
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
            min_price: query.min_price.as_deref().and_then(parse_bound),
            max_price: query.max_price.as_deref().and_then(parse_bound),
        }
    }
}

// Blank or non-numeric bounds leave the range open
fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty()
            && self.vehicle_type.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    pub fn matches(&self, listing: &VehicleListing) -> bool {
        if !self.search_term.is_empty() {
            let needle = self.search_term.to_lowercase();
            let hit = [&listing.manufacturer, &listing.model, &listing.city]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if !self.vehicle_type.is_empty() {
            let same_type = listing
                .vehicle_type
                .as_deref()
                .is_some_and(|t| t.to_lowercase() == self.vehicle_type.to_lowercase());
            if !same_type {
                return false;
            }
        }

        let price = listing_price(listing);
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        true
    }
}

/// Price of a listing for range comparisons.
///
/// Missing or unparsable prices compare as 0, so a listing priced "abc" passes a
/// max-only filter but never a positive minimum.
pub fn listing_price(listing: &VehicleListing) -> f64 {
    listing
        .price
        .as_deref()
        .and_then(|p| p.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
}

/// Returns the listings matching every set criterion, in their original order.
pub fn apply_filters<'a>(source: &'a [VehicleListing], criteria: &FilterCriteria) -> Vec<&'a VehicleListing> {
    let filtered: Vec<&VehicleListing> = source.iter().filter(|l| criteria.matches(l)).collect();
    tracing::debug!(
        total = source.len(),
        matched = filtered.len(),
        criteria = ?criteria,
        "Applied listing filters"
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: i64, manufacturer: &str, model: &str, city: Option<&str>, kind: &str, price: Option<&str>) -> VehicleListing {
        VehicleListing {
            id,
            manufacturer: Some(manufacturer.to_string()),
            model: Some(model.to_string()),
            city: city.map(str::to_string),
            vehicle_type: Some(kind.to_string()),
            price: price.map(str::to_string),
            ..Default::default()
        }
    }

    fn sample() -> Vec<VehicleListing> {
        vec![
            listing(1, "Toyota", "Prius", Some("Colombo"), "Car", Some("2500000.00")),
            listing(2, "Honda", "Toyota Van", Some("Kandy"), "Van", Some("abc")),
            listing(3, "Nissan", "X-Trail", None, "SUV", Some("7800000")),
            listing(4, "Suzuki", "Alto", Some("Galle"), "suv", None),
            listing(5, "Honda", "Civic", Some("Toyota Town"), "Car", Some("4999999.99")),
        ]
    }

    fn ids(filtered: &[&VehicleListing]) -> Vec<i64> {
        filtered.iter().map(|l| l.id).collect()
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let source = sample();
        let filtered = apply_filters(&source, &FilterCriteria::default());
        assert_eq!(ids(&filtered), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_search_matches_any_field_case_insensitive() {
        let source = sample();
        let criteria = FilterCriteria { search_term: "toyota".into(), ..Default::default() };
        // manufacturer, model and city matches, in source order
        assert_eq!(ids(&apply_filters(&source, &criteria)), vec![1, 2, 5]);

        let criteria = FilterCriteria { search_term: "HONDA".into(), ..Default::default() };
        assert_eq!(ids(&apply_filters(&source, &criteria)), vec![2, 5]);
    }

    #[test]
    fn test_search_excludes_non_matching_manufacturer() {
        let source = vec![
            listing(1, "Toyota", "Axio", None, "Car", None),
            listing(2, "Honda", "Fit", None, "Car", None),
        ];
        let criteria = FilterCriteria { search_term: "toyota".into(), ..Default::default() };
        assert_eq!(ids(&apply_filters(&source, &criteria)), vec![1]);
    }

    #[test]
    fn test_missing_fields_never_match_search() {
        let source = vec![VehicleListing { id: 9, ..Default::default() }];
        let criteria = FilterCriteria { search_term: "colombo".into(), ..Default::default() };
        assert!(apply_filters(&source, &criteria).is_empty());
    }

    #[test]
    fn test_vehicle_type_equality_is_case_insensitive() {
        let source = sample();
        let criteria = FilterCriteria { vehicle_type: "SUV".into(), ..Default::default() };
        let filtered = apply_filters(&source, &criteria);
        assert_eq!(ids(&filtered), vec![3, 4]);
        assert!(filtered
            .iter()
            .all(|l| l.vehicle_type.as_deref().unwrap().eq_ignore_ascii_case("suv")));
    }

    #[test]
    fn test_vehicle_type_is_not_substring() {
        let source = vec![listing(1, "Tata", "Ace", None, "Mini Van", None)];
        let criteria = FilterCriteria { vehicle_type: "Van".into(), ..Default::default() };
        assert!(apply_filters(&source, &criteria).is_empty());
    }

    #[test]
    fn test_price_range_treats_unparsable_price_as_zero() {
        let source = vec![
            listing(1, "Honda", "Fit", None, "Car", Some("abc")),
            listing(2, "Toyota", "Axio", None, "Car", Some("2500000")),
        ];
        let criteria = FilterCriteria {
            min_price: Some(1_000_000.0),
            max_price: Some(5_000_000.0),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&source, &criteria)), vec![2]);

        let max_only = FilterCriteria { max_price: Some(100.0), ..Default::default() };
        assert_eq!(ids(&apply_filters(&source, &max_only)), vec![1]);
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let source = sample();
        let criteria = FilterCriteria {
            min_price: Some(2_500_000.0),
            max_price: Some(4_999_999.99),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&source, &criteria)), vec![1, 5]);
    }

    #[test]
    fn test_all_criteria_combine() {
        let source = sample();
        let criteria = FilterCriteria {
            search_term: "honda".into(),
            vehicle_type: "car".into(),
            min_price: Some(1.0),
            max_price: None,
        };
        assert_eq!(ids(&apply_filters(&source, &criteria)), vec![5]);
    }

    #[test]
    fn test_source_is_untouched() {
        let source = sample();
        let before = source.clone();
        let criteria = FilterCriteria { vehicle_type: "car".into(), ..Default::default() };
        let _ = apply_filters(&source, &criteria);
        assert_eq!(source, before);
    }

    #[test]
    fn test_query_conversion_ignores_blank_and_garbage_bounds() {
        let query = FilterQuery {
            search: Some("prius".into()),
            vehicle_type: Some("".into()),
            min_price: Some("".into()),
            max_price: Some("lots".into()),
            ..Default::default()
        };
        let criteria = FilterCriteria::from(query);
        assert_eq!(criteria.search_term, "prius");
        assert!(criteria.vehicle_type.is_empty());
        assert_eq!(criteria.min_price, None);
        assert_eq!(criteria.max_price, None);
        assert!(!criteria.is_empty());
        assert!(FilterCriteria::from(FilterQuery::default()).is_empty());
    }

    fn parse_query(query: &str) -> FilterQuery {
        let uri: axum::http::Uri = format!("/vehicles?{query}").parse().unwrap();
        axum::extract::Query::<FilterQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_type_param_is_a_fallback_for_vehicle_type() {
        let criteria = FilterCriteria::from(parse_query("type=Car&vehicle_type=SUV"));
        assert_eq!(criteria.vehicle_type, "SUV");

        let criteria = FilterCriteria::from(parse_query("type=Van"));
        assert_eq!(criteria.vehicle_type, "Van");

        let criteria = FilterCriteria::from(parse_query("vehicle_type=&type=Bike"));
        assert_eq!(criteria.vehicle_type, "Bike");
    }

    #[test]
    fn test_search_term_keeps_surrounding_spaces() {
        let criteria = FilterCriteria::from(parse_query("search=+Town"));
        assert_eq!(criteria.search_term, " Town");

        // " Town" is inside "Toyota Town" but not at the start of "Toyota"
        let source = sample();
        assert_eq!(ids(&apply_filters(&source, &criteria)), vec![5]);
    }
}
