use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A jurisdiction's contribution-base bounds and rate for one year.
///
/// The calculator only ever uses the first stored row (lowest id).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "city_name": "Shanghai",
        "year": "2024",
        "base_min": 3000.0,
        "base_max": 8500.0,
        "rate": 0.16
    })
)]
pub struct CityStandard {
    pub id: u64,
    pub city_name: String,
    pub year: String,
    pub base_min: f64,
    pub base_max: f64,
    pub rate: f64,
}

/// Parsed but not yet persisted city-standard row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCityStandard {
    pub city_name: String,
    pub year: String,
    pub base_min: f64,
    pub base_max: f64,
    pub rate: f64,
}
