use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stored outcome of one calculation run for one employee.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ContributionResult {
    pub id: u64,

    #[schema(example = "Alice")]
    pub employee_name: String,

    #[schema(example = 9000.0)]
    pub avg_salary: f64,

    #[schema(example = 8500.0)]
    pub contribution_base: f64,

    #[schema(example = 1360.0)]
    pub company_fee: f64,

    #[schema(example = "2024-06-01T09:30:00", value_type = String, format = "date-time")]
    pub calculated_at: NaiveDateTime,
}
