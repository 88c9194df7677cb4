use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One uploaded salary row: one employee, one month.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SalaryRecord {
    pub id: u64,

    #[schema(example = "1001")]
    pub employee_id: String,

    #[schema(example = "Alice")]
    pub employee_name: String,

    #[schema(example = "202401")]
    pub month: String,

    #[schema(example = 8000.0)]
    pub salary_amount: f64,
}

/// Parsed but not yet persisted salary row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSalaryRecord {
    pub employee_id: String,
    pub employee_name: String,
    pub month: String,
    pub salary_amount: f64,
}
