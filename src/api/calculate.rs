use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

use crate::calc::{self, EmployeeContribution};

#[derive(Serialize, ToSchema)]
pub struct CalculateResponse {
    #[schema(example = true)]
    pub success: bool,

    #[schema(example = "calculated and stored 3 results")]
    pub message: String,

    pub data: Vec<EmployeeContribution>,
}

/// Run the contribution calculation over everything uploaded so far
#[utoipa::path(
    post,
    path = "/api/v1/calculate",
    responses(
        (status = 200, description = "Results computed and stored", body = CalculateResponse),
        (status = 400, description = "Nothing to calculate yet", body = Object, example = json!({
            "error": "no salary rows have been uploaded yet"
        })),
        (status = 500, description = "Storage failure")
    ),
    tag = "Calculation"
)]
pub async fn calculate(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    match calc::run_calculation(pool.get_ref()).await {
        Ok(results) => Ok(HttpResponse::Ok().json(CalculateResponse {
            success: true,
            message: format!("calculated and stored {} results", results.len()),
            data: results,
        })),
        Err(e) if e.is_client_error() => Ok(HttpResponse::BadRequest().json(json!({
            "error": e.to_string()
        }))),
        Err(e) => {
            error!(error = %e, "calculation run failed");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "calculation failed, contact the administrator"
            })))
        }
    }
}
