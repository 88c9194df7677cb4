use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::model::{city::CityStandard, result::ContributionResult, salary::SalaryRecord};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 100)]
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// 1-based page, page size clamped to a sane range.
    fn resolve(&self) -> (u32, u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(100).clamp(1, 500);
        (page, per_page, (page - 1) * per_page)
    }
}

#[derive(Serialize, ToSchema)]
pub struct ResultListResponse {
    pub data: Vec<ContributionResult>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct SalaryListResponse {
    pub data: Vec<SalaryRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct CityListResponse {
    pub data: Vec<CityStandard>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// List stored calculation results
#[utoipa::path(
    get,
    path = "/api/v1/results",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated results, oldest first", body = ResultListResponse)
    ),
    tag = "Results"
)]
pub async fn list_results(
    pool: web::Data<MySqlPool>,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    let (page, per_page, offset) = query.resolve();

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM results")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "failed to count results");
            ErrorInternalServerError("Database error")
        })?;

    let data = sqlx::query_as::<_, ContributionResult>(
        "SELECT id, employee_name, avg_salary, contribution_base, company_fee, calculated_at \
         FROM results ORDER BY id ASC LIMIT ? OFFSET ?",
    )
    .bind(per_page as i64)
    .bind(offset as i64)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "failed to fetch results");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(ResultListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// List uploaded salary rows
#[utoipa::path(
    get,
    path = "/api/v1/salaries",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated salary rows", body = SalaryListResponse)
    ),
    tag = "Results"
)]
pub async fn list_salaries(
    pool: web::Data<MySqlPool>,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    let (page, per_page, offset) = query.resolve();

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM salaries")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "failed to count salaries");
            ErrorInternalServerError("Database error")
        })?;

    let data = sqlx::query_as::<_, SalaryRecord>(
        "SELECT id, employee_id, employee_name, month, salary_amount \
         FROM salaries ORDER BY id ASC LIMIT ? OFFSET ?",
    )
    .bind(per_page as i64)
    .bind(offset as i64)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "failed to fetch salaries");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(SalaryListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// List uploaded city standards
#[utoipa::path(
    get,
    path = "/api/v1/cities",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated city standards", body = CityListResponse)
    ),
    tag = "Results"
)]
pub async fn list_cities(
    pool: web::Data<MySqlPool>,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    let (page, per_page, offset) = query.resolve();

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cities")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "failed to count cities");
            ErrorInternalServerError("Database error")
        })?;

    let data = sqlx::query_as::<_, CityStandard>(
        "SELECT id, city_name, year, base_min, base_max, rate \
         FROM cities ORDER BY id ASC LIMIT ? OFFSET ?",
    )
    .bind(per_page as i64)
    .bind(offset as i64)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "failed to fetch cities");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(CityListResponse {
        data,
        page,
        per_page,
        total,
    }))
}
