use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use strum_macros::{Display, EnumString};
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClearTarget {
    Salaries,
    Cities,
    Results,
    All,
}

#[derive(Deserialize, ToSchema)]
pub struct ClearRequest {
    #[schema(example = "all")]
    pub table: String,
}

async fn clear_one(pool: &MySqlPool, target: ClearTarget) -> Result<u64, sqlx::Error> {
    let sql = match target {
        ClearTarget::Salaries => "DELETE FROM salaries",
        ClearTarget::Cities => "DELETE FROM cities",
        ClearTarget::Results => "DELETE FROM results",
        ClearTarget::All => unreachable!("callers expand `all` before this point"),
    };
    Ok(sqlx::query(sql).execute(pool).await?.rows_affected())
}

/// Empty one table, or all three
#[utoipa::path(
    post,
    path = "/api/v1/clear",
    request_body = ClearRequest,
    responses(
        (status = 200, description = "Table(s) emptied", body = Object, example = json!({
            "success": true,
            "message": "cleared all tables"
        })),
        (status = 400, description = "Unknown table name"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Admin"
)]
pub async fn clear_tables(
    pool: web::Data<MySqlPool>,
    body: web::Json<ClearRequest>,
) -> actix_web::Result<impl Responder> {
    let Ok(target) = body.table.parse::<ClearTarget>() else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": format!("invalid table name `{}`", body.table)
        })));
    };

    // Results depend on the inputs, so they go first when wiping everything.
    let targets: &[ClearTarget] = match target {
        ClearTarget::All => &[
            ClearTarget::Results,
            ClearTarget::Salaries,
            ClearTarget::Cities,
        ],
        _ => std::slice::from_ref(&target),
    };

    let mut removed = 0u64;
    for t in targets.iter().copied() {
        match clear_one(pool.get_ref(), t).await {
            Ok(rows) => removed += rows,
            Err(e) => {
                error!(error = %e, table = %t, "failed to clear table");
                return Ok(HttpResponse::InternalServerError().json(json!({
                    "error": format!("failed to clear `{}`", t)
                })));
            }
        }
    }

    info!(target = %target, removed, "tables cleared");

    let message = match target {
        ClearTarget::All => "cleared all tables".to_string(),
        _ => format!("cleared `{}`", target),
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": message
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_parse_case_insensitively() {
        assert_eq!("salaries".parse::<ClearTarget>(), Ok(ClearTarget::Salaries));
        assert_eq!("CITIES".parse::<ClearTarget>(), Ok(ClearTarget::Cities));
        assert_eq!("Results".parse::<ClearTarget>(), Ok(ClearTarget::Results));
        assert_eq!("all".parse::<ClearTarget>(), Ok(ClearTarget::All));
    }

    #[test]
    fn unknown_table_names_are_rejected() {
        assert!("users".parse::<ClearTarget>().is_err());
        assert!("".parse::<ClearTarget>().is_err());
    }

    #[test]
    fn display_matches_table_names() {
        assert_eq!(ClearTarget::Salaries.to_string(), "salaries");
        assert_eq!(ClearTarget::All.to_string(), "all");
    }
}
