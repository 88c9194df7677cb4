use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, web};
use futures_util::TryStreamExt;
use serde_json::json;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::utils::sheet;

/// Pull the `file` part out of a multipart body, capped at `max_bytes`.
async fn read_file_field(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<Option<(String, Vec<u8>)>, actix_web::Error> {
    while let Some(mut field) = payload.try_next().await? {
        if field.name() != "file" {
            continue;
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .unwrap_or("upload.xlsx")
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(actix_web::error::ErrorPayloadTooLarge(
                    "file exceeds the upload size limit",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(Some((filename, bytes)));
    }

    Ok(None)
}

/// Upload monthly salary rows
#[utoipa::path(
    post,
    path = "/api/v1/upload/salaries",
    responses(
        (status = 200, description = "Rows stored", body = Object, example = json!({
            "success": true,
            "message": "uploaded 24 salary rows"
        })),
        (status = 400, description = "No file attached, or the sheet could not be parsed"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Upload"
)]
pub async fn upload_salaries(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> actix_web::Result<impl Responder> {
    let upload_id = Uuid::new_v4();

    let Some((filename, bytes)) = read_file_field(payload, config.max_upload_bytes).await? else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "no file attached, send the spreadsheet as the `file` form field"
        })));
    };

    let rows = match sheet::parse_salaries(&bytes, &filename) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(%upload_id, file = %filename, error = %e, "rejected salary upload");
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": format!("could not read `{}`: {}", filename, e)
            })));
        }
    };

    let mut insert: QueryBuilder<MySql> = QueryBuilder::new(
        "INSERT INTO salaries (employee_id, employee_name, month, salary_amount) ",
    );
    insert.push_values(rows.iter(), |mut row, r| {
        row.push_bind(&r.employee_id)
            .push_bind(&r.employee_name)
            .push_bind(&r.month)
            .push_bind(r.salary_amount);
    });

    if let Err(e) = insert.build().execute(pool.get_ref()).await {
        error!(%upload_id, error = %e, "failed to store salary rows");
        return Ok(HttpResponse::InternalServerError().json(json!({
            "error": "failed to store salary rows"
        })));
    }

    info!(%upload_id, file = %filename, rows = rows.len(), "salary upload stored");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("uploaded {} salary rows", rows.len())
    })))
}

/// Upload city contribution standards
#[utoipa::path(
    post,
    path = "/api/v1/upload/cities",
    responses(
        (status = 200, description = "Rows stored", body = Object, example = json!({
            "success": true,
            "message": "uploaded 1 city standard"
        })),
        (status = 400, description = "No file attached, or the sheet could not be parsed"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Upload"
)]
pub async fn upload_cities(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> actix_web::Result<impl Responder> {
    let upload_id = Uuid::new_v4();

    let Some((filename, bytes)) = read_file_field(payload, config.max_upload_bytes).await? else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "no file attached, send the spreadsheet as the `file` form field"
        })));
    };

    let rows = match sheet::parse_cities(&bytes, &filename) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(%upload_id, file = %filename, error = %e, "rejected city standard upload");
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": format!("could not read `{}`: {}", filename, e)
            })));
        }
    };

    let mut insert: QueryBuilder<MySql> =
        QueryBuilder::new("INSERT INTO cities (city_name, year, base_min, base_max, rate) ");
    insert.push_values(rows.iter(), |mut row, r| {
        row.push_bind(&r.city_name)
            .push_bind(&r.year)
            .push_bind(r.base_min)
            .push_bind(r.base_max)
            .push_bind(r.rate);
    });

    if let Err(e) = insert.build().execute(pool.get_ref()).await {
        error!(%upload_id, error = %e, "failed to store city standards");
        return Ok(HttpResponse::InternalServerError().json(json!({
            "error": "failed to store city standards"
        })));
    }

    info!(%upload_id, file = %filename, rows = rows.len(), "city standard upload stored");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!(
            "uploaded {} city standard{}",
            rows.len(),
            if rows.len() == 1 { "" } else { "s" }
        )
    })))
}
