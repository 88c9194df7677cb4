use crate::{
    api::{admin, calculate, results, upload},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter config
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let upload_limiter = build_limiter(config.rate_upload_per_min);
    let calculate_limiter = build_limiter(config.rate_calculate_per_min);
    let query_limiter = build_limiter(config.rate_query_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/upload")
                    // /upload/salaries
                    .service(
                        web::resource("/salaries")
                            .wrap(Governor::new(&upload_limiter))
                            .route(web::post().to(upload::upload_salaries)),
                    )
                    // /upload/cities
                    .service(
                        web::resource("/cities")
                            .wrap(Governor::new(&upload_limiter))
                            .route(web::post().to(upload::upload_cities)),
                    ),
            )
            // /calculate
            .service(
                web::resource("/calculate")
                    .wrap(Governor::new(&calculate_limiter))
                    .route(web::post().to(calculate::calculate)),
            )
            // /results
            .service(
                web::resource("/results")
                    .wrap(Governor::new(&query_limiter))
                    .route(web::get().to(results::list_results)),
            )
            // /salaries
            .service(
                web::resource("/salaries")
                    .wrap(Governor::new(&query_limiter))
                    .route(web::get().to(results::list_salaries)),
            )
            // /cities
            .service(
                web::resource("/cities")
                    .wrap(Governor::new(&query_limiter))
                    .route(web::get().to(results::list_cities)),
            )
            // /clear
            .service(
                web::resource("/clear")
                    .wrap(Governor::new(&query_limiter))
                    .route(web::post().to(admin::clear_tables)),
            ),
    );
}

// UPLOAD
//  ├─ POST /upload/salaries  (multipart, field `file`)
//  └─ POST /upload/cities    (multipart, field `file`)
//
// CALCULATE
//  └─ POST /calculate  → group, average, clamp, rate, store
//
// READ BACK
//  ├─ GET /results  ├─ GET /salaries  └─ GET /cities
//
// ADMIN
//  └─ POST /clear  {"table": "salaries" | "cities" | "results" | "all"}
