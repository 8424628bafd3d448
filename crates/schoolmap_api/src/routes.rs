//! API route table.
//!
//! - GET /api/schools - paginated school listing
//! - GET /api/healthcheck - liveness probe

use crate::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/schools", web::get().to(handlers::list_schools_handler))
            .route("/healthcheck", web::get().to(handlers::healthcheck_handler)),
    );
}
