//! Request handlers.

use crate::models::{ErrorResponse, HealthResponse, ListSchoolsResponse};
use actix_web::{web, HttpRequest, HttpResponse};
use log::error;
use schoolmap_core::{core_version, list_schools, PageRequest, StoreSession};

/// GET /api/schools?limit=<int>&skip=<int>
///
/// Unparseable pagination falls back to `limit=100, skip=0`. Store access
/// runs on the blocking pool; any failure there is answered with a 500
/// envelope and no partial results.
pub async fn list_schools_handler(
    req: HttpRequest,
    session: web::Data<StoreSession>,
) -> HttpResponse {
    let request = page_request(req.query_string());
    let session = session.into_inner();

    match web::block(move || list_schools(&session, &request)).await {
        Ok(Ok(listing)) => HttpResponse::Ok().json(ListSchoolsResponse::ok(listing)),
        Ok(Err(err)) => HttpResponse::InternalServerError().json(ErrorResponse::new(err.to_string())),
        Err(err) => {
            error!("event=schools_list module=api status=error error_code=blocking_failed error={err}");
            HttpResponse::InternalServerError().json(ErrorResponse::new("server error"))
        }
    }
}

/// GET /api/healthcheck
pub async fn healthcheck_handler() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: core_version().to_string(),
    })
}

/// First occurrence of `limit`/`skip` wins; an undecodable query string
/// counts as absent parameters.
fn page_request(query_string: &str) -> PageRequest {
    let pairs = web::Query::<Vec<(String, String)>>::from_query(query_string)
        .map(web::Query::into_inner)
        .unwrap_or_default();
    let first = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };
    PageRequest::from_params(first("limit"), first("skip"))
}
