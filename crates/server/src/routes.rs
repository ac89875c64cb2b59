use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::errors::JsonApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod carts;
pub mod products;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Parse a record id from a path segment, answering 400 when it is not a positive integer.
pub(crate) fn path_id(raw: &str, entity: &str) -> Result<u64, JsonApiError> {
    service::ids::parse_id(raw).ok_or_else(|| {
        JsonApiError::new(
            axum::http::StatusCode::BAD_REQUEST,
            format!("{entity} id must be a positive integer"),
            Some(format!("got {raw:?}")),
        )
    })
}

/// Build the full application router: health, products, carts and API docs.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/:id",
            get(products::get).put(products::update).delete(products::delete),
        )
        .route("/api/carts", get(carts::list).post(carts::create))
        .route("/api/carts/:cid", get(carts::get))
        .route("/api/carts/:cid/products/:pid", post(carts::add_item));

    let docs = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
        .merge(docs)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_id_accepts_positive_integers_only() {
        assert_eq!(path_id("3", "product").ok(), Some(3));
        let err = path_id("abc", "product").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert!(path_id("0", "cart").is_err());
        assert!(path_id("-2", "cart").is_err());
    }
}
