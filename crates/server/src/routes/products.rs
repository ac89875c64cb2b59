use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use common::types::Message;
use serde_json::Value;
use service::{errors::ServiceError, Product, ProductFields};
use tracing::{info, warn};

use crate::errors::JsonApiError;
use crate::routes::path_id;
use crate::state::AppState;

fn into_fields(body: Value) -> Result<ProductFields, JsonApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(JsonApiError::bad_request("Product body must be a JSON object")),
    }
}

#[utoipa::path(
    get, path = "/api/products", tag = "products",
    responses((status = 200, description = "All products", body = [crate::openapi::ProductDoc]))
)]
pub async fn list(State(state): State<AppState>) -> Json<Vec<Product>> {
    let items = state.products.list().await;
    info!(count = items.len(), "list products");
    Json(items)
}

#[utoipa::path(
    get, path = "/api/products/{id}", tag = "products",
    params(("id" = u64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Found", body = crate::openapi::ProductDoc),
        (status = 400, description = "Invalid id", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Product not found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, JsonApiError> {
    let id = path_id(&id, "product")?;
    state
        .products
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("Product not found"))
}

#[utoipa::path(
    post, path = "/api/products", tag = "products",
    request_body = crate::openapi::ProductInputDoc,
    responses(
        (status = 201, description = "Created", body = crate::openapi::ProductDoc),
        (status = 400, description = "Duplicate title or creation failed", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Product>), JsonApiError> {
    let fields = into_fields(body)?;
    match state.products.add_unique_title(fields).await {
        Ok(product) => Ok((StatusCode::CREATED, Json(product))),
        Err(ServiceError::Conflict(msg)) => {
            Err(JsonApiError::new(StatusCode::BAD_REQUEST, "Product already exists", Some(msg)))
        }
        Err(e) => {
            warn!(error = %e, "create product failed");
            Err(JsonApiError::new(StatusCode::BAD_REQUEST, "Could not add product", Some(e.to_string())))
        }
    }
}

#[utoipa::path(
    put, path = "/api/products/{id}", tag = "products",
    params(("id" = u64, Path, description = "Product id")),
    request_body = crate::openapi::ProductInputDoc,
    responses(
        (status = 200, description = "Replaced", body = crate::openapi::ProductDoc),
        (status = 400, description = "Invalid id or body", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Product not found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Product>, JsonApiError> {
    let id = path_id(&id, "product")?;
    let fields = into_fields(body)?;
    state
        .products
        .update(id, fields)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("Product not found"))
}

#[utoipa::path(
    delete, path = "/api/products/{id}", tag = "products",
    params(("id" = u64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Deleted", body = crate::openapi::MessageDoc),
        (status = 400, description = "Invalid id", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Product not found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, JsonApiError> {
    let id = path_id(&id, "product")?;
    if state.products.delete(id).await? {
        Ok(Json(Message::new("product deleted")))
    } else {
        Err(JsonApiError::not_found("Product not found"))
    }
}
