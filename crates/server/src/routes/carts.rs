use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use service::{Cart, DEFAULT_QUANTITY};
use tracing::{info, warn};

use crate::errors::JsonApiError;
use crate::routes::path_id;
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AddItemQuery {
    /// Units to add; defaults to 1.
    pub quantity: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    pub message: String,
    pub cart: Cart,
}

#[utoipa::path(
    get, path = "/api/carts", tag = "carts",
    responses((status = 200, description = "All carts", body = [crate::openapi::CartDoc]))
)]
pub async fn list(State(state): State<AppState>) -> Json<Vec<Cart>> {
    let carts = state.carts.list().await;
    info!(count = carts.len(), "list carts");
    Json(carts)
}

#[utoipa::path(
    post, path = "/api/carts", tag = "carts",
    responses(
        (status = 201, description = "Empty cart created", body = crate::openapi::CartDoc),
        (status = 400, description = "Creation failed", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn create(State(state): State<AppState>) -> Result<(StatusCode, Json<Cart>), JsonApiError> {
    match state.carts.create().await {
        Ok(cart) => Ok((StatusCode::CREATED, Json(cart))),
        Err(e) => {
            warn!(error = %e, "create cart failed");
            Err(JsonApiError::new(StatusCode::BAD_REQUEST, "Could not create cart", Some(e.to_string())))
        }
    }
}

#[utoipa::path(
    get, path = "/api/carts/{cid}", tag = "carts",
    params(("cid" = u64, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Found", body = crate::openapi::CartDoc),
        (status = 400, description = "Invalid id", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Cart not found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn get(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<Json<Cart>, JsonApiError> {
    let cart_id = path_id(&cid, "cart")?;
    state
        .carts
        .get(cart_id)
        .await?
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found("Cart not found"))
}

/// Add a product to a cart. Both must exist; the cart is re-read afterwards
/// since the store does not report the outcome of the add itself.
#[utoipa::path(
    post, path = "/api/carts/{cid}/products/{pid}", tag = "carts",
    params(
        ("cid" = u64, Path, description = "Cart id"),
        ("pid" = u64, Path, description = "Product id"),
        AddItemQuery
    ),
    responses(
        (status = 201, description = "Product added", body = crate::openapi::AddItemResponseDoc),
        (status = 400, description = "Invalid id or quantity", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Cart or product not found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path((cid, pid)): Path<(String, String)>,
    Query(q): Query<AddItemQuery>,
) -> Result<(StatusCode, Json<AddItemResponse>), JsonApiError> {
    let cart_id = path_id(&cid, "cart")?;
    let product_id = path_id(&pid, "product")?;
    let quantity = match q.quantity {
        Some(0) => return Err(JsonApiError::bad_request("quantity must be a positive integer")),
        Some(n) => n,
        None => DEFAULT_QUANTITY,
    };

    if state.carts.get(cart_id).await?.is_none() {
        return Err(JsonApiError::not_found("Cart not found"));
    }
    if state.products.get(product_id).await?.is_none() {
        return Err(JsonApiError::not_found("Product not found"));
    }

    state.carts.add_item(cart_id, product_id, quantity).await?;

    let cart = state
        .carts
        .get(cart_id)
        .await?
        .ok_or_else(|| JsonApiError::not_found("Cart not found"))?;
    Ok((
        StatusCode::CREATED,
        Json(AddItemResponse { message: "product added to cart".into(), cart }),
    ))
}
