use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorDoc { pub error: String, pub detail: Option<String> }

#[derive(ToSchema)]
pub struct MessageDoc { pub message: String }

/// Product fields are free-form; these are the ones the storefront uses.
#[derive(ToSchema)]
pub struct ProductInputDoc {
    pub title: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub price: Option<f64>,
    pub status: Option<bool>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub thumbnails: Option<Vec<String>>,
}

#[derive(ToSchema)]
pub struct ProductDoc {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub price: Option<f64>,
    pub status: Option<bool>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub thumbnails: Option<Vec<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct LineItemDoc {
    #[serde(rename = "idProducto")]
    pub product_id: u64,
    pub quantity: u64,
}

#[derive(Serialize, ToSchema)]
pub struct CartDoc {
    #[serde(rename = "idCart")]
    pub id: u64,
    #[serde(rename = "productos")]
    pub items: Vec<LineItemDoc>,
}

#[derive(ToSchema)]
pub struct AddItemResponseDoc { pub message: String, pub cart: CartDoc }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::products::list,
        crate::routes::products::get,
        crate::routes::products::create,
        crate::routes::products::update,
        crate::routes::products::delete,
        crate::routes::carts::list,
        crate::routes::carts::create,
        crate::routes::carts::get,
        crate::routes::carts::add_item,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorDoc,
            MessageDoc,
            ProductInputDoc,
            ProductDoc,
            LineItemDoc,
            CartDoc,
            AddItemResponseDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "products"),
        (name = "carts")
    )
)]
pub struct ApiDoc;
