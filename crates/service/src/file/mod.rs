//! JSON file-backed stores for the catalog and carts.

pub mod cart_store;
pub mod product_store;
