//! Service layer: JSON file-backed product and cart stores.
//! - Each store owns one file and serializes its read-modify-write cycles.
//! - Not-found is reported as `None`/`false`, storage failures as `ServiceError`.

pub mod errors;
pub mod file;
pub mod ids;
pub mod repository;
pub mod storage;

pub use file::cart_store::{Cart, CartStore, LineItem, DEFAULT_QUANTITY};
pub use file::product_store::{Product, ProductFields, ProductStore};
pub use repository::{CartRepository, ProductRepository};
