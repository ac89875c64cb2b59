//! Storage abstractions for service layer
//!
//! Reusable file-backed collections shared by the product and cart stores.

pub mod json_list_store;

pub use json_list_store::{next_key, JsonListStore, Keyed};
