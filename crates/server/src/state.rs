use std::sync::Arc;

use configs::StorageConfig;
use service::{CartRepository, CartStore, ProductRepository, ProductStore};

use crate::errors::StartupError;

/// Shared router state: one store per backing file, created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
}

impl AppState {
    pub fn new(products: Arc<dyn ProductRepository>, carts: Arc<dyn CartRepository>) -> Self {
        Self { products, carts }
    }

    /// Open the file stores named by the storage configuration.
    pub async fn from_storage(cfg: &StorageConfig) -> Result<Self, StartupError> {
        cfg.validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
        let products = ProductStore::new(cfg.products_path()).await?;
        let carts = CartStore::new(cfg.carts_path()).await?;
        Ok(Self::new(products, carts))
    }
}
