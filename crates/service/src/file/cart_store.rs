use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::errors::ServiceError;
use crate::ids::lenient_id;
use crate::repository::CartRepository;
use crate::storage::{next_key, JsonListStore, Keyed};

/// Quantity used when a caller does not specify one.
pub const DEFAULT_QUANTITY: u64 = 1;

/// One product reference inside a cart.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    #[serde(rename = "idProducto", deserialize_with = "lenient_id")]
    pub product_id: u64,
    pub quantity: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cart {
    #[serde(rename = "idCart", deserialize_with = "lenient_id")]
    pub id: u64,
    #[serde(rename = "productos", default)]
    pub items: Vec<LineItem>,
}

impl Cart {
    pub fn empty(id: u64) -> Self {
        Self { id, items: Vec::new() }
    }

    /// Bump the quantity of an existing line, or append a new one at the end.
    /// The cart is left unchanged if the summed quantity would overflow.
    pub fn add_item(&mut self, product_id: u64, quantity: u64) -> Result<(), ServiceError> {
        match self.items.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| ServiceError::Validation("quantity overflow".into()))?;
            }
            None => self.items.push(LineItem { product_id, quantity }),
        }
        Ok(())
    }
}

impl Keyed for Cart {
    fn key(&self) -> u64 { self.id }
}

/// File storage for shopping carts (`carts.json`).
pub struct CartStore {
    store: JsonListStore<Cart>,
}

impl CartStore {
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonListStore::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// All carts in file order. A storage failure is logged and reads as empty.
    pub async fn list(&self) -> Vec<Cart> {
        match self.store.read_all().await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, path = %self.path().display(), "failed to read carts");
                Vec::new()
            }
        }
    }

    pub async fn get(&self, cart_id: u64) -> Result<Option<Cart>, ServiceError> {
        let carts = self.store.read_all().await?;
        Ok(carts.into_iter().find(|c| c.id == cart_id))
    }

    /// Create and persist an empty cart.
    pub async fn create(&self) -> Result<Cart, ServiceError> {
        let cart = self
            .store
            .update_list(|carts| {
                let cart = Cart::empty(next_key(carts)?);
                carts.push(cart.clone());
                Ok(cart)
            })
            .await
            .inspect_err(|e| error!(error = %e, "failed to create cart"))?;
        info!(cart_id = cart.id, "cart created");
        Ok(cart)
    }

    /// Add `quantity` units of `product_id` to cart `cart_id`.
    ///
    /// A missing cart is logged and leaves the file untouched; it is not
    /// reported to the caller, who re-reads the cart to observe the result.
    /// The product id is not checked against the catalog.
    pub async fn add_item(&self, cart_id: u64, product_id: u64, quantity: u64) -> Result<(), ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::Validation("quantity must be positive".into()));
        }
        let res = self
            .store
            .update_list(|carts| {
                let cart = carts
                    .iter_mut()
                    .find(|c| c.id == cart_id)
                    .ok_or_else(|| ServiceError::not_found("cart"))?;
                cart.add_item(product_id, quantity)
            })
            .await;
        match res {
            Ok(()) => {
                info!(cart_id, product_id, quantity, "item added to cart");
                Ok(())
            }
            Err(ServiceError::NotFound(_)) => {
                warn!(cart_id, product_id, "add item: cart not found");
                Ok(())
            }
            Err(e) => {
                error!(cart_id, product_id, error = %e, "failed to add item to cart");
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl CartRepository for CartStore {
    async fn list(&self) -> Vec<Cart> { self.list().await }
    async fn get(&self, cart_id: u64) -> Result<Option<Cart>, ServiceError> { self.get(cart_id).await }
    async fn create(&self) -> Result<Cart, ServiceError> { self.create().await }
    async fn add_item(&self, cart_id: u64, product_id: u64, quantity: u64) -> Result<(), ServiceError> {
        self.add_item(cart_id, product_id, quantity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    async fn setup_store() -> (Arc<CartStore>, std::path::PathBuf) {
        let tmp = std::env::temp_dir().join(format!("svc_carts_{}.json", Uuid::new_v4()));
        let store = CartStore::new(&tmp).await.expect("store init");
        (store, tmp)
    }

    #[tokio::test]
    async fn create_then_add_same_product_twice() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;

        let cart = store.create().await?;
        assert_eq!(serde_json::to_value(&cart)?, json!({"idCart": 1, "productos": []}));

        store.add_item(1, 42, 1).await?;
        store.add_item(1, 42, 2).await?;
        let cart = store.get(1).await?.expect("cart exists");
        assert_eq!(
            serde_json::to_value(&cart)?,
            json!({"idCart": 1, "productos": [{"idProducto": 42, "quantity": 3}]})
        );

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn new_products_append_in_first_add_order() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        store.create().await?;

        store.add_item(1, 5, DEFAULT_QUANTITY).await?;
        store.add_item(1, 3, 4).await?;
        store.add_item(1, 5, 1).await?;

        let cart = store.get(1).await?.expect("cart exists");
        assert_eq!(
            cart.items,
            vec![
                LineItem { product_id: 5, quantity: 2 },
                LineItem { product_id: 3, quantity: 4 },
            ]
        );

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn cart_ids_follow_max_plus_one() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        assert_eq!(store.create().await?.id, 1);
        assert_eq!(store.create().await?.id, 2);
        assert_eq!(store.create().await?.id, 3);
        assert_eq!(store.list().await.len(), 3);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn add_item_to_missing_cart_is_silent_and_does_not_write() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        store.create().await?;
        let before = tokio::fs::read(&tmp).await?;

        store.add_item(9, 1, 1).await?;
        assert_eq!(tokio::fs::read(&tmp).await?, before);
        assert_eq!(store.get(9).await?, None);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        store.create().await?;
        assert!(matches!(store.add_item(1, 1, 0).await, Err(ServiceError::Validation(_))));
        assert!(store.get(1).await?.expect("cart").items.is_empty());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn get_distinguishes_not_found_from_storage_error() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        assert_eq!(store.get(1).await?, None);

        tokio::fs::write(&tmp, "not json").await?;
        assert!(matches!(store.get(1).await, Err(e) if e.is_storage()));
        assert!(store.list().await.is_empty());
        assert!(store.create().await.is_err());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn reads_string_product_ids_written_by_older_versions() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        tokio::fs::write(
            &tmp,
            r#"[{"idCart": 1, "productos": [{"idProducto": "7", "quantity": 1}]}]"#,
        )
        .await?;

        store.add_item(1, 7, 1).await?;
        let cart = store.get(1).await?.expect("cart exists");
        assert_eq!(cart.items, vec![LineItem { product_id: 7, quantity: 2 }]);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn quantity_overflow_is_rejected_and_does_not_write() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        store.create().await?;
        store.add_item(1, 42, u64::MAX).await?;
        let before = tokio::fs::read(&tmp).await?;

        let res = store.add_item(1, 42, 2).await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));
        assert_eq!(tokio::fs::read(&tmp).await?, before);
        let cart = store.get(1).await?.expect("cart exists");
        assert_eq!(cart.items, vec![LineItem { product_id: 42, quantity: u64::MAX }]);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn add_item_on_corrupt_file_fails_without_overwriting() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        tokio::fs::write(&tmp, "[{\"idCart\": 1,").await?;

        let res = store.add_item(1, 42, 1).await;
        assert!(matches!(res, Err(e) if e.is_storage()));
        assert_eq!(tokio::fs::read_to_string(&tmp).await?, "[{\"idCart\": 1,");

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn create_fails_when_cart_ids_are_exhausted() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        let raw = r#"[{"idCart": 18446744073709551615, "productos": []}]"#;
        tokio::fs::write(&tmp, raw).await?;

        assert!(matches!(store.create().await, Err(ServiceError::Validation(_))));
        assert_eq!(tokio::fs::read_to_string(&tmp).await?, raw);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adds_to_one_cart_are_not_lost() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        store.create().await?;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.add_item(1, 42, 1).await }));
        }
        for h in handles {
            h.await??;
        }

        let cart = store.get(1).await?.expect("cart exists");
        assert_eq!(cart.items, vec![LineItem { product_id: 42, quantity: 20 }]);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
