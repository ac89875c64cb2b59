use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::errors::ServiceError;
use crate::ids::lenient_id;
use crate::repository::ProductRepository;
use crate::storage::{next_key, JsonListStore, Keyed};

/// Caller-supplied product attributes (`title`, `price`, `stock`, ...), kept opaque.
pub type ProductFields = Map<String, Value>;

/// Product record: a store-assigned `id` followed by the caller's fields.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Product {
    #[serde(deserialize_with = "lenient_id")]
    pub id: u64,
    #[serde(flatten)]
    pub fields: ProductFields,
}

impl Product {
    /// Build `{id} merged with fields`; an `id` among the fields is discarded.
    pub fn new(id: u64, mut fields: ProductFields) -> Self {
        fields.shift_remove("id");
        Self { id, fields }
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }
}

impl Keyed for Product {
    fn key(&self) -> u64 { self.id }
}

/// File storage for the product catalog (`products.json`).
pub struct ProductStore {
    store: JsonListStore<Product>,
}

impl ProductStore {
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonListStore::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// All products in file order. A storage failure is logged and reads as empty.
    pub async fn list(&self) -> Vec<Product> {
        match self.store.read_all().await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, path = %self.path().display(), "failed to read products");
                Vec::new()
            }
        }
    }

    pub async fn get(&self, id: u64) -> Result<Option<Product>, ServiceError> {
        let items = self.store.read_all().await?;
        Ok(items.into_iter().find(|p| p.id == id))
    }

    pub async fn add(&self, fields: ProductFields) -> Result<Product, ServiceError> {
        let created = self
            .store
            .update_list(|items| {
                let product = Product::new(next_key(items)?, fields);
                items.push(product.clone());
                Ok(product)
            })
            .await
            .inspect_err(|e| error!(error = %e, "failed to add product"))?;
        info!(id = created.id, "product added");
        Ok(created)
    }

    /// Like [`add`](Self::add), but fails with `Conflict` when a product with
    /// the same `title` value already exists (`7` and `"7"` differ). The check
    /// and the insert happen under one lock.
    pub async fn add_unique_title(&self, fields: ProductFields) -> Result<Product, ServiceError> {
        let created = self
            .store
            .update_list(|items| {
                if let Some(title) = fields.get("title") {
                    if items.iter().any(|p| p.fields.get("title") == Some(title)) {
                        return Err(ServiceError::Conflict(format!("product {title} already exists")));
                    }
                }
                let product = Product::new(next_key(items)?, fields);
                items.push(product.clone());
                Ok(product)
            })
            .await?;
        info!(id = created.id, "product added");
        Ok(created)
    }

    /// Replace every field of product `id`. Fields absent from `fields` are dropped.
    pub async fn update(&self, id: u64, fields: ProductFields) -> Result<Option<Product>, ServiceError> {
        let res = self
            .store
            .update_list(|items| {
                let slot = items
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| ServiceError::not_found("product"))?;
                *slot = Product::new(id, fields);
                Ok(slot.clone())
            })
            .await;
        match res {
            Ok(updated) => {
                info!(id, "product updated");
                Ok(Some(updated))
            }
            Err(ServiceError::NotFound(_)) => {
                debug!(id, "update: product not found");
                Ok(None)
            }
            Err(e) => {
                error!(id, error = %e, "failed to update product");
                Err(e)
            }
        }
    }

    /// Remove product `id`; returns whether it existed.
    pub async fn delete(&self, id: u64) -> Result<bool, ServiceError> {
        let res = self
            .store
            .update_list(|items| {
                let index = items
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or_else(|| ServiceError::not_found("product"))?;
                items.remove(index);
                Ok(())
            })
            .await;
        match res {
            Ok(()) => {
                info!(id, "product deleted");
                Ok(true)
            }
            Err(ServiceError::NotFound(_)) => Ok(false),
            Err(e) => {
                error!(id, error = %e, "failed to delete product");
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl ProductRepository for ProductStore {
    async fn list(&self) -> Vec<Product> { self.list().await }
    async fn get(&self, id: u64) -> Result<Option<Product>, ServiceError> { self.get(id).await }
    async fn add(&self, fields: ProductFields) -> Result<Product, ServiceError> { self.add(fields).await }
    async fn add_unique_title(&self, fields: ProductFields) -> Result<Product, ServiceError> { self.add_unique_title(fields).await }
    async fn update(&self, id: u64, fields: ProductFields) -> Result<Option<Product>, ServiceError> { self.update(id, fields).await }
    async fn delete(&self, id: u64) -> Result<bool, ServiceError> { self.delete(id).await }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn fields(v: Value) -> ProductFields {
        match v {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    async fn setup_store() -> (Arc<ProductStore>, std::path::PathBuf) {
        let tmp = std::env::temp_dir().join(format!("svc_products_{}.json", Uuid::new_v4()));
        let store = ProductStore::new(&tmp).await.expect("store init");
        (store, tmp)
    }

    #[tokio::test]
    async fn add_get_delete_scenario() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;

        let a = store.add(fields(json!({"title": "A"}))).await?;
        assert_eq!(serde_json::to_value(&a)?, json!({"id": 1, "title": "A"}));
        let b = store.add(fields(json!({"title": "B"}))).await?;
        assert_eq!(serde_json::to_value(&b)?, json!({"id": 2, "title": "B"}));

        assert!(store.delete(1).await?);
        assert_eq!(store.get(1).await?, None);
        assert_eq!(store.get(2).await?, Some(b));

        // max remaining id is 2
        let c = store.add(fields(json!({"title": "C"}))).await?;
        assert_eq!(serde_json::to_value(&c)?, json!({"id": 3, "title": "C"}));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn deleting_the_max_id_lets_it_be_assigned_again() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        store.add(fields(json!({"title": "A"}))).await?;
        store.add(fields(json!({"title": "B"}))).await?;
        assert!(store.delete(2).await?);

        let again = store.add(fields(json!({"title": "C"}))).await?;
        assert_eq!(again.id, 2);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn caller_supplied_id_is_ignored() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        let p = store.add(fields(json!({"id": 99, "title": "A", "price": 10}))).await?;
        assert_eq!(p.id, 1);
        assert!(!p.fields.contains_key("id"));
        assert_eq!(store.get(1).await?.map(|p| p.fields), Some(fields(json!({"title": "A", "price": 10}))));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn update_replaces_all_fields() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        store
            .add(fields(json!({"title": "A", "description": "old", "stock": 5})))
            .await?;

        let updated = store.update(1, fields(json!({"title": "A2", "id": 7}))).await?;
        let updated = updated.expect("product exists");
        assert_eq!(serde_json::to_value(&updated)?, json!({"id": 1, "title": "A2"}));
        assert_eq!(store.get(1).await?, Some(updated));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_ids_are_not_found_and_do_not_write() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;

        assert_eq!(store.get(5).await?, None);
        assert_eq!(store.update(5, fields(json!({"title": "x"}))).await?, None);
        assert!(!store.delete(5).await?);
        // nothing was ever written
        assert!(!tmp.exists());

        store.add(fields(json!({"title": "A"}))).await?;
        let before = tokio::fs::metadata(&tmp).await?.modified()?;
        let content = tokio::fs::read(&tmp).await?;
        assert_eq!(store.update(5, fields(json!({"title": "x"}))).await?, None);
        assert!(!store.delete(5).await?);
        assert_eq!(tokio::fs::read(&tmp).await?, content);
        assert_eq!(tokio::fs::metadata(&tmp).await?.modified()?, before);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_keeps_order_of_remaining() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        for t in ["A", "B", "C", "D"] {
            store.add(fields(json!({"title": t}))).await?;
        }
        assert!(store.delete(2).await?);
        let ids: Vec<u64> = store.list().await.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_title_is_a_conflict() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        store.add_unique_title(fields(json!({"title": "A"}))).await?;
        let dup = store.add_unique_title(fields(json!({"title": "A", "price": 1}))).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));
        assert_eq!(store.list().await.len(), 1);

        store.add_unique_title(fields(json!({"title": 7}))).await?;
        let dup = store.add_unique_title(fields(json!({"title": 7}))).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));
        store.add_unique_title(fields(json!({"title": "7"}))).await?;
        assert_eq!(store.list().await.len(), 3);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn add_fails_when_ids_are_exhausted() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        let raw = r#"[{"id": 18446744073709551615, "title": "last"}]"#;
        tokio::fs::write(&tmp, raw).await?;

        assert!(matches!(store.add(fields(json!({"title": "x"}))).await, Err(ServiceError::Validation(_))));
        assert!(store.add_unique_title(fields(json!({"title": "y"}))).await.is_err());
        assert_eq!(tokio::fs::read_to_string(&tmp).await?, raw);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_lists_empty_but_get_reports_error() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        tokio::fs::write(&tmp, "[{\"id\": 1,").await?;

        assert!(store.list().await.is_empty());
        assert!(matches!(store.get(1).await, Err(e) if e.is_storage()));
        assert!(store.add(fields(json!({"title": "A"}))).await.is_err());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn reads_legacy_string_ids() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;
        tokio::fs::write(&tmp, "[\n\t{\"id\": \"4\", \"title\": \"legacy\"}\n]").await?;

        let p = store.get(4).await?.expect("legacy product");
        assert_eq!(p.title(), Some("legacy"));
        assert_eq!(store.add(fields(json!({"title": "new"}))).await?.id, 5);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adds_are_all_kept_with_distinct_ids() -> Result<(), anyhow::Error> {
        let (store, tmp) = setup_store().await;

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.add(fields(json!({"title": format!("p{i}")}))).await
            }));
        }
        for h in handles {
            h.await??;
        }

        let mut ids: Vec<u64> = store.list().await.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=32).collect::<Vec<_>>());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
