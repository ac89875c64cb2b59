use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, sync::Mutex};

use crate::errors::ServiceError;

/// A record addressed by a store-assigned positive integer key.
pub trait Keyed {
    fn key(&self) -> u64;
}

/// Next key for a collection: one past the largest key present, or 1 when empty.
///
/// Keys of deleted records are not remembered, so removing the current maximum
/// lets a later insert take a value at or below it. Fails when the largest key
/// is already `u64::MAX`.
pub fn next_key<T: Keyed>(items: &[T]) -> Result<u64, ServiceError> {
    match items.iter().map(Keyed::key).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| ServiceError::Validation("id space exhausted".into())),
    }
}

/// Generic JSON file-backed ordered collection.
///
/// The file holds a top-level array. Every operation reads the whole array,
/// and every mutation rewrites it, while holding a per-store mutex so that
/// read-modify-write cycles never interleave.
pub struct JsonListStore<T> {
    file_path: PathBuf,
    lock: Mutex<()>,
    _items: PhantomData<fn() -> T>,
}

impl<T> JsonListStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind the store to a path. The file itself is created on first write;
    /// a missing file reads as an empty collection.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::Storage(format!("create {}: {e}", parent.display())))?;
        }
        Ok(Self { file_path, lock: Mutex::new(()), _items: PhantomData })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn load(&self) -> Result<Vec<T>, ServiceError> {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ServiceError::Storage(format!("read {}: {e}", self.file_path.display())))
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::Serialization(format!("{}: {e}", self.file_path.display())))
    }

    async fn save(&self, items: &[T]) -> Result<(), ServiceError> {
        let data = to_tab_indented(items)
            .map_err(|e| ServiceError::Serialization(e.to_string()))?;
        let tmp = self.file_path.with_extension("json.tmp");
        fs::write(&tmp, data)
            .await
            .map_err(|e| ServiceError::Storage(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.file_path).await.map_err(|e| {
            ServiceError::Storage(format!(
                "rename {} -> {}: {e}",
                tmp.display(),
                self.file_path.display()
            ))
        })
    }

    /// Read the full collection.
    pub async fn read_all(&self) -> Result<Vec<T>, ServiceError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// Apply a mutation to the collection and persist it.
    ///
    /// If `f` returns an error nothing is written and the error is passed through.
    pub async fn update_list<F, R>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, ServiceError>,
    {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        let out = f(&mut items)?;
        self.save(&items).await?;
        Ok(out)
    }
}

fn to_tab_indented<S: Serialize + ?Sized>(value: &S) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}
