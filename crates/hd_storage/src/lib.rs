use async_trait::async_trait;
use hd_core::{DigestStore, Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

pub const DEFAULT_DB_PATH: &str = "digest.db";

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn new() -> Result<Self> where Self: Sized;
}

async fn open_backend<T: StorageBackend + DigestStore + 'static>() -> Result<Arc<dyn DigestStore>> {
    let storage = T::new()
        .await
        .map_err(|e| Error::Storage(format!("{} ({})", T::get_error_message(), e)))?;
    Ok(Arc::new(storage))
}

/// Build the store named by `kind` (`memory` or `sqlite`).
#[cfg_attr(not(feature = "sqlite"), allow(unused_variables))]
pub async fn create_storage(kind: &str, db_path: Option<&Path>) -> Result<Arc<dyn DigestStore>> {
    let storage = match kind {
        "memory" => open_backend::<MemoryStorage>().await?,
        #[cfg(feature = "sqlite")]
        "sqlite" => match db_path {
            Some(path) => Arc::new(SQLiteStorage::new_with_path(path).await?) as Arc<dyn DigestStore>,
            None => open_backend::<SQLiteStorage>().await?,
        },
        other => return Err(Error::Config(format!("Unknown storage backend: {}", other))),
    };
    info!("Storage backend ready: {}", kind);
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", None).await.unwrap();
        assert!(storage.all_tag_weights().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_backend_is_config_error() {
        let result = create_storage("qdrant", None).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
