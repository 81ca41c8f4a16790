//! Persistence contract consumed by the scrape orchestrator.

use crate::types::OutletDraft;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by an outlet store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An outlet with the same unique name is already stored.
    #[error("outlet already stored: {name}")]
    Duplicate {
        /// Name that collided
        name: String,
    },

    /// The record failed store-side validation.
    #[error("invalid outlet record: {0}")]
    Invalid(String),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Storage for accepted outlets.
///
/// Implementations must reject a second record with the same name using
/// [`StoreError::Duplicate`] so callers can tell storage-level duplicates
/// apart from real failures.
#[async_trait]
pub trait OutletStore: Send + Sync {
    /// Insert an outlet and return its row id.
    async fn insert(&self, outlet: &OutletDraft) -> Result<i64, StoreError>;

    /// Whether an outlet with this exact name is already stored.
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<String, i64>>,
    }

    #[async_trait]
    impl OutletStore for MemoryStore {
        async fn insert(&self, outlet: &OutletDraft) -> Result<i64, StoreError> {
            let mut rows = self.rows.lock().await;
            if rows.contains_key(&outlet.name) {
                return Err(StoreError::Duplicate {
                    name: outlet.name.clone(),
                });
            }
            let id = i64::try_from(rows.len()).unwrap_or(i64::MAX) + 1;
            rows.insert(outlet.name.clone(), id);
            Ok(id)
        }

        async fn exists(&self, name: &str) -> Result<bool, StoreError> {
            Ok(self.rows.lock().await.contains_key(name))
        }
    }

    #[tokio::test]
    async fn test_store_contract_distinguishes_duplicates() {
        let store = MemoryStore::default();
        let outlet = OutletDraft::new("McDonald's KLCC", "Jalan Ampang, Kuala Lumpur");

        assert!(!store.exists(&outlet.name).await.expect("exists"));
        assert_eq!(store.insert(&outlet).await.expect("insert"), 1);
        assert!(store.exists(&outlet.name).await.expect("exists"));

        let err = store.insert(&outlet).await.expect_err("duplicate insert");
        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert_eq!(err.to_string(), "outlet already stored: McDonald's KLCC");
    }
}
