//! Outpost Database Layer
//!
//! `SQLite` storage for scraped outlets through `SQLx`, with embedded,
//! versioned migrations.
//!
//! # Example
//!
//! ```ignore
//! use outpost_db::Database;
//!
//! let db = Database::new("outlets.db").await?;
//! db.run_migrations().await?;
//! println!("schema v{}", db.get_schema_version().await?);
//! ```
//!
//! [`Database`] implements [`outpost_core::OutletStore`], so the scrape
//! orchestrator can persist outlets without knowing about `SQLx`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod migrations;
pub mod outlets;

// Re-export commonly used types
pub use error::{DatabaseError, Result};
pub use outlets::{NearbyOutlet, OutletRecord};

use async_trait::async_trait;
use outpost_core::{Coordinates, OutletDraft, OutletStore, StoreError};
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// High-level database handle.
///
/// Wraps the connection pool and optionally enforces a brand prefix on
/// every inserted outlet name.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    required_prefix: Option<String>,
}

impl Database {
    /// Open the database at `path` (or `:memory:`).
    ///
    /// Migrations are not applied; call [`Database::run_migrations`].
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connection::connect(path).await?;
        Ok(Self::from_pool(pool))
    }

    /// Open the database at `path` and bring its schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self::new(path).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Migrated in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::open(connection::MEMORY_PATH).await
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            required_prefix: None,
        }
    }

    /// Reject outlets whose name does not start with `prefix`.
    #[must_use]
    pub fn with_required_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.required_prefix = Some(prefix.into());
        self
    }

    /// Apply pending migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Highest applied migration version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Validate and insert one outlet.
    pub async fn insert_outlet(&self, draft: &OutletDraft) -> Result<i64> {
        outlets::validate_outlet(draft, self.required_prefix.as_deref())?;
        let id = outlets::insert_outlet(&self.pool, draft).await?;
        tracing::debug!(id, name = %draft.name, "Outlet stored");
        Ok(id)
    }

    /// Number of stored outlets.
    pub async fn count_outlets(&self) -> Result<i64> {
        outlets::count_outlets(&self.pool).await
    }

    /// Stored outlets in insertion order.
    pub async fn list_outlets(&self, limit: i64) -> Result<Vec<OutletRecord>> {
        outlets::list_outlets(&self.pool, limit).await
    }

    /// Geocoded outlets within `radius_km` of `center`, nearest first.
    pub async fn nearby_outlets(
        &self,
        center: Coordinates,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<NearbyOutlet>> {
        outlets::nearby_outlets(&self.pool, center, radius_km, limit).await
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl OutletStore for Database {
    async fn insert(&self, outlet: &OutletDraft) -> std::result::Result<i64, StoreError> {
        Ok(self.insert_outlet(outlet).await?)
    }

    async fn exists(&self, name: &str) -> std::result::Result<bool, StoreError> {
        Ok(outlets::outlet_exists(&self.pool, name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_in_memory_is_migrated() {
        let db = Database::in_memory().await.expect("open database");
        assert_eq!(db.get_schema_version().await.expect("version"), 2);
        assert_eq!(db.count_outlets().await.expect("count"), 0);
        db.close().await;
    }

    #[tokio::test]
    async fn test_store_maps_duplicates() {
        let db = Database::in_memory().await.expect("open database");
        let store: Arc<dyn OutletStore> = Arc::new(db.clone());
        let draft = OutletDraft::new("McDonald's KLCC", "Jalan Ampang, Kuala Lumpur");

        assert!(!store.exists(&draft.name).await.expect("exists"));
        store.insert(&draft).await.expect("insert");
        assert!(store.exists(&draft.name).await.expect("exists"));

        let err = store.insert(&draft).await.expect_err("duplicate");
        assert!(matches!(err, StoreError::Duplicate { ref name } if name == "McDonald's KLCC"));
    }

    #[tokio::test]
    async fn test_store_maps_validation_failures() {
        let db = Database::in_memory()
            .await
            .expect("open database")
            .with_required_prefix("McDonald's");

        let err = OutletStore::insert(&db, &OutletDraft::new("KFC Ampang", "Jalan Ampang"))
            .await
            .expect_err("unbranded name");
        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(db.count_outlets().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("outlets.db");

        let db = Database::open(&path).await.expect("open");
        db.insert_outlet(&OutletDraft::new("McDonald's KLCC", "Jalan Ampang, Kuala Lumpur"))
            .await
            .expect("insert");
        db.close().await;

        let reopened = Database::open(&path).await.expect("reopen");
        assert_eq!(reopened.count_outlets().await.expect("count"), 1);
        let listed = reopened.list_outlets(10).await.expect("list");
        assert_eq!(listed[0].name, "McDonald's KLCC");
        reopened.close().await;
    }
}
