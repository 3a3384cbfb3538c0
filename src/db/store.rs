use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::error::ErrorKind;
use thiserror::Error;

use super::models::{Medicine, NewMedicine};

/// Handle passed to every component that needs persistence.
pub type SharedStore = Arc<dyn InventoryStore>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Inventory storage is unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
    #[error("Constraint violated: {0}")]
    ConstraintViolated(String),
    #[error("No medicine with id {0}")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let violation = match &err {
            sqlx::Error::Database(db) => matches!(
                db.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            )
            .then(|| db.message().to_string()),
            _ => None,
        };

        if let Some(message) = violation {
            return StoreError::ConstraintViolated(message);
        }

        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err),
            _ => StoreError::Database(err),
        }
    }
}

/// Data-access façade over the `inventory` table.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Every record, in insertion order.
    async fn list_all(&self) -> Result<Vec<Medicine>, StoreError>;

    /// Appends a record and returns it with its storage-assigned id.
    /// Names are not required to be unique.
    async fn insert(&self, medicine: &NewMedicine) -> Result<Medicine, StoreError>;

    /// Removes every record whose name equals `name` exactly (case-sensitive).
    /// Returns `true` when at least one row was removed.
    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError>;

    /// Number of records that [`InventoryStore::delete_by_name`] would remove.
    async fn count_by_name(&self, name: &str) -> Result<u64, StoreError>;

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError>;

    /// Records expiring on or before `threshold`, soonest first.
    async fn query_expiring_by(&self, threshold: NaiveDate) -> Result<Vec<Medicine>, StoreError>;
}
