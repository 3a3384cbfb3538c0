use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Executor, PgPool};

use super::models::{Medicine, NewMedicine};
use super::store::{InventoryStore, StoreError};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS inventory (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL CHECK (name <> ''),
    quantity INTEGER NOT NULL CHECK (quantity >= 0),
    expiry_date DATE NOT NULL
)";

#[derive(Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.pool.execute(SCHEMA).await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn list_all(&self) -> Result<Vec<Medicine>, StoreError> {
        log::info!("Listing inventory");
        let medicines = sqlx::query_as::<_, Medicine>(
            "SELECT id, name, quantity, expiry_date FROM inventory ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(medicines)
    }

    async fn insert(&self, medicine: &NewMedicine) -> Result<Medicine, StoreError> {
        log::info!("Adding medicine '{}'", medicine.name());
        let inserted = sqlx::query_as::<_, Medicine>(
            "INSERT INTO inventory (name, quantity, expiry_date) VALUES ($1, $2, $3) \
             RETURNING id, name, quantity, expiry_date",
        )
        .bind(medicine.name())
        .bind(medicine.quantity())
        .bind(medicine.expiry_date())
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        log::info!("Removing medicines named '{}'", name);
        let result = sqlx::query("DELETE FROM inventory WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_name(&self, name: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.unsigned_abs())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        log::info!("Removing medicine #{}", id);
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn query_expiring_by(&self, threshold: NaiveDate) -> Result<Vec<Medicine>, StoreError> {
        log::info!("Checking medicines expiring on or before {}", threshold);
        let medicines = sqlx::query_as::<_, Medicine>(
            "SELECT id, name, quantity, expiry_date FROM inventory \
             WHERE expiry_date <= $1 ORDER BY expiry_date, id",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        Ok(medicines)
    }
}
