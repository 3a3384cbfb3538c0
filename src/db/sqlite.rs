use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Executor, SqlitePool};

use super::models::{Medicine, NewMedicine};
use super::store::{InventoryStore, StoreError};

// AUTOINCREMENT keeps ids from being reused after a delete.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS inventory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(name) > 0),
    quantity INTEGER NOT NULL CHECK (quantity >= 0),
    expiry_date TEXT NOT NULL
)";

#[derive(Clone)]
pub struct SqliteInventoryStore {
    pool: SqlitePool,
}

impl SqliteInventoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.pool.execute(SCHEMA).await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
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
        let result =
            sqlx::query("INSERT INTO inventory (name, quantity, expiry_date) VALUES (?, ?, ?)")
                .bind(medicine.name())
                .bind(medicine.quantity())
                .bind(medicine.expiry_date())
                .execute(&self.pool)
                .await?;

        Ok(Medicine {
            id: result.last_insert_rowid(),
            name: medicine.name().to_string(),
            quantity: medicine.quantity(),
            expiry_date: medicine.expiry_date(),
        })
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        log::info!("Removing medicines named '{}'", name);
        let result = sqlx::query("DELETE FROM inventory WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_name(&self, name: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.unsigned_abs())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        log::info!("Removing medicine #{}", id);
        let result = sqlx::query("DELETE FROM inventory WHERE id = ?")
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
        // Dates are stored zero-padded, so text order matches calendar order.
        let medicines = sqlx::query_as::<_, Medicine>(
            "SELECT id, name, quantity, expiry_date FROM inventory \
             WHERE expiry_date <= ? ORDER BY expiry_date, id",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        Ok(medicines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_store() -> SqliteInventoryStore {
        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteInventoryStore::new(pool);
        store.ensure_schema().await.unwrap();
        store
    }

    fn medicine(name: &str, quantity: i32, expiry: &str) -> NewMedicine {
        let date = NaiveDate::parse_from_str(expiry, "%Y-%m-%d").unwrap();
        NewMedicine::new(name, quantity, date).unwrap()
    }

    fn names(medicines: &[Medicine]) -> Vec<&str> {
        medicines.iter().map(|m| m.name.as_str()).collect()
    }

    #[tokio::test]
    async fn insert_then_list_returns_record_with_fresh_id() {
        let store = memory_store().await;
        let first = store.insert(&medicine("Aspirin", 500, "2025-06-30")).await.unwrap();
        let second = store.insert(&medicine("Metformin", 350, "2025-09-30")).await.unwrap();

        assert_ne!(first.id, second.id);

        let all = store.list_all().await.unwrap();
        let matching: Vec<_> = all.iter().filter(|m| m.name == "Metformin").collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0], &second);
        assert_eq!(matching[0].quantity, 350);
        assert_eq!(
            matching[0].expiry_date,
            NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()
        );
    }

    #[tokio::test]
    async fn list_all_on_empty_table_is_empty() {
        let store = memory_store().await;
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_name_leaves_table_unchanged() {
        let store = memory_store().await;
        store.insert(&medicine("Aspirin", 1, "2025-01-01")).await.unwrap();
        let before = store.list_all().await.unwrap();

        assert!(!store.delete_by_name("Ibuprofen").await.unwrap());
        assert_eq!(store.list_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_by_name_is_exact_and_case_sensitive() {
        let store = memory_store().await;
        store.insert(&medicine("Aspirin", 1, "2025-01-01")).await.unwrap();
        let kept = store.insert(&medicine("Aspirin Forte", 1, "2025-01-01")).await.unwrap();

        assert!(!store.delete_by_name("aspirin").await.unwrap());
        assert!(!store.delete_by_name("Asp").await.unwrap());
        assert!(store.delete_by_name("Aspirin").await.unwrap());

        assert_eq!(store.list_all().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn delete_by_name_removes_every_match() {
        let store = memory_store().await;
        store.insert(&medicine("Amoxicillin", 10, "2024-12-31")).await.unwrap();
        store.insert(&medicine("Amoxicillin", 20, "2025-03-31")).await.unwrap();
        store.insert(&medicine("Amoxicillin", 30, "2025-06-30")).await.unwrap();
        let other = store.insert(&medicine("Omeprazole", 5, "2025-07-31")).await.unwrap();

        assert_eq!(store.count_by_name("Amoxicillin").await.unwrap(), 3);
        assert!(store.delete_by_name("Amoxicillin").await.unwrap());
        assert_eq!(store.count_by_name("Amoxicillin").await.unwrap(), 0);
        assert_eq!(store.list_all().await.unwrap(), vec![other]);
    }

    #[tokio::test]
    async fn expiry_query_is_inclusive_of_threshold() {
        let store = memory_store().await;
        store.insert(&medicine("C", 1, "2024-07-01")).await.unwrap();
        store.insert(&medicine("B", 1, "2024-06-01")).await.unwrap();
        store.insert(&medicine("A", 1, "2024-05-01")).await.unwrap();

        let threshold = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let expiring = store.query_expiring_by(threshold).await.unwrap();
        assert_eq!(names(&expiring), vec!["A", "B"]);

        let earlier = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        assert!(store.query_expiring_by(earlier).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_list_delete_round_trip() {
        let store = memory_store().await;
        store.insert(&medicine("Lisinopril", 400, "2025-03-15")).await.unwrap();
        let before = store.list_all().await.unwrap();

        let added = store.insert(&medicine("Gabapentin", 300, "2025-05-31")).await.unwrap();
        let during = store.list_all().await.unwrap();
        assert_eq!(during.len(), before.len() + 1);
        assert!(before.iter().all(|m| m.id != added.id));

        assert!(store.delete_by_name("Gabapentin").await.unwrap());
        assert_eq!(store.list_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = memory_store().await;
        let first = store.insert(&medicine("Albuterol", 1, "2026-04-30")).await.unwrap();
        store.delete_by_id(first.id).await.unwrap();
        let second = store.insert(&medicine("Albuterol", 1, "2026-04-30")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn delete_by_id_reports_missing_record() {
        let store = memory_store().await;
        let err = store.delete_by_id(42).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(42)));
    }

    #[tokio::test]
    async fn writes_bypassing_validation_hit_table_constraints() {
        let store = memory_store().await;
        let err = sqlx::query("INSERT INTO inventory (name, quantity, expiry_date) VALUES (?, ?, ?)")
            .bind("Aspirin")
            .bind(-5)
            .bind("2025-01-01")
            .execute(&store.pool)
            .await
            .map_err(StoreError::from)
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolated(_)));
    }

    #[tokio::test]
    async fn closed_pool_is_reported_as_unavailable() {
        let store = memory_store().await;
        store.pool.close().await;
        let err = store.list_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
