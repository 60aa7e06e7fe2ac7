//! SQLite cellar store implementation.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{NewWine, WineCategory, WinePatch, WineRecord};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, Pool, QueryBuilder, Sqlite};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{CellarSnapshot, CellarStore, SnapshotBroadcaster, StoreError, StoreResult};

/// Schema for the cellar database.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS wines (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    producer TEXT NOT NULL DEFAULT '',
    vintage TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT 'red',
    grape TEXT NOT NULL DEFAULT '',
    region TEXT NOT NULL DEFAULT '',
    alcohol_by_volume TEXT,
    price REAL,
    quantity INTEGER NOT NULL DEFAULT 1,
    rating INTEGER,
    notes TEXT,
    pairing_suggestion TEXT,
    image_reference TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_wines_owner_created
    ON wines(owner_id, created_at DESC);
"#;

const WINE_COLUMNS: &str = "id, owner_id, name, producer, vintage, category, grape, region, \
     alcohol_by_volume, price, quantity, rating, notes, pairing_suggestion, \
     image_reference, created_at";

/// Database row for a wine record.
#[derive(Debug, FromRow)]
struct WineRow {
    id: String,
    owner_id: String,
    name: String,
    producer: String,
    vintage: String,
    category: String,
    grape: String,
    region: String,
    alcohol_by_volume: Option<String>,
    price: Option<f64>,
    quantity: i64,
    rating: Option<i64>,
    notes: Option<String>,
    pairing_suggestion: Option<String>,
    image_reference: Option<String>,
    created_at: String,
}

impl From<WineRow> for WineRecord {
    fn from(row: WineRow) -> Self {
        WineRecord {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            producer: row.producer,
            vintage: row.vintage,
            category: WineCategory::parse(&row.category),
            grape: row.grape,
            region: row.region,
            alcohol_by_volume: row.alcohol_by_volume,
            price: row.price,
            quantity: u32::try_from(row.quantity).unwrap_or(0),
            rating: row.rating.and_then(|r| u8::try_from(r).ok()),
            notes: row.notes,
            pairing_suggestion: row.pairing_suggestion,
            image_reference: row.image_reference,
            created_at: chrono::DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
        }
    }
}

impl From<&WineRecord> for WineRow {
    fn from(wine: &WineRecord) -> Self {
        Self {
            id: wine.id.clone(),
            owner_id: wine.owner_id.clone(),
            name: wine.name.clone(),
            producer: wine.producer.clone(),
            vintage: wine.vintage.clone(),
            category: wine.category.as_str().to_string(),
            grape: wine.grape.clone(),
            region: wine.region.clone(),
            alcohol_by_volume: wine.alcohol_by_volume.clone(),
            price: wine.price,
            quantity: i64::from(wine.quantity),
            rating: wine.rating.map(i64::from),
            notes: wine.notes.clone(),
            pairing_suggestion: wine.pairing_suggestion.clone(),
            image_reference: wine.image_reference.clone(),
            created_at: wine.created_at.to_rfc3339(),
        }
    }
}

/// SQLite-backed cellar store.
pub struct SqliteCellarStore {
    pool: Pool<Sqlite>,
    broadcaster: SnapshotBroadcaster,
}

impl SqliteCellarStore {
    /// Opens (creating if needed) the cellar database at the given path.
    pub async fn open(db_path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(
                    path = %parent.display(),
                    error = %e,
                    "Failed to create database directory, connecting will likely fail"
                );
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        let store = Self {
            pool,
            broadcaster: SnapshotBroadcaster::new(),
        };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Runs database migrations
    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    async fn snapshot(&self, owner_id: &str) -> StoreResult<Vec<WineRecord>> {
        let rows: Vec<WineRow> = sqlx::query_as(&format!(
            "SELECT {WINE_COLUMNS}
             FROM wines
             WHERE owner_id = ?
             ORDER BY created_at DESC, id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WineRecord::from).collect())
    }

    async fn publish_snapshot(&self, owner_id: &str) {
        match self.snapshot(owner_id).await {
            Ok(records) => self.broadcaster.publish(owner_id, records),
            Err(e) => warn!(owner_id = %owner_id, error = %e, "Failed to publish cellar snapshot"),
        }
    }
}

#[async_trait]
impl CellarStore for SqliteCellarStore {
    async fn create_wine(
        &self,
        owner_id: &str,
        created_at: DateTime<Utc>,
        wine: NewWine,
    ) -> StoreResult<WineRecord> {
        let record = wine.into_record(Uuid::new_v4().to_string(), owner_id, created_at);
        let row = WineRow::from(&record);

        sqlx::query(&format!(
            "INSERT INTO wines ({WINE_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&row.id)
        .bind(&row.owner_id)
        .bind(&row.name)
        .bind(&row.producer)
        .bind(&row.vintage)
        .bind(&row.category)
        .bind(&row.grape)
        .bind(&row.region)
        .bind(&row.alcohol_by_volume)
        .bind(row.price)
        .bind(row.quantity)
        .bind(row.rating)
        .bind(&row.notes)
        .bind(&row.pairing_suggestion)
        .bind(&row.image_reference)
        .bind(&row.created_at)
        .execute(&self.pool)
        .await?;

        self.publish_snapshot(owner_id).await;
        Ok(record)
    }

    async fn get_wine(&self, id: &str) -> StoreResult<Option<WineRecord>> {
        let row: Option<WineRow> = sqlx::query_as(&format!(
            "SELECT {WINE_COLUMNS}
             FROM wines
             WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(WineRecord::from))
    }

    async fn list_wines(&self, owner_id: &str) -> StoreResult<Vec<WineRecord>> {
        self.snapshot(owner_id).await
    }

    async fn patch_wine(&self, id: &str, patch: &WinePatch) -> StoreResult<()> {
        let owner_id: Option<String> =
            sqlx::query_scalar("SELECT owner_id FROM wines WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let owner_id = owner_id.ok_or_else(|| StoreError::not_found("Wine", id))?;

        // Only the patched columns are written; untouched columns never ride
        // along, so interleaved patches to different fields cannot revert
        // each other. Last write wins per field, not per row.
        if !patch.is_empty() {
            let mut query = QueryBuilder::<Sqlite>::new("UPDATE wines SET ");
            let mut columns = query.separated(", ");
            if let Some(name) = &patch.name {
                columns.push("name = ").push_bind_unseparated(name);
            }
            if let Some(producer) = &patch.producer {
                columns.push("producer = ").push_bind_unseparated(producer);
            }
            if let Some(vintage) = &patch.vintage {
                columns.push("vintage = ").push_bind_unseparated(vintage);
            }
            if let Some(category) = patch.category {
                columns
                    .push("category = ")
                    .push_bind_unseparated(category.as_str());
            }
            if let Some(grape) = &patch.grape {
                columns.push("grape = ").push_bind_unseparated(grape);
            }
            if let Some(region) = &patch.region {
                columns.push("region = ").push_bind_unseparated(region);
            }
            if let Some(alcohol) = &patch.alcohol_by_volume {
                columns
                    .push("alcohol_by_volume = ")
                    .push_bind_unseparated(alcohol);
            }
            if let Some(price) = patch.price {
                columns.push("price = ").push_bind_unseparated(price);
            }
            if let Some(quantity) = patch.quantity {
                columns
                    .push("quantity = ")
                    .push_bind_unseparated(i64::from(quantity));
            }
            if let Some(rating) = patch.rating {
                columns
                    .push("rating = ")
                    .push_bind_unseparated(i64::from(rating));
            }
            if let Some(notes) = &patch.notes {
                columns.push("notes = ").push_bind_unseparated(notes);
            }
            if let Some(pairing) = &patch.pairing_suggestion {
                columns
                    .push("pairing_suggestion = ")
                    .push_bind_unseparated(pairing);
            }
            if let Some(image) = &patch.image_reference {
                columns
                    .push("image_reference = ")
                    .push_bind_unseparated(image);
            }
            query.push(" WHERE id = ").push_bind(id);

            query.build().execute(&self.pool).await?;
        }

        self.publish_snapshot(&owner_id).await;
        Ok(())
    }

    async fn delete_wine(&self, id: &str) -> StoreResult<()> {
        let owner_id: Option<String> =
            sqlx::query_scalar("SELECT owner_id FROM wines WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(owner_id) = owner_id else {
            debug!(wine_id = %id, "Delete of missing wine ignored");
            return Ok(());
        };

        sqlx::query("DELETE FROM wines WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.publish_snapshot(&owner_id).await;
        Ok(())
    }

    fn subscribe(&self, owner_id: &str) -> broadcast::Receiver<CellarSnapshot> {
        self.broadcaster.subscribe(owner_id)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use entities::WineCategory;

    use super::*;

    fn temp_db_path() -> PathBuf {
        std::env::temp_dir().join(format!("cantina-store-test-{}.db", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_wine_crud_round_trip() {
        let path = temp_db_path();
        let store = SqliteCellarStore::open(&path).await.unwrap();

        let created = store
            .create_wine(
                "user-1",
                Utc::now(),
                NewWine::new("Amarone")
                    .with_producer("Tenuta Alta")
                    .with_category(WineCategory::Red)
                    .with_quantity(2)
                    .with_price(60.0),
            )
            .await
            .unwrap();

        let fetched = store.get_wine(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let patch = WinePatch {
            region: Some("Veneto".to_string()),
            quantity: Some(1),
            ..WinePatch::default()
        };
        store.patch_wine(&created.id, &patch).await.unwrap();
        let patched = store.get_wine(&created.id).await.unwrap().unwrap();
        assert_eq!(patched.region, "Veneto");
        assert_eq!(patched.quantity, 1);
        assert_eq!(patched.producer, "Tenuta Alta");

        store.delete_wine(&created.id).await.unwrap();
        assert!(store.get_wine(&created.id).await.unwrap().is_none());

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_list_scoped_to_owner_newest_first() {
        let path = temp_db_path();
        let store = SqliteCellarStore::open(&path).await.unwrap();
        let earlier = Utc::now() - chrono::Duration::minutes(5);

        store
            .create_wine("user-1", earlier, NewWine::new("Older"))
            .await
            .unwrap();
        store
            .create_wine("user-1", Utc::now(), NewWine::new("Newer"))
            .await
            .unwrap();
        store
            .create_wine("user-2", Utc::now(), NewWine::new("Foreign"))
            .await
            .unwrap();

        let wines = store.list_wines("user-1").await.unwrap();
        assert_eq!(wines.len(), 2);
        assert_eq!(wines[0].name, "Newer");
        assert_eq!(wines[1].name, "Older");

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_interleaved_patches_keep_both_fields() {
        let path = temp_db_path();
        let store = SqliteCellarStore::open(&path).await.unwrap();

        let created = store
            .create_wine("user-1", Utc::now(), NewWine::new("Draft Name"))
            .await
            .unwrap();

        // Two concurrent patches touching different fields: neither may
        // revert the other's column, whatever order they land in
        let name_patch = WinePatch {
            name: Some("Final Name".to_string()),
            ..WinePatch::default()
        };
        let region_patch = WinePatch {
            region: Some("Toscana".to_string()),
            ..WinePatch::default()
        };
        let (a, b) = tokio::join!(
            store.patch_wine(&created.id, &name_patch),
            store.patch_wine(&created.id, &region_patch),
        );
        a.unwrap();
        b.unwrap();

        let patched = store.get_wine(&created.id).await.unwrap().unwrap();
        assert_eq!(patched.name, "Final Name");
        assert_eq!(patched.region, "Toscana");

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_patch_unknown_wine_is_not_found() {
        let path = temp_db_path();
        let store = SqliteCellarStore::open(&path).await.unwrap();

        let patch = WinePatch {
            name: Some("Ghost".to_string()),
            ..WinePatch::default()
        };
        let result = store.patch_wine("missing", &patch).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_open_fails_when_directory_cannot_be_created() {
        // A regular file where the parent directory should be
        let blocker = temp_db_path();
        std::fs::write(&blocker, b"not a directory").unwrap();
        let path = blocker.join("cellar.db");

        assert!(SqliteCellarStore::open(&path).await.is_err());

        std::fs::remove_file(&blocker).ok();
    }

    #[tokio::test]
    async fn test_delete_unknown_wine_succeeds() {
        let path = temp_db_path();
        let store = SqliteCellarStore::open(&path).await.unwrap();

        assert!(store.delete_wine("missing").await.is_ok());

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_mutations_publish_snapshots() {
        let path = temp_db_path();
        let store = SqliteCellarStore::open(&path).await.unwrap();
        let mut rx = store.subscribe("user-1");

        store
            .create_wine("user-1", Utc::now(), NewWine::new("Verdicchio"))
            .await
            .unwrap();

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.owner_id, "user-1");
        assert_eq!(snapshot.records.len(), 1);

        std::fs::remove_file(&path).ok();
    }
}
