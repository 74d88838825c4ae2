//! SQLite-backed local event store
//!
//! Writes go through this type so every change can be broadcast to live
//! subscribers, each of which re-reads and delivers the full snapshot.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use evhub_common::{Error, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{LocalEventStore, SnapshotOrder, StoreError, Subscription, UnsubscribeHandle};
use crate::models::{LocalEventRecord, NewLocalEvent};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;
const CHANGE_CHANNEL_CAPACITY: usize = 64;

const SELECT_COLUMNS: &str = "id, title, cover_image, date, time, start_at, location, \
     description, organizer_name, price, is_free, category, imported_from, created_at";

/// Local event store on a SQLite pool
#[derive(Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
    changes: broadcast::Sender<()>,
}

impl SqliteEventStore {
    /// Open (or create) the database file at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // mode=rwc: read, write, create
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        tracing::debug!("Connecting to database: {}", db_url);

        let pool = SqlitePool::connect(&db_url).await?;
        Self::from_pool(pool).await
    }

    /// Private in-memory database (single connection so all queries share it)
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the events table if needed
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        init_tables(&pool).await?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self { pool, changes })
    }

    /// Insert a new event, returning its id
    pub async fn insert(&self, event: &NewLocalEvent) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.insert_with_id(&id, &created_at, event).await?;
        Ok(id)
    }

    /// Insert with caller-chosen id and creation timestamp
    pub async fn insert_with_id(
        &self,
        id: &str,
        created_at: &str,
        event: &NewLocalEvent,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (
                id, title, cover_image, date, time, start_at, location, description,
                organizer_name, price, is_free, category, imported_from, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&event.title)
        .bind(&event.cover_image)
        .bind(&event.date)
        .bind(&event.time)
        .bind(&event.start_at)
        .bind(&event.location)
        .bind(&event.description)
        .bind(&event.organizer_name)
        .bind(event.price)
        .bind(event.is_free)
        .bind(&event.category)
        .bind(&event.imported_from)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = %id, "Inserted local event");
        self.notify();
        Ok(())
    }

    /// Replace all editable fields of an existing event
    pub async fn update(&self, id: &str, event: &NewLocalEvent) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = ?, cover_image = ?, date = ?, time = ?, start_at = ?, location = ?,
                description = ?, organizer_name = ?, price = ?, is_free = ?, category = ?,
                imported_from = ?
            WHERE id = ?
            "#,
        )
        .bind(&event.title)
        .bind(&event.cover_image)
        .bind(&event.date)
        .bind(&event.time)
        .bind(&event.start_at)
        .bind(&event.location)
        .bind(&event.description)
        .bind(&event.organizer_name)
        .bind(event.price)
        .bind(event.is_free)
        .bind(&event.category)
        .bind(&event.imported_from)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("event {}", id)));
        }

        tracing::debug!(id = %id, "Updated local event");
        self.notify();
        Ok(())
    }

    /// Delete an event; returns false if it did not exist
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::debug!(id = %id, "Deleted local event");
            self.notify();
        }
        Ok(deleted)
    }

    /// Read the full current collection
    pub async fn snapshot(&self, order: SnapshotOrder) -> Result<Vec<LocalEventRecord>> {
        Ok(load_snapshot(&self.pool, order).await?)
    }

    fn notify(&self) {
        // No receivers simply means nobody is subscribed
        let _ = self.changes.send(());
    }
}

async fn load_snapshot(
    pool: &SqlitePool,
    order: SnapshotOrder,
) -> std::result::Result<Vec<LocalEventRecord>, sqlx::Error> {
    let direction = match order {
        SnapshotOrder::CreatedDesc => "DESC",
        SnapshotOrder::CreatedAsc => "ASC",
    };
    let sql = format!(
        "SELECT {} FROM events ORDER BY created_at {dir}, rowid {dir}",
        SELECT_COLUMNS,
        dir = direction
    );

    sqlx::query_as::<_, LocalEventRecord>(&sql)
        .fetch_all(pool)
        .await
}

async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            title TEXT,
            cover_image TEXT,
            date TEXT,
            time TEXT,
            start_at TEXT,
            location TEXT,
            description TEXT,
            organizer_name TEXT,
            price REAL,
            is_free INTEGER,
            category TEXT,
            imported_from TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_created_at ON events(created_at)")
        .execute(pool)
        .await?;

    tracing::debug!("Database tables initialized (events)");
    Ok(())
}

#[async_trait]
impl LocalEventStore for SqliteEventStore {
    async fn subscribe(
        &self,
        order: SnapshotOrder,
    ) -> std::result::Result<Subscription, StoreError> {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(1);
        let token = CancellationToken::new();

        // Subscribe to changes before the first read so no write is missed
        let mut changes = self.changes.subscribe();
        let pool = self.pool.clone();
        let cancelled = token.clone();

        tokio::spawn(async move {
            loop {
                let snapshot = tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    result = load_snapshot(&pool, order) => result,
                };

                match snapshot {
                    Ok(records) => {
                        tracing::trace!(count = records.len(), "Delivering local snapshot");
                        if snapshot_tx.send(records).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = error_tx.send(StoreError::Database(e)).await;
                        break;
                    }
                }

                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    changed = changes.recv() => match changed {
                        // A lagged receiver still only needs one fresh snapshot
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => {
                            let _ = error_tx
                                .send(StoreError::Closed("store dropped".to_string()))
                                .await;
                            break;
                        }
                    },
                }
            }

            tracing::debug!("Local store subscription ended");
        });

        Ok(Subscription {
            snapshots: snapshot_rx,
            errors: error_rx,
            handle: UnsubscribeHandle::new(token),
        })
    }
}
