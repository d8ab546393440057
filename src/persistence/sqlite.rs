//! SQLite implementation of the message log.

use std::str::FromStr;

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::domain::{ChatMessage, HistoryPage};
use crate::error::RelayError;

/// Row tuple for the `messages` table, in schema order.
type MessageRow = (i64, String, String, i64, Option<String>, Option<String>);

/// SQLite-backed message log using `sqlx::SqlitePool`.
///
/// Id assignment happens inside the database (`AUTOINCREMENT`), so ids are
/// unique and strictly increasing even across concurrent callers.
#[derive(Debug, Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    /// Opens (creating if missing) the store at the given SQLite URL and
    /// brings its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError::Persistence`] if the URL is invalid, the
    /// file cannot be opened, or schema setup fails.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RelayError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| RelayError::Persistence(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| RelayError::Persistence(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Creates the `messages` table and adds the optional image columns.
    ///
    /// The base table predates image support; files created by the older
    /// schema gain the columns here via `ALTER TABLE`, and rows written
    /// before that read back with `NULL` image fields.
    async fn migrate(&self) -> Result<(), RelayError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (\
                 id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 username TEXT NOT NULL, \
                 text TEXT NOT NULL, \
                 timestamp INTEGER NOT NULL\
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RelayError::Persistence(e.to_string()))?;

        for column in ["image", "image_type"] {
            let result = sqlx::query(&format!("ALTER TABLE messages ADD COLUMN {column} TEXT"))
                .execute(&self.pool)
                .await;
            match result {
                Ok(_) => {}
                Err(e) if e.to_string().contains("duplicate column name") => {}
                Err(e) => return Err(RelayError::Persistence(e.to_string())),
            }
        }

        Ok(())
    }

    /// Inserts a new message, assigning its id and timestamp server-side.
    ///
    /// Returns the assigned id. The caller must not broadcast the message
    /// unless this call succeeded.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError::Persistence`] if the write fails.
    pub async fn append(
        &self,
        username: &str,
        text: &str,
        image: Option<&str>,
        image_type: Option<&str>,
    ) -> Result<i64, RelayError> {
        let timestamp = Utc::now().timestamp_millis();

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO messages (username, text, timestamp, image, image_type) \
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(username)
        .bind(text)
        .bind(timestamp)
        .bind(image)
        .bind(image_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RelayError::Persistence(e.to_string()))?;

        Ok(id)
    }

    /// Returns at most `limit` most-recent messages, oldest first.
    ///
    /// Selected newest-first and reversed, so the result is always in
    /// ascending id order regardless of the internal query order.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError::Persistence`] if the read fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<ChatMessage>, RelayError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, username, text, timestamp, image, image_type \
             FROM messages ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelayError::Persistence(e.to_string()))?;

        let mut messages: Vec<ChatMessage> = rows.into_iter().map(into_message).collect();
        messages.reverse();
        Ok(messages)
    }

    /// Returns up to `limit` messages with `id < cursor_id`, oldest first,
    /// plus whether history older than the returned page exists.
    ///
    /// The page is the most recent `limit` messages strictly before the
    /// cursor (selected descending then reversed), which is not the same
    /// as the first `limit` messages after some older boundary.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError::Persistence`] if the read fails.
    pub async fn before(&self, cursor_id: i64, limit: i64) -> Result<HistoryPage, RelayError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, username, text, timestamp, image, image_type \
             FROM messages WHERE id < ? ORDER BY id DESC LIMIT ?",
        )
        .bind(cursor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelayError::Persistence(e.to_string()))?;

        // The last row of the DESC page is the oldest returned id; more
        // history exists iff anything sits strictly below it.
        let has_more = match rows.last() {
            Some(&(oldest_id, ..)) => {
                let older = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM messages WHERE id < ?",
                )
                .bind(oldest_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RelayError::Persistence(e.to_string()))?;
                older > 0
            }
            None => false,
        };

        let mut messages: Vec<ChatMessage> = rows.into_iter().map(into_message).collect();
        messages.reverse();
        Ok(HistoryPage { messages, has_more })
    }

    /// Closes the underlying pool, flushing outstanding work.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn into_message((id, username, text, timestamp, image, image_type): MessageRow) -> ChatMessage {
    ChatMessage {
        id,
        username,
        text,
        timestamp,
        image,
        image_type,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    async fn memory_store() -> MessageStore {
        let Ok(store) = MessageStore::connect("sqlite::memory:", 1).await else {
            panic!("in-memory store failed to open");
        };
        store
    }

    async fn seed(store: &MessageStore, count: usize) -> Vec<i64> {
        let mut ids = Vec::with_capacity(count);
        for n in 0..count {
            let Ok(id) = store.append("alice", &format!("msg {n}"), None, None).await else {
                panic!("append failed");
            };
            ids.push(id);
        }
        ids
    }

    #[tokio::test]
    async fn append_assigns_strictly_increasing_ids() {
        let store = memory_store().await;
        let ids = seed(&store, 5).await;
        for pair in ids.windows(2) {
            let &[a, b] = pair else {
                panic!("window of two");
            };
            assert!(b > a, "ids must strictly increase: {a} then {b}");
        }
    }

    #[tokio::test]
    async fn concurrent_appends_never_collide() {
        let store = memory_store().await;
        let mut handles = Vec::new();
        for worker in 0..4 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut ids = Vec::new();
                for n in 0..5 {
                    let Ok(id) = store
                        .append(&format!("user{worker}"), &format!("msg {n}"), None, None)
                        .await
                    else {
                        panic!("append failed");
                    };
                    ids.push(id);
                }
                ids
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            let Ok(ids) = handle.await else {
                panic!("worker task failed");
            };
            all.extend(ids);
        }

        let mut deduped = all.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), all.len(), "ids must be unique");
    }

    #[tokio::test]
    async fn recent_returns_newest_in_ascending_order() {
        let store = memory_store().await;
        let ids = seed(&store, 10).await;

        let Ok(messages) = store.recent(3).await else {
            panic!("recent failed");
        };
        assert_eq!(messages.len(), 3);
        let returned: Vec<i64> = messages.iter().map(|m| m.id).collect();
        let expected: Vec<i64> = ids.iter().skip(7).copied().collect();
        assert_eq!(returned, expected);
    }

    #[tokio::test]
    async fn recent_is_bounded_by_total() {
        let store = memory_store().await;
        seed(&store, 2).await;

        let Ok(messages) = store.recent(100).await else {
            panic!("recent failed");
        };
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn recent_on_empty_store_is_empty() {
        let store = memory_store().await;
        let Ok(messages) = store.recent(100).await else {
            panic!("recent failed");
        };
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn before_returns_page_under_cursor() {
        let store = memory_store().await;
        let ids = seed(&store, 10).await;
        let Some(&cursor) = ids.get(6) else {
            panic!("seed too short");
        };

        let Ok(page) = store.before(cursor, 3).await else {
            panic!("before failed");
        };
        let returned: Vec<i64> = page.messages.iter().map(|m| m.id).collect();
        let expected: Vec<i64> = ids.iter().skip(3).take(3).copied().collect();
        assert_eq!(returned, expected);
        assert!(returned.iter().all(|&id| id < cursor));
        assert!(page.has_more, "three older rows remain");
    }

    #[tokio::test]
    async fn before_reports_end_of_history() {
        let store = memory_store().await;
        let ids = seed(&store, 3).await;
        let Some(&cursor) = ids.last() else {
            panic!("seed too short");
        };

        let Ok(page) = store.before(cursor, 50).await else {
            panic!("before failed");
        };
        assert_eq!(page.messages.len(), 2);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn before_with_no_older_rows_is_empty_and_final() {
        let store = memory_store().await;
        let ids = seed(&store, 3).await;
        let Some(&first) = ids.first() else {
            panic!("seed too short");
        };

        let Ok(page) = store.before(first, 50).await else {
            panic!("before failed");
        };
        assert!(page.messages.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn pagination_is_contiguous() {
        let store = memory_store().await;
        let ids = seed(&store, 10).await;

        // Walk backwards from the end in pages of three; the pages must
        // tile history with no overlap and no gap.
        let Some(&newest) = ids.last() else {
            panic!("seed too short");
        };
        let mut cursor = newest;
        let mut collected = vec![newest];
        loop {
            let Ok(page) = store.before(cursor, 3).await else {
                panic!("before failed");
            };
            let page_ids: Vec<i64> = page.messages.iter().map(|m| m.id).collect();
            let mut next = page_ids.clone();
            next.extend(collected);
            collected = next;
            match page_ids.first() {
                Some(&oldest) => cursor = oldest,
                None => {
                    assert!(!page.has_more);
                    break;
                }
            }
        }

        assert_eq!(collected, ids);
    }

    #[tokio::test]
    async fn image_fields_round_trip() {
        let store = memory_store().await;
        let Ok(id) = store
            .append("bob", "", Some("aGVsbG8="), Some("image/png"))
            .await
        else {
            panic!("append failed");
        };

        let Ok(messages) = store.recent(1).await else {
            panic!("recent failed");
        };
        let Some(message) = messages.first() else {
            panic!("expected one row");
        };
        assert_eq!(message.id, id);
        assert_eq!(message.image.as_deref(), Some("aGVsbG8="));
        assert_eq!(message.image_type.as_deref(), Some("image/png"));
        assert!(message.timestamp > 0);
    }

    #[tokio::test]
    async fn opens_files_created_by_the_pre_image_schema() {
        let path =
            std::env::temp_dir().join(format!("aurora-relay-test-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite://{}", path.display());

        // Simulate a database written before image support existed.
        {
            let Ok(options) = SqliteConnectOptions::from_str(&url) else {
                panic!("bad url");
            };
            let Ok(pool) = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options.create_if_missing(true))
                .await
            else {
                panic!("failed to create fixture db");
            };
            let setup = sqlx::query(
                "CREATE TABLE messages (\
                     id INTEGER PRIMARY KEY AUTOINCREMENT, \
                     username TEXT NOT NULL, \
                     text TEXT NOT NULL, \
                     timestamp INTEGER NOT NULL\
                 )",
            )
            .execute(&pool)
            .await;
            assert!(setup.is_ok());
            let insert =
                sqlx::query("INSERT INTO messages (username, text, timestamp) VALUES (?, ?, ?)")
                    .bind("alice")
                    .bind("from the old days")
                    .bind(1_500_000_000_000_i64)
                    .execute(&pool)
                    .await;
            assert!(insert.is_ok());
            pool.close().await;
        }

        let Ok(store) = MessageStore::connect(&url, 1).await else {
            panic!("store must open old-schema files");
        };
        let Ok(messages) = store.recent(100).await else {
            panic!("recent failed on migrated file");
        };
        let Some(message) = messages.first() else {
            panic!("expected the old row");
        };
        assert_eq!(message.text, "from the old days");
        assert_eq!(message.image, None);
        assert_eq!(message.image_type, None);

        store.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
