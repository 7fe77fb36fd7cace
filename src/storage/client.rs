use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::storage::errors::StoreError;
use crate::storage::models::{NotifiedRecord, Subscription, User};

const UNKNOWN_USERNAME: &str = "Unknown";

/// SQLite-backed subscription store.
///
/// Every operation runs on a single connection behind a mutex, so writes from
/// the notification cycle and from command handlers are serialized. Channel
/// names are stored lowercased.
pub struct StorageClient {
    conn: Mutex<Connection>,
}

impl StorageClient {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        info!("Opened database at {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                first_seen INTEGER NOT NULL,
                last_seen INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS subscriptions (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                channel_name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(user_id, channel_name),
                FOREIGN KEY(user_id) REFERENCES users(user_id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS notified_streams (
                stream_id TEXT PRIMARY KEY,
                channel_name TEXT NOT NULL,
                notified_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notified_streams_notified_at
                ON notified_streams(notified_at)",
            [],
        )?;

        debug!("Database schema created or updated successfully");

        Ok(StorageClient {
            conn: Mutex::new(conn),
        })
    }

    /// Inserts the user or refreshes their display name.
    pub fn add_user(&self, user_id: i64, display_name: &str) -> Result<(), StoreError> {
        let query = "INSERT INTO users (user_id, username, first_seen, last_seen)
                     VALUES (?1, ?2, ?3, ?3)
                     ON CONFLICT(user_id) DO UPDATE SET
                        username = excluded.username,
                        last_seen = excluded.last_seen";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        stmt.execute(params![user_id, display_name, Utc::now().timestamp()])?;
        Ok(())
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let query = "SELECT username, first_seen, last_seen FROM users WHERE user_id = ?1";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        let row = stmt
            .query_row([user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .optional()?;

        match row {
            Some((display_name, first_seen, last_seen)) => Ok(Some(User {
                user_id,
                display_name,
                first_seen: timestamp("first_seen", first_seen)?,
                last_seen: timestamp("last_seen", last_seen)?,
            })),
            None => Ok(None),
        }
    }

    /// Returns `true` when a new subscription row was created.
    ///
    /// A user the store has not seen yet gets a placeholder record, which the
    /// next `add_user` call fills in.
    pub fn add_subscription(&self, user_id: i64, channel_name: &str) -> Result<bool, StoreError> {
        let channel = channel_key(channel_name)?;
        let now = Utc::now().timestamp();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.prepare_cached(
            "INSERT OR IGNORE INTO users (user_id, username, first_seen, last_seen)
             VALUES (?1, ?2, ?3, ?3)",
        )?
        .execute(params![user_id, UNKNOWN_USERNAME, now])?;
        let inserted = tx
            .prepare_cached(
                "INSERT OR IGNORE INTO subscriptions (user_id, channel_name, created_at)
                 VALUES (?1, ?2, ?3)",
            )?
            .execute(params![user_id, channel, now])?;
        tx.commit()?;
        Ok(inserted > 0)
    }

    /// Returns `true` when a subscription row was removed.
    pub fn remove_subscription(&self, user_id: i64, channel_name: &str) -> Result<bool, StoreError> {
        let channel = channel_key(channel_name)?;
        let query = "DELETE FROM subscriptions WHERE user_id = ?1 AND channel_name = ?2";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        let removed = stmt.execute(params![user_id, channel])?;
        Ok(removed > 0)
    }

    pub fn list_subscriptions_for_user(&self, user_id: i64) -> Result<Vec<String>, StoreError> {
        let query = "SELECT channel_name FROM subscriptions WHERE user_id = ?1 ORDER BY channel_name";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        let channels = stmt
            .query_map([user_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(channels)
    }

    /// Every (user, channel) pair, read in one statement.
    pub fn get_all_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        let query = "SELECT user_id, channel_name FROM subscriptions ORDER BY channel_name, user_id";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        let subscriptions = stmt
            .query_map([], |row| {
                Ok(Subscription {
                    user_id: row.get(0)?,
                    channel_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subscriptions)
    }

    pub fn is_stream_notified(&self, session_id: &str) -> Result<bool, StoreError> {
        let query = "SELECT EXISTS(SELECT 1 FROM notified_streams WHERE stream_id = ?1)";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        let exists: bool = stmt.query_row([session_id], |row| row.get(0))?;
        Ok(exists)
    }

    /// Records the session as announced. Repeated calls keep the first record.
    pub fn add_stream_notification(&self, session_id: &str, channel_name: &str) -> Result<(), StoreError> {
        let channel = channel_key(channel_name)?;
        let query = "INSERT OR IGNORE INTO notified_streams (stream_id, channel_name, notified_at)
                     VALUES (?1, ?2, ?3)";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        stmt.execute(params![session_id, channel, Utc::now().timestamp()])?;
        Ok(())
    }

    pub fn get_stream_notification(&self, session_id: &str) -> Result<Option<NotifiedRecord>, StoreError> {
        let query = "SELECT channel_name, notified_at FROM notified_streams WHERE stream_id = ?1";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        let row = stmt
            .query_row([session_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .optional()?;

        match row {
            Some((channel_name, notified_at)) => Ok(Some(NotifiedRecord {
                session_id: session_id.to_string(),
                channel_name,
                notified_at: timestamp("notified_at", notified_at)?,
            })),
            None => Ok(None),
        }
    }

    /// Deletes notified records older than `cutoff`, returning how many went.
    pub fn prune_notifications(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let query = "DELETE FROM notified_streams WHERE notified_at < ?1";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        let removed = stmt.execute([cutoff.timestamp()])?;
        Ok(removed)
    }

    #[cfg(test)]
    pub(crate) fn drop_table(&self, table: &str) -> Result<(), StoreError> {
        self.conn.lock().execute_batch(&format!("DROP TABLE {}", table))?;
        Ok(())
    }

    #[cfg(test)]
    fn backdate_notification(&self, session_id: &str, notified_at: DateTime<Utc>) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE notified_streams SET notified_at = ?1 WHERE stream_id = ?2",
            params![notified_at.timestamp(), session_id],
        )?;
        Ok(())
    }
}

fn channel_key(channel_name: &str) -> Result<String, StoreError> {
    let key = channel_name.trim().to_lowercase();
    if key.is_empty() {
        return Err(StoreError::InvalidChannel(channel_name.to_string()));
    }
    Ok(key)
}

fn timestamp(column: &'static str, value: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(value, 0).ok_or(StoreError::CorruptTimestamp { column, value })
}
