//! Relational persistence on SQLite.
//!
//! `Database` owns the single connection behind a mutex and hands it to closures
//! running on the blocking thread pool, the same way long-running work is kept off
//! the async runtime elsewhere in the service. The table modules expose free
//! functions over `&Connection`, so they run unchanged inside an open
//! `rusqlite::Transaction` (which derefs to `Connection`).

pub mod participants;
pub mod reminders;
pub mod requirements;
mod schema;
pub mod submissions;
pub mod workspaces;

use rusqlite::types::Type;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The connection could not be reached: the mutex was poisoned by a panicking
/// closure, or the blocking task itself failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreUnavailable {
    #[error("database connection lock poisoned")]
    Poisoned,
    #[error("database task failed: {0}")]
    Join(String),
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (creating if needed) the database at `path`. `:memory:` yields a private
    /// in-memory database.
    pub fn open(path: &str) -> rusqlite::Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the connection on the blocking pool.
    pub async fn run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreUnavailable> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreUnavailable::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreUnavailable::Join(e.to_string()))?
    }
}

/// Wraps a decode failure of a stored column so it surfaces as a rusqlite error.
pub(crate) fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized stored value {0:?}")]
pub(crate) struct UnknownValue(pub String);
