//! SQLite driver backed by `rusqlite`.
//!
//! A single connection guarded by a mutex. Cancellation is honoured before a
//! statement starts and, through SQLite's progress handler, while it runs.

use std::panic::AssertUnwindSafe;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode, OpenFlags, ToSql};
use thiserror::Error as ThisError;

use crate::context::Cancellation;
use crate::db::{Connect, Driver};
use crate::value::{ExecResult, Rows, Value};

/// Errors reported by [`SqliteDriver`].
#[derive(Debug, ThisError)]
pub enum SqliteError {
    /// Error from SQLite itself (syntax, constraint, I/O, ...).
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// The request was cancelled before or during the statement.
    #[error("statement cancelled")]
    Cancelled,
    /// The request deadline passed before or during the statement.
    #[error("statement deadline exceeded")]
    DeadlineExceeded,
    /// A previous caller panicked while holding the connection.
    #[error("connection lock poisoned")]
    Poisoned,
    /// A text column held invalid UTF-8.
    #[error("text column is not valid UTF-8: {0}")]
    InvalidText(#[from] std::str::Utf8Error),
}

impl SqliteError {
    /// Returns `true` for [`Cancelled`](Self::Cancelled) and [`DeadlineExceeded`](Self::DeadlineExceeded).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SqliteError::Cancelled | SqliteError::DeadlineExceeded)
    }

    // An interrupted statement surfaces as SQLITE_INTERRUPT; report why.
    fn interrupted_by(self, scope: &Cancellation) -> Self {
        let interrupted = matches!(
            &self,
            SqliteError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::OperationInterrupted
        );

        if !interrupted {
            self
        } else if scope.is_cancelled() {
            SqliteError::Cancelled
        } else if scope.is_expired() {
            SqliteError::DeadlineExceeded
        } else {
            self
        }
    }
}

/// Connection settings for [`SqliteDriver`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use safesql::SqliteConfig;
///
/// let config = SqliteConfig::default()
///     .with_busy_timeout(Duration::from_secs(1))
///     .with_read_only(true);
/// assert!(config.read_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// How long to wait on a locked database before failing
    pub busy_timeout: Duration,
    /// VM instructions between cancellation checks while a statement runs.
    /// Values below 1 are treated as 1.
    pub progress_interval: i32,
    /// Open the database read-only
    pub read_only: bool,
    /// Create the database file if it does not exist (ignored when read-only)
    pub create_if_missing: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            progress_interval: 1000,
            read_only: false,
            create_if_missing: true,
        }
    }
}

impl SqliteConfig {
    /// Sets the busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets how many VM instructions run between cancellation checks.
    pub fn with_progress_interval(mut self, instructions: i32) -> Self {
        self.progress_interval = instructions.max(1);
        self
    }

    /// Opens the database read-only.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Controls whether a missing database file is created.
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    fn open_flags(&self) -> OpenFlags {
        let mode = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else if self.create_if_missing {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };
        // The mutex below serialises access, so SQLite's own mutex is not needed.
        mode | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }
}

/// SQLite [`Driver`].
///
/// Open with [`Db::open`](crate::Db::open) for defaults, or build one with
/// [`SqliteDriver::with_config`] and pass it to [`Db::new`](crate::Db::new).
/// `:memory:` opens a private in-memory database.
#[derive(Debug)]
pub struct SqliteDriver {
    conn: Mutex<Connection>,
    config: SqliteConfig,
}

impl SqliteDriver {
    /// Opens `data_source` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Sqlite`] if the database cannot be opened.
    pub fn open(data_source: &str) -> Result<Self, SqliteError> {
        Self::with_config(data_source, SqliteConfig::default())
    }

    /// Opens `data_source` with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Sqlite`] if the database cannot be opened or
    /// configured.
    pub fn with_config(data_source: &str, config: SqliteConfig) -> Result<Self, SqliteError> {
        let conn = Connection::open_with_flags(data_source, config.open_flags())?;
        conn.busy_timeout(config.busy_timeout)?;

        tracing::debug!(
            data_source,
            read_only = config.read_only,
            "sqlite connection opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            config,
        })
    }

    /// The settings this driver was opened with.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    fn with_connection<T>(
        &self,
        scope: &Cancellation,
        run: impl FnOnce(&Connection) -> Result<T, SqliteError>,
    ) -> Result<T, SqliteError> {
        stop_if_done(scope)?;
        let conn = self.conn.lock().map_err(|_| SqliteError::Poisoned)?;
        // The scope may have ended while this caller waited for the lock.
        stop_if_done(scope)?;

        // An interval of 0 makes SQLite drop the handler, so never pass one.
        let interval = self.config.progress_interval.max(1);
        let watch = AssertUnwindSafe(scope.clone());
        conn.progress_handler(interval, Some(move || watch.is_done()));
        let result = run(&conn);
        conn.progress_handler(interval, None::<fn() -> bool>);

        result.map_err(|err| err.interrupted_by(scope))
    }
}

fn stop_if_done(scope: &Cancellation) -> Result<(), SqliteError> {
    if scope.is_cancelled() {
        return Err(SqliteError::Cancelled);
    }
    if scope.is_expired() {
        return Err(SqliteError::DeadlineExceeded);
    }
    Ok(())
}

impl Driver for SqliteDriver {
    const NAME: &'static str = "sqlite";
    type Error = SqliteError;

    fn query(&self, scope: &Cancellation, sql: &str, params: &[Value]) -> Result<Rows, SqliteError> {
        self.with_connection(scope, |conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let width = columns.len();

            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(width);
                for idx in 0..width {
                    values.push(column_value(row.get_ref(idx)?)?);
                }
                out.push(values);
            }

            Ok(Rows::new(columns, out))
        })
    }

    /// `last_insert_id` is SQLite's `last_insert_rowid()` for the
    /// connection: after an `UPDATE` or `DELETE` it still names the row of
    /// the most recent successful insert.
    fn execute(
        &self,
        scope: &Cancellation,
        sql: &str,
        params: &[Value],
    ) -> Result<ExecResult, SqliteError> {
        self.with_connection(scope, |conn| {
            let mut stmt = conn.prepare(sql)?;
            let changed = stmt.execute(params_from_iter(params.iter()))?;

            Ok(ExecResult {
                rows_affected: changed as u64,
                last_insert_id: Some(conn.last_insert_rowid()),
            })
        })
    }
}

impl Connect for SqliteDriver {
    fn connect(data_source: &str) -> Result<Self, SqliteError> {
        Self::open(data_source)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Blob(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
        })
    }
}

fn column_value(value: ValueRef<'_>) -> Result<Value, SqliteError> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(v) => Value::Text(std::str::from_utf8(v)?.to_owned()),
        ValueRef::Blob(v) => Value::Blob(v.to_vec()),
    })
}
