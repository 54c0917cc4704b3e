//! SQLite-backed target store and its unit-of-work.
//!
//! [`Store::session`] hands out a [`Session`] that stages new records in memory;
//! [`Session::commit`] writes all of them in one transaction or none of them.

use std::path::PathBuf;

use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info};

use crate::error::{LoadError, LoadResult};
use crate::types::{RowEntity, RowRecord};

/// Default target: a transient in-memory database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:///:memory:";

/// Where a database URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// Transient in-memory database, gone when the connection closes.
    Memory,
    /// Database file.
    File(PathBuf),
}

/// Parse a SQLAlchemy-style SQLite URL.
///
/// - `sqlite://`, `sqlite:///:memory:`, `:memory:` and `""` map to [`DatabaseTarget::Memory`]
/// - `sqlite:///relative.db` and `sqlite:////abs/path.db` map to files
/// - anything without a scheme is taken as a file path
pub fn parse_database_url(url: &str) -> LoadResult<DatabaseTarget> {
    let unsupported = || LoadError::UnsupportedDatabaseUrl {
        url: url.to_string(),
    };

    if url.is_empty() || url == ":memory:" {
        return Ok(DatabaseTarget::Memory);
    }

    match url.strip_prefix("sqlite://") {
        Some("") => Ok(DatabaseTarget::Memory),
        Some(rest) => {
            // `sqlite://host/...` has no meaning for SQLite.
            let path = rest.strip_prefix('/').ok_or_else(unsupported)?;
            if path.is_empty() || path == ":memory:" {
                Ok(DatabaseTarget::Memory)
            } else {
                Ok(DatabaseTarget::File(PathBuf::from(path)))
            }
        }
        None if url.contains("://") => Err(unsupported()),
        None => Ok(DatabaseTarget::File(PathBuf::from(url))),
    }
}

/// A connection to the target store.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Connect to the store named by `url` (see [`parse_database_url`]).
    pub fn connect(url: &str) -> LoadResult<Self> {
        let conn = match parse_database_url(url)? {
            DatabaseTarget::Memory => Connection::open_in_memory()?,
            DatabaseTarget::File(path) => Connection::open(path)?,
        };
        debug!(url, "connected to target store");
        Ok(Self { conn })
    }

    /// Connect to a fresh in-memory store.
    pub fn open_in_memory() -> LoadResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Underlying connection, for statements outside the load path.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create the entity's table unless it already exists.
    pub fn create_table(&self, entity: &RowEntity) -> LoadResult<()> {
        let sql = entity.create_table_sql();
        debug!(%sql, "create table");
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Open a unit-of-work for new records of `entity`.
    pub fn session<'a>(&'a mut self, entity: &'a RowEntity) -> Session<'a> {
        Session {
            conn: &mut self.conn,
            entity,
            pending: Vec::new(),
        }
    }

    /// All rows of the entity's table, ordered by id.
    pub fn query_all(&self, entity: &RowEntity) -> LoadResult<Vec<RowRecord>> {
        let width = entity.columns.len();
        let mut stmt = self.conn.prepare(&entity.select_all_sql())?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let values = (1..=width)
                .map(|idx| row.get::<_, Option<String>>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(RowRecord {
                id: Some(id),
                values,
            })
        })?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

/// Unit-of-work staging new records for one atomic commit.
#[derive(Debug)]
pub struct Session<'a> {
    conn: &'a mut Connection,
    entity: &'a RowEntity,
    pending: Vec<RowRecord>,
}

impl<'a> Session<'a> {
    /// Entity this session stages records for.
    pub fn entity(&self) -> &'a RowEntity {
        self.entity
    }

    /// Stage a new record.
    pub fn add(&mut self, record: RowRecord) {
        self.pending.push(record);
    }

    /// Number of staged records.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Insert every staged record inside one transaction.
    ///
    /// On failure the transaction rolls back and the staged records are dropped. On success the
    /// records are returned with their assigned ids.
    pub fn commit(self) -> LoadResult<Vec<RowRecord>> {
        let Session {
            conn,
            entity,
            pending,
        } = self;

        let tx = conn.transaction()?;
        let mut committed = Vec::with_capacity(pending.len());
        {
            let mut stmt = tx.prepare(&entity.insert_sql())?;
            for mut record in pending {
                stmt.execute(params_from_iter(record.values.iter()))?;
                record.id = Some(tx.last_insert_rowid());
                committed.push(record);
            }
        }
        tx.commit()?;

        info!(table = %entity.table, rows = committed.len(), "committed");
        Ok(committed)
    }

    /// Discard every staged record.
    pub fn rollback(self) {
        debug!(discarded = self.pending.len(), "session rolled back");
    }
}
