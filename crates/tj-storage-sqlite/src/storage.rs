use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, ErrorCode, OpenFlags};
use tj_core::{Destination, DestinationId, DestinationQuery, Item, SortKey};
use tj_storage::{RecordStore, StoreError};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) and apply the schema. Used by the editing side.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path).with_context(|| format!("open sqlite db {}", db_path.display()))?;
        let init_sql = include_str!("../migrations/0001_init.sql");
        conn.execute_batch(init_sql)
            .with_context(|| format!("apply schema to {}", db_path.display()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an existing database without touching its schema. A missing file is
    /// reported as unavailable rather than created.
    pub fn open_read_only(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| classify(e, &format!("open {}", db_path.display())))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".to_string()))
    }

    fn order_by(query: &DestinationQuery) -> &'static str {
        match (query.sort_key, query.ascending) {
            (SortKey::CreatedAt, true) => "ORDER BY created_at ASC, rowid ASC",
            (SortKey::CreatedAt, false) => "ORDER BY created_at DESC, rowid ASC",
        }
    }

    pub fn insert_item(&self, item: Item) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("INSERT INTO items(timestamp) VALUES (?1)", params![item.timestamp_unix])?;
        Ok(())
    }

    pub fn list_items(&self) -> Result<Vec<Item>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT timestamp FROM items ORDER BY timestamp ASC, rowid ASC")?;
        let rows = stmt.query_map([], |r| Ok(Item::new(r.get(0)?)))?;
        let mut items = vec![];
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }
}

impl RecordStore for SqliteStore {
    fn query(&self, query: &DestinationQuery) -> Result<Vec<Destination>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT id, caption, details, created_at, image FROM destinations {}",
            Self::order_by(query)
        );
        let what = query.to_string();
        let mut stmt = conn.prepare(&sql).map_err(|e| classify(e, &what))?;
        let rows = stmt
            .query_map([], |r| {
                Ok(Destination {
                    id: DestinationId::from_str(r.get::<_, String>(0)?),
                    caption: r.get(1)?,
                    details: r.get(2)?,
                    created_at_unix: r.get(3)?,
                    image: r.get(4)?,
                })
            })
            .map_err(|e| classify(e, &what))?;

        let mut out = vec![];
        for row in rows {
            out.push(row.map_err(|e| classify(e, &what))?);
        }
        tracing::trace!(rows = out.len(), query = %what, "sqlite query");
        Ok(out)
    }

    fn insert_destination(&self, destination: Destination) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let res = conn.execute(
            "INSERT INTO destinations(id, caption, details, created_at, image) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                destination.id.0,
                destination.caption,
                destination.details,
                destination.created_at_unix,
                destination.image
            ],
        );
        match res {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::DuplicateId(destination.id.0))
            }
            Err(e) => Err(classify(e, "insert destination")),
        }
    }
}

/// Storage-level faults become `Unavailable`; anything else is a plain query failure.
fn classify(err: rusqlite::Error, what: &str) -> StoreError {
    let unavailable = match &err {
        rusqlite::Error::SqliteFailure(e, _) => matches!(
            e.code,
            ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::PermissionDenied
                | ErrorCode::SystemIoFailure
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
        ),
        _ => false,
    };
    if unavailable {
        StoreError::Unavailable(format!("{what}: {err}"))
    } else {
        StoreError::Query(format!("{what}: {err}"))
    }
}
