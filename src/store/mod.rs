//! Entry and vocabulary storage over SQLite
//!
//! One mutation in flight at a time: every method locks the single
//! connection, so a `Store` can be shared across threads behind an `Arc`.
//! Each mutation broadcasts the updated newest-first entry snapshot to all
//! live subscribers.

mod schema;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection};
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::error::StoreError;

pub use schema::{SCHEMA, SEED};

/// Snapshots a slow subscriber can fall behind by before missing updates.
const FEED_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: String,
    pub title: Option<String>,
    pub category_id: Option<i64>,
    pub material_id: Option<i64>,
    pub surface_id: Option<i64>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub creator_hash: String,
    pub near_photo_path: Option<String>,
    pub far_photo_path: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Mutable entry fields, as captured by the form
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub title: Option<String>,
    pub category_id: Option<i64>,
    pub material_id: Option<i64>,
    pub surface_id: Option<i64>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub creator_hash: String,
    pub near_photo_path: Option<String>,
    pub far_photo_path: Option<String>,
}

impl EntryDraft {
    /// A draft with nothing the user actually entered. City, district and
    /// creator hash are session-derived and do not count.
    pub fn is_blank(&self) -> bool {
        blank(&self.title)
            && self.category_id.is_none()
            && self.material_id.is_none()
            && self.surface_id.is_none()
            && blank(&self.description)
            && blank(&self.near_photo_path)
            && blank(&self.far_photo_path)
    }
}

fn blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(String),
    RejectedBlank,
}

/// Photo paths handed back on delete so the caller can clean up the files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPhotos {
    pub near: Option<String>,
    pub far: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocabItem {
    pub id: i64,
    pub name: String,
    pub alt_name: Option<String>,
    pub user_defined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VocabKind {
    Category,
    Material,
    Surface,
}

impl VocabKind {
    fn table(self) -> &'static str {
        match self {
            VocabKind::Category => "category",
            VocabKind::Material => "material",
            VocabKind::Surface => "surface",
        }
    }

    fn has_alt_name(self) -> bool {
        !matches!(self, VocabKind::Surface)
    }

    pub fn as_str(self) -> &'static str {
        self.table()
    }
}

pub struct Store {
    conn: Mutex<Connection>,
    feed: broadcast::Sender<Vec<Entry>>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory store, used by tests and throwaway sessions
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(SEED)?;
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Ok(Self {
            conn: Mutex::new(conn),
            feed,
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another thread panicked mid-query;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ============================================
    // ENTRIES
    // ============================================

    /// Persist a new entry. Blank drafts are rejected at this boundary and
    /// never reach the table.
    pub fn create(&self, draft: &EntryDraft) -> Result<SaveOutcome, StoreError> {
        if draft.is_blank() {
            return Ok(SaveOutcome::RejectedBlank);
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp_millis();
        self.conn().execute(
            "INSERT INTO entry
               (id, title, category_id, material_id, surface_id, description,
                city, district, creator_hash, near_photo_path, far_photo_path,
                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                draft.title,
                draft.category_id,
                draft.material_id,
                draft.surface_id,
                draft.description,
                draft.city,
                draft.district,
                draft.creator_hash,
                draft.near_photo_path,
                draft.far_photo_path,
                now,
                now,
            ],
        )?;

        self.publish();
        Ok(SaveOutcome::Saved(id))
    }

    pub fn entry(&self, id: &str) -> Result<Option<Entry>, StoreError> {
        let result = self.conn().query_row(
            "SELECT id, title, category_id, material_id, surface_id, description,
                    city, district, creator_hash, near_photo_path, far_photo_path,
                    created_at, updated_at
             FROM entry WHERE id = ?",
            params![id],
            row_to_entry,
        );

        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Full replacement of the mutable fields; `updated_at` is refreshed.
    pub fn update(&self, id: &str, draft: &EntryDraft) -> Result<(), StoreError> {
        let now = Utc::now().timestamp_millis();
        let changed = self.conn().execute(
            "UPDATE entry SET
                title = ?, category_id = ?, material_id = ?, surface_id = ?,
                description = ?, city = ?, district = ?, creator_hash = ?,
                near_photo_path = ?, far_photo_path = ?, updated_at = ?
             WHERE id = ?",
            params![
                draft.title,
                draft.category_id,
                draft.material_id,
                draft.surface_id,
                draft.description,
                draft.city,
                draft.district,
                draft.creator_hash,
                draft.near_photo_path,
                draft.far_photo_path,
                now,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::EntryNotFound(id.to_string()));
        }
        self.publish();
        Ok(())
    }

    /// Rewrite just the photo paths, after relocation into the library.
    pub fn set_photo_paths(
        &self,
        id: &str,
        near: Option<&str>,
        far: Option<&str>,
    ) -> Result<(), StoreError> {
        let now = Utc::now().timestamp_millis();
        let changed = self.conn().execute(
            "UPDATE entry SET near_photo_path = ?, far_photo_path = ?, updated_at = ?
             WHERE id = ?",
            params![near, far, now, id],
        )?;

        if changed == 0 {
            return Err(StoreError::EntryNotFound(id.to_string()));
        }
        self.publish();
        Ok(())
    }

    /// Remove the record and hand its photo paths back to the caller for
    /// best-effort file cleanup. File I/O is not the store's concern.
    pub fn delete(&self, id: &str) -> Result<EntryPhotos, StoreError> {
        let entry = self
            .entry(id)?
            .ok_or_else(|| StoreError::EntryNotFound(id.to_string()))?;

        self.conn()
            .execute("DELETE FROM entry WHERE id = ?", params![id])?;

        self.publish();
        Ok(EntryPhotos {
            near: entry.near_photo_path,
            far: entry.far_photo_path,
        })
    }

    /// Copy every field of an existing entry into a new record with a fresh
    /// id and fresh timestamps.
    pub fn duplicate(&self, id: &str) -> Result<Entry, StoreError> {
        let src = self
            .entry(id)?
            .ok_or_else(|| StoreError::EntryNotFound(id.to_string()))?;

        let now = Utc::now().timestamp_millis();
        let copy = Entry {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            ..src
        };

        self.conn().execute(
            "INSERT INTO entry
               (id, title, category_id, material_id, surface_id, description,
                city, district, creator_hash, near_photo_path, far_photo_path,
                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                copy.id,
                copy.title,
                copy.category_id,
                copy.material_id,
                copy.surface_id,
                copy.description,
                copy.city,
                copy.district,
                copy.creator_hash,
                copy.near_photo_path,
                copy.far_photo_path,
                copy.created_at,
                copy.updated_at,
            ],
        )?;

        self.publish();
        Ok(copy)
    }

    /// Full snapshot, newest first
    pub fn entries(&self) -> Result<Vec<Entry>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, title, category_id, material_id, surface_id, description,
                    city, district, creator_hash, near_photo_path, far_photo_path,
                    created_at, updated_at
             FROM entry ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], row_to_entry)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Live observation of the entry list. Every mutation pushes the full
    /// newest-first snapshot; within one subscriber updates arrive in
    /// mutation order.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Entry>> {
        self.feed.subscribe()
    }

    fn publish(&self) {
        match self.entries() {
            // send only fails when nobody is subscribed
            Ok(snapshot) => {
                let _ = self.feed.send(snapshot);
            }
            Err(e) => warn!("entry feed snapshot failed: {e}"),
        }
    }

    // ============================================
    // VOCABULARY
    // ============================================

    /// Seeded items first, then user-defined, each group alphabetical
    pub fn vocab(&self, kind: VocabKind) -> Result<Vec<VocabItem>, StoreError> {
        let alt = if kind.has_alt_name() {
            "alt_name"
        } else {
            "NULL AS alt_name"
        };
        let query = format!(
            "SELECT id, name, {alt}, user_defined FROM {} ORDER BY user_defined, name",
            kind.table()
        );

        let conn = self.conn();
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], row_to_vocab)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn categories(&self) -> Result<Vec<VocabItem>, StoreError> {
        self.vocab(VocabKind::Category)
    }

    pub fn materials(&self) -> Result<Vec<VocabItem>, StoreError> {
        self.vocab(VocabKind::Material)
    }

    pub fn surfaces(&self) -> Result<Vec<VocabItem>, StoreError> {
        self.vocab(VocabKind::Surface)
    }

    /// Materials tied to a category via the allow-list. Empty when the
    /// category is unknown or untied; the form layer decides what empty
    /// means (see `FormConfig::empty_allow_list_shows_all`).
    pub fn materials_for_category(&self, category_id: i64) -> Result<Vec<VocabItem>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT material.id, material.name, material.alt_name, material.user_defined
             FROM material
             INNER JOIN category_material cm ON cm.material_id = material.id
             WHERE cm.category_id = ?
             ORDER BY material.user_defined, material.name",
        )?;

        let rows = stmt.query_map(params![category_id], row_to_vocab)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Add a user-defined vocabulary item, returning its new id
    pub fn add_custom(&self, kind: VocabKind, name: &str) -> Result<i64, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::BlankName);
        }

        let conn = self.conn();
        if kind.has_alt_name() {
            conn.execute(
                &format!(
                    "INSERT INTO {} (name, alt_name, user_defined) VALUES (?, NULL, TRUE)",
                    kind.table()
                ),
                params![name],
            )?;
        } else {
            conn.execute(
                &format!(
                    "INSERT INTO {} (name, user_defined) VALUES (?, TRUE)",
                    kind.table()
                ),
                params![name],
            )?;
        }
        Ok(conn.last_insert_rowid())
    }

    /// Idempotent allow-list insert; a duplicate pair is a silent no-op
    pub fn tie(&self, category_id: i64, material_id: i64) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT OR IGNORE INTO category_material (category_id, material_id) VALUES (?, ?)",
            params![category_id, material_id],
        )?;
        Ok(())
    }
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        title: row.get(1)?,
        category_id: row.get(2)?,
        material_id: row.get(3)?,
        surface_id: row.get(4)?,
        description: row.get(5)?,
        city: row.get(6)?,
        district: row.get(7)?,
        creator_hash: row.get(8)?,
        near_photo_path: row.get(9)?,
        far_photo_path: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn row_to_vocab(row: &rusqlite::Row) -> rusqlite::Result<VocabItem> {
    Ok(VocabItem {
        id: row.get(0)?,
        name: row.get(1)?,
        alt_name: row.get(2)?,
        user_defined: row.get(3)?,
    })
}
