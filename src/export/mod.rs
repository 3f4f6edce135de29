//! Export job
//!
//! Joins the entry snapshot with the three vocabulary lists and writes one
//! row per entry to a timestamp-named file under the export directory. The
//! writer targets a `.tmp` sibling and renames on success, so a failed or
//! cancelled export never leaves a partial file at the final path.

mod csv;
mod xlsx;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use clap::ValueEnum;
use tracing::debug;

use crate::error::ExportError;
use crate::store::{Store, VocabItem};

pub use csv::csv_escape;

/// Output columns, in order
pub const COLUMNS: [&str; 15] = [
    "id",
    "title",
    "category",
    "material",
    "surface",
    "description",
    "city",
    "district",
    "creatorHash",
    "nearPhotoPath",
    "nearPhotoLink",
    "farPhotoPath",
    "farPhotoLink",
    "createdAt",
    "updatedAt",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

/// One entry joined against the vocabulary maps. Unresolvable vocabulary
/// ids become empty strings rather than errors.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub material: String,
    pub surface: String,
    pub description: String,
    pub city: String,
    pub district: String,
    pub creator_hash: String,
    pub near_path: String,
    pub far_path: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Cooperative cancellation for a running export
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run an export and return the written file path
pub fn export(
    store: &Store,
    export_dir: &Path,
    format: ExportFormat,
    cancel: &CancelFlag,
) -> Result<PathBuf, ExportError> {
    let rows = collect_rows(store)?;
    debug!("exporting {} entries as {:?}", rows.len(), format);

    std::fs::create_dir_all(export_dir)?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let file = export_dir.join(format!("export_{stamp}.{}", format.extension()));
    let tmp = export_dir.join(format!("export_{stamp}.{}.tmp", format.extension()));

    let written = match format {
        ExportFormat::Csv => csv::write_csv(&tmp, &rows, cancel),
        ExportFormat::Xlsx => xlsx::write_xlsx(&tmp, &rows, cancel),
    };

    match written {
        Ok(()) => {
            std::fs::rename(&tmp, &file)?;
            Ok(file)
        }
        Err(e) => {
            // Release the partial output; the error is what matters
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// Run the export on a background thread so entry mutation is never
/// blocked. The export reflects whatever snapshot it read first.
pub fn spawn_export(
    store: Arc<Store>,
    export_dir: PathBuf,
    format: ExportFormat,
    cancel: CancelFlag,
) -> std::thread::JoinHandle<Result<PathBuf, ExportError>> {
    std::thread::spawn(move || export(&store, &export_dir, format, &cancel))
}

fn collect_rows(store: &Store) -> Result<Vec<ExportRow>, ExportError> {
    let categories = name_map(store.categories()?);
    let materials = name_map(store.materials()?);
    let surfaces = name_map(store.surfaces()?);

    let rows = store
        .entries()?
        .into_iter()
        .map(|e| ExportRow {
            id: e.id,
            title: e.title.unwrap_or_default(),
            category: resolve(&categories, e.category_id),
            material: resolve(&materials, e.material_id),
            surface: resolve(&surfaces, e.surface_id),
            description: e.description.unwrap_or_default(),
            city: e.city.unwrap_or_default(),
            district: e.district.unwrap_or_default(),
            creator_hash: e.creator_hash,
            near_path: e.near_photo_path.unwrap_or_default(),
            far_path: e.far_photo_path.unwrap_or_default(),
            created_at: e.created_at,
            updated_at: e.updated_at,
        })
        .collect();
    Ok(rows)
}

fn name_map(items: Vec<VocabItem>) -> HashMap<i64, String> {
    items.into_iter().map(|v| (v.id, v.name)).collect()
}

fn resolve(map: &HashMap<i64, String>, id: Option<i64>) -> String {
    id.and_then(|id| map.get(&id)).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EntryDraft, SaveOutcome};
    use tempfile::tempdir;

    fn store_with_entry() -> Store {
        let store = Store::open_in_memory().unwrap();
        let draft = EntryDraft {
            title: Some("Entry, A".to_string()),
            category_id: Some(2),
            material_id: Some(4),
            surface_id: Some(4),
            description: Some("line one\nline two".to_string()),
            city: Some("Berlin".to_string()),
            district: Some("Mitte".to_string()),
            creator_hash: "abc123".to_string(),
            near_photo_path: Some("/photos/غرافيتي/a near.jpg".to_string()),
            far_photo_path: None,
        };
        assert!(matches!(
            store.create(&draft).unwrap(),
            SaveOutcome::Saved(_)
        ));
        store
    }

    #[test]
    fn test_rows_resolve_vocabulary_names() {
        let store = store_with_entry();
        let rows = collect_rows(&store).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, "غرافيتي");
        assert_eq!(rows[0].material, "دهان رذاذ");
        assert_eq!(rows[0].surface, "خرسانة");
    }

    #[test]
    fn test_rows_tolerate_dangling_vocabulary_ids() {
        let store = Store::open_in_memory().unwrap();
        let draft = EntryDraft {
            title: Some("orphan".to_string()),
            category_id: Some(999),
            creator_hash: "abc123".to_string(),
            ..Default::default()
        };
        store.create(&draft).unwrap();

        let rows = collect_rows(&store).unwrap();
        assert_eq!(rows[0].category, "");
    }

    #[test]
    fn test_export_names_never_collide_with_existing() {
        let store = store_with_entry();
        let dir = tempdir().unwrap();
        let cancel = CancelFlag::new();

        let file = export(&store, dir.path(), ExportFormat::Csv, &cancel).unwrap();
        assert!(file.exists());
        let name = file.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("export_"));
        assert!(name.ends_with(".csv"));

        // No .tmp residue
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_empty_store_exports_header_only() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempdir().unwrap();

        let file = export(&store, dir.path(), ExportFormat::Csv, &CancelFlag::new()).unwrap();
        let content = std::fs::read_to_string(&file).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], COLUMNS.join(","));
    }

    #[test]
    fn test_cancelled_export_leaves_nothing() {
        let store = store_with_entry();
        let dir = tempdir().unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = export(&store, dir.path(), ExportFormat::Csv, &cancel);
        assert!(matches!(result, Err(ExportError::Cancelled)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_xlsx_export_writes_file() {
        let store = store_with_entry();
        let dir = tempdir().unwrap();

        let file = export(&store, dir.path(), ExportFormat::Xlsx, &CancelFlag::new()).unwrap();
        assert!(file.exists());
        assert!(file.extension().map_or(false, |x| x == "xlsx"));
        assert!(std::fs::metadata(&file).unwrap().len() > 0);
    }

    #[test]
    fn test_background_export_does_not_block_mutation() {
        let store = Arc::new(store_with_entry());
        let dir = tempdir().unwrap();

        let handle = spawn_export(
            Arc::clone(&store),
            dir.path().to_path_buf(),
            ExportFormat::Csv,
            CancelFlag::new(),
        );

        // A concurrent create must not deadlock against the export
        let draft = EntryDraft {
            title: Some("while exporting".to_string()),
            creator_hash: "abc123".to_string(),
            ..Default::default()
        };
        store.create(&draft).unwrap();

        let file = handle.join().unwrap().unwrap();
        assert!(file.exists());
    }
}
