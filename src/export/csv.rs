//! CSV writer with standard field quoting

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ExportError;

use super::{CancelFlag, ExportRow, COLUMNS};

pub(super) fn write_csv(
    path: &Path,
    rows: &[ExportRow],
    cancel: &CancelFlag,
) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", COLUMNS.join(","))?;

    for row in rows {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        let fields = [
            row.id.clone(),
            row.title.clone(),
            row.category.clone(),
            row.material.clone(),
            row.surface.clone(),
            row.description.clone(),
            row.city.clone(),
            row.district.clone(),
            row.creator_hash.clone(),
            row.near_path.clone(),
            hyperlink(&row.near_path, "near"),
            row.far_path.clone(),
            hyperlink(&row.far_path, "far"),
            row.created_at.to_string(),
            row.updated_at.to_string(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        writeln!(out, "{}", line.join(","))?;
    }

    out.flush()?;
    Ok(())
}

/// Spreadsheet-clickable reference to a local file; empty when there is no
/// path.
fn hyperlink(path: &str, label: &str) -> String {
    if path.trim().is_empty() {
        String::new()
    } else {
        format!(r#"=HYPERLINK("file:///{path}","{label}")"#)
    }
}

/// Standard CSV quoting: a field containing a comma, double quote, or
/// newline is wrapped in quotes with inner quotes doubled.
pub fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
