//! Relocation of accepted photos into the permanent library
//!
//! Accepted captures start life in the staging directory; once the entry is
//! saved they move under `photos/<category>/`. Everything here is
//! best-effort: a failed copy retains the staged path so the record never
//! points at a file that does not exist.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Library folder for entries without a category
pub const UNCATEGORIZED_FOLDER: &str = "uncategorized";

/// Filename fallback when a title sanitizes to nothing
pub const DEFAULT_PHOTO_NAME: &str = "Photo";

/// Strip a title down to filename-safe characters: ASCII letters and
/// digits, underscore, space, and the Arabic blocks. Everything else
/// becomes a space; a blank result falls back to [`DEFAULT_PHOTO_NAME`].
pub fn sanitize_title(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if is_allowed_char(c) { c } else { ' ' })
        .collect();
    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        DEFAULT_PHOTO_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || c == ' '
        || ('\u{0600}'..='\u{06FF}').contains(&c)
        || ('\u{0750}'..='\u{077F}').contains(&c)
        || ('\u{08A0}'..='\u{08FF}').contains(&c)
}

/// Permanent folder for a category; a missing or blank name lands in the
/// uncategorized folder.
pub fn category_folder(library_dir: &Path, category_name: Option<&str>) -> PathBuf {
    let name = category_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNCATEGORIZED_FOLDER);
    library_dir.join(name)
}

/// Move one accepted photo into the category folder, returning the path the
/// entry should reference afterwards. The staged filename already carries
/// the `<title> <timestamp> <near|far>.jpg` scheme, so it is kept as-is.
pub fn relocate_photo(library_dir: &Path, category_name: Option<&str>, path: &str) -> String {
    let folder = category_folder(library_dir, category_name);
    let src = Path::new(path);

    if src.starts_with(&folder) {
        return path.to_string();
    }
    if !src.exists() {
        warn!("photo missing at {path}, keeping recorded path");
        return path.to_string();
    }
    let Some(file_name) = src.file_name() else {
        warn!("photo path {path} has no filename, keeping recorded path");
        return path.to_string();
    };

    if let Err(e) = std::fs::create_dir_all(&folder) {
        warn!("cannot create {}: {e}, keeping staged photo", folder.display());
        return path.to_string();
    }

    let dest = folder.join(file_name);
    match std::fs::copy(src, &dest) {
        Ok(_) => {
            if let Err(e) = std::fs::remove_file(src) {
                warn!("staged photo {path} not removed: {e}");
            }
            dest.to_string_lossy().into_owned()
        }
        Err(e) => {
            warn!("photo copy to {} failed: {e}, keeping staged photo", dest.display());
            path.to_string()
        }
    }
}
