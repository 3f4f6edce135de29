//! CLI command implementations

pub mod entry;
pub mod export;
pub mod list;
pub mod location;
pub mod record;
pub mod vocab;

use crate::error::StoreError;
use crate::store::{Store, VocabItem, VocabKind};

/// Look a vocabulary item up by numeric id, display name, or alternate
/// name.
pub(crate) fn find_vocab(
    store: &Store,
    kind: VocabKind,
    input: &str,
) -> Result<Option<VocabItem>, StoreError> {
    let input = input.trim();
    let items = store.vocab(kind)?;
    if let Ok(id) = input.parse::<i64>() {
        return Ok(items.into_iter().find(|v| v.id == id));
    }
    Ok(items
        .into_iter()
        .find(|v| v.name == input || v.alt_name.as_deref() == Some(input)))
}

pub(crate) fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
