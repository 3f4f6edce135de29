//! Vocabulary commands

use anyhow::{anyhow, Result};

use crate::config::Config;
use crate::error::StoreError;
use crate::store::{Store, VocabItem, VocabKind};

use super::find_vocab;

pub fn list(store: &Store, kind: VocabKind) -> Result<()> {
    let items = store.vocab(kind)?;

    println!("{:<6} {:<24} {:<18} {}", "ID", "Name", "Alt name", "Origin");
    println!("{}", "-".repeat(60));
    for item in items {
        println!(
            "{:<6} {:<24} {:<18} {}",
            item.id,
            item.name,
            item.alt_name.as_deref().unwrap_or("-"),
            if item.user_defined { "user" } else { "seeded" },
        );
    }
    Ok(())
}

pub fn add(store: &Store, kind: VocabKind, name: &str, category: Option<&str>) -> Result<()> {
    let tie_to = match category {
        Some(input) if kind != VocabKind::Material => {
            return Err(anyhow!("--category only applies to materials, got {input}"));
        }
        Some(input) => Some(
            find_vocab(store, VocabKind::Category, input)?
                .ok_or_else(|| anyhow!("category not found: {input}"))?,
        ),
        None => None,
    };

    let id = store.add_custom(kind, name)?;
    println!("Added {} '{}' with id {}", kind.as_str(), name.trim(), id);

    if let Some(category) = tie_to {
        store.tie(category.id, id)?;
        println!("Tied to category '{}'", category.name);
    }
    Ok(())
}

pub fn materials(store: &Store, config: &Config, category: &str) -> Result<()> {
    let category = find_vocab(store, VocabKind::Category, category)?
        .ok_or_else(|| anyhow!("category not found: {category}"))?;

    let tied = store.materials_for_category(category.id)?;
    if tied.is_empty() && !config.form.empty_allow_list_shows_all {
        println!("No materials suggested for '{}'.", category.name);
        return Ok(());
    }
    if tied.is_empty() {
        println!("No specific suggestions for '{}'; offering all materials.", category.name);
    }

    for item in suggested_materials(store, config, category.id)? {
        println!("{:<6} {}", item.id, item.name);
    }
    Ok(())
}

/// Materials the form should offer for a category. An empty allow-list
/// means "everything" or "nothing" depending on
/// `form.empty_allow_list_shows_all`.
pub(crate) fn suggested_materials(
    store: &Store,
    config: &Config,
    category_id: i64,
) -> Result<Vec<VocabItem>, StoreError> {
    let tied = store.materials_for_category(category_id)?;
    if !tied.is_empty() {
        return Ok(tied);
    }
    if config.form.empty_allow_list_shows_all {
        store.materials()
    } else {
        Ok(Vec::new())
    }
}
