//! List and show commands

use anyhow::Result;
use std::collections::HashMap;

use crate::store::Store;

use super::format_millis;

pub fn run(store: &Store) -> Result<()> {
    let entries = store.entries()?;

    if entries.is_empty() {
        println!("No entries yet. Run 'fieldnote record' first.");
        return Ok(());
    }

    let categories: HashMap<i64, String> = store
        .categories()?
        .into_iter()
        .map(|v| (v.id, v.name))
        .collect();

    println!(
        "{:<17} {:<10} {:<20} {:<14} {:<14} {}",
        "Created", "ID", "Title", "Category", "City", "Photos"
    );
    println!("{}", "-".repeat(85));

    for entry in entries {
        let title = entry
            .title
            .as_deref()
            .map(|t| {
                // Char-based so Arabic titles never split mid-character
                if t.chars().count() > 18 {
                    let short: String = t.chars().take(15).collect();
                    format!("{short}...")
                } else {
                    t.to_string()
                }
            })
            .unwrap_or_else(|| "-".to_string());

        let category = entry
            .category_id
            .and_then(|id| categories.get(&id))
            .map(String::as_str)
            .unwrap_or("-");

        let photos = match (&entry.near_photo_path, &entry.far_photo_path) {
            (Some(_), Some(_)) => "near+far",
            (Some(_), None) => "near",
            (None, Some(_)) => "far",
            (None, None) => "-",
        };

        println!(
            "{:<17} {:<10} {:<20} {:<14} {:<14} {}",
            format_millis(entry.created_at),
            &entry.id[..8.min(entry.id.len())],
            title,
            category,
            entry.city.as_deref().unwrap_or("-"),
            photos,
        );
    }

    Ok(())
}

pub fn show(store: &Store, id: &str) -> Result<()> {
    // Accept an id prefix, the way the listing displays them
    let entry = match resolve(store, id)? {
        Some(e) => e,
        None => {
            println!("Entry '{}' not found.", id);
            return Ok(());
        }
    };

    let category = lookup(store.categories()?, entry.category_id);
    let material = lookup(store.materials()?, entry.material_id);
    let surface = lookup(store.surfaces()?, entry.surface_id);

    println!("\n{}", "=".repeat(60));
    println!("Entry {}", entry.id);
    println!("{}", "=".repeat(60));
    println!("Title:       {}", entry.title.as_deref().unwrap_or("-"));
    println!("Category:    {}", category.as_deref().unwrap_or("-"));
    println!("Material:    {}", material.as_deref().unwrap_or("-"));
    println!("Surface:     {}", surface.as_deref().unwrap_or("-"));
    println!("Description: {}", entry.description.as_deref().unwrap_or("-"));
    println!(
        "Location:    {} / {}",
        entry.city.as_deref().unwrap_or("-"),
        entry.district.as_deref().unwrap_or("-")
    );
    println!("Creator:     {}", entry.creator_hash);
    println!(
        "Near photo:  {}",
        entry.near_photo_path.as_deref().unwrap_or("-")
    );
    println!(
        "Far photo:   {}",
        entry.far_photo_path.as_deref().unwrap_or("-")
    );
    println!("Created:     {}", format_millis(entry.created_at));
    println!("Updated:     {}", format_millis(entry.updated_at));

    Ok(())
}

pub(crate) fn resolve(store: &Store, id: &str) -> Result<Option<crate::store::Entry>> {
    if let Some(entry) = store.entry(id)? {
        return Ok(Some(entry));
    }
    Ok(store
        .entries()?
        .into_iter()
        .find(|e| e.id.starts_with(id)))
}

fn lookup(items: Vec<crate::store::VocabItem>, id: Option<i64>) -> Option<String> {
    id.and_then(|id| items.into_iter().find(|v| v.id == id)).map(|v| v.name)
}
