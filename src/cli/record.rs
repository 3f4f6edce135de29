//! Record and edit commands
//!
//! `record` is the CLI rendition of the entry form: remembered location,
//! vocabulary selection with add-on-miss, photo import through the capture
//! flow, blank-draft rejection, and post-save relocation of accepted photos
//! into the category library.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::Args;

use crate::capture::{
    discard_file, relocate_photo, Camera, CaptureFlow, FileImportCamera, PhotoKind,
};
use crate::config::Config;
use crate::session::SessionStore;
use crate::store::{EntryDraft, SaveOutcome, Store, VocabKind};

use super::{find_vocab, vocab::suggested_materials};

#[derive(Args, Debug, Default)]
pub struct RecordArgs {
    /// Entry title
    #[arg(long)]
    pub title: Option<String>,

    /// Category name or id; an unknown name is added to the vocabulary
    #[arg(long)]
    pub category: Option<String>,

    /// Material name or id; an unknown name is added and tied to the category
    #[arg(long)]
    pub material: Option<String>,

    /// Surface name or id; an unknown name is added to the vocabulary
    #[arg(long)]
    pub surface: Option<String>,

    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,

    /// Image file to import as the near photo
    #[arg(long)]
    pub near_photo: Option<PathBuf>,

    /// Image file to import as the far photo
    #[arg(long)]
    pub far_photo: Option<PathBuf>,

    /// City, overriding the remembered session location
    #[arg(long)]
    pub city: Option<String>,

    /// District, overriding the remembered session location
    #[arg(long)]
    pub district: Option<String>,
}

pub fn run(
    store: &Store,
    session: &mut SessionStore,
    config: &Config,
    args: RecordArgs,
) -> Result<()> {
    // Location: explicit flags confirm a new session location, otherwise
    // the one remembered from the last entry is reused.
    let city = args.city.clone().or_else(|| session.city().map(String::from));
    let district = args
        .district
        .clone()
        .or_else(|| session.district().map(String::from));
    if args.city.is_some() || args.district.is_some() {
        session.set_location(city.as_deref().unwrap_or(""), district.as_deref().unwrap_or(""))?;
    }
    if city.is_none() {
        println!(
            "No location set; use --city/--district (e.g. {}).",
            config.form.city_suggestions.join(", ")
        );
    }

    let category_id = args
        .category
        .as_deref()
        .map(|input| select_or_add(store, VocabKind::Category, input))
        .transpose()?;
    let surface_id = args
        .surface
        .as_deref()
        .map(|input| select_or_add(store, VocabKind::Surface, input))
        .transpose()?;
    let material_id = args
        .material
        .as_deref()
        .map(|input| select_material(store, config, category_id, input))
        .transpose()?;

    let title = clean(args.title);
    let (near, far) = import_photos(
        config,
        title.as_deref().unwrap_or(""),
        args.near_photo,
        args.far_photo,
    )?;

    let draft = EntryDraft {
        title,
        category_id,
        material_id,
        surface_id,
        description: clean(args.description),
        city: city.and_then(|c| clean(Some(c))),
        district: district.and_then(|d| clean(Some(d))),
        creator_hash: session.creator_hash(),
        near_photo_path: near,
        far_photo_path: far,
    };

    match store.create(&draft)? {
        SaveOutcome::RejectedBlank => {
            println!("Empty entry not saved.");
            Ok(())
        }
        SaveOutcome::Saved(id) => {
            settle_photos(store, config, &id, category_id)?;
            println!("Saved {id}");
            Ok(())
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub material: Option<String>,

    #[arg(long)]
    pub surface: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Replace the near photo with an imported image
    #[arg(long)]
    pub near_photo: Option<PathBuf>,

    /// Replace the far photo with an imported image
    #[arg(long)]
    pub far_photo: Option<PathBuf>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub district: Option<String>,
}

/// Full-replacement update; flags left unspecified keep the entry's
/// current values.
pub fn edit(store: &Store, config: &Config, id: &str, args: EditArgs) -> Result<()> {
    let existing = store
        .entry(id)?
        .ok_or_else(|| anyhow!("entry not found: {id}"))?;

    let category_id = match args.category.as_deref() {
        Some(input) => Some(select_or_add(store, VocabKind::Category, input)?),
        None => existing.category_id,
    };
    let material_id = match args.material.as_deref() {
        Some(input) => Some(select_material(store, config, category_id, input)?),
        None => existing.material_id,
    };
    let surface_id = match args.surface.as_deref() {
        Some(input) => Some(select_or_add(store, VocabKind::Surface, input)?),
        None => existing.surface_id,
    };

    let title = clean(args.title).or(existing.title);
    let (new_near, new_far) = import_photos(
        config,
        title.as_deref().unwrap_or(""),
        args.near_photo,
        args.far_photo,
    )?;

    // A replaced photo's old file is no longer referenced by anything
    if new_near.is_some() {
        if let Some(old) = &existing.near_photo_path {
            discard_file(std::path::Path::new(old));
        }
    }
    if new_far.is_some() {
        if let Some(old) = &existing.far_photo_path {
            discard_file(std::path::Path::new(old));
        }
    }

    let draft = EntryDraft {
        title,
        category_id,
        material_id,
        surface_id,
        description: clean(args.description).or(existing.description),
        city: clean(args.city).or(existing.city),
        district: clean(args.district).or(existing.district),
        creator_hash: existing.creator_hash,
        near_photo_path: new_near.or(existing.near_photo_path),
        far_photo_path: new_far.or(existing.far_photo_path),
    };

    store.update(id, &draft)?;
    settle_photos(store, config, id, category_id)?;
    println!("Updated {id}");
    Ok(())
}

/// Resolve a vocabulary input, adding it as a user-defined item when the
/// name is new. Unknown numeric ids are an error, not a new tag.
fn select_or_add(store: &Store, kind: VocabKind, input: &str) -> Result<i64> {
    if let Some(item) = find_vocab(store, kind, input)? {
        return Ok(item.id);
    }
    if input.trim().parse::<i64>().is_ok() {
        bail!("no {} with id {}", kind.as_str(), input.trim());
    }
    let id = store.add_custom(kind, input)?;
    println!("Added {} '{}'", kind.as_str(), input.trim());
    Ok(id)
}

/// Like [`select_or_add`], plus the allow-list handling: a brand-new
/// material is tied to the selected category, an existing one gets a note
/// when it is not on the category's suggestion list.
fn select_material(
    store: &Store,
    config: &Config,
    category_id: Option<i64>,
    input: &str,
) -> Result<i64> {
    let known = find_vocab(store, VocabKind::Material, input)?;
    let is_new = known.is_none();
    let id = match known {
        Some(item) => item.id,
        None => select_or_add(store, VocabKind::Material, input)?,
    };

    if let Some(category_id) = category_id {
        if is_new {
            store.tie(category_id, id)?;
        } else {
            let suggested = suggested_materials(store, config, category_id)?;
            if !suggested.iter().any(|m| m.id == id) {
                println!("Note: that material is not suggested for this category.");
            }
        }
    }
    Ok(id)
}

/// Run provided image files through the capture flow: stage, accept,
/// yield the staged paths. Failure cleans the staging area up.
fn import_photos(
    config: &Config,
    title: &str,
    near: Option<PathBuf>,
    far: Option<PathBuf>,
) -> Result<(Option<String>, Option<String>)> {
    if near.is_none() && far.is_none() {
        return Ok((None, None));
    }

    let staging = config.staging_dir();
    let mut flow = CaptureFlow::new(&staging, title, config.cancel_policy());

    if let Some(source) = near {
        let target = flow.start(PhotoKind::Near)?;
        if let Err(e) = FileImportCamera::new(source).shoot(&target) {
            flow.capture_failed()?;
            return Err(e);
        }
        flow.capture_succeeded()?;
        if far.is_some() {
            let far_target = flow.next()?;
            let source = far.ok_or_else(|| anyhow!("far photo vanished"))?;
            if let Err(e) = FileImportCamera::new(source).shoot(&far_target) {
                flow.cancel();
                return Err(e);
            }
            flow.capture_succeeded()?;
        }
        flow.accept()?;
    } else if let Some(source) = far {
        let target = flow.start(PhotoKind::Far)?;
        if let Err(e) = FileImportCamera::new(source).shoot(&target) {
            flow.capture_failed()?;
            return Err(e);
        }
        flow.capture_succeeded()?;
        flow.accept()?;
    }

    let outcome = flow
        .outcome()
        .ok_or_else(|| anyhow!("capture flow did not finish"))?;
    Ok((
        outcome.near.map(|p| p.to_string_lossy().into_owned()),
        outcome.far.map(|p| p.to_string_lossy().into_owned()),
    ))
}

/// Move accepted photos from staging into the category library and point
/// the saved record at their settled paths.
fn settle_photos(
    store: &Store,
    config: &Config,
    id: &str,
    category_id: Option<i64>,
) -> Result<()> {
    let Some(entry) = store.entry(id)? else {
        return Ok(());
    };
    if entry.near_photo_path.is_none() && entry.far_photo_path.is_none() {
        return Ok(());
    }

    let category_name = match category_id {
        Some(cid) => find_vocab(store, VocabKind::Category, &cid.to_string())?.map(|v| v.name),
        None => None,
    };
    let library = config.library_dir();

    let near = entry
        .near_photo_path
        .as_deref()
        .map(|p| relocate_photo(&library, category_name.as_deref(), p));
    let far = entry
        .far_photo_path
        .as_deref()
        .map(|p| relocate_photo(&library, category_name.as_deref(), p));

    if near != entry.near_photo_path || far != entry.far_photo_path {
        store.set_photo_paths(id, near.as_deref(), far.as_deref())?;
    }
    Ok(())
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(root: &std::path::Path) -> Config {
        let yaml = format!(
            "storage:\n  path: {0}/fieldnote.db\nphotos:\n  staging_dir: {0}/staging\n  library_dir: {0}/photos\nexports:\n  dir: {0}/exports\n",
            root.display()
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[test]
    fn test_record_rejects_blank_and_saves_minimal() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let store = Store::open_in_memory().unwrap();
        let mut session = SessionStore::load(dir.path());

        run(&store, &mut session, &config, RecordArgs::default()).unwrap();
        assert!(store.entries().unwrap().is_empty());

        run(
            &store,
            &mut session,
            &config,
            RecordArgs {
                title: Some("Mural".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_record_remembers_location_for_next_entry() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let store = Store::open_in_memory().unwrap();
        let mut session = SessionStore::load(dir.path());

        run(
            &store,
            &mut session,
            &config,
            RecordArgs {
                title: Some("first".to_string()),
                city: Some("Hamburg".to_string()),
                district: Some("Nord".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        // Second entry gives no location flags and still gets the city
        run(
            &store,
            &mut session,
            &config,
            RecordArgs {
                title: Some("second".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let entries = store.entries().unwrap();
        assert_eq!(entries[0].city.as_deref(), Some("Hamburg"));
        assert_eq!(entries[0].district.as_deref(), Some("Nord"));
    }

    #[test]
    fn test_record_adds_unknown_vocabulary_and_ties_material() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let store = Store::open_in_memory().unwrap();
        let mut session = SessionStore::load(dir.path());

        run(
            &store,
            &mut session,
            &config,
            RecordArgs {
                title: Some("Mosaic panel".to_string()),
                category: Some("Mosaik".to_string()),
                material: Some("Glas".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let category = find_vocab(&store, VocabKind::Category, "Mosaik")
            .unwrap()
            .expect("category added");
        assert!(category.user_defined);

        let allowed = store.materials_for_category(category.id).unwrap();
        assert!(allowed.iter().any(|m| m.name == "Glas"));
    }

    #[test]
    fn test_record_unknown_numeric_id_is_an_error() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let store = Store::open_in_memory().unwrap();
        let mut session = SessionStore::load(dir.path());

        let result = run(
            &store,
            &mut session,
            &config,
            RecordArgs {
                title: Some("x".to_string()),
                category: Some("999".to_string()),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_record_relocates_photos_into_category_folder() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let store = Store::open_in_memory().unwrap();
        let mut session = SessionStore::load(dir.path());

        let source = dir.path().join("shot.jpg");
        std::fs::write(&source, b"jpeg").unwrap();

        run(
            &store,
            &mut session,
            &config,
            RecordArgs {
                title: Some("Mural".to_string()),
                category: Some("Graffiti".to_string()),
                near_photo: Some(source),
                ..Default::default()
            },
        )
        .unwrap();

        let entry = &store.entries().unwrap()[0];
        let near = entry.near_photo_path.as_deref().unwrap();
        assert!(near.contains("غرافيتي"), "photo should settle under the category folder: {near}");
        assert!(std::path::Path::new(near).exists());

        // Staging is empty again
        let staged = std::fs::read_dir(config.staging_dir())
            .map(|d| d.count())
            .unwrap_or(0);
        assert_eq!(staged, 0);
    }

    #[test]
    fn test_edit_keeps_unspecified_fields() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let store = Store::open_in_memory().unwrap();
        let mut session = SessionStore::load(dir.path());

        run(
            &store,
            &mut session,
            &config,
            RecordArgs {
                title: Some("before".to_string()),
                description: Some("keep me".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let id = store.entries().unwrap()[0].id.clone();

        edit(
            &store,
            &config,
            &id,
            EditArgs {
                title: Some("after".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let entry = store.entry(&id).unwrap().unwrap();
        assert_eq!(entry.title.as_deref(), Some("after"));
        assert_eq!(entry.description.as_deref(), Some("keep me"));
    }
}
