//! Duplicate and delete commands

use anyhow::{anyhow, Result};
use std::path::Path;

use crate::capture::discard_file;
use crate::store::Store;

pub fn duplicate(store: &Store, id: &str) -> Result<()> {
    let source = super::list::resolve(store, id)?
        .ok_or_else(|| anyhow!("entry not found: {id}"))?;
    let copy = store.duplicate(&source.id)?;
    println!("Duplicated {} as {}", source.id, copy.id);
    Ok(())
}

pub fn delete(store: &Store, id: &str) -> Result<()> {
    let entry = super::list::resolve(store, id)?
        .ok_or_else(|| anyhow!("entry not found: {id}"))?;
    let photos = store.delete(&entry.id)?;

    // Best-effort cleanup; a photo that will not delete never blocks the
    // record deletion.
    if let Some(near) = &photos.near {
        discard_file(Path::new(near));
    }
    if let Some(far) = &photos.far {
        discard_file(Path::new(far));
    }

    println!("Deleted {}", entry.id);
    Ok(())
}
