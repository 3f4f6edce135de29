//! Export command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::export::{spawn_export, CancelFlag, ExportFormat};
use crate::store::Store;

pub fn run(store: Arc<Store>, export_dir: PathBuf, format: ExportFormat) -> Result<()> {
    let cancel = CancelFlag::new();
    let handle = spawn_export(store, export_dir, format, cancel);

    let file = handle
        .join()
        .map_err(|_| anyhow!("export worker panicked"))??;
    println!("Exported to {}", file.display());
    Ok(())
}
