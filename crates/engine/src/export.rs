// Export the current document content as `<stem>.html`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polysync_common::types::Document;
use tracing::info;

/// File name the export is written under.
pub fn export_file_name(doc: &Document) -> String {
    format!("{}.html", doc.stem())
}

/// Write `doc.content` into `dir`, overwriting any previous export.
pub fn export_html(doc: &Document, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory `{}`", dir.display()))?;
    let path = dir.join(export_file_name(doc));
    std::fs::write(&path, doc.content.as_bytes())
        .with_context(|| format!("failed to write `{}`", path.display()))?;
    info!(doc_id = %doc.id, path = %path.display(), "document exported");
    Ok(path)
}
