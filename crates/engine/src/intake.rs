// Document intake: validate an uploaded file and turn it into a stored
// document record.
//
// Plain text is imported verbatim. DOCX/PDF/DOC are not parsed; they receive
// a starter policy document titled after the file.

use std::path::Path;

use polysync_common::types::{strip_extension, Document};
use thiserror::Error;
use tracing::info;

use crate::error::StoreError;
use crate::store::records::store_document;
use crate::store::KeyValueStore;

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_DOC: &str = "application/msword";

pub const ALLOWED_TYPES: [&str; 4] = [MIME_DOCX, MIME_PDF, MIME_TEXT, MIME_DOC];

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("unsupported file type `{0}`; upload a DOCX, PDF, or TXT file")]
    UnsupportedType(String),
    #[error("file is {size} bytes; upload a file smaller than 10MB")]
    TooLarge { size: u64 },
    #[error("text file is not valid UTF-8")]
    NotUtf8,
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// MIME type for an accepted file extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "docx" => Some(MIME_DOCX),
        "pdf" => Some(MIME_PDF),
        "txt" => Some(MIME_TEXT),
        "doc" => Some(MIME_DOC),
        _ => None,
    }
}

/// Check type and size before anything is read.
pub fn validate(mime_type: &str, size: u64) -> Result<(), IntakeError> {
    if !ALLOWED_TYPES.contains(&mime_type) {
        return Err(IntakeError::UnsupportedType(mime_type.to_string()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(IntakeError::TooLarge { size });
    }
    Ok(())
}

/// Build a document from raw upload bytes.
pub fn document_from_bytes(name: &str, mime_type: &str, bytes: &[u8]) -> Result<Document, IntakeError> {
    validate(mime_type, bytes.len() as u64)?;
    let content = if mime_type == MIME_TEXT {
        String::from_utf8(bytes.to_vec()).map_err(|_| IntakeError::NotUtf8)?
    } else {
        starter_content(name)
    };
    Ok(Document::new(name, Some(mime_type.to_string()), content))
}

/// Read, validate and store a file from disk.
pub async fn import_file<S: KeyValueStore>(store: &S, path: &Path) -> Result<Document, IntakeError> {
    let io_err = |source| IntakeError::Io { path: path.display().to_string(), source };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "Document".to_string());
    let mime_type = mime_for_path(path)
        .ok_or_else(|| IntakeError::UnsupportedType(path.extension().map_or_else(
            || "unknown".to_string(),
            |e| e.to_string_lossy().into_owned(),
        )))?;

    let size = tokio::fs::metadata(path).await.map_err(io_err)?.len();
    validate(mime_type, size)?;
    let bytes = tokio::fs::read(path).await.map_err(io_err)?;

    let doc = document_from_bytes(&name, mime_type, &bytes)?;
    store_document(store, &doc).await?;
    info!(doc_id = %doc.id, name = %doc.name, size, "document imported");
    Ok(doc)
}

/// Starter policy document for formats that are not parsed.
pub fn starter_content(file_name: &str) -> String {
    let title = strip_extension(file_name);
    format!(
        "<h1>{title}</h1>\
<h2>Company Policy Document</h2>\
<p>This is a sample document that has been uploaded to PolySync. You can now edit this content using our rich text editor and get AI assistance for improving your policies.</p>\
<h3>Section 1: Overview</h3>\
<p>This section provides an overview of the policy framework and its applications within the organization.</p>\
<h3>Section 2: Guidelines</h3>\
<p>The following guidelines should be followed by all team members:</p>\
<ul><li>Ensure compliance with industry standards</li><li>Regular review and updates of policies</li><li>Clear communication of policy changes</li></ul>\
<h3>Section 3: Implementation</h3>\
<p>Implementation of these policies requires coordination across multiple departments and regular monitoring of compliance metrics.</p>"
    )
}

/// Human-readable size, e.g. `1.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
