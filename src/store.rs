//! Document blobs on disk and field lists in memory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;

use crate::field::{Field, validate_fields};
use crate::pdf_writer::PdfDocument;

/// Field lists keyed by document id. Saving replaces the whole list.
#[derive(Default)]
pub struct FieldStore {
    fields: Mutex<HashMap<String, Vec<Field>>>,
}

impl FieldStore {
    pub fn list_fields(&self, doc_id: &str) -> Vec<Field> {
        self.fields
            .lock()
            .map(|map| map.get(doc_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Set the list for `doc_id` to exactly `fields`. Returns the new count.
    pub fn replace_fields(&self, doc_id: &str, fields: Vec<Field>) -> Result<usize> {
        validate_fields(&fields)?;
        let count = fields.len();
        let mut map = self.fields.lock().map_err(|_| anyhow!("field store lock poisoned"))?;
        map.insert(doc_id.to_string(), fields);
        log::debug!("stored {count} fields for document {doc_id}");
        Ok(count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

pub struct StoredDocument {
    pub pages: Vec<PageSize>,
    pub bytes: Vec<u8>,
}

/// Source and filled PDFs under one directory.
pub struct DocumentStore {
    root: PathBuf,
}

fn check_id(doc_id: &str) -> Result<()> {
    let ok = !doc_id.is_empty()
        && doc_id.len() <= 128
        && doc_id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !ok {
        bail!("invalid document id {doc_id:?}");
    }
    Ok(())
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> DocumentStore {
        DocumentStore { root: root.into() }
    }

    fn source_path(&self, doc_id: &str) -> PathBuf {
        self.root.join(format!("{doc_id}.pdf"))
    }

    /// Store a source PDF. The bytes must parse as a PDF.
    pub fn put(&self, doc_id: &str, bytes: &[u8]) -> Result<usize> {
        check_id(doc_id)?;
        let pages = PdfDocument::load(bytes)?.page_count();
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("creating {}", self.root.display()))?;
        let path = self.source_path(doc_id);
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        log::info!("stored document {doc_id} ({} bytes, {pages} pages)", bytes.len());
        Ok(pages)
    }

    pub fn exists(&self, doc_id: &str) -> bool {
        check_id(doc_id).is_ok() && self.source_path(doc_id).is_file()
    }

    pub fn load(&self, doc_id: &str) -> Result<StoredDocument> {
        check_id(doc_id)?;
        let path = self.source_path(doc_id);
        let bytes = std::fs::read(&path).with_context(|| format!("document {doc_id} not found"))?;
        let pages = PdfDocument::load(&bytes)?
            .pages()
            .iter()
            .map(|p| PageSize { width: p.width(), height: p.height() })
            .collect();
        Ok(StoredDocument { pages, bytes })
    }

    /// Keep a filled copy next to the source. Returns where it was written.
    pub fn save_filled(&self, doc_id: &str, bytes: &[u8]) -> Result<PathBuf> {
        check_id(doc_id)?;
        let now = time::OffsetDateTime::now_utc();
        let stamp = format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}{:03}",
            now.year(),
            u8::from(now.month()),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.millisecond(),
        );
        let dir = self.root.join("filled");
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(format!("{doc_id}-{stamp}.pdf"));
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        log::info!("saved filled document to {}", path.display());
        Ok(path)
    }
}
