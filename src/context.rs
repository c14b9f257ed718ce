use std::collections::HashMap;

use anyhow::Result;

use crate::calibration::RenderContext;
use crate::config::Config;
use crate::field::{Field, PositionOverrides, ValueMap};
use crate::fill::{FillEngine, Filled};
use crate::images::HttpFetcher;
use crate::position::{ResolvedPosition, resolve_position};
use crate::store::{DocumentStore, FieldStore, PageSize};

/// Everything the server shares between requests.
pub struct GlobalContext {
    pub config: Config,
    pub documents: DocumentStore,
    pub fields: FieldStore,
}

impl GlobalContext {
    pub fn new(config: Config) -> GlobalContext {
        let documents = DocumentStore::new(config.storage_dir.clone());
        GlobalContext { config, documents, fields: FieldStore::default() }
    }

    /// Fill a stored document with its stored fields.
    ///
    /// Blocking: loads a fresh document and may download images. Nothing is
    /// written; the caller keeps the result with `save_filled` once it is
    /// accepted.
    pub fn fill_stored(&self, doc_id: &str, values: &ValueMap, overrides: &PositionOverrides) -> Result<Filled> {
        let source = self.documents.load(doc_id)?;
        let fields = self.fields.list_fields(doc_id);
        let fetcher = HttpFetcher::new(self.config.fetch_timeout())?;
        FillEngine::new(&self.config.calibration, &fetcher).fill(&source.bytes, &fields, values, overrides)
    }

    /// Resolved position of every stored field, keyed by field id.
    pub fn positions(&self, doc_id: &str, scale: f64, context: RenderContext) -> Result<HashMap<String, ResolvedPosition>> {
        let pages = self.documents.load(doc_id)?.pages;
        let fields = self.fields.list_fields(doc_id);
        Ok(resolve_all(&fields, &pages, scale, context, &self.config))
    }
}

fn resolve_all(
    fields: &[Field],
    pages: &[PageSize],
    scale: f64,
    context: RenderContext,
    config: &Config,
) -> HashMap<String, ResolvedPosition> {
    fields
        .iter()
        .filter_map(|f| {
            let page = pages.get(usize::try_from(f.page_number).ok()?.checked_sub(1)?)?;
            let pos = resolve_position(&config.calibration, f.stored_box(), f.font_size(), scale, context, page.height);
            Some((f.id.clone(), pos))
        })
        .collect()
}
