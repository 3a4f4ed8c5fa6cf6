use crate::classifier::TableClassifier;
use crate::error::Result;
use crate::formulas::FormulaTable;
use crate::metrics::derive_metrics;
use crate::schema::{DocType, DocumentRecord, NewDocument, NewRow, ParsedRow, RawTable};
use crate::store::Store;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// An external table-extraction engine, consumed as a black box. Engines
/// return raw grids of text cells; anything they raise is swallowed by the
/// pipeline, which falls back to whatever the other engines produced.
pub trait TableExtractor {
    fn name(&self) -> &str;
    fn extract_tables(&self, path: &Path) -> Result<Vec<RawTable>>;
}

/// One file to ingest, with its statement metadata.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub path: PathBuf,
    pub owner: String,
    pub year: i32,
    pub doc_type: DocType,
    pub notes: Option<String>,
}

impl DocumentSource {
    fn to_new_document(&self) -> NewDocument {
        let original_filename = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.pdf")
            .to_string();
        NewDocument {
            owner: self.owner.clone(),
            year: self.year,
            doc_type: self.doc_type,
            file_path: self.path.to_string_lossy().into_owned(),
            original_filename,
            notes: self.notes.clone(),
        }
    }
}

/// Result of ingesting one document. `tables_saved == 0` is a degenerate
/// success: the document exists but nothing usable was extracted.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub document_id: i64,
    pub tables_saved: usize,
    pub rows_saved: usize,
}

/// The ingestion pipeline: extraction engines → classifier → store →
/// derivation. Everything it touches is injected; it owns no globals.
pub struct Pipeline<'a> {
    store: &'a Store,
    formulas: FormulaTable,
    engines: Vec<Box<dyn TableExtractor>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a Store, formulas: FormulaTable) -> Self {
        Self {
            store,
            formulas,
            engines: Vec::new(),
        }
    }

    pub fn with_engine(mut self, engine: Box<dyn TableExtractor>) -> Self {
        self.engines.push(engine);
        self
    }

    /// Ingests one document through the table-extraction path: runs every
    /// engine over the file, merges and classifies the grids, persists the
    /// result and refreshes the document's metrics.
    pub fn ingest_tables(&self, source: &DocumentSource) -> Result<IngestOutcome> {
        let doc = self.store.create_document(&source.to_new_document())?;
        info!(
            "ingesting {} ({} {}) as document {}",
            doc.original_filename, doc.doc_type, doc.year, doc.id
        );

        let mut raw_tables: Vec<RawTable> = Vec::new();
        let mut contributing: Vec<&str> = Vec::new();
        for engine in &self.engines {
            match engine.extract_tables(&source.path) {
                Ok(tables) => {
                    if !tables.is_empty() {
                        contributing.push(engine.name());
                    }
                    raw_tables.extend(tables);
                }
                Err(e) => {
                    warn!("engine {} failed on {:?}: {}", engine.name(), source.path, e);
                }
            }
        }

        let classified = TableClassifier::new(source.doc_type).classify(&raw_tables);
        if classified.is_empty() {
            debug!("document {}: nothing extracted, 0 tables saved", doc.id);
            return Ok(IngestOutcome {
                document_id: doc.id,
                tables_saved: 0,
                rows_saved: 0,
            });
        }

        let method = contributing.join("+");
        let page_number = raw_tables.first().map(|t| t.page_number).unwrap_or(1);
        let meta = serde_json::json!({
            "rows": classified.rows.len(),
            "columns": classified.columns.len(),
            "raw_tables": raw_tables.len(),
        });

        let table_id =
            self.store
                .insert_table(doc.id, page_number, 1, &method, &classified.columns, &meta)?;
        let rows_saved = self.store.insert_rows(table_id, &classified.rows)?;

        self.refresh_metrics(&doc)?;

        Ok(IngestOutcome {
            document_id: doc.id,
            tables_saved: 1,
            rows_saved,
        })
    }

    /// Ingests already-parsed rows (the LLM path) through the same
    /// persistence and derivation steps as the table path.
    pub fn ingest_rows(
        &self,
        source: &DocumentSource,
        method: &str,
        parsed: Vec<ParsedRow>,
    ) -> Result<IngestOutcome> {
        let doc = self.store.create_document(&source.to_new_document())?;

        let rows: Vec<NewRow> = parsed
            .into_iter()
            .filter(ParsedRow::is_meaningful)
            .map(NewRow::from)
            .collect();

        if rows.is_empty() {
            debug!("document {}: no rows from {}, 0 tables saved", doc.id, method);
            return Ok(IngestOutcome {
                document_id: doc.id,
                tables_saved: 0,
                rows_saved: 0,
            });
        }

        let columns = ["code", "label", "value", "section"]
            .map(str::to_string)
            .to_vec();
        let meta = serde_json::json!({ "rows": rows.len() });
        let table_id = self
            .store
            .insert_table(doc.id, 1, 1, method, &columns, &meta)?;
        let rows_saved = self.store.insert_rows(table_id, &rows)?;

        self.refresh_metrics(&doc)?;

        Ok(IngestOutcome {
            document_id: doc.id,
            tables_saved: 1,
            rows_saved,
        })
    }

    /// Sequential batch ingestion. One file's failure is logged and does not
    /// abort the remaining files; each file's writes are independent.
    pub fn ingest_batch(&self, sources: &[DocumentSource]) -> Vec<Result<IngestOutcome>> {
        sources
            .iter()
            .map(|source| {
                let outcome = self.ingest_tables(source);
                if let Err(e) = &outcome {
                    warn!("ingestion failed for {:?}: {}", source.path, e);
                }
                outcome
            })
            .collect()
    }

    /// Regenerates base metrics from the document's current rows, then
    /// recomputes the derived set from scratch.
    pub fn refresh_metrics(&self, doc: &DocumentRecord) -> Result<()> {
        let written = self.store.rewrite_base_metrics(doc)?;
        let code_map = self.store.code_map(doc.id)?;
        let derived = derive_metrics(doc.doc_type, &code_map, &self.formulas);
        self.store.replace_derived_metrics(doc, &derived)?;
        debug!(
            "document {}: {} base metrics, {} derived",
            doc.id,
            written,
            derived.len()
        );
        Ok(())
    }

    pub fn formulas(&self) -> &FormulaTable {
        &self.formulas
    }
}
