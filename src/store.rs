use crate::error::{Result, StatementPipelineError};
use crate::metrics::{CodeMap, DerivedMetric};
use crate::schema::{
    DocType, DocumentRecord, MetricRecord, NewDocument, NewRow, RowRecord, Section, TableRecord,
};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;

const SCHEMA_SQL: &str = "
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        year INTEGER NOT NULL,
        doc_type TEXT NOT NULL,
        file_path TEXT NOT NULL,
        original_filename TEXT NOT NULL,
        uploaded_at TEXT NOT NULL,
        notes TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_documents_owner_year_type
        ON documents(owner, year, doc_type);
    CREATE TABLE IF NOT EXISTS extracted_tables (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        page_number INTEGER NOT NULL DEFAULT 1,
        table_index INTEGER NOT NULL DEFAULT 1,
        method TEXT NOT NULL,
        columns TEXT NOT NULL,
        meta TEXT NOT NULL DEFAULT '{}'
    );
    CREATE INDEX IF NOT EXISTS idx_tables_document
        ON extracted_tables(document_id, page_number);
    CREATE TABLE IF NOT EXISTS extracted_rows (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        table_id INTEGER NOT NULL REFERENCES extracted_tables(id) ON DELETE CASCADE,
        code TEXT,
        label TEXT,
        value REAL,
        section TEXT,
        raw_data TEXT NOT NULL DEFAULT '{}'
    );
    CREATE INDEX IF NOT EXISTS idx_rows_table ON extracted_rows(table_id);
    CREATE INDEX IF NOT EXISTS idx_rows_code ON extracted_rows(code);
    CREATE TABLE IF NOT EXISTS financial_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        code TEXT NOT NULL DEFAULT '',
        label TEXT NOT NULL DEFAULT '',
        value REAL,
        year INTEGER NOT NULL,
        is_derived INTEGER NOT NULL DEFAULT 0,
        derived_key TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_metrics_document ON financial_metrics(document_id);
    CREATE INDEX IF NOT EXISTS idx_metrics_year_key
        ON financial_metrics(year, is_derived, derived_key);
    CREATE INDEX IF NOT EXISTS idx_metrics_code ON financial_metrics(code);
";

/// SQLite-backed persistence for documents, extracted tables/rows and
/// metrics. Deletes cascade from documents down; re-uploading a
/// (owner, year, doc_type) supersedes the previous document.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Store { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Store { conn })
    }

    /// Creates a document record, superseding any existing document for the
    /// same (owner, year, doc_type). Last write wins; there is no guard
    /// against concurrent uploads of the same triple.
    pub fn create_document(&self, new: &NewDocument) -> Result<DocumentRecord> {
        if let Some(old) = self.find_document(&new.owner, new.year, new.doc_type)? {
            debug!(
                "superseding document {} ({} {} {})",
                old.id, old.owner, old.year, old.doc_type
            );
            self.delete_document(old.id)?;
        }

        let uploaded_at = Utc::now();
        self.conn.execute(
            "INSERT INTO documents (owner, year, doc_type, file_path, original_filename, uploaded_at, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.owner,
                new.year,
                new.doc_type.as_str(),
                new.file_path,
                new.original_filename,
                uploaded_at.to_rfc3339(),
                new.notes,
            ],
        )?;

        Ok(DocumentRecord {
            id: self.conn.last_insert_rowid(),
            owner: new.owner.clone(),
            year: new.year,
            doc_type: new.doc_type,
            file_path: new.file_path.clone(),
            original_filename: new.original_filename.clone(),
            uploaded_at,
            notes: new.notes.clone(),
        })
    }

    /// Latest document for the triple, if any.
    pub fn find_document(
        &self,
        owner: &str,
        year: i32,
        doc_type: DocType,
    ) -> Result<Option<DocumentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, year, doc_type, file_path, original_filename, uploaded_at, notes
             FROM documents WHERE owner = ?1 AND year = ?2 AND doc_type = ?3
             ORDER BY uploaded_at DESC, id DESC LIMIT 1",
        )?;
        let doc = stmt
            .query_row(params![owner, year, doc_type.as_str()], document_from_row)
            .map(Some)
            .or_else(not_found_to_none)?;
        Ok(doc)
    }

    pub fn document(&self, id: i64) -> Result<Option<DocumentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, year, doc_type, file_path, original_filename, uploaded_at, notes
             FROM documents WHERE id = ?1",
        )?;
        let doc = stmt
            .query_row(params![id], document_from_row)
            .map(Some)
            .or_else(not_found_to_none)?;
        Ok(doc)
    }

    pub fn documents_for_owner(&self, owner: &str) -> Result<Vec<DocumentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, year, doc_type, file_path, original_filename, uploaded_at, notes
             FROM documents WHERE owner = ?1 ORDER BY uploaded_at DESC, id DESC",
        )?;
        let docs = stmt
            .query_map(params![owner], document_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    /// Deletes the document, cascading to its tables, rows and metrics, and
    /// removes the stored file. File removal failures are swallowed.
    pub fn delete_document(&self, id: i64) -> Result<()> {
        let doc = self
            .document(id)?
            .ok_or(StatementPipelineError::DocumentNotFound(id))?;

        self.conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id])?;

        if !doc.file_path.is_empty() {
            if let Err(e) = std::fs::remove_file(&doc.file_path) {
                debug!("could not remove stored file {}: {}", doc.file_path, e);
            }
        }
        Ok(())
    }

    pub fn insert_table(
        &self,
        document_id: i64,
        page_number: u32,
        table_index: u32,
        method: &str,
        columns: &[String],
        meta: &serde_json::Value,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO extracted_tables (document_id, page_number, table_index, method, columns, meta)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                document_id,
                page_number,
                table_index,
                method,
                serde_json::to_string(columns)?,
                meta.to_string(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_rows(&self, table_id: i64, rows: &[NewRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO extracted_rows (table_id, code, label, value, section, raw_data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(params![
                    table_id,
                    row.code,
                    row.label,
                    row.value,
                    row.section.map(|s| s.as_str()),
                    row.raw_data.to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn tables_for_document(&self, document_id: i64) -> Result<Vec<TableRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, document_id, page_number, table_index, method, columns, meta
             FROM extracted_tables WHERE document_id = ?1 ORDER BY page_number, table_index",
        )?;
        let tables = stmt
            .query_map(params![document_id], |row| {
                let columns_json: String = row.get(5)?;
                let meta_json: String = row.get(6)?;
                Ok(TableRecord {
                    id: row.get(0)?,
                    document_id: row.get(1)?,
                    page_number: row.get(2)?,
                    table_index: row.get(3)?,
                    method: row.get(4)?,
                    columns: serde_json::from_str(&columns_json).unwrap_or_default(),
                    meta: serde_json::from_str(&meta_json)
                        .unwrap_or(serde_json::Value::Null),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tables)
    }

    pub fn rows_for_document(&self, document_id: i64) -> Result<Vec<RowRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.table_id, r.code, r.label, r.value, r.section, r.raw_data
             FROM extracted_rows r
             JOIN extracted_tables t ON r.table_id = t.id
             WHERE t.document_id = ?1 ORDER BY r.id",
        )?;
        let rows = stmt
            .query_map(params![document_id], row_record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Regenerates the base (non-derived) metrics for a document from its
    /// current extracted rows: old base metrics are deleted, then every row
    /// with a code or a value is copied over 1:1.
    pub fn rewrite_base_metrics(&self, doc: &DocumentRecord) -> Result<usize> {
        let rows = self.rows_for_document(doc.id)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM financial_metrics WHERE document_id = ?1 AND is_derived = 0",
            params![doc.id],
        )?;

        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO financial_metrics (document_id, code, label, value, year, is_derived, derived_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, '')",
            )?;
            for row in &rows {
                let code = row.code.as_deref().map(str::trim).unwrap_or("");
                if code.is_empty() && row.value.is_none() {
                    continue;
                }
                let label = row.label.as_deref().map(str::trim).unwrap_or("");
                stmt.execute(params![doc.id, code, label, row.value, doc.year])?;
                written += 1;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Replaces all derived metrics for a document. Derivation has no
    /// incremental mode: the prior derived set is always deleted first.
    pub fn replace_derived_metrics(
        &self,
        doc: &DocumentRecord,
        derived: &[DerivedMetric],
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM financial_metrics WHERE document_id = ?1 AND is_derived = 1",
            params![doc.id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO financial_metrics (document_id, code, label, value, year, is_derived, derived_key)
                 VALUES (?1, '', ?2, ?3, ?4, 1, ?5)",
            )?;
            for metric in derived {
                stmt.execute(params![doc.id, metric.label, metric.value, doc.year, metric.key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Raw code → value for one document, from the base metrics. Rows with
    /// no code or no value contribute nothing; on duplicate codes the latest
    /// row wins.
    pub fn code_map(&self, document_id: i64) -> Result<CodeMap> {
        let mut stmt = self.conn.prepare(
            "SELECT code, value FROM financial_metrics
             WHERE document_id = ?1 AND is_derived = 0 AND code != '' AND value IS NOT NULL
             ORDER BY id",
        )?;
        let mut map = CodeMap::new();
        let entries = stmt.query_map(params![document_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        for entry in entries {
            let (code, value) = entry?;
            map.insert(code, value);
        }
        Ok(map)
    }

    pub fn metrics_for_document(&self, document_id: i64, derived: bool) -> Result<Vec<MetricRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, document_id, code, label, value, year, is_derived, derived_key
             FROM financial_metrics WHERE document_id = ?1 AND is_derived = ?2
             ORDER BY code, derived_key, id",
        )?;
        let metrics = stmt
            .query_map(params![document_id, derived], metric_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(metrics)
    }

    /// The stored derived metric value for (owner, year, key), if present.
    pub fn derived_value(&self, owner: &str, year: i32, key: &str) -> Result<Option<f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.value FROM financial_metrics m
             JOIN documents d ON m.document_id = d.id
             WHERE d.owner = ?1 AND m.year = ?2 AND m.is_derived = 1 AND m.derived_key = ?3
             ORDER BY m.id DESC LIMIT 1",
        )?;
        let value = stmt
            .query_row(params![owner, year, key], |row| row.get::<_, Option<f64>>(0))
            .map(Some)
            .or_else(not_found_to_none)?;
        Ok(value.flatten())
    }

    /// Sums raw base-metric values across the given codes for one owner and
    /// year, optionally restricted to one statement type. `None` when no
    /// code resolves to a value.
    pub fn sum_raw_codes(
        &self,
        owner: &str,
        year: i32,
        codes: &[String],
        doc_type: Option<DocType>,
    ) -> Result<Option<f64>> {
        if codes.is_empty() {
            return Ok(None);
        }

        let placeholders = vec!["?"; codes.len()].join(", ");
        let mut sql = format!(
            "SELECT m.value FROM financial_metrics m
             JOIN documents d ON m.document_id = d.id
             WHERE d.owner = ? AND m.year = ? AND m.is_derived = 0
               AND m.value IS NOT NULL AND m.code IN ({})",
            placeholders
        );

        let mut sql_params: Vec<SqlValue> = vec![
            SqlValue::Text(owner.to_string()),
            SqlValue::Integer(year as i64),
        ];
        for code in codes {
            sql_params.push(SqlValue::Text(code.clone()));
        }
        if let Some(doc_type) = doc_type {
            sql.push_str(" AND d.doc_type = ?");
            sql_params.push(SqlValue::Text(doc_type.as_str().to_string()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let values = stmt
            .query_map(params_from_iter(sql_params), |row| row.get::<_, f64>(0))?
            .collect::<rusqlite::Result<Vec<f64>>>()?;

        if values.is_empty() {
            Ok(None)
        } else {
            Ok(Some(values.iter().sum()))
        }
    }

    /// Years for which the owner has an income statement, ascending.
    pub fn income_years(&self, owner: &str) -> Result<Vec<i32>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT year FROM documents
             WHERE owner = ?1 AND doc_type = 'income' ORDER BY year",
        )?;
        let years = stmt
            .query_map(params![owner], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i32>>>()?;
        Ok(years)
    }
}

fn not_found_to_none<T>(e: rusqlite::Error) -> rusqlite::Result<Option<T>> {
    match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other),
    }
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    let doc_type_str: String = row.get(3)?;
    let doc_type = doc_type_str.parse::<DocType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let uploaded_at_str: String = row.get(6)?;
    let uploaded_at = DateTime::parse_from_rfc3339(&uploaded_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(DocumentRecord {
        id: row.get(0)?,
        owner: row.get(1)?,
        year: row.get(2)?,
        doc_type,
        file_path: row.get(4)?,
        original_filename: row.get(5)?,
        uploaded_at,
        notes: row.get(7)?,
    })
}

fn row_record_from_row(row: &Row<'_>) -> rusqlite::Result<RowRecord> {
    let section: Option<String> = row.get(5)?;
    let raw_json: String = row.get(6)?;
    Ok(RowRecord {
        id: row.get(0)?,
        table_id: row.get(1)?,
        code: row.get(2)?,
        label: row.get(3)?,
        value: row.get(4)?,
        section: section.as_deref().and_then(Section::parse_lenient),
        raw_data: serde_json::from_str(&raw_json).unwrap_or(serde_json::Value::Null),
    })
}

fn metric_from_row(row: &Row<'_>) -> rusqlite::Result<MetricRecord> {
    Ok(MetricRecord {
        id: row.get(0)?,
        document_id: row.get(1)?,
        code: row.get(2)?,
        label: row.get(3)?,
        value: row.get(4)?,
        year: row.get(5)?,
        is_derived: row.get(6)?,
        derived_key: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_doc(owner: &str, year: i32, doc_type: DocType) -> NewDocument {
        NewDocument {
            owner: owner.to_string(),
            year,
            doc_type,
            file_path: String::new(),
            original_filename: format!("{}_{}.pdf", doc_type, year),
            notes: None,
        }
    }

    fn row(code: Option<&str>, label: Option<&str>, value: Option<f64>) -> NewRow {
        NewRow {
            code: code.map(str::to_string),
            label: label.map(str::to_string),
            value,
            section: None,
            raw_data: serde_json::json!({}),
        }
    }

    #[test]
    fn test_create_and_find_document() {
        let store = Store::open_in_memory().unwrap();
        let doc = store
            .create_document(&new_doc("acme", 2023, DocType::Income))
            .unwrap();

        let found = store.find_document("acme", 2023, DocType::Income).unwrap();
        assert_eq!(found.unwrap().id, doc.id);

        assert!(store.find_document("acme", 2022, DocType::Income).unwrap().is_none());
        assert!(store.find_document("acme", 2023, DocType::Balance).unwrap().is_none());
    }

    #[test]
    fn test_reupload_supersedes() {
        let store = Store::open_in_memory().unwrap();
        let first = store
            .create_document(&new_doc("acme", 2023, DocType::Income))
            .unwrap();
        let second = store
            .create_document(&new_doc("acme", 2023, DocType::Income))
            .unwrap();

        assert_ne!(first.id, second.id);
        let docs = store.documents_for_owner("acme").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, second.id);
    }

    #[test]
    fn test_delete_cascades() {
        let store = Store::open_in_memory().unwrap();
        let doc = store
            .create_document(&new_doc("acme", 2023, DocType::Income))
            .unwrap();
        let table_id = store
            .insert_table(doc.id, 1, 1, "test", &[], &serde_json::json!({}))
            .unwrap();
        store
            .insert_rows(table_id, &[row(Some("01"), Some("Tržby"), Some(100.0))])
            .unwrap();
        store.rewrite_base_metrics(&doc).unwrap();

        store.delete_document(doc.id).unwrap();

        assert!(store.document(doc.id).unwrap().is_none());
        assert!(store.rows_for_document(doc.id).unwrap().is_empty());
        assert!(store.metrics_for_document(doc.id, false).unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_document_errors() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            store.delete_document(999),
            Err(StatementPipelineError::DocumentNotFound(999))
        ));
    }

    #[test]
    fn test_rewrite_base_metrics_filters_and_regenerates() {
        let store = Store::open_in_memory().unwrap();
        let doc = store
            .create_document(&new_doc("acme", 2023, DocType::Income))
            .unwrap();
        let table_id = store
            .insert_table(doc.id, 1, 1, "test", &[], &serde_json::json!({}))
            .unwrap();
        store
            .insert_rows(
                table_id,
                &[
                    row(Some("01"), Some("Tržby"), Some(100.0)),
                    row(None, Some("Mezisoučet"), None),
                    row(None, None, Some(7.0)),
                ],
            )
            .unwrap();

        let written = store.rewrite_base_metrics(&doc).unwrap();
        assert_eq!(written, 2);

        // Running again replaces rather than accumulates.
        let written = store.rewrite_base_metrics(&doc).unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.metrics_for_document(doc.id, false).unwrap().len(), 2);
    }

    #[test]
    fn test_code_map_skips_nulls_and_last_wins() {
        let store = Store::open_in_memory().unwrap();
        let doc = store
            .create_document(&new_doc("acme", 2023, DocType::Income))
            .unwrap();
        let table_id = store
            .insert_table(doc.id, 1, 1, "test", &[], &serde_json::json!({}))
            .unwrap();
        store
            .insert_rows(
                table_id,
                &[
                    row(Some("01"), None, Some(100.0)),
                    row(Some("01"), None, Some(250.0)),
                    row(Some("02"), None, None),
                ],
            )
            .unwrap();
        store.rewrite_base_metrics(&doc).unwrap();

        let map = store.code_map(doc.id).unwrap();
        assert_eq!(map.get("01"), Some(&250.0));
        assert!(!map.contains_key("02"));
    }

    #[test]
    fn test_replace_derived_metrics() {
        let store = Store::open_in_memory().unwrap();
        let doc = store
            .create_document(&new_doc("acme", 2023, DocType::Income))
            .unwrap();

        let derived = vec![
            DerivedMetric {
                key: "revenue".to_string(),
                label: "Derived revenue".to_string(),
                value: Some(1500.0),
            },
            DerivedMetric {
                key: "gross_margin".to_string(),
                label: "Derived gross_margin".to_string(),
                value: None,
            },
        ];

        store.replace_derived_metrics(&doc, &derived).unwrap();
        store.replace_derived_metrics(&doc, &derived).unwrap();

        let stored = store.metrics_for_document(doc.id, true).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(store.derived_value("acme", 2023, "revenue").unwrap(), Some(1500.0));
        assert_eq!(store.derived_value("acme", 2023, "gross_margin").unwrap(), None);
        assert_eq!(store.derived_value("acme", 2023, "missing").unwrap(), None);
    }

    #[test]
    fn test_sum_raw_codes_with_doc_type_filter() {
        let store = Store::open_in_memory().unwrap();

        let income = store
            .create_document(&new_doc("acme", 2023, DocType::Income))
            .unwrap();
        let income_table = store
            .insert_table(income.id, 1, 1, "test", &[], &serde_json::json!({}))
            .unwrap();
        store
            .insert_rows(income_table, &[row(Some("17"), None, Some(40.0))])
            .unwrap();
        store.rewrite_base_metrics(&income).unwrap();

        let balance = store
            .create_document(&new_doc("acme", 2023, DocType::Balance))
            .unwrap();
        let balance_table = store
            .insert_table(balance.id, 1, 1, "test", &[], &serde_json::json!({}))
            .unwrap();
        store
            .insert_rows(
                balance_table,
                &[
                    row(Some("055"), None, Some(100.0)),
                    row(Some("056"), None, Some(20.0)),
                ],
            )
            .unwrap();
        store.rewrite_base_metrics(&balance).unwrap();

        let codes: Vec<String> = vec!["055".into(), "056".into(), "057".into()];
        assert_eq!(
            store
                .sum_raw_codes("acme", 2023, &codes, Some(DocType::Balance))
                .unwrap(),
            Some(120.0)
        );
        assert_eq!(
            store
                .sum_raw_codes("acme", 2023, &codes, Some(DocType::Income))
                .unwrap(),
            None
        );

        let dep: Vec<String> = vec!["17".into()];
        assert_eq!(
            store
                .sum_raw_codes("acme", 2023, &dep, Some(DocType::Income))
                .unwrap(),
            Some(40.0)
        );
        assert_eq!(store.sum_raw_codes("acme", 2023, &[], None).unwrap(), None);
    }

    #[test]
    fn test_income_years() {
        let store = Store::open_in_memory().unwrap();
        store
            .create_document(&new_doc("acme", 2023, DocType::Income))
            .unwrap();
        store
            .create_document(&new_doc("acme", 2022, DocType::Income))
            .unwrap();
        store
            .create_document(&new_doc("acme", 2023, DocType::Balance))
            .unwrap();
        store
            .create_document(&new_doc("other", 2021, DocType::Income))
            .unwrap();

        assert_eq!(store.income_years("acme").unwrap(), vec![2022, 2023]);
    }
}
