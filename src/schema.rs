use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StatementPipelineError;

/// Which statement a document contains. Czech statutory filings come as a
/// balance sheet (rozvaha) or an income statement (výkaz zisku a ztráty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Balance,
    Income,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Balance => "balance",
            DocType::Income => "income",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = StatementPipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balance" => Ok(DocType::Balance),
            "income" => Ok(DocType::Income),
            other => Err(StatementPipelineError::UnknownDocType(other.to_string())),
        }
    }
}

/// Side of the balance sheet a row belongs to. Only meaningful for
/// `DocType::Balance`; income statement rows carry no section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Assets,
    Liabilities,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Assets => "assets",
            Section::Liabilities => "liabilities",
        }
    }

    /// Lenient parse used for LLM output and stored values. The prompt asks
    /// for "asset"/"liability", older data has "assets"/"liabilities", and
    /// the statements themselves say "aktiva"/"pasiva".
    pub fn parse_lenient(s: &str) -> Option<Section> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asset" | "assets" | "aktiva" => Some(Section::Assets),
            "liability" | "liabilities" | "pasiva" | "equity" => Some(Section::Liabilities),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = StatementPipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::parse_lenient(s).ok_or_else(|| StatementPipelineError::UnknownSection(s.to_string()))
    }
}

/// One raw grid of text cells as produced by an extraction engine, before any
/// classification. Headers may be empty or garbled; rows may be ragged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTable {
    pub page_number: u32,
    /// Name of the engine that produced this grid (e.g. "pdf-grid").
    pub engine: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One sanitized statement row: the contract shared by the column classifier
/// and the LLM extraction path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParsedRow {
    #[schemars(description = "Printed row number like \"01\" or \"055\". Empty string if missing.")]
    pub code: String,

    #[schemars(description = "The line item name as printed. Empty string if missing.")]
    pub label: String,

    #[schemars(description = "Current-period value. Null when the cell is empty.")]
    pub value: Option<f64>,

    #[schemars(
        description = "Balance sheet side: \"assets\" or \"liabilities\". Null for income statements."
    )]
    #[serde(default)]
    pub section: Option<Section>,
}

impl ParsedRow {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Vec<ParsedRow>)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }

    /// A row is worth keeping only when it identifies a line item or carries
    /// a value.
    pub fn is_meaningful(&self) -> bool {
        !self.code.is_empty() || self.value.is_some()
    }
}

/// Input for creating a document record. The id and upload timestamp are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner: String,
    pub year: i32,
    pub doc_type: DocType,
    pub file_path: String,
    pub original_filename: String,
    pub notes: Option<String>,
}

/// One uploaded financial statement file. Deleting a document cascades to its
/// tables, rows and metrics, and removes the stored file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub owner: String,
    pub year: i32,
    pub doc_type: DocType,
    pub file_path: String,
    pub original_filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// One logical table recovered from a document, possibly merged from raw
/// tables found by several extraction engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRecord {
    pub id: i64,
    pub document_id: i64,
    pub page_number: u32,
    pub table_index: u32,
    /// Which extraction path produced the table (engine names, or "llm").
    pub method: String,
    pub columns: Vec<String>,
    pub meta: serde_json::Value,
}

/// Input for one classified row. The original cells are preserved in
/// `raw_data` for audit and debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRow {
    pub code: Option<String>,
    pub label: Option<String>,
    pub value: Option<f64>,
    pub section: Option<Section>,
    pub raw_data: serde_json::Value,
}

impl From<ParsedRow> for NewRow {
    fn from(row: ParsedRow) -> Self {
        let raw_data = serde_json::to_value(&row).unwrap_or(serde_json::Value::Null);
        NewRow {
            code: if row.code.is_empty() { None } else { Some(row.code) },
            label: if row.label.is_empty() { None } else { Some(row.label) },
            value: row.value,
            section: row.section,
            raw_data,
        }
    }
}

/// One persisted row of an extracted table after classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowRecord {
    pub id: i64,
    pub table_id: i64,
    pub code: Option<String>,
    pub label: Option<String>,
    pub value: Option<f64>,
    pub section: Option<Section>,
    pub raw_data: serde_json::Value,
}

/// A normalized fact: either copied 1:1 from an extracted row
/// (`is_derived == false`, keyed by `code`) or computed by formula
/// (`is_derived == true`, keyed by `derived_key`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    pub id: i64,
    pub document_id: i64,
    pub code: String,
    pub label: String,
    pub value: Option<f64>,
    pub year: i32,
    pub is_derived: bool,
    pub derived_key: String,
}
