//! # Statement Pipeline
//!
//! A library for turning Czech financial statements (rozvaha and výkaz zisku
//! a ztráty) extracted from PDFs into structured rows and derived financial
//! metrics, backed by SQLite.
//!
//! ## Core Concepts
//!
//! - **Raw Tables**: Grids of text cells produced by external extraction
//!   engines, merged and classified by column role (code / label / value)
//! - **Parsed Rows**: One statement line each, with a printed row code, a
//!   label, a current-period value and (for balance sheets) a section
//! - **Formula Table**: Named metrics mapped to the row codes that sum into
//!   them, with derived ratios (gross margin, EBIT, net profit) on top
//! - **Supersede-on-upload**: One live document per (owner, year, statement
//!   type); re-uploading replaces the previous document and its metrics
//!
//! ## Example
//!
//! ```rust,ignore
//! use statement_pipeline::*;
//! use std::path::PathBuf;
//!
//! let store = Store::open("statements.db")?;
//! let pipeline = Pipeline::new(&store, FormulaTable::czech_default())
//!     .with_engine(Box::new(my_pdf_engine));
//!
//! let outcome = pipeline.ingest_tables(&DocumentSource {
//!     path: PathBuf::from("vysledovka_2023.pdf"),
//!     owner: "acme".to_string(),
//!     year: 2023,
//!     doc_type: DocType::Income,
//!     notes: None,
//! })?;
//!
//! let report = ProfitabilityReport::build(&store, pipeline.formulas(), "acme")?;
//! ```

pub mod classifier;
pub mod error;
pub mod formulas;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod store;

#[cfg(feature = "llm")]
pub mod llm;

pub use classifier::{ClassifiedTable, ColumnRoles, TableClassifier};
pub use error::{Result, StatementPipelineError};
pub use formulas::FormulaTable;
pub use metrics::{derive_metrics, sum_codes, yoy_growth, CodeMap, DerivedMetric, YearSeries};
pub use pipeline::{DocumentSource, IngestOutcome, Pipeline, TableExtractor};
pub use report::ProfitabilityReport;
pub use schema::*;
pub use store::Store;
