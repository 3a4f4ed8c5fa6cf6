use crate::error::{Result, StatementPipelineError};
use crate::schema::DocType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_depreciation_code() -> String {
    "17".to_string()
}

/// Maps semantic metric keys to the statement row codes that sum into them,
/// per document type. Injected wherever metrics are derived so a different
/// statement schema is a configuration change, not a code change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaTable {
    pub income: BTreeMap<String, Vec<String>>,
    pub balance: BTreeMap<String, Vec<String>>,

    /// Income statement row holding depreciation, used by the operating
    /// cash flow approximation.
    #[serde(default = "default_depreciation_code")]
    pub depreciation_code: String,

    /// Display labels per metric key, for tenants that want localized
    /// metric names. Keys without an entry fall back to "Derived {key}".
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl FormulaTable {
    /// The canonical mapping for the Czech statutory statement forms.
    pub fn czech_default() -> Self {
        let mut income = BTreeMap::new();
        income.insert(key("revenue"), codes(&["01", "02"]));
        income.insert(key("cogs"), codes(&["04", "05"]));
        income.insert(key("overheads"), codes(&["12", "13", "16", "17", "18"]));
        income.insert(key("other_operating_income"), codes(&["15"]));
        income.insert(key("fin_income"), codes(&["20"]));
        income.insert(key("fin_expense"), codes(&["21"]));
        income.insert(key("tax"), codes(&["40"]));

        let mut balance = BTreeMap::new();
        balance.insert(key("inventories"), codes(&["055", "056", "057"]));
        balance.insert(key("receivables_trade"), codes(&["065", "066"]));
        balance.insert(key("payables_trade"), codes(&["105", "106"]));

        FormulaTable {
            income,
            balance,
            depreciation_code: default_depreciation_code(),
            labels: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let table: FormulaTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        for (doc_type, mapping) in [(DocType::Income, &self.income), (DocType::Balance, &self.balance)]
        {
            for (key, codes) in mapping {
                if codes.is_empty() {
                    return Err(StatementPipelineError::InvalidFormulaTable(format!(
                        "{} metric '{}' maps to no row codes",
                        doc_type, key
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn for_doc_type(&self, doc_type: DocType) -> &BTreeMap<String, Vec<String>> {
        match doc_type {
            DocType::Income => &self.income,
            DocType::Balance => &self.balance,
        }
    }

    /// The row codes behind a semantic key, or an empty slice when the key is
    /// not configured.
    pub fn codes(&self, doc_type: DocType, key: &str) -> &[String] {
        self.for_doc_type(doc_type)
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Display label for a metric key, honoring the configured override.
    pub fn label_for(&self, key: &str) -> String {
        self.labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| format!("Derived {}", key))
    }
}

impl Default for FormulaTable {
    fn default() -> Self {
        Self::czech_default()
    }
}

fn key(s: &str) -> String {
    s.to_string()
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        let table = FormulaTable::czech_default();
        assert_eq!(table.codes(DocType::Income, "revenue"), &["01", "02"]);
        assert_eq!(table.codes(DocType::Balance, "inventories"), &["055", "056", "057"]);
        assert!(table.codes(DocType::Income, "missing").is_empty());
        assert_eq!(table.depreciation_code, "17");
    }

    #[test]
    fn test_json_round_trip() {
        let table = FormulaTable::czech_default();
        let json = serde_json::to_string(&table).unwrap();
        let back = FormulaTable::from_json(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_depreciation_code_defaults_when_absent() {
        let json = r#"{"income": {"revenue": ["01"]}, "balance": {}}"#;
        let table = FormulaTable::from_json(json).unwrap();
        assert_eq!(table.depreciation_code, "17");
    }

    #[test]
    fn test_label_override() {
        let mut table = FormulaTable::czech_default();
        assert_eq!(table.label_for("revenue"), "Derived revenue");

        table
            .labels
            .insert("revenue".to_string(), "Tržby celkem".to_string());
        assert_eq!(table.label_for("revenue"), "Tržby celkem");
        assert_eq!(table.label_for("cogs"), "Derived cogs");
    }

    #[test]
    fn test_labels_default_to_empty_when_absent() {
        let json = r#"{"income": {"revenue": ["01"]}, "balance": {}}"#;
        let table = FormulaTable::from_json(json).unwrap();
        assert!(table.labels.is_empty());
    }

    #[test]
    fn test_empty_code_list_rejected() {
        let json = r#"{"income": {"revenue": []}, "balance": {}}"#;
        assert!(FormulaTable::from_json(json).is_err());
    }
}
