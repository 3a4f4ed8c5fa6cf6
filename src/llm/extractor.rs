use crate::error::Result;
use crate::llm::client::ChatClient;
use crate::llm::prompts::{extraction_prompt, SYSTEM_PROMPT};
use crate::schema::{DocType, ParsedRow, Section};
use log::warn;

/// Turns a statement's raw text into parsed rows via a chat model. The client
/// is injected so the extractor carries no credentials of its own.
pub struct RowExtractor {
    client: ChatClient,
    model: String,
}

impl RowExtractor {
    pub fn new(client: ChatClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Extracts rows from one document's text. Malformed model output is
    /// logged and yields an empty row set rather than an error; the document
    /// still gets recorded by the pipeline as a degenerate ingest.
    pub async fn extract_rows(&self, text: &str, doc_type: DocType) -> Result<Vec<ParsedRow>> {
        let prompt = extraction_prompt(doc_type, text);
        let raw = self.client.chat_json(&self.model, SYSTEM_PROMPT, &prompt).await?;

        let rows = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => rows_from_value(value),
            Err(e) => {
                warn!("model returned unparseable JSON: {}", e);
                Vec::new()
            }
        };

        Ok(sanitize_rows(rows, doc_type))
    }
}

/// Accepts either a bare array or an object with a "rows" key, which is what
/// `json_object` mode tends to produce.
fn rows_from_value(value: serde_json::Value) -> Vec<serde_json::Value> {
    match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("rows") {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Mirrors classification hygiene for the model's output: trimmed strings,
/// numeric coercion, section only for balance sheets, and rows kept only
/// when they carry a code or a value.
fn sanitize_rows(items: Vec<serde_json::Value>, doc_type: DocType) -> Vec<ParsedRow> {
    let mut out = Vec::new();
    for item in items {
        let code = item
            .get("code")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        let label = item
            .get("label")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        let value = item.get("value").and_then(coerce_number);
        let section = match doc_type {
            DocType::Balance => item
                .get("section")
                .and_then(|v| v.as_str())
                .and_then(Section::parse_lenient),
            DocType::Income => None,
        };

        if !code.is_empty() || value.is_some() {
            out.push(ParsedRow {
                code,
                label,
                value,
                section,
            });
        }
    }
    out
}

fn coerce_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_from_bare_array_and_wrapper() {
        let bare = json!([{"code": "01"}]);
        assert_eq!(rows_from_value(bare).len(), 1);

        let wrapped = json!({"rows": [{"code": "01"}, {"code": "02"}]});
        assert_eq!(rows_from_value(wrapped).len(), 2);

        let junk = json!({"items": []});
        assert!(rows_from_value(junk).is_empty());
    }

    #[test]
    fn test_sanitize_keeps_code_or_value_rows() {
        let items = vec![
            json!({"code": " 01 ", "label": "Tržby", "value": 1000.0}),
            json!({"code": "", "label": "mezisoučet", "value": null}),
            json!({"code": "", "label": "dopočet", "value": "1234,5"}),
        ];
        let rows = sanitize_rows(items, DocType::Income);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "01");
        assert_eq!(rows[1].value, Some(1234.5));
    }

    #[test]
    fn test_sanitize_sections_balance_only() {
        let items = vec![json!({"code": "001", "label": "AKTIVA", "value": 5000.0, "section": "asset"})];

        let balance = sanitize_rows(items.clone(), DocType::Balance);
        assert_eq!(balance[0].section, Some(Section::Assets));

        let income = sanitize_rows(items, DocType::Income);
        assert_eq!(income[0].section, None);
    }

    #[test]
    fn test_sanitize_ignores_non_numeric_values() {
        let items = vec![json!({"code": "01", "value": "n/a"})];
        let rows = sanitize_rows(items, DocType::Income);
        assert_eq!(rows[0].value, None);
    }
}
