use crate::schema::DocType;

pub const SYSTEM_PROMPT: &str = "You are an expert in Czech accounting. Output JSON only.";

/// Builds the extraction prompt for one statement's raw text. Balance sheets
/// get the section-aware variant; income statements only need code and value.
pub fn extraction_prompt(doc_type: DocType, text: &str) -> String {
    match doc_type {
        DocType::Balance => format!(
            "From the following Czech BALANCE SHEET (rozvaha) text, extract a JSON array of rows.\n\
             \n\
             Each row MUST have these keys:\n\
             - \"code\": string row number like \"001\" or \"\" if missing\n\
             - \"label\": string item name\n\
             - \"value\": float (use null if empty)\n\
             - \"section\": one of [\"asset\", \"liability\"]\n\
             \n\
             Rules:\n\
             - Rows related to Aktiva (assets) -> section = \"asset\"\n\
             - Rows related to Pasiva or Vlastni kapital (liabilities/equity) -> section = \"liability\"\n\
             - Return ONLY valid JSON. No explanations.\n\
             \n\
             Text:\n{text}"
        ),
        DocType::Income => format!(
            "From the following Czech INCOME STATEMENT text, extract a JSON array of rows.\n\
             Each row MUST be an object with keys:\n\
             - \"code\": string row number like \"001\" or \"01\"\n\
             - \"label\": string item name\n\
             - \"value\": float or null for the CURRENT period\n\
             Return ONLY valid JSON. No explanations.\n\
             \n\
             Text:\n{text}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_prompt_mentions_sections() {
        let prompt = extraction_prompt(DocType::Balance, "AKTIVA CELKEM 001 5000");
        assert!(prompt.contains("\"section\""));
        assert!(prompt.contains("AKTIVA CELKEM 001 5000"));
    }

    #[test]
    fn test_income_prompt_has_no_section_key() {
        let prompt = extraction_prompt(DocType::Income, "Trzby 01 1000");
        assert!(!prompt.contains("\"section\""));
    }
}
