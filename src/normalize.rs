use regex::Regex;
use std::sync::OnceLock;

/// Dot-grouped thousands with an optional decimal comma, e.g. "1.234.567" or
/// "1.234,56". This is the only shape in which a dot is read as a thousands
/// separator; every other dotted string falls through to a plain parse.
fn thousands_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d{1,3}(\.\d{3})+(,\d+)?$").unwrap())
}

/// Lowercases and strips Czech diacritics so header hints and section markers
/// can be matched with plain ASCII substrings.
pub fn fold_text(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'č' => 'c',
            'ď' => 'd',
            'é' | 'ě' => 'e',
            'í' => 'i',
            'ň' => 'n',
            'ó' => 'o',
            'ř' => 'r',
            'š' => 's',
            'ť' => 't',
            'ú' | 'ů' => 'u',
            'ý' => 'y',
            'ž' => 'z',
            other => other,
        })
        .collect()
}

/// Parses a statement cell into a number. Czech statements use a comma as the
/// decimal separator and either spaces or dots to group thousands. Returns
/// `None` for anything that does not parse; cell-level parse failures never
/// become errors.
pub fn parse_statement_number(cell: &str) -> Option<f64> {
    let compact: String = cell
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{a0}')
        .collect();
    let compact = compact.trim();

    if compact.is_empty() {
        return None;
    }

    if thousands_pattern().is_match(compact) {
        let plain: String = compact.chars().filter(|c| *c != '.').collect();
        return plain.replace(',', ".").parse::<f64>().ok();
    }

    let candidate = compact.replace(',', ".");
    if candidate.matches('.').count() > 1 {
        return None;
    }
    candidate.parse::<f64>().ok()
}

pub fn is_numeric_cell(cell: &str) -> bool {
    parse_statement_number(cell).is_some()
}

/// True for short, digit-only row identifiers like "01" or "055".
pub fn is_row_code(cell: &str) -> bool {
    let trimmed = cell.trim();
    !trimmed.is_empty() && trimmed.len() <= 4 && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Extracts a row code from a cell, zero-padding single digits so "1" and
/// "01" refer to the same line item.
pub fn normalize_code(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if !is_row_code(trimmed) {
        return None;
    }
    if trimmed.len() == 1 {
        Some(format!("0{}", trimmed))
    } else {
        Some(trimmed.to_string())
    }
}
