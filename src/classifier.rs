use crate::normalize::{fold_text, is_numeric_cell, is_row_code, normalize_code, parse_statement_number};
use crate::schema::{DocType, NewRow, RawTable, Section};
use log::debug;

/// Header substrings (diacritics folded) that identify the row-code column.
const CODE_HEADER_HINTS: &[&str] = &["cislo radku", "cis. radku", "c. radku"];

/// Header substrings that identify the item-label column.
const LABEL_HEADER_HINTS: &[&str] = &["oznaceni", "polozka", "popis", "text", "nazev"];

/// Header substrings marking a current-period value column.
const VALUE_HEADER_PREFERRED: &[&str] = &["brutto", "netto", "stav", "bezne"];

/// Header substrings marking a prior/comparison-period column that must never
/// be read as the current value.
const VALUE_HEADER_EXCLUDED: &[&str] = &["minule", "korekce"];

/// Minimum fraction of short digit-only cells for a column to be scored as
/// the code column when no header hint matches.
const CODE_SCORE_THRESHOLD: f64 = 0.6;

/// Score bonus for a value-column header that names the current period.
const VALUE_HEADER_BONUS: f64 = 0.25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    pub code: Option<usize>,
    pub label: Option<usize>,
    pub value: Option<usize>,
}

/// One rectangular table merged from every engine's raw output, with rows
/// classified into code/label/value/section.
#[derive(Debug, Clone)]
pub struct ClassifiedTable {
    pub columns: Vec<String>,
    pub roles: ColumnRoles,
    pub rows: Vec<NewRow>,
}

impl ClassifiedTable {
    fn empty() -> Self {
        ClassifiedTable {
            columns: Vec::new(),
            roles: ColumnRoles::default(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct TableClassifier {
    doc_type: DocType,
}

impl TableClassifier {
    pub fn new(doc_type: DocType) -> Self {
        Self { doc_type }
    }

    /// Merges the raw grids into one rectangular table and classifies its
    /// rows. An empty or degenerate input yields an empty table, never an
    /// error.
    pub fn classify(&self, raw_tables: &[RawTable]) -> ClassifiedTable {
        let (columns, grid) = merge_tables(raw_tables);
        if grid.is_empty() {
            return ClassifiedTable::empty();
        }

        let roles = detect_roles(&columns, &grid);
        debug!(
            "classified {} columns: code={:?} label={:?} value={:?}",
            columns.len(),
            roles.code,
            roles.label,
            roles.value
        );

        let mut rows = Vec::new();
        let mut section: Option<Section> = None;

        for cells in &grid {
            if self.doc_type == DocType::Balance {
                if let Some(marker) = section_marker(cells) {
                    section = Some(marker);
                }
            }

            let code = roles.code.and_then(|i| normalize_code(&cells[i]));

            let label = roles
                .label
                .map(|i| cells[i].trim())
                .filter(|s| !s.is_empty() && !is_numeric_cell(s))
                .map(str::to_string)
                .or_else(|| {
                    cells
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| Some(*i) != roles.code)
                        .map(|(_, c)| c.trim())
                        .find(|s| !s.is_empty() && !is_numeric_cell(s))
                        .map(str::to_string)
                });

            let value = roles
                .value
                .and_then(|i| parse_statement_number(&cells[i]))
                .or_else(|| {
                    cells
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| Some(*i) != roles.code)
                        .find_map(|(_, c)| parse_statement_number(c))
                });

            if code.is_none() && value.is_none() {
                continue;
            }

            let raw_data: serde_json::Map<String, serde_json::Value> = columns
                .iter()
                .zip(cells.iter())
                .map(|(name, cell)| (name.clone(), serde_json::Value::String(cell.clone())))
                .collect();

            rows.push(NewRow {
                code,
                label,
                value,
                section: if self.doc_type == DocType::Balance {
                    section
                } else {
                    None
                },
                raw_data: serde_json::Value::Object(raw_data),
            });
        }

        ClassifiedTable {
            columns,
            roles,
            rows,
        }
    }
}

/// Detects a section-change marker: a row where any cell mentions
/// aktiva/pasiva. The marker row itself is still processed afterwards, so
/// total rows like "AKTIVA CELKEM" keep their value under the new section.
fn section_marker(cells: &[String]) -> Option<Section> {
    for cell in cells {
        let folded = fold_text(cell);
        if folded.contains("pasiva") {
            return Some(Section::Liabilities);
        }
        if folded.contains("aktiva") {
            return Some(Section::Assets);
        }
    }
    None
}

/// Stacks every raw table into one rectangular grid, dropping all-empty rows
/// and columns. Column names come from the first table with a usable header
/// row; unnamed columns get positional names.
fn merge_tables(raw_tables: &[RawTable]) -> (Vec<String>, Vec<Vec<String>>) {
    let width = raw_tables
        .iter()
        .flat_map(|t| {
            t.rows
                .iter()
                .map(|r| r.len())
                .chain(std::iter::once(t.headers.len()))
        })
        .max()
        .unwrap_or(0);

    if width == 0 {
        return (Vec::new(), Vec::new());
    }

    let header_source = raw_tables
        .iter()
        .find(|t| t.headers.iter().any(|h| !h.trim().is_empty()));

    let mut columns: Vec<String> = (0..width)
        .map(|i| {
            header_source
                .and_then(|t| t.headers.get(i))
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| format!("col{}", i + 1))
        })
        .collect();

    let mut grid: Vec<Vec<String>> = Vec::new();
    for table in raw_tables {
        for row in &table.rows {
            let mut padded = row.clone();
            padded.resize(width, String::new());
            if padded.iter().any(|c| !c.trim().is_empty()) {
                grid.push(padded);
            }
        }
    }

    if grid.is_empty() {
        return (Vec::new(), Vec::new());
    }

    // Drop columns with no data at all.
    let keep: Vec<usize> = (0..width)
        .filter(|&i| grid.iter().any(|row| !row[i].trim().is_empty()))
        .collect();

    if keep.len() != width {
        columns = keep.iter().map(|&i| columns[i].clone()).collect();
        grid = grid
            .into_iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
    }

    (columns, grid)
}

fn detect_roles(columns: &[String], grid: &[Vec<String>]) -> ColumnRoles {
    let folded: Vec<String> = columns.iter().map(|c| fold_text(c)).collect();

    let code = detect_code_column(&folded, grid);
    let label = detect_label_column(&folded, grid, code);
    let value = detect_value_column(&folded, grid, code);

    ColumnRoles { code, label, value }
}

fn header_matches(folded_header: &str, hints: &[&str]) -> bool {
    hints.iter().any(|hint| folded_header.contains(hint))
}

/// Fraction of a column's non-empty cells satisfying a predicate. Columns
/// with no data score zero.
fn column_fraction<F: Fn(&str) -> bool>(grid: &[Vec<String>], col: usize, pred: F) -> f64 {
    let mut total = 0usize;
    let mut hits = 0usize;
    for row in grid {
        let cell = row[col].trim();
        if cell.is_empty() {
            continue;
        }
        total += 1;
        if pred(cell) {
            hits += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

fn detect_code_column(folded: &[String], grid: &[Vec<String>]) -> Option<usize> {
    if let Some(i) = folded.iter().position(|h| header_matches(h, CODE_HEADER_HINTS)) {
        return Some(i);
    }

    let mut best: Option<(usize, f64)> = None;
    for i in 0..folded.len() {
        let score = column_fraction(grid, i, is_row_code);
        if score >= CODE_SCORE_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

fn detect_label_column(
    folded: &[String],
    grid: &[Vec<String>],
    code: Option<usize>,
) -> Option<usize> {
    if let Some(i) = folded
        .iter()
        .position(|h| header_matches(h, LABEL_HEADER_HINTS))
    {
        if Some(i) != code {
            return Some(i);
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for i in 0..folded.len() {
        if Some(i) == code {
            continue;
        }
        let score = column_fraction(grid, i, |cell| !is_numeric_cell(cell) && !is_row_code(cell));
        if score > 0.0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

/// Picks the current-period value column: scan right of the code column
/// (wrapping), score each candidate by its numeric fraction, skip
/// prior-period columns and favour current-period headers.
fn detect_value_column(
    folded: &[String],
    grid: &[Vec<String>],
    code: Option<usize>,
) -> Option<usize> {
    let width = folded.len();
    let start = code.map(|c| c + 1).unwrap_or(0);
    let order: Vec<usize> = (0..width).map(|off| (start + off) % width).collect();

    let mut best: Option<(usize, f64)> = None;
    for i in order {
        if Some(i) == code {
            continue;
        }
        if header_matches(&folded[i], VALUE_HEADER_EXCLUDED) {
            continue;
        }
        let mut score = column_fraction(grid, i, is_numeric_cell);
        if score == 0.0 {
            continue;
        }
        if header_matches(&folded[i], VALUE_HEADER_PREFERRED) {
            score += VALUE_HEADER_BONUS;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            page_number: 1,
            engine: "test".to_string(),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_empty_input_is_degenerate_success() {
        let classifier = TableClassifier::new(DocType::Income);
        assert!(classifier.classify(&[]).is_empty());

        let blank = table(&["", ""], &[&["", ""], &["  ", ""]]);
        assert!(classifier.classify(&[blank]).is_empty());
    }

    #[test]
    fn test_header_hint_roles() {
        let raw = table(
            &["Označení", "Položka", "Číslo řádku", "Běžné období", "Minulé období"],
            &[
                &["A.", "Tržby za zboží", "01", "1 200", "1 000"],
                &["B.", "Výkonová spotřeba", "04", "800,5", "700"],
            ],
        );
        let classified = TableClassifier::new(DocType::Income).classify(&[raw]);

        assert_eq!(classified.roles.code, Some(2));
        assert_eq!(classified.roles.label, Some(0));
        assert_eq!(classified.roles.value, Some(3));

        assert_eq!(classified.rows.len(), 2);
        assert_eq!(classified.rows[0].code.as_deref(), Some("01"));
        assert_eq!(classified.rows[0].value, Some(1200.0));
        assert_eq!(classified.rows[1].value, Some(800.5));
    }

    #[test]
    fn test_prior_period_column_excluded() {
        // Without the exclusion the "Minulé období" column sits right of the
        // code column and would win.
        let raw = table(
            &["Číslo řádku", "Minulé období", "Netto"],
            &[&["01", "999", "1200"], &["02", "888", "500"]],
        );
        let classified = TableClassifier::new(DocType::Income).classify(&[raw]);

        assert_eq!(classified.roles.value, Some(2));
        assert_eq!(classified.rows[0].value, Some(1200.0));
    }

    #[test]
    fn test_scored_code_column_without_headers() {
        let raw = table(
            &[],
            &[
                &["Tržby z prodeje", "01", "1500"],
                &["Náklady na zboží", "04", "600"],
                &["Služby", "05", "200"],
            ],
        );
        let classified = TableClassifier::new(DocType::Income).classify(&[raw]);

        assert_eq!(classified.roles.code, Some(1));
        assert_eq!(classified.rows[0].code.as_deref(), Some("01"));
        assert_eq!(classified.rows[0].label.as_deref(), Some("Tržby z prodeje"));
        assert_eq!(classified.rows[0].value, Some(1500.0));
    }

    #[test]
    fn test_code_column_never_supplies_value() {
        // The only numeric-looking cell sits in the code column; the row must
        // keep its code but yield no value.
        let raw = table(
            &[],
            &[
                &["Rezervy", "08", ""],
                &["Závazky", "09", "300"],
                &["Úvěry", "10", "150"],
            ],
        );
        let classified = TableClassifier::new(DocType::Income).classify(&[raw]);

        assert_eq!(classified.roles.code, Some(1));
        let row = &classified.rows[0];
        assert_eq!(row.code.as_deref(), Some("08"));
        assert_eq!(row.value, None);
    }

    #[test]
    fn test_single_digit_code_zero_padded() {
        let raw = table(&["Číslo řádku", "Položka", "Netto"], &[&["1", "Tržby", "100"]]);
        let classified = TableClassifier::new(DocType::Income).classify(&[raw]);
        assert_eq!(classified.rows[0].code.as_deref(), Some("01"));
    }

    #[test]
    fn test_balance_sections_stick_until_next_marker() {
        let raw = table(
            &["Položka", "Číslo řádku", "Netto"],
            &[
                &["AKTIVA CELKEM", "01", "5000"],
                &["Dlouhodobý majetek", "03", "2000"],
                &["Oběžná aktiva", "37", "3000"],
                &["PASIVA CELKEM", "01", "5000"],
                &["Vlastní kapitál", "02", "1500"],
            ],
        );
        let classified = TableClassifier::new(DocType::Balance).classify(&[raw]);

        let sections: Vec<Option<Section>> =
            classified.rows.iter().map(|r| r.section).collect();
        assert_eq!(
            sections,
            vec![
                Some(Section::Assets),
                Some(Section::Assets),
                Some(Section::Assets),
                Some(Section::Liabilities),
                Some(Section::Liabilities),
            ]
        );
    }

    #[test]
    fn test_income_rows_never_carry_sections() {
        let raw = table(
            &["Položka", "Číslo řádku", "Netto"],
            &[&["Aktivace", "08", "100"]],
        );
        let classified = TableClassifier::new(DocType::Income).classify(&[raw]);
        assert_eq!(classified.rows[0].section, None);
    }

    #[test]
    fn test_merge_across_engines() {
        let first = table(
            &["Položka", "Číslo řádku", "Netto"],
            &[&["Tržby", "01", "1000"]],
        );
        let second = table(&[], &[&["Náklady", "04", "400"]]);
        let classified = TableClassifier::new(DocType::Income).classify(&[first, second]);

        assert_eq!(classified.rows.len(), 2);
        assert_eq!(classified.columns.len(), 3);
        assert_eq!(classified.rows[1].code.as_deref(), Some("04"));
        assert_eq!(classified.rows[1].value, Some(400.0));
    }

    #[test]
    fn test_rows_without_code_or_value_are_dropped() {
        let raw = table(
            &["Položka", "Číslo řádku", "Netto"],
            &[
                &["Mezisoučet", "", ""],
                &["Tržby", "01", "1000"],
            ],
        );
        let classified = TableClassifier::new(DocType::Income).classify(&[raw]);
        assert_eq!(classified.rows.len(), 1);
    }

    #[test]
    fn test_raw_data_preserved() {
        let raw = table(
            &["Položka", "Číslo řádku", "Netto"],
            &[&["Tržby", "01", "1000"]],
        );
        let classified = TableClassifier::new(DocType::Income).classify(&[raw]);
        let raw_data = classified.rows[0].raw_data.as_object().unwrap();
        assert_eq!(raw_data["Položka"], "Tržby");
        assert_eq!(raw_data["Číslo řádku"], "01");
    }
}
