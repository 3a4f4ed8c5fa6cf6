//! The formula engine: pure derivation of accounting metrics from a
//! code→value map and an injected [`FormulaTable`].
//!
//! Null handling follows one convention throughout: a sum over row codes is
//! `None` only when *no* code resolves (partial presence sums what is there),
//! differences null-propagate, and missing supporting items (financial
//! income/expense, tax, depreciation) are treated as zero so the headline
//! metrics stay computable. "No data" is therefore always `None`, never a
//! silent `0.0`.

use crate::formulas::FormulaTable;
use crate::schema::DocType;
use std::collections::BTreeMap;

/// Raw row code → current-period value for one document.
pub type CodeMap = BTreeMap<String, f64>;

/// A value-by-year series. `None` marks a year with no data.
pub type YearSeries = BTreeMap<i32, Option<f64>>;

/// One derived metric, keyed by a semantic name such as "revenue" or "ebit".
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetric {
    pub key: String,
    pub label: String,
    pub value: Option<f64>,
}

impl DerivedMetric {
    fn new(key: &str, label: String, value: Option<f64>) -> Self {
        DerivedMetric {
            key: key.to_string(),
            label,
            value,
        }
    }
}

/// Sums the values of the given codes. Returns `None` only when no code is
/// present in the map; a partially populated code set sums the codes that are
/// there.
pub fn sum_codes(code_map: &CodeMap, codes: &[String]) -> Option<f64> {
    let mut acc = 0.0;
    let mut has_any = false;
    for code in codes {
        if let Some(v) = code_map.get(code) {
            acc += v;
            has_any = true;
        }
    }
    has_any.then_some(acc)
}

fn sub(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a - b),
        _ => None,
    }
}

/// Derives every configured metric for a document. Deterministic in both
/// values and ordering: base sums in key order, then the income statement
/// chain in a fixed order. Re-running on the same map yields identical
/// output.
pub fn derive_metrics(
    doc_type: DocType,
    code_map: &CodeMap,
    formulas: &FormulaTable,
) -> Vec<DerivedMetric> {
    let mapping = formulas.for_doc_type(doc_type);

    let mut derived: Vec<DerivedMetric> = mapping
        .iter()
        .map(|(key, codes)| {
            DerivedMetric::new(key, formulas.label_for(key), sum_codes(code_map, codes))
        })
        .collect();

    if doc_type == DocType::Income {
        let find = |key: &str| -> Option<f64> {
            derived.iter().find(|m| m.key == key).and_then(|m| m.value)
        };

        let revenue = find("revenue");
        let cogs = find("cogs");
        let overheads = find("overheads");

        let gross_margin = sub(revenue, cogs);
        let gross_margin_pct = match (gross_margin, revenue) {
            (Some(gm), Some(r)) if r != 0.0 => Some(gm / r * 100.0),
            _ => None,
        };
        let ebit = sub(gross_margin, overheads);

        let fin_income = find("fin_income").unwrap_or(0.0);
        let fin_expense = find("fin_expense").unwrap_or(0.0);
        let tax = find("tax").unwrap_or(0.0);

        let ebt = ebit.map(|e| e + fin_income - fin_expense);
        let net_profit = ebt.map(|e| e - tax);

        for (key, value) in [
            ("gross_margin", gross_margin),
            ("gross_margin_pct", gross_margin_pct),
            ("ebit", ebit),
            ("ebt", ebt),
            ("net_profit", net_profit),
        ] {
            derived.push(DerivedMetric::new(key, formulas.label_for(key), value));
        }
    }

    derived
}

/// Year-over-year growth of one step: `(cur - prev) / |prev| * 100`. `None`
/// when the current value is missing or the previous value is missing or
/// zero.
pub fn growth(cur: Option<f64>, prev: Option<f64>) -> Option<f64> {
    match (cur, prev) {
        (Some(cur), Some(prev)) if prev != 0.0 => Some((cur - prev) / prev.abs() * 100.0),
        _ => None,
    }
}

/// Growth of each year against the previous year in the series. The first
/// year has no predecessor and is always `None`.
pub fn yoy_growth(series: &YearSeries) -> YearSeries {
    let years: Vec<i32> = series.keys().copied().collect();
    years
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let g = if i == 0 {
                None
            } else {
                growth(series[&y], series[&years[i - 1]])
            };
            (y, g)
        })
        .collect()
}

/// Year-over-year differences. `None` when either year is missing.
pub fn delta_series(series: &YearSeries) -> YearSeries {
    let years: Vec<i32> = series.keys().copied().collect();
    years
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let d = if i == 0 {
                None
            } else {
                sub(series[&y], series[&years[i - 1]])
            };
            (y, d)
        })
        .collect()
}
