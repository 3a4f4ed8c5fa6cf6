//! Multi-year profitability and cash-approximation reporting over the
//! stored metrics. One assembly path replaces the several near-duplicate
//! dashboard computations the data used to flow through.

use crate::error::Result;
use crate::formulas::FormulaTable;
use crate::metrics::{delta_series, growth, yoy_growth, YearSeries};
use crate::schema::DocType;
use crate::store::Store;

/// Everything the profitability dashboard and the PDF report need for one
/// owner, keyed by year. Missing data stays `None` throughout.
#[derive(Debug, Clone, Default)]
pub struct ProfitabilityReport {
    pub years: Vec<i32>,

    // income statement chain
    pub revenue: YearSeries,
    pub cogs: YearSeries,
    pub overheads: YearSeries,
    pub gross_margin: YearSeries,
    pub gross_margin_pct: YearSeries,
    pub ebit: YearSeries,
    pub net_profit: YearSeries,

    // year-over-year
    pub revenue_growth_pct: YearSeries,
    pub cogs_growth_pct: YearSeries,
    pub overheads_growth_pct: YearSeries,
    pub operating_margin_pct: YearSeries,
    pub net_margin_pct: YearSeries,

    // working capital
    pub inventories: YearSeries,
    pub receivables: YearSeries,
    pub payables: YearSeries,

    // indicative cash approximations
    pub cash_from_customers: YearSeries,
    pub cash_to_suppliers: YearSeries,
    pub gross_cash_profit: YearSeries,
    pub operating_cash_flow: YearSeries,
}

impl ProfitabilityReport {
    pub fn build(store: &Store, formulas: &FormulaTable, owner: &str) -> Result<Self> {
        let years = store.income_years(owner)?;
        if years.is_empty() {
            return Ok(ProfitabilityReport::default());
        }

        let mut report = ProfitabilityReport {
            years: years.clone(),
            ..Default::default()
        };

        let fin_income_codes = formulas.codes(DocType::Income, "fin_income");
        let fin_expense_codes = formulas.codes(DocType::Income, "fin_expense");
        let tax_codes = formulas.codes(DocType::Income, "tax");
        let dep_codes = [formulas.depreciation_code.clone()];

        for &y in &years {
            let revenue = store.derived_value(owner, y, "revenue")?;
            let cogs = store.derived_value(owner, y, "cogs")?;
            let overheads = store.derived_value(owner, y, "overheads")?;

            let gross_margin = match (revenue, cogs) {
                (Some(r), Some(c)) => Some(r - c),
                _ => None,
            };
            let gross_margin_pct = match (gross_margin, revenue) {
                (Some(gm), Some(r)) if r != 0.0 => Some(gm / r * 100.0),
                _ => None,
            };
            let ebit = match (gross_margin, overheads) {
                (Some(gm), Some(o)) => Some(gm - o),
                _ => None,
            };

            let fin_income = store
                .sum_raw_codes(owner, y, fin_income_codes, Some(DocType::Income))?
                .unwrap_or(0.0);
            let fin_expense = store
                .sum_raw_codes(owner, y, fin_expense_codes, Some(DocType::Income))?
                .unwrap_or(0.0);
            let tax = store
                .sum_raw_codes(owner, y, tax_codes, Some(DocType::Income))?
                .unwrap_or(0.0);

            let ebt = ebit.map(|e| e + fin_income - fin_expense);
            let net_profit = ebt.map(|e| e - tax);

            report.revenue.insert(y, revenue);
            report.cogs.insert(y, cogs);
            report.overheads.insert(y, overheads);
            report.gross_margin.insert(y, gross_margin);
            report.gross_margin_pct.insert(y, gross_margin_pct);
            report.ebit.insert(y, ebit);
            report.net_profit.insert(y, net_profit);

            let operating_margin = match (ebit, revenue) {
                (Some(e), Some(r)) if r != 0.0 => Some(e / r * 100.0),
                _ => None,
            };
            let net_margin = match (net_profit, revenue) {
                (Some(n), Some(r)) if r != 0.0 => Some(n / r * 100.0),
                _ => None,
            };
            report.operating_margin_pct.insert(y, operating_margin);
            report.net_margin_pct.insert(y, net_margin);

            for (key, series) in [
                ("inventories", &mut report.inventories),
                ("receivables_trade", &mut report.receivables),
                ("payables_trade", &mut report.payables),
            ] {
                let codes = formulas.codes(DocType::Balance, key);
                series.insert(
                    y,
                    store.sum_raw_codes(owner, y, codes, Some(DocType::Balance))?,
                );
            }
        }

        report.revenue_growth_pct = yoy_growth(&report.revenue);
        report.cogs_growth_pct = yoy_growth(&report.cogs);
        report.overheads_growth_pct = yoy_growth(&report.overheads);

        let d_inventories = delta_series(&report.inventories);
        let d_receivables = delta_series(&report.receivables);
        let d_payables = delta_series(&report.payables);

        for &y in &years {
            let d_inv = d_inventories[&y].unwrap_or(0.0);
            let d_rec = d_receivables[&y].unwrap_or(0.0);
            let d_pay = d_payables[&y].unwrap_or(0.0);

            let cash_from_customers = report.revenue[&y].map(|r| r - d_rec);
            let cash_to_suppliers = report.cogs[&y].map(|c| c + d_inv - d_pay);
            let gross_cash_profit = match (cash_from_customers, cash_to_suppliers) {
                (Some(cfc), Some(cts)) => Some(cfc - cts),
                _ => None,
            };

            let depreciation = store
                .sum_raw_codes(owner, y, &dep_codes, Some(DocType::Income))?
                .unwrap_or(0.0);
            let working_capital_delta = d_inv + d_rec - d_pay;
            let operating_cash_flow = report.net_profit[&y]
                .map(|np| np + depreciation - working_capital_delta);

            report.cash_from_customers.insert(y, cash_from_customers);
            report.cash_to_suppliers.insert(y, cash_to_suppliers);
            report.gross_cash_profit.insert(y, gross_cash_profit);
            report.operating_cash_flow.insert(y, operating_cash_flow);
        }

        Ok(report)
    }

    /// Growth of one metric between two stored years; convenience for
    /// callers rendering a single delta.
    pub fn growth_between(&self, series: &YearSeries, year: i32, prev_year: i32) -> Option<f64> {
        growth(
            series.get(&year).copied().flatten(),
            series.get(&prev_year).copied().flatten(),
        )
    }
}
