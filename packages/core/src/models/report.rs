//! Report requests, backend report payloads and the tables derived from them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use super::{Expense, PaymentStatus, Product, Sale};
use crate::format::date::{format_date, DateStyle};
use crate::validation::FormErrors;

pub const MSG_KIND_REQUIRED: &str = "Selecione um tipo de relatório";
pub const MSG_PERIOD_REQUIRED: &str = "Selecione o período para o relatório";
pub const MSG_PERIOD_ORDER: &str = "A data inicial deve ser anterior à data final";

pub const TOP_CUSTOMERS: usize = 10;
pub const TOP_PRODUCTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Sales,
    Expenses,
    Products,
    Profit,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Sales => "vendas",
            ReportKind::Expenses => "despesas",
            ReportKind::Products => "produtos",
            ReportKind::Profit => "lucro",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vendas" | "sales" => Ok(ReportKind::Sales),
            "despesas" | "expenses" => Ok(ReportKind::Expenses),
            "produtos" | "products" => Ok(ReportKind::Products),
            "lucro" | "profit" => Ok(ReportKind::Profit),
            other => Err(format!("Tipo de relatório desconhecido: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub kind: Option<ReportKind>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ReportRequest {
    /// First day of the current month through `today`.
    pub fn month_to_date(kind: ReportKind, today: NaiveDate) -> Self {
        Self {
            kind: Some(kind),
            start: today.with_day(1),
            end: Some(today),
        }
    }

    /// Checks stop at the first failure, one message at a time.
    pub fn validate(&self) -> Result<(ReportKind, NaiveDate, NaiveDate), FormErrors> {
        let mut errors = FormErrors::new();
        let Some(kind) = self.kind else {
            errors.push("tipo", MSG_KIND_REQUIRED);
            return Err(errors);
        };
        let (Some(start), Some(end)) = (self.start, self.end) else {
            errors.push("periodo", MSG_PERIOD_REQUIRED);
            return Err(errors);
        };
        if start > end {
            errors.push("periodo", MSG_PERIOD_ORDER);
            return Err(errors);
        }
        Ok((kind, start, end))
    }

    /// Form fields posted to the report endpoint. Dates go as ISO, the way
    /// a date input submits them.
    pub fn form_fields(kind: ReportKind, start: NaiveDate, end: NaiveDate) -> [(&'static str, String); 3] {
        [
            ("tipo", kind.as_str().to_string()),
            ("data_inicio", format_date(start, DateStyle::Iso)),
            ("data_fim", format_date(end, DateStyle::Iso)),
        ]
    }
}

// ---- payloads ----

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SalesReport {
    #[serde(rename = "total_vendas", default)]
    pub count: usize,
    #[serde(rename = "valor_total", default)]
    pub total: f64,
    #[serde(rename = "vendas", default)]
    pub sales: Vec<Sale>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpensesReport {
    #[serde(rename = "total_despesas", default)]
    pub count: usize,
    #[serde(rename = "valor_total", default)]
    pub total: f64,
    #[serde(rename = "despesas", default)]
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductsReport {
    #[serde(rename = "total_produtos", default)]
    pub count: usize,
    #[serde(rename = "margem_media", default)]
    pub average_margin: f64,
    #[serde(rename = "produtos", default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfitReport {
    #[serde(rename = "receita_total", default)]
    pub revenue: f64,
    #[serde(rename = "despesas_total", default)]
    pub expenses: f64,
}

impl ProfitReport {
    pub fn net_profit(&self) -> f64 {
        self.revenue - self.expenses
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Sales(SalesReport),
    Expenses(ExpensesReport),
    Products(ProductsReport),
    Profit(ProfitReport),
}

impl Report {
    pub fn decode(kind: ReportKind, body: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ReportKind::Sales => Report::Sales(serde_json::from_value(body)?),
            ReportKind::Expenses => Report::Expenses(serde_json::from_value(body)?),
            ReportKind::Products => Report::Products(serde_json::from_value(body)?),
            ReportKind::Profit => Report::Profit(serde_json::from_value(body)?),
        })
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Sales(_) => ReportKind::Sales,
            Report::Expenses(_) => ReportKind::Expenses,
            Report::Products(_) => ReportKind::Products,
            Report::Profit(_) => ReportKind::Profit,
        }
    }
}

// ---- derived tables ----

/// One row of a grouped summary: how many records and their summed value.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub label: String,
    pub count: usize,
    pub amount: f64,
}

/// Group in first-seen order.
fn group_by<T, K, V>(items: &[T], key: K, value: V) -> Vec<GroupTotal>
where
    K: Fn(&T) -> String,
    V: Fn(&T) -> f64,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupTotal> = Vec::new();
    for item in items {
        let label = key(item);
        let slot = *index.entry(label.clone()).or_insert_with(|| {
            groups.push(GroupTotal {
                label,
                count: 0,
                amount: 0.0,
            });
            groups.len() - 1
        });
        groups[slot].count += 1;
        groups[slot].amount += value(item);
    }
    groups
}

pub fn sales_by_payment_method(sales: &[Sale]) -> Vec<GroupTotal> {
    group_by(sales, |s| s.payment_method.clone(), |s| s.amount)
}

/// Grouped by raw status; callers colour rows with [`PaymentStatus::color`].
pub fn sales_by_status(sales: &[Sale]) -> Vec<(PaymentStatus, GroupTotal)> {
    group_by(sales, |s| s.status.as_str().to_string(), |s| s.amount)
        .into_iter()
        .map(|g| (PaymentStatus::from(g.label.as_str()), g))
        .collect()
}

pub fn top_customers(sales: &[Sale], limit: usize) -> Vec<GroupTotal> {
    let mut groups = group_by(sales, |s| s.recipient_name().to_string(), |s| s.amount);
    groups.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    groups.truncate(limit);
    groups
}

/// Daily sale totals, oldest day first.
pub fn sales_per_day(sales: &[Sale]) -> Vec<(NaiveDate, f64)> {
    let mut days: Vec<(NaiveDate, f64)> = Vec::new();
    for sale in sales {
        match days.iter_mut().find(|(d, _)| *d == sale.exit_date) {
            Some((_, total)) => *total += sale.amount,
            None => days.push((sale.exit_date, sale.amount)),
        }
    }
    days.sort_by_key(|(d, _)| *d);
    days
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub amount: f64,
    /// Percentage of all expenses, 0..=100.
    pub share: f64,
}

/// Expense totals per category, largest first, with each category's share.
pub fn expenses_by_category(expenses: &[Expense]) -> Vec<CategoryShare> {
    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    let mut shares: Vec<CategoryShare> = group_by(expenses, |e| e.category.clone(), |e| e.amount)
        .into_iter()
        .map(|g| CategoryShare {
            share: if total > 0.0 { g.amount / total * 100.0 } else { 0.0 },
            category: g.label,
            amount: g.amount,
        })
        .collect();
    shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    shares
}

pub fn average_margin(products: &[Product]) -> f64 {
    if products.is_empty() {
        return 0.0;
    }
    products.iter().map(Product::margin).sum::<f64>() / products.len() as f64
}

/// Highest-margin products first.
pub fn top_products_by_margin(products: &[Product], limit: usize) -> Vec<&Product> {
    let mut ranked: Vec<&Product> = products.iter().collect();
    ranked.sort_by(|a, b| b.margin().total_cmp(&a.margin()));
    ranked.truncate(limit);
    ranked
}
