//! Month-to-date metrics computed from the full listings.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::alerts::Alert;
use crate::error::AppError;
use crate::format::{format_brl, format_date, format_number, DateStyle};
use crate::models::report::{expenses_by_category, sales_per_day, CategoryShare};
use crate::models::{Customer, Expense, PaymentStatus, Product, Sale};
use crate::services::DashboardSource;
use crate::table::TableView;

pub const RECENT_ROWS: usize = 5;
pub const MSG_LOAD_FAILED: &str = "Erro ao carregar dashboard";

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub sales_month_total: f64,
    pub expenses_month_total: f64,
    /// Sum of pending sales, any month.
    pub pending_total: f64,
    pub overdue_count: usize,
    pub customer_count: usize,
    pub product_count: usize,
    pub sales_per_day: Vec<(NaiveDate, f64)>,
    pub expenses_by_category: Vec<CategoryShare>,
    /// Most recent last in the listing, shown first here.
    pub recent_sales: Vec<Sale>,
    pub recent_expenses: Vec<Expense>,
}

fn last_n<T: Clone>(rows: &[T], n: usize) -> Vec<T> {
    rows.iter().rev().take(n).cloned().collect()
}

impl Dashboard {
    /// "This month" starts on the first day of `today`'s month; rows dated
    /// later than `today` still count.
    pub fn compute(
        sales: &[Sale],
        expenses: &[Expense],
        customers: &[Customer],
        products: &[Product],
        today: NaiveDate,
    ) -> Self {
        let month_start = today.with_day(1).unwrap_or(today);

        let month_sales: Vec<Sale> = sales
            .iter()
            .filter(|s| s.exit_date >= month_start)
            .cloned()
            .collect();
        let month_expenses: Vec<Expense> = expenses
            .iter()
            .filter(|e| e.date >= month_start)
            .cloned()
            .collect();

        Self {
            today,
            sales_month_total: month_sales.iter().map(|s| s.amount).sum(),
            expenses_month_total: month_expenses.iter().map(|e| e.amount).sum(),
            pending_total: sales
                .iter()
                .filter(|s| s.status == PaymentStatus::Pending)
                .map(|s| s.amount)
                .sum(),
            overdue_count: sales
                .iter()
                .filter(|s| s.status == PaymentStatus::Overdue)
                .count(),
            customer_count: customers.len(),
            product_count: products.len(),
            sales_per_day: sales_per_day(&month_sales),
            expenses_by_category: expenses_by_category(&month_expenses),
            recent_sales: last_n(sales, RECENT_ROWS),
            recent_expenses: last_n(expenses, RECENT_ROWS),
        }
    }

    pub fn month_balance(&self) -> f64 {
        self.sales_month_total - self.expenses_month_total
    }

    fn recent_sales_table(&self) -> TableView {
        let mut table = TableView::new(["NF", "Data", "Destinatário", "Valor", "Status"], "Nenhuma venda recente");
        for s in &self.recent_sales {
            table.push_row(vec![
                s.invoice_number.clone(),
                format_date(s.exit_date, DateStyle::Br),
                s.recipient_name().to_string(),
                format_brl(s.amount),
                s.status.label(),
            ]);
        }
        table
    }

    fn recent_expenses_table(&self) -> TableView {
        let mut table = TableView::new(["Data", "Descrição", "Categoria", "Valor"], "Nenhuma despesa recente");
        for e in &self.recent_expenses {
            table.push_row(vec![
                format_date(e.date, DateStyle::Br),
                e.description.clone(),
                e.category.clone(),
                format_brl(e.amount),
            ]);
        }
        table
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dashboard em {}", format_date(self.today, DateStyle::Br))?;
        writeln!(f, "Vendas do mês:     {}", format_brl(self.sales_month_total))?;
        writeln!(f, "Despesas do mês:   {}", format_brl(self.expenses_month_total))?;
        writeln!(f, "Saldo do mês:      {}", format_brl(self.month_balance()))?;
        writeln!(f, "A receber:         {}", format_brl(self.pending_total))?;
        writeln!(f, "Vendas atrasadas:  {}", self.overdue_count)?;
        writeln!(f, "Clientes:          {}", self.customer_count)?;
        writeln!(f, "Produtos:          {}", self.product_count)?;

        writeln!(f, "\nVendas por dia")?;
        for (day, total) in &self.sales_per_day {
            writeln!(f, "  {}  {}", format_date(*day, DateStyle::DayMonth), format_brl(*total))?;
        }

        writeln!(f, "\nDespesas por categoria")?;
        for share in &self.expenses_by_category {
            writeln!(
                f,
                "  {}  {} ({}%)",
                share.category,
                format_brl(share.amount),
                format_number(share.share, 1)
            )?;
        }

        writeln!(f, "\nVendas recentes")?;
        write!(f, "{}", self.recent_sales_table())?;
        writeln!(f, "\nDespesas recentes")?;
        write!(f, "{}", self.recent_expenses_table())
    }
}

/// Fetch every listing the dashboard needs and compute it.
pub async fn build_dashboard<S>(source: &S, today: NaiveDate) -> Result<Dashboard, AppError>
where
    S: DashboardSource + ?Sized,
{
    let sales = source.sales().await?;
    let expenses = source.expenses().await?;
    let customers = source.customers().await?;
    let products = source.products().await?;
    Ok(Dashboard::compute(&sales, &expenses, &customers, &products, today))
}

#[derive(Debug, Default)]
pub struct DashboardPage {
    current: Option<Dashboard>,
}

impl DashboardPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Dashboard> {
        self.current.as_ref()
    }

    /// A failed refresh keeps the last dashboard on screen.
    pub async fn refresh<S>(&mut self, source: &S, today: NaiveDate) -> Result<&Dashboard, AppError>
    where
        S: DashboardSource + ?Sized,
    {
        let dashboard = build_dashboard(source, today).await?;
        Ok(self.current.insert(dashboard))
    }

    pub async fn load<S>(&mut self, source: &S, today: NaiveDate) -> Option<Alert>
    where
        S: DashboardSource + ?Sized,
    {
        self.refresh(source, today)
            .await
            .err()
            .map(|err| Alert::from_error(&err, MSG_LOAD_FAILED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock_source::MockSource;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn sale(id: i64, date: NaiveDate, status: PaymentStatus, amount: f64) -> Sale {
        Sale {
            id,
            invoice_number: id.to_string(),
            exit_date: date,
            customer_id: None,
            customer_name: None,
            recipient: None,
            amount,
            payment_method: "PIX".into(),
            due_date: None,
            status,
            bonus: false,
        }
    }

    fn expense(id: i64, date: NaiveDate, category: &str, amount: f64) -> Expense {
        Expense {
            id,
            description: String::new(),
            amount,
            date,
            category: category.into(),
            status: PaymentStatus::Paid,
            supplier_id: None,
            supplier_name: None,
            invoice_number: None,
            due_date: None,
        }
    }

    fn sales() -> Vec<Sale> {
        vec![
            sale(1, day(4, 28), PaymentStatus::Pending, 500.0),
            sale(2, day(5, 2), PaymentStatus::Paid, 100.0),
            sale(3, day(5, 2), PaymentStatus::Overdue, 50.0),
            sale(4, day(5, 6), PaymentStatus::Pending, 25.0),
        ]
    }

    fn expenses() -> Vec<Expense> {
        vec![
            expense(1, day(4, 30), "Aluguel", 900.0),
            expense(2, day(5, 3), "Energia", 30.0),
            expense(3, day(5, 4), "Combustível", 90.0),
        ]
    }

    fn source() -> MockSource {
        MockSource::new().with_sales(sales()).with_expenses(expenses())
    }

    fn dashboard() -> Dashboard {
        Dashboard::compute(&sales(), &expenses(), &[], &[], day(5, 10))
    }

    #[test]
    fn month_to_date_metrics() {
        let dash = dashboard();

        assert_eq!(dash.sales_month_total, 175.0);
        assert_eq!(dash.expenses_month_total, 120.0);
        assert_eq!(dash.month_balance(), 55.0);
        assert_eq!(dash.pending_total, 525.0);
        assert_eq!(dash.overdue_count, 1);
        assert_eq!(dash.sales_per_day, vec![(day(5, 2), 150.0), (day(5, 6), 25.0)]);
        assert_eq!(dash.expenses_by_category[0].category, "Combustível");
        assert_eq!(dash.expenses_by_category[0].share, 75.0);
    }

    #[test]
    fn recent_rows_are_newest_first() {
        let dash = dashboard();
        let ids: Vec<i64> = dash.recent_sales.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn refresh_builds_from_source() {
        let src = source();
        let mut page = DashboardPage::new();
        let dash = page.refresh(&src, day(5, 10)).await.unwrap();
        assert_eq!(dash.sales_month_total, 175.0);
        assert_eq!(src.calls(), 4);
        assert!(page.current().is_some());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_dashboard() {
        let mut page = DashboardPage::new();
        page.refresh(&source(), day(5, 10)).await.unwrap();

        let alert = page.load(&MockSource::failing(), day(5, 11)).await;
        assert_eq!(alert.map(|a| a.message), Some(MSG_LOAD_FAILED.to_string()));
        assert_eq!(page.current().map(|d| d.today), Some(day(5, 10)));
    }

    #[test]
    fn display_lists_metrics() {
        let dash = dashboard();
        let text = dash.to_string();
        assert!(text.contains("Vendas do mês:     R$ 175,00"));
        assert!(text.contains("Combustível  R$ 90,00 (75,0%)"));
    }
}
