use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

use crate::alerts::Alert;
use crate::cache::NameCache;
use crate::error::AppError;
use crate::export;
use crate::format::text::contains_folded;
use crate::format::{format_brl, format_date, DateStyle};
use crate::models::{Expense, ExpenseForm, PaymentStatus, Supplier, DEFAULT_EXPENSE_CATEGORIES};
use crate::services::resource::ExpenseQuery;
use crate::services::{CrmClient, Expenses, Suppliers};
use crate::table::{Totals, TableView};

use super::{delete_record, log_reload_failure, outcome, read_upload, save_record, Messages};

pub const MESSAGES: Messages = Messages {
    created: "Despesa adicionada com sucesso!",
    create_failed: "Erro ao adicionar despesa. Verifique os dados.",
    updated: "Despesa atualizada com sucesso!",
    update_failed: "Erro ao atualizar despesa.",
    deleted: "Despesa removida com sucesso!",
    delete_failed: "Erro ao excluir despesa.",
    load_failed: "Erro ao carregar despesas.",
    no_results: "Nenhuma despesa encontrada com os filtros aplicados",
};

pub const MSG_STATUS_UPDATED: &str = "Status atualizado com sucesso!";
pub const MSG_STATUS_FAILED: &str = "Erro ao atualizar status da despesa.";
pub const MSG_IMPORT_FAILED: &str = "Erro ao importar despesas.";
pub const MSG_EXPORT_FAILED: &str = "Erro ao exportar despesas.";

pub const SUPPLIER_NAMES_TTL: Duration = Duration::from_secs(300);

pub struct ExpensesPage {
    rows: Vec<Expense>,
    supplier_names: NameCache,
    query: ExpenseQuery,
}

impl Default for ExpensesPage {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            supplier_names: NameCache::new(SUPPLIER_NAMES_TTL),
            query: ExpenseQuery::default(),
        }
    }
}

impl ExpensesPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Expense>, suppliers: &[Supplier]) -> Self {
        let mut page = Self {
            rows,
            ..Self::default()
        };
        page.remember_suppliers(suppliers);
        page
    }

    fn remember_suppliers(&mut self, suppliers: &[Supplier]) {
        self.supplier_names
            .fill(suppliers.iter().map(|s| (s.id, s.name.clone())));
    }

    pub fn set_query(&mut self, query: ExpenseQuery) {
        self.query = query;
    }

    pub fn clear_filters(&mut self) {
        self.query = ExpenseQuery::default();
    }

    pub async fn refresh(&mut self, client: &CrmClient) -> Result<usize, AppError> {
        self.rows = client.list::<Expenses>(&self.query.to_params()).await?;
        if !self.supplier_names.is_fresh() {
            match client.list::<Suppliers>(&[]).await {
                Ok(suppliers) => self.remember_suppliers(&suppliers),
                Err(err) => tracing::warn!("Could not load supplier names: {}", err),
            }
        }
        Ok(self.rows.len())
    }

    pub async fn load(&mut self, client: &CrmClient) -> Option<Alert> {
        self.refresh(client)
            .await
            .err()
            .map(|err| Alert::from_error(&err, MESSAGES.load_failed))
    }

    pub fn rows(&self) -> &[Expense] {
        &self.rows
    }

    fn matches(&self, expense: &Expense) -> bool {
        let q = &self.query;
        q.start.map_or(true, |d| expense.date >= d)
            && q.end.map_or(true, |d| expense.date <= d)
            && q.category
                .as_deref()
                .map_or(true, |c| contains_folded(&expense.category, c.trim()))
            && q.supplier_id.map_or(true, |id| expense.supplier_id == Some(id))
    }

    pub fn visible(&self) -> Vec<&Expense> {
        self.rows.iter().filter(|e| self.matches(e)).collect()
    }

    pub fn totals(&self) -> Totals {
        Totals::from_amounts(self.visible().iter().map(|e| e.amount))
    }

    /// Default categories followed by any other category seen in the rows.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = DEFAULT_EXPENSE_CATEGORIES.iter().map(|c| c.to_string()).collect();
        for expense in &self.rows {
            let category = expense.category.trim();
            if !category.is_empty() && !categories.iter().any(|c| c.eq_ignore_ascii_case(category)) {
                categories.push(category.to_string());
            }
        }
        categories
    }

    pub fn supplier_label(&self, expense: &Expense) -> String {
        expense
            .supplier_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| expense.supplier_id.and_then(|id| self.supplier_names.name(id)))
            .unwrap_or("-")
            .to_string()
    }

    pub fn table(&self) -> TableView {
        let mut table = TableView::new(
            ["ID", "Descrição", "Valor", "Data", "Categoria", "Fornecedor", "Vencimento", "Status"],
            MESSAGES.no_results,
        );
        for e in self.visible() {
            table.push_row(vec![
                e.id.to_string(),
                e.description.clone(),
                format_brl(e.amount),
                format_date(e.date, DateStyle::Br),
                e.category.clone(),
                self.supplier_label(e),
                e.due_date
                    .map(|d| format_date(d, DateStyle::Br))
                    .unwrap_or_else(|| "-".to_string()),
                e.status.label(),
            ]);
        }
        table
    }

    // ---- actions ----

    /// Unchecked supplier/due-date sections are cleared before validating.
    pub async fn save(&mut self, client: &CrmClient, id: Option<i64>, form: ExpenseForm, today: NaiveDate) -> Alert {
        let form = form.normalized();
        let alert = save_record::<Expenses>(client, id, &form, form.validate(today), &MESSAGES).await;
        if alert.is_success() {
            log_reload_failure(self.refresh(client).await, "despesas");
        }
        alert
    }

    pub async fn set_status(&mut self, client: &CrmClient, id: i64, status: PaymentStatus) -> Alert {
        let result = client.patch_status::<Expenses>(id, &status).await;
        let alert = outcome(result, MSG_STATUS_UPDATED, MSG_STATUS_FAILED);
        if alert.is_success() {
            if let Some(expense) = self.rows.iter_mut().find(|e| e.id == id) {
                expense.status = status;
            }
        }
        alert
    }

    pub async fn delete(&mut self, client: &CrmClient, id: i64) -> Alert {
        let alert = delete_record::<Expenses>(client, id, &MESSAGES).await;
        if alert.is_success() {
            self.rows.retain(|e| e.id != id);
        }
        alert
    }

    pub async fn import(&mut self, client: &CrmClient, path: &Path) -> Alert {
        let result = async {
            let (file_name, bytes) = read_upload(path).await?;
            client.import_expenses(&file_name, bytes).await
        }
        .await;

        match result {
            Ok(summary) => {
                log_reload_failure(self.refresh(client).await, "despesas");
                Alert::success(format!(
                    "Importação concluída! {} despesas foram importadas.",
                    summary.total
                ))
            }
            Err(err) => Alert::from_error(&err, MSG_IMPORT_FAILED),
        }
    }

    /// Spreadsheet of one year's expenses, built by the backend.
    pub async fn export_year(&self, client: &CrmClient, year: i32, dir: &Path) -> Alert {
        let target: PathBuf = dir.join(format!("despesas_{}.xlsx", year));
        let result = async {
            let bytes = client.export_expenses(year).await?;
            export::save(&target, &bytes).await
        }
        .await;
        outcome(
            result,
            format!("Despesas de {} exportadas ({})", year, target.display()),
            MSG_EXPORT_FAILED,
        )
    }

    /// Visible rows as CSV.
    pub async fn export_csv(&self, path: &Path) -> Alert {
        let rows: Vec<Expense> = self.visible().into_iter().cloned().collect();
        let result = async {
            let csv = export::expenses_report_csv(&rows)?;
            export::save(path, csv.as_bytes()).await
        }
        .await;
        outcome(
            result,
            format!("{} despesas exportadas ({})", rows.len(), path.display()),
            MSG_EXPORT_FAILED,
        )
    }
}
