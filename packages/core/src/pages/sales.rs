//! Sales listing, forms, payment status and spreadsheet transfers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

use crate::alerts::Alert;
use crate::cache::NameCache;
use crate::error::AppError;
use crate::export;
use crate::format::{format_brl, format_date, DateStyle};
use crate::models::sale::next_invoice_number;
use crate::models::{Customer, PaymentStatus, Sale, SaleForm};
use crate::services::resource::SaleQuery;
use crate::services::{CrmClient, Customers, FileArea, Sales};
use crate::table::{Totals, TableView};

use super::{delete_record, download_generated, log_reload_failure, outcome, read_upload, save_record, Messages};

pub const MESSAGES: Messages = Messages {
    created: "Venda cadastrada com sucesso!",
    create_failed: "Erro ao cadastrar venda. Por favor, tente novamente.",
    updated: "Venda atualizada com sucesso!",
    update_failed: "Erro ao atualizar venda.",
    deleted: "Venda removida com sucesso!",
    delete_failed: "Erro ao excluir venda.",
    load_failed: "Erro ao carregar vendas.",
    no_results: "Nenhuma venda encontrada com os filtros aplicados",
};

pub const MSG_STATUS_UPDATED: &str = "Status atualizado com sucesso!";
pub const MSG_STATUS_FAILED: &str = "Erro ao atualizar status da venda.";
pub const MSG_IMPORT_FAILED: &str = "Erro na importação.";
pub const MSG_EXPORT_FAILED: &str = "Erro ao exportar vendas.";
pub const MSG_NOTHING_TO_EXPORT: &str = "Nenhuma venda encontrada para exportar.";
pub const MSG_TEMPLATE_READY: &str = "Template baixado! Use este formato para organizar suas planilhas.";
pub const MSG_TEMPLATE_FAILED: &str = "Erro ao gerar modelo de importação.";

pub const CUSTOMER_NAMES_TTL: Duration = Duration::from_secs(300);

pub struct SalesPage {
    rows: Vec<Sale>,
    customer_names: NameCache,
    query: SaleQuery,
}

impl Default for SalesPage {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            customer_names: NameCache::new(CUSTOMER_NAMES_TTL),
            query: SaleQuery::default(),
        }
    }
}

impl SalesPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Sale>, customers: &[Customer]) -> Self {
        let mut page = Self {
            rows,
            ..Self::default()
        };
        page.remember_customers(customers);
        page
    }

    fn remember_customers(&mut self, customers: &[Customer]) {
        self.customer_names
            .fill(customers.iter().map(|c| (c.id, c.display_name())));
    }

    /// The same query drives the backend search and the local filter.
    pub fn set_query(&mut self, query: SaleQuery) {
        self.query = query;
    }

    pub fn clear_filters(&mut self) {
        self.query = SaleQuery::default();
    }

    pub async fn refresh(&mut self, client: &CrmClient) -> Result<usize, AppError> {
        self.rows = client.list::<Sales>(&self.query.to_params()).await?;
        if !self.customer_names.is_fresh() {
            // Display names only; a failed lookup keeps the rows.
            match client.list::<Customers>(&[]).await {
                Ok(customers) => self.remember_customers(&customers),
                Err(err) => tracing::warn!("Could not load customer names: {}", err),
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

    pub fn rows(&self) -> &[Sale] {
        &self.rows
    }

    fn matches(&self, sale: &Sale) -> bool {
        let q = &self.query;
        q.start.map_or(true, |d| sale.exit_date >= d)
            && q.end.map_or(true, |d| sale.exit_date <= d)
            && q.customer_id.map_or(true, |id| sale.customer_id == Some(id))
            && q.status.as_ref().map_or(true, |s| {
                sale.status.as_str().to_lowercase().contains(&s.as_str().to_lowercase())
            })
            && (!q.bonus_only || sale.bonus)
    }

    pub fn visible(&self) -> Vec<&Sale> {
        self.rows.iter().filter(|s| self.matches(s)).collect()
    }

    pub fn totals(&self) -> Totals {
        Totals::from_amounts(self.visible().iter().map(|s| s.amount))
    }

    /// Recipient for display: the sale's own names, then the cached
    /// customer table, then walk-in.
    pub fn recipient_label(&self, sale: &Sale) -> String {
        let has_own_name = [sale.recipient.as_deref(), sale.customer_name.as_deref()]
            .into_iter()
            .flatten()
            .any(|n| !n.trim().is_empty());
        if !has_own_name {
            if let Some(name) = sale.customer_id.and_then(|id| self.customer_names.name(id)) {
                return name.to_string();
            }
        }
        sale.recipient_name().to_string()
    }

    pub fn table(&self) -> TableView {
        let mut table = TableView::new(
            ["ID", "NF", "Saída", "Destinatário", "Valor", "Pagamento", "Vencimento", "Status"],
            MESSAGES.no_results,
        );
        for s in self.visible() {
            let invoice = if s.bonus {
                format!("{} (bonificação)", s.invoice_number)
            } else {
                s.invoice_number.clone()
            };
            table.push_row(vec![
                s.id.to_string(),
                invoice,
                format_date(s.exit_date, DateStyle::Br),
                self.recipient_label(s),
                format_brl(s.amount),
                s.payment_method.clone(),
                s.due_date
                    .map(|d| format_date(d, DateStyle::Br))
                    .unwrap_or_else(|| "-".to_string()),
                s.status.label(),
            ]);
        }
        table
    }

    pub fn next_invoice_number(&self) -> String {
        next_invoice_number(&self.rows)
    }

    // ---- actions ----

    pub async fn save(&mut self, client: &CrmClient, id: Option<i64>, form: &SaleForm, today: NaiveDate) -> Alert {
        let alert = save_record::<Sales>(client, id, form, form.validate(today), &MESSAGES).await;
        if alert.is_success() {
            log_reload_failure(self.refresh(client).await, "vendas");
        }
        alert
    }

    pub async fn set_status(&mut self, client: &CrmClient, id: i64, status: PaymentStatus) -> Alert {
        let result = client.patch_status::<Sales>(id, &status).await;
        let alert = outcome(result, MSG_STATUS_UPDATED, MSG_STATUS_FAILED);
        if alert.is_success() {
            if let Some(sale) = self.rows.iter_mut().find(|s| s.id == id) {
                sale.status = status;
            }
        }
        alert
    }

    pub async fn delete(&mut self, client: &CrmClient, id: i64) -> Alert {
        let alert = delete_record::<Sales>(client, id, &MESSAGES).await;
        if alert.is_success() {
            self.rows.retain(|s| s.id != id);
        }
        alert
    }

    // ---- spreadsheets ----

    pub async fn import(&mut self, client: &CrmClient, path: &Path) -> Alert {
        let result = async {
            let (file_name, bytes) = read_upload(path).await?;
            client.import_sales(&file_name, bytes).await
        }
        .await;

        match result {
            Ok(summary) => {
                for error in &summary.errors {
                    tracing::warn!("Import row rejected: {}", error);
                }
                log_reload_failure(self.refresh(client).await, "vendas");
                let mut message = format!("Importação concluída! {} vendas importadas.", summary.imported);
                if summary.failed > 0 {
                    message.push_str(&format!(" {} com erro.", summary.failed));
                    return Alert::warning(message);
                }
                Alert::success(message)
            }
            Err(err) => Alert::from_error(&err, MSG_IMPORT_FAILED),
        }
    }

    /// Ask the backend for the full spreadsheet, or one year of it, and
    /// download it into `dir`.
    pub async fn export_spreadsheet(&self, client: &CrmClient, year: Option<i32>, dir: &Path) -> Alert {
        let result = async {
            let generated = match year {
                Some(year) => client.export_sales_by_year(year).await?,
                None => client.export_sales().await?,
            };
            let saved = download_generated(client, FileArea::Export, &generated, dir).await?;
            Ok::<_, AppError>((generated, saved))
        }
        .await;

        match result {
            Ok((generated, saved)) => {
                let message = generated
                    .message
                    .unwrap_or_else(|| "Planilha exportada com sucesso!".to_string());
                Alert::success(format!("{} ({})", message, saved.display()))
            }
            Err(err) => Alert::from_error(&err, MSG_EXPORT_FAILED),
        }
    }

    pub async fn download_template(&self, client: &CrmClient, dir: &Path) -> Alert {
        let result = async {
            let generated = client.import_template().await?;
            download_generated(client, FileArea::Template, &generated, dir).await
        }
        .await;

        match result {
            Ok(saved) => Alert::success(format!("{} ({})", MSG_TEMPLATE_READY, saved.display())),
            Err(err) => Alert::from_error(&err, MSG_TEMPLATE_FAILED),
        }
    }

    /// Visible rows as CSV in the spreadsheet layout, written to `dir`.
    pub async fn export_csv(&self, dir: &Path, today: NaiveDate) -> Alert {
        let rows: Vec<Sale> = self
            .visible()
            .into_iter()
            .map(|s| Sale {
                recipient: Some(self.recipient_label(s)),
                ..s.clone()
            })
            .collect();
        if rows.is_empty() {
            return Alert::warning(MSG_NOTHING_TO_EXPORT);
        }

        let target: PathBuf = dir.join(export::sales_spreadsheet_file_name(today));
        let result = async {
            let csv = export::sales_spreadsheet(&rows)?;
            export::save(&target, csv.as_bytes()).await
        }
        .await;

        outcome(
            result,
            format!("{} vendas exportadas com suas colunas originais!", rows.len()),
            MSG_EXPORT_FAILED,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn sale(id: i64, date: NaiveDate, customer: Option<i64>, status: PaymentStatus, amount: f64) -> Sale {
        Sale {
            id,
            invoice_number: format!("{:06}", id),
            exit_date: date,
            customer_id: customer,
            customer_name: None,
            recipient: None,
            amount,
            payment_method: "À vista".into(),
            due_date: None,
            status,
            bonus: id == 3,
        }
    }

    fn customer(id: i64, name: &str, store: &str) -> Customer {
        Customer {
            id,
            name: name.into(),
            store_number: store.into(),
            address: String::new(),
            phone: String::new(),
            email: None,
            notes: None,
            cnpj: None,
            group: None,
            registered_on: None,
        }
    }

    fn page() -> SalesPage {
        SalesPage::with_rows(
            vec![
                sale(1, day(1), Some(10), PaymentStatus::Paid, 100.0),
                sale(2, day(5), None, PaymentStatus::Pending, 50.5),
                sale(3, day(9), Some(10), PaymentStatus::Overdue, 20.0),
            ],
            &[customer(10, "Mercado Central", "4")],
        )
    }

    fn ids(rows: Vec<&Sale>) -> Vec<i64> {
        rows.iter().map(|s| s.id).collect()
    }

    #[test]
    fn local_filter_by_period_customer_status_and_bonus() {
        let mut page = page();
        page.set_query(SaleQuery {
            start: Some(day(2)),
            end: Some(day(9)),
            ..Default::default()
        });
        assert_eq!(ids(page.visible()), vec![2, 3]);

        page.set_query(SaleQuery {
            customer_id: Some(10),
            ..Default::default()
        });
        assert_eq!(ids(page.visible()), vec![1, 3]);

        page.set_query(SaleQuery {
            status: Some(PaymentStatus::Pending),
            ..Default::default()
        });
        assert_eq!(ids(page.visible()), vec![2]);

        page.set_query(SaleQuery {
            bonus_only: true,
            ..Default::default()
        });
        assert_eq!(ids(page.visible()), vec![3]);
    }

    #[test]
    fn totals_follow_filter() {
        let mut page = page();
        assert_eq!(page.totals().amount_label(), "R$ 170,50");
        page.set_query(SaleQuery {
            customer_id: Some(10),
            ..Default::default()
        });
        assert_eq!(page.totals().count_label(), "Total: 2");
    }

    #[test]
    fn recipient_uses_cache_then_walk_in() {
        let page = page();
        assert_eq!(page.recipient_label(&page.rows()[0]), "Mercado Central - Loja 4");
        assert_eq!(page.recipient_label(&page.rows()[1]), "Cliente Avulso");
    }

    #[test]
    fn suggests_next_invoice() {
        assert_eq!(page().next_invoice_number(), "000004");
    }

    #[test]
    fn table_marks_bonus_and_status() {
        let text = page().table().to_string();
        assert!(text.contains("000003 (bonificação)"));
        assert!(text.contains("Atrasado"));
        assert!(text.contains("R$ 50,50"));
    }

    #[tokio::test]
    async fn csv_export_of_empty_view_warns() {
        let mut page = page();
        page.set_query(SaleQuery {
            customer_id: Some(99),
            ..Default::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let alert = page.export_csv(dir.path(), day(10)).await;
        assert_eq!(alert, Alert::warning(MSG_NOTHING_TO_EXPORT));
    }

    #[tokio::test]
    async fn csv_export_writes_visible_rows() {
        let page = page();
        let dir = tempfile::tempdir().unwrap();
        let alert = page.export_csv(dir.path(), day(10)).await;
        assert!(alert.is_success());
        assert_eq!(alert.message, "3 vendas exportadas com suas colunas originais!");

        let csv = std::fs::read_to_string(dir.path().join("vendas_exportadas_2024-05-10.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.contains(r#""Mercado Central","4""#));
    }
}
