use std::path::Path;

use crate::alerts::Alert;
use crate::error::AppError;
use crate::export;
use crate::format::text::contains_folded;
use crate::format::{format_phone, only_digits};
use crate::models::{Customer, CustomerForm};
use crate::services::resource::CustomerQuery;
use crate::services::{CrmClient, Customers};
use crate::table::{highlight, should_auto_search, TableView};

use super::{delete_record, log_reload_failure, outcome, save_record, Messages};

pub const MESSAGES: Messages = Messages {
    created: "Cliente adicionado com sucesso!",
    create_failed: "Erro ao adicionar cliente. Verifique os dados.",
    updated: "Cliente atualizado com sucesso!",
    update_failed: "Erro ao atualizar cliente.",
    deleted: "Cliente removido com sucesso!",
    delete_failed: "Erro ao excluir cliente.",
    load_failed: "Erro ao carregar clientes.",
    no_results: "Nenhum cliente encontrado com os filtros aplicados",
};

#[derive(Debug, Default)]
pub struct CustomersPage {
    rows: Vec<Customer>,
    query: CustomerQuery,
    term: String,
    phone: String,
}

impl CustomersPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Customer>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn set_query(&mut self, query: CustomerQuery) {
        self.query = query;
    }

    pub async fn refresh(&mut self, client: &CrmClient) -> Result<usize, AppError> {
        self.rows = client.list::<Customers>(&self.query.to_params()).await?;
        Ok(self.rows.len())
    }

    /// Load rows, reporting failure as an alert.
    pub async fn load(&mut self, client: &CrmClient) -> Option<Alert> {
        self.refresh(client)
            .await
            .err()
            .map(|err| Alert::from_error(&err, MESSAGES.load_failed))
    }

    pub fn rows(&self) -> &[Customer] {
        &self.rows
    }

    /// Returns false, keeping the previous term, when the term is too short
    /// to search on.
    pub fn set_term(&mut self, term: &str) -> bool {
        if !should_auto_search(term) {
            return false;
        }
        self.term = term.trim().to_string();
        true
    }

    pub fn set_phone(&mut self, phone: &str) {
        self.phone = phone.trim().to_string();
    }

    pub fn clear_filters(&mut self) {
        self.term.clear();
        self.phone.clear();
    }

    fn matches(&self, customer: &Customer) -> bool {
        let term_ok = self.term.is_empty()
            || contains_folded(&customer.name, &self.term)
            || contains_folded(&customer.store_number, &self.term);
        let phone_ok = self.phone.is_empty() || {
            let wanted = only_digits(&self.phone);
            if wanted.is_empty() {
                contains_folded(&customer.phone, &self.phone)
            } else {
                only_digits(&customer.phone).contains(&wanted)
            }
        };
        term_ok && phone_ok
    }

    pub fn visible(&self) -> Vec<&Customer> {
        self.rows.iter().filter(|c| self.matches(c)).collect()
    }

    pub fn table(&self) -> TableView {
        let mut table = TableView::new(
            ["ID", "Nome", "Loja", "Telefone", "Endereço", "Grupo"],
            MESSAGES.no_results,
        );
        for c in self.visible() {
            table.push_row(vec![
                c.id.to_string(),
                highlight(&c.name, &self.term),
                highlight(&c.store_number, &self.term),
                format_phone(&c.phone),
                c.address.clone(),
                c.group.clone().unwrap_or_default(),
            ]);
        }
        table
    }

    pub fn count_label(&self) -> String {
        format!("Total: {}", self.visible().len())
    }

    pub async fn save(&mut self, client: &CrmClient, id: Option<i64>, form: &CustomerForm) -> Alert {
        let alert = save_record::<Customers>(client, id, form, form.validate(), &MESSAGES).await;
        if alert.is_success() {
            log_reload_failure(self.refresh(client).await, "clientes");
        }
        alert
    }

    pub async fn delete(&mut self, client: &CrmClient, id: i64) -> Alert {
        let alert = delete_record::<Customers>(client, id, &MESSAGES).await;
        if alert.is_success() {
            self.rows.retain(|c| c.id != id);
        }
        alert
    }

    pub async fn export_csv(&self, path: &Path) -> Alert {
        let rows: Vec<Customer> = self.visible().into_iter().cloned().collect();
        let result = async {
            let csv = export::customers_csv(&rows)?;
            export::save(path, csv.as_bytes()).await
        }
        .await;
        outcome(
            result,
            format!("{} clientes exportados ({})", rows.len(), path.display()),
            "Erro ao exportar clientes.",
        )
    }
}
