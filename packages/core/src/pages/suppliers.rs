use std::path::Path;

use crate::alerts::Alert;
use crate::error::AppError;
use crate::export;
use crate::format::text::contains_folded;
use crate::format::{mask_cnpj, only_digits};
use crate::models::{Supplier, SupplierForm};
use crate::services::{CrmClient, Suppliers};
use crate::table::{highlight, should_auto_search, TableView};

use super::{delete_record, log_reload_failure, outcome, save_record, Messages};

pub const MESSAGES: Messages = Messages {
    created: "Fornecedor adicionado com sucesso!",
    create_failed: "Erro ao adicionar fornecedor. Verifique os dados.",
    updated: "Fornecedor atualizado com sucesso!",
    update_failed: "Erro ao atualizar fornecedor.",
    deleted: "Fornecedor removido com sucesso!",
    delete_failed: "Erro ao excluir fornecedor.",
    load_failed: "Erro ao carregar fornecedores.",
    no_results: "Nenhum fornecedor encontrado com os filtros aplicados",
};

#[derive(Debug, Default)]
pub struct SuppliersPage {
    rows: Vec<Supplier>,
    term: String,
}

impl SuppliersPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Supplier>) -> Self {
        Self {
            rows,
            term: String::new(),
        }
    }

    pub async fn refresh(&mut self, client: &CrmClient) -> Result<usize, AppError> {
        self.rows = client.list::<Suppliers>(&[]).await?;
        Ok(self.rows.len())
    }

    pub async fn load(&mut self, client: &CrmClient) -> Option<Alert> {
        self.refresh(client)
            .await
            .err()
            .map(|err| Alert::from_error(&err, MESSAGES.load_failed))
    }

    pub fn rows(&self) -> &[Supplier] {
        &self.rows
    }

    pub fn set_term(&mut self, term: &str) -> bool {
        if !should_auto_search(term) {
            return false;
        }
        self.term = term.trim().to_string();
        true
    }

    pub fn clear_filters(&mut self) {
        self.term.clear();
    }

    /// The term matches the name, the CNPJ as stored, or the CNPJ digits
    /// when the term itself is numeric.
    fn matches(&self, supplier: &Supplier) -> bool {
        if self.term.is_empty() {
            return true;
        }
        if contains_folded(&supplier.name, &self.term) || supplier.cnpj.contains(&self.term) {
            return true;
        }
        let digits = only_digits(&self.term);
        !digits.is_empty() && supplier.cnpj_digits().contains(&digits)
    }

    pub fn visible(&self) -> Vec<&Supplier> {
        self.rows.iter().filter(|s| self.matches(s)).collect()
    }

    pub fn table(&self) -> TableView {
        let mut table = TableView::new(["ID", "Nome", "CNPJ"], MESSAGES.no_results);
        for s in self.visible() {
            table.push_row(vec![
                s.id.to_string(),
                highlight(&s.name, &self.term),
                mask_cnpj(&s.cnpj),
            ]);
        }
        table
    }

    pub async fn save(&mut self, client: &CrmClient, id: Option<i64>, form: &SupplierForm) -> Alert {
        let alert = save_record::<Suppliers>(client, id, form, form.validate(), &MESSAGES).await;
        if alert.is_success() {
            log_reload_failure(self.refresh(client).await, "fornecedores");
        }
        alert
    }

    pub async fn delete(&mut self, client: &CrmClient, id: i64) -> Alert {
        let alert = delete_record::<Suppliers>(client, id, &MESSAGES).await;
        if alert.is_success() {
            self.rows.retain(|s| s.id != id);
        }
        alert
    }

    pub async fn export_csv(&self, path: &Path) -> Alert {
        let rows: Vec<Supplier> = self.visible().into_iter().cloned().collect();
        let result = async {
            let csv = export::suppliers_csv(&rows)?;
            export::save(path, csv.as_bytes()).await
        }
        .await;
        outcome(
            result,
            format!("{} fornecedores exportados ({})", rows.len(), path.display()),
            "Erro ao exportar fornecedores.",
        )
    }
}
