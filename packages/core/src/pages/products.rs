use std::str::FromStr;
use std::time::Duration;

use crate::alerts::Alert;
use crate::cache::NameCache;
use crate::error::AppError;
use crate::format::text::contains_folded;
use crate::format::{format_brl, format_number};
use crate::margin::MarginBand;
use crate::models::{Product, ProductForm, Supplier};
use crate::services::{CrmClient, Products, Suppliers};
use crate::table::{highlight, should_auto_search, TableView};

use super::{delete_record, log_reload_failure, save_record, Messages};

pub const MESSAGES: Messages = Messages {
    created: "Produto adicionado com sucesso!",
    create_failed: "Erro ao adicionar produto. Verifique os dados.",
    updated: "Produto atualizado com sucesso!",
    update_failed: "Erro ao atualizar produto.",
    deleted: "Produto removido com sucesso!",
    delete_failed: "Erro ao excluir produto.",
    load_failed: "Erro ao carregar produtos.",
    no_results: "Nenhum produto encontrado com os filtros aplicados",
};

pub const SUPPLIER_NAMES_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    Name,
    Cost,
    Price,
    Margin,
}

impl FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nome" | "name" => Ok(ProductSort::Name),
            "compra" | "cost" => Ok(ProductSort::Cost),
            "venda" | "price" => Ok(ProductSort::Price),
            "margem" | "margin" => Ok(ProductSort::Margin),
            other => Err(format!("Ordenação desconhecida: {}", other)),
        }
    }
}

pub struct ProductsPage {
    rows: Vec<Product>,
    supplier_names: NameCache,
    term: String,
    supplier_id: Option<i64>,
    sort: Option<ProductSort>,
}

impl Default for ProductsPage {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            supplier_names: NameCache::new(SUPPLIER_NAMES_TTL),
            term: String::new(),
            supplier_id: None,
            sort: None,
        }
    }
}

impl ProductsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Product>, suppliers: &[Supplier]) -> Self {
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

    pub async fn refresh(&mut self, client: &CrmClient) -> Result<usize, AppError> {
        self.rows = client.list::<Products>(&[]).await?;
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

    pub fn rows(&self) -> &[Product] {
        &self.rows
    }

    pub fn set_term(&mut self, term: &str) -> bool {
        if !should_auto_search(term) {
            return false;
        }
        self.term = term.trim().to_string();
        true
    }

    pub fn set_supplier(&mut self, supplier_id: Option<i64>) {
        self.supplier_id = supplier_id;
    }

    pub fn sort_by(&mut self, sort: ProductSort) {
        self.sort = Some(sort);
    }

    pub fn clear_filters(&mut self) {
        self.term.clear();
        self.supplier_id = None;
    }

    /// Listing name first, then the cached supplier table.
    pub fn supplier_name<'a>(&'a self, product: &'a Product) -> &'a str {
        product
            .supplier_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| product.supplier_id.and_then(|id| self.supplier_names.name(id)))
            .unwrap_or("-")
    }

    pub fn visible(&self) -> Vec<&Product> {
        let mut rows: Vec<&Product> = self
            .rows
            .iter()
            .filter(|p| self.term.is_empty() || contains_folded(&p.name, &self.term))
            .filter(|p| self.supplier_id.is_none() || p.supplier_id == self.supplier_id)
            .collect();

        match self.sort {
            Some(ProductSort::Name) => rows.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
            Some(ProductSort::Cost) => rows.sort_by(|a, b| a.cost.total_cmp(&b.cost)),
            Some(ProductSort::Price) => rows.sort_by(|a, b| a.price.total_cmp(&b.price)),
            Some(ProductSort::Margin) => rows.sort_by(|a, b| a.margin().total_cmp(&b.margin())),
            None => {}
        }
        rows
    }

    pub fn table(&self) -> TableView {
        let mut table = TableView::new(
            ["ID", "Nome", "Compra", "Venda", "Margem", "Fornecedor"],
            MESSAGES.no_results,
        );
        for p in self.visible() {
            table.push_row(vec![
                p.id.to_string(),
                highlight(&p.name, &self.term),
                format_brl(p.cost),
                format_brl(p.price),
                format!("{}%", format_number(p.margin(), 2)),
                self.supplier_name(p).to_string(),
            ]);
        }
        table
    }

    /// Margin and band shown while a product form is filled in.
    pub fn margin_preview(form: &ProductForm) -> (f64, MarginBand) {
        let margin = form.margin_preview();
        (margin, MarginBand::for_margin(margin))
    }

    pub async fn save(&mut self, client: &CrmClient, id: Option<i64>, form: &ProductForm) -> Alert {
        let alert = save_record::<Products>(client, id, form, form.validate(), &MESSAGES).await;
        if alert.is_success() {
            log_reload_failure(self.refresh(client).await, "produtos");
        }
        alert
    }

    pub async fn delete(&mut self, client: &CrmClient, id: i64) -> Alert {
        let alert = delete_record::<Products>(client, id, &MESSAGES).await;
        if alert.is_success() {
            self.rows.retain(|p| p.id != id);
        }
        alert
    }
}
