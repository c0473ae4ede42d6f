use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::format::{parse_brl, parse_date};
use crate::models::{CustomerForm, ExpenseForm, PaymentStatus, ProductForm, ReportKind, SaleForm, SupplierForm};
use crate::pages::ProductSort;
use crate::services::resource::{ExpenseQuery, SaleQuery};

/// Distributor CRM command-line client
#[derive(Debug, Parser)]
#[command(
    name = "crm",
    version,
    about = "Customers, sales, expenses and margins for a small distributor"
)]
pub struct Cli {
    /// Backend base URL (overrides CRM_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds (overrides CRM_TIMEOUT_SECONDS)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Customers
    #[command(subcommand, name = "clientes")]
    Customers(CustomerCommand),

    /// Suppliers
    #[command(subcommand, name = "fornecedores")]
    Suppliers(SupplierCommand),

    /// Products
    #[command(subcommand, name = "produtos")]
    Products(ProductCommand),

    /// Sales
    #[command(subcommand, name = "vendas")]
    Sales(SaleCommand),

    /// Expenses
    #[command(subcommand, name = "despesas")]
    Expenses(ExpenseCommand),

    /// Month-to-date dashboard
    Dashboard {
        /// Keep refreshing until Ctrl+C
        #[arg(long)]
        watch: bool,

        /// Refresh interval in seconds (overrides CRM_DASHBOARD_REFRESH_SECONDS)
        #[arg(long = "intervalo")]
        interval: Option<u64>,
    },

    /// Generate a report for a period
    #[command(name = "relatorio")]
    Report(ReportArgs),

    /// Margin calculator
    #[command(subcommand, name = "calculadora")]
    Calculator(CalculatorCommand),

    /// Ask the backend to back up its data
    Backup,
}

// ---- value parsers ----

pub fn parse_money(text: &str) -> Result<f64, String> {
    parse_brl(text).ok_or_else(|| format!("Valor inválido: {}", text))
}

pub fn parse_day(text: &str) -> Result<NaiveDate, String> {
    parse_date(text).ok_or_else(|| format!("Data inválida: {} (use dd/mm/aaaa)", text))
}

pub fn parse_status(text: &str) -> Result<PaymentStatus, String> {
    if text.trim().is_empty() {
        return Err("Status vazio".to_string());
    }
    Ok(PaymentStatus::from(text))
}

fn parse_kind(text: &str) -> Result<ReportKind, String> {
    text.parse()
}

fn parse_sort(text: &str) -> Result<ProductSort, String> {
    text.parse()
}

// ---- customers ----

#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    #[command(name = "listar")]
    List {
        #[arg(long = "termo")]
        term: Option<String>,
        #[arg(long = "telefone")]
        phone: Option<String>,
        #[arg(long = "grupo")]
        group: Option<String>,
        /// Write the listing as CSV to this file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    #[command(name = "criar")]
    Create(CustomerArgs),
    #[command(name = "editar")]
    Update {
        id: i64,
        #[command(flatten)]
        fields: CustomerArgs,
    },
    #[command(name = "excluir")]
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct CustomerArgs {
    #[arg(long = "nome")]
    pub name: String,
    #[arg(long = "loja")]
    pub store_number: String,
    #[arg(long = "endereco")]
    pub address: String,
    #[arg(long = "telefone")]
    pub phone: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long = "observacoes")]
    pub notes: Option<String>,
    #[arg(long)]
    pub cnpj: Option<String>,
    #[arg(long = "grupo")]
    pub group: Option<String>,
}

impl From<CustomerArgs> for CustomerForm {
    fn from(a: CustomerArgs) -> Self {
        Self {
            name: a.name,
            store_number: a.store_number,
            address: a.address,
            phone: a.phone,
            email: a.email,
            notes: a.notes,
            cnpj: a.cnpj,
            group: a.group,
        }
    }
}

// ---- suppliers ----

#[derive(Debug, Subcommand)]
pub enum SupplierCommand {
    #[command(name = "listar")]
    List {
        #[arg(long = "termo")]
        term: Option<String>,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    #[command(name = "criar")]
    Create(SupplierArgs),
    #[command(name = "editar")]
    Update {
        id: i64,
        #[command(flatten)]
        fields: SupplierArgs,
    },
    #[command(name = "excluir")]
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct SupplierArgs {
    #[arg(long = "nome")]
    pub name: String,
    #[arg(long)]
    pub cnpj: String,
}

impl From<SupplierArgs> for SupplierForm {
    fn from(a: SupplierArgs) -> Self {
        SupplierForm::new(a.name, &a.cnpj)
    }
}

// ---- products ----

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    #[command(name = "listar")]
    List {
        #[arg(long = "termo")]
        term: Option<String>,
        #[arg(long = "fornecedor")]
        supplier_id: Option<i64>,
        /// nome, compra, venda or margem
        #[arg(long = "ordenar", value_parser = parse_sort)]
        sort: Option<ProductSort>,
    },
    #[command(name = "criar")]
    Create(ProductArgs),
    #[command(name = "editar")]
    Update {
        id: i64,
        #[command(flatten)]
        fields: ProductArgs,
    },
    #[command(name = "excluir")]
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct ProductArgs {
    #[arg(long = "nome")]
    pub name: String,
    #[arg(long = "compra", value_parser = parse_money)]
    pub cost: f64,
    #[arg(long = "venda", value_parser = parse_money)]
    pub price: f64,
    #[arg(long = "fornecedor")]
    pub supplier_id: Option<i64>,
}

impl From<ProductArgs> for ProductForm {
    fn from(a: ProductArgs) -> Self {
        Self {
            name: a.name,
            cost: a.cost,
            price: a.price,
            supplier_id: a.supplier_id,
        }
    }
}

// ---- sales ----

#[derive(Debug, Args, Default)]
pub struct SaleFilterArgs {
    #[arg(long = "inicio", value_parser = parse_day)]
    pub start: Option<NaiveDate>,
    #[arg(long = "fim", value_parser = parse_day)]
    pub end: Option<NaiveDate>,
    #[arg(long = "cliente")]
    pub customer_id: Option<i64>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<PaymentStatus>,
    /// Only bonus shipments
    #[arg(long = "bonificacao")]
    pub bonus_only: bool,
}

impl From<&SaleFilterArgs> for SaleQuery {
    fn from(a: &SaleFilterArgs) -> Self {
        Self {
            start: a.start,
            end: a.end,
            customer_id: a.customer_id,
            status: a.status.clone(),
            bonus_only: a.bonus_only,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum SaleCommand {
    #[command(name = "listar")]
    List {
        #[command(flatten)]
        filter: SaleFilterArgs,
        /// Write the visible sales as a spreadsheet-layout CSV into this folder
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    #[command(name = "criar")]
    Create(SaleArgs),
    #[command(name = "editar")]
    Update {
        id: i64,
        #[command(flatten)]
        fields: SaleArgs,
    },
    /// Change only the payment status
    #[command(name = "status")]
    Status {
        id: i64,
        #[arg(value_parser = parse_status)]
        status: PaymentStatus,
    },
    #[command(name = "excluir")]
    Delete { id: i64 },
    /// Suggested invoice number for the next sale
    #[command(name = "proxima-nota")]
    NextInvoice,
    /// Upload a spreadsheet of sales
    #[command(name = "importar")]
    Import { file: PathBuf },
    /// Download the backend's spreadsheet of all sales, or one year
    #[command(name = "exportar")]
    Export {
        #[arg(long = "ano")]
        year: Option<i32>,
        #[arg(long = "destino", default_value = ".")]
        dir: PathBuf,
    },
    /// Download the import template
    #[command(name = "modelo")]
    Template {
        #[arg(long = "destino", default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct SaleArgs {
    /// Invoice number; the next free number when omitted on create
    #[arg(long = "nota")]
    pub invoice_number: Option<String>,
    /// Exit date; today when omitted
    #[arg(long = "data", value_parser = parse_day)]
    pub exit_date: Option<NaiveDate>,
    #[arg(long = "cliente")]
    pub customer_id: Option<i64>,
    /// Recipient of a walk-in sale
    #[arg(long = "destinatario")]
    pub recipient: Option<String>,
    #[arg(long = "valor", value_parser = parse_money)]
    pub amount: f64,
    #[arg(long = "pagamento")]
    pub payment_method: String,
    #[arg(long = "vencimento", value_parser = parse_day)]
    pub due_date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_status, default_value = "pendente")]
    pub status: PaymentStatus,
    #[arg(long = "bonificacao")]
    pub bonus: bool,
}

impl SaleArgs {
    pub fn into_form(self, invoice_fallback: String, today: NaiveDate) -> SaleForm {
        let mut form = SaleForm::new(
            self.invoice_number.unwrap_or(invoice_fallback),
            self.exit_date.unwrap_or(today),
            self.amount,
        )
        .with_customer(self.customer_id, self.recipient);
        form.payment_method = self.payment_method;
        form.due_date = self.due_date;
        form.status = self.status;
        form.bonus = self.bonus;
        form
    }
}

// ---- expenses ----

#[derive(Debug, Args, Default)]
pub struct ExpenseFilterArgs {
    #[arg(long = "inicio", value_parser = parse_day)]
    pub start: Option<NaiveDate>,
    #[arg(long = "fim", value_parser = parse_day)]
    pub end: Option<NaiveDate>,
    #[arg(long = "categoria")]
    pub category: Option<String>,
    #[arg(long = "fornecedor")]
    pub supplier_id: Option<i64>,
}

impl From<&ExpenseFilterArgs> for ExpenseQuery {
    fn from(a: &ExpenseFilterArgs) -> Self {
        Self {
            start: a.start,
            end: a.end,
            category: a.category.clone(),
            supplier_id: a.supplier_id,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ExpenseCommand {
    #[command(name = "listar")]
    List {
        #[command(flatten)]
        filter: ExpenseFilterArgs,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    #[command(name = "criar")]
    Create(ExpenseArgs),
    #[command(name = "editar")]
    Update {
        id: i64,
        #[command(flatten)]
        fields: ExpenseArgs,
    },
    #[command(name = "status")]
    Status {
        id: i64,
        #[arg(value_parser = parse_status)]
        status: PaymentStatus,
    },
    #[command(name = "excluir")]
    Delete { id: i64 },
    #[command(name = "importar")]
    Import { file: PathBuf },
    #[command(name = "exportar")]
    Export {
        #[arg(long = "ano")]
        year: i32,
        #[arg(long = "destino", default_value = ".")]
        dir: PathBuf,
    },
    /// List the known expense categories
    #[command(name = "categorias")]
    Categories,
}

#[derive(Debug, Args)]
pub struct ExpenseArgs {
    #[arg(long = "descricao")]
    pub description: String,
    #[arg(long = "valor", value_parser = parse_money)]
    pub amount: f64,
    /// Expense date; today when omitted
    #[arg(long = "data", value_parser = parse_day)]
    pub date: Option<NaiveDate>,
    #[arg(long = "categoria")]
    pub category: String,
    #[arg(long, value_parser = parse_status, default_value = "pendente")]
    pub status: PaymentStatus,
    #[arg(long = "fornecedor")]
    pub supplier_id: Option<i64>,
    #[arg(long = "nota")]
    pub invoice_number: Option<String>,
    #[arg(long = "vencimento", value_parser = parse_day)]
    pub due_date: Option<NaiveDate>,
}

impl ExpenseArgs {
    /// Supplier and due-date sections count as checked when any of their
    /// fields was given.
    pub fn into_form(self, today: NaiveDate) -> ExpenseForm {
        let mut form = ExpenseForm::new(
            self.description,
            self.amount,
            self.date.unwrap_or(today),
            self.category,
        );
        form.status = self.status;
        if self.supplier_id.is_some() || self.invoice_number.is_some() {
            form = form.with_supplier(self.supplier_id, self.invoice_number.unwrap_or_default());
        }
        if self.due_date.is_some() {
            form = form.with_due_date(self.due_date);
        }
        form
    }
}

// ---- reports and calculator ----

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// vendas, despesas, produtos or lucro
    #[arg(value_parser = parse_kind)]
    pub kind: ReportKind,
    /// First day; the first of this month when omitted
    #[arg(long = "inicio", value_parser = parse_day)]
    pub start: Option<NaiveDate>,
    /// Last day; today when omitted
    #[arg(long = "fim", value_parser = parse_day)]
    pub end: Option<NaiveDate>,
    /// Write the report as CSV into this folder
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CalculatorCommand {
    /// Margin from cost and sale price
    #[command(name = "margem")]
    Margin {
        #[arg(long = "compra", value_parser = parse_money)]
        cost: f64,
        #[arg(long = "venda", value_parser = parse_money)]
        sale: f64,
        /// Simulate this many units
        #[arg(long = "quantidade")]
        quantity: Option<i64>,
        /// Also ask the backend for the margin
        #[arg(long = "servidor")]
        server: bool,
    },
    /// Sale price for a desired margin
    #[command(name = "reverso")]
    Reverse {
        #[arg(long = "compra", value_parser = parse_money)]
        cost: f64,
        #[arg(long = "margem", value_parser = parse_money)]
        margin: f64,
    },
    #[command(name = "historico")]
    History,
    #[command(name = "limpar")]
    Clear,
}
