//! CSV downloads. Every field is quoted, matching the files the web pages
//! used to produce.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use csv::{QuoteStyle, Writer, WriterBuilder};

use crate::error::AppError;
use crate::format::{format_brl_plain, format_date, DateStyle};
use crate::models::{Customer, Expense, PaymentStatus, Product, Report, ReportKind, Sale, Supplier};

pub const SALES_SPREADSHEET_HEADERS: [&str; 7] = [
    "NFE",
    "DataSaida",
    "Destinatario",
    "Nume da Loja",
    "Valor",
    "Pix ou Boleto",
    "Pago",
];

const SALES_REPORT_HEADERS: [&str; 7] = ["ID", "Nota", "Data", "Cliente", "Valor", "Forma Pagamento", "Status"];
const EXPENSES_REPORT_HEADERS: [&str; 6] = ["ID", "Descrição", "Valor", "Data", "Categoria", "Status"];
const PRODUCTS_REPORT_HEADERS: [&str; 5] = ["ID", "Nome", "Valor Compra", "Valor Venda", "Margem %"];
const CUSTOMER_HEADERS: [&str; 8] = ["ID", "Nome", "Loja", "Endereço", "Telefone", "Email", "CNPJ", "Grupo"];
const SUPPLIER_HEADERS: [&str; 3] = ["ID", "Nome", "CNPJ"];

fn writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, AppError> {
    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::Io(err.into_error()))?;
    String::from_utf8(bytes).map_err(|err| AppError::Parse(err.to_string()))
}

fn write_table<T, F, const N: usize>(headers: [&str; N], rows: &[T], cells: F) -> Result<String, AppError>
where
    F: Fn(&T) -> [String; N],
{
    let mut wtr = writer();
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(cells(row))?;
    }
    finish(wtr)
}

fn amount(value: f64) -> String {
    format!("{:.2}", value)
}

fn br(date: NaiveDate) -> String {
    format_date(date, DateStyle::Br)
}

// ---- sales spreadsheet ----

/// "Mercado - Loja 3" splits into recipient and store number.
pub fn split_store(recipient: &str) -> (String, String) {
    match recipient.split_once(" - Loja ") {
        Some((name, store)) => (name.to_string(), store.to_string()),
        None => (recipient.to_string(), String::new()),
    }
}

/// Payment method as written in the import spreadsheets.
pub fn spreadsheet_payment(method: &str) -> String {
    if method.to_lowercase().contains("vista") {
        "PIX".to_string()
    } else if method.contains("dias") {
        "Boleto".to_string()
    } else {
        method.to_string()
    }
}

fn spreadsheet_paid(status: &PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Paid => "Pago",
        _ => "Pendente",
    }
}

/// Sales in the column layout the backend's spreadsheet import reads back.
pub fn sales_spreadsheet(sales: &[Sale]) -> Result<String, AppError> {
    write_table(SALES_SPREADSHEET_HEADERS, sales, |s| {
        let (recipient, store) = split_store(s.recipient_name());
        [
            s.invoice_number.clone(),
            br(s.exit_date),
            recipient,
            store,
            format_brl_plain(s.amount),
            spreadsheet_payment(&s.payment_method),
            spreadsheet_paid(&s.status).to_string(),
        ]
    })
}

pub fn sales_spreadsheet_file_name(today: NaiveDate) -> String {
    format!("vendas_exportadas_{}.csv", format_date(today, DateStyle::Iso))
}

// ---- reports ----

pub fn sales_report_csv(sales: &[Sale]) -> Result<String, AppError> {
    write_table(SALES_REPORT_HEADERS, sales, |s| {
        [
            s.id.to_string(),
            s.invoice_number.clone(),
            br(s.exit_date),
            s.recipient_name().to_string(),
            amount(s.amount),
            s.payment_method.clone(),
            s.status.as_str().to_string(),
        ]
    })
}

pub fn expenses_report_csv(expenses: &[Expense]) -> Result<String, AppError> {
    write_table(EXPENSES_REPORT_HEADERS, expenses, |e| {
        [
            e.id.to_string(),
            e.description.clone(),
            amount(e.amount),
            br(e.date),
            e.category.clone(),
            e.status.as_str().to_string(),
        ]
    })
}

pub fn products_report_csv(products: &[Product]) -> Result<String, AppError> {
    write_table(PRODUCTS_REPORT_HEADERS, products, |p| {
        [
            p.id.to_string(),
            p.name.clone(),
            amount(p.cost),
            amount(p.price),
            format!("{:.2}", p.margin()),
        ]
    })
}

/// Profit reports carry no rows; they export as a two-line summary.
fn profit_report_csv(revenue: f64, expenses: f64) -> Result<String, AppError> {
    let mut wtr = writer();
    wtr.write_record(["Receita", "Despesas", "Lucro Líquido"])?;
    wtr.write_record([amount(revenue), amount(expenses), amount(revenue - expenses)])?;
    finish(wtr)
}

pub fn report_csv(report: &Report) -> Result<String, AppError> {
    match report {
        Report::Sales(r) => sales_report_csv(&r.sales),
        Report::Expenses(r) => expenses_report_csv(&r.expenses),
        Report::Products(r) => products_report_csv(&r.products),
        Report::Profit(r) => profit_report_csv(r.revenue, r.expenses),
    }
}

pub fn report_file_name(kind: ReportKind, at: DateTime<Utc>) -> String {
    format!("relatorio_{}_{}.csv", kind.as_str(), at.timestamp_millis())
}

// ---- listings ----

pub fn customers_csv(customers: &[Customer]) -> Result<String, AppError> {
    write_table(CUSTOMER_HEADERS, customers, |c| {
        [
            c.id.to_string(),
            c.name.clone(),
            c.store_number.clone(),
            c.address.clone(),
            c.phone.clone(),
            c.email.clone().unwrap_or_default(),
            c.cnpj.clone().unwrap_or_default(),
            c.group.clone().unwrap_or_default(),
        ]
    })
}

pub fn suppliers_csv(suppliers: &[Supplier]) -> Result<String, AppError> {
    write_table(SUPPLIER_HEADERS, suppliers, |s| {
        [s.id.to_string(), s.name.clone(), s.cnpj.clone()]
    })
}

/// Write a file, creating its parent directory first.
pub async fn save(path: &Path, contents: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    tracing::info!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
