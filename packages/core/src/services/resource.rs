//! Backend collections and the query parameters their listings accept.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::format::date::{format_date, DateStyle};
use crate::models::{
    Customer, CustomerForm, Expense, ExpenseForm, PaymentStatus, Product, ProductForm, Sale,
    SaleForm, Supplier, SupplierForm,
};

/// A REST collection: `GET/POST {PATH}` and `GET/PUT/DELETE {PATH}/{id}`.
pub trait Resource {
    type Record: DeserializeOwned + Send;
    type Form: Serialize + Sync;

    const PATH: &'static str;
    /// Singular noun used in log lines.
    const LABEL: &'static str;
}

/// Collections whose records carry a payment status that can be PATCHed
/// on its own.
pub trait StatusResource: Resource {
    const STATUS_FIELD: &'static str;
}

pub struct Customers;
pub struct Suppliers;
pub struct Products;
pub struct Sales;
pub struct Expenses;

impl Resource for Customers {
    type Record = Customer;
    type Form = CustomerForm;
    const PATH: &'static str = "/api/clientes";
    const LABEL: &'static str = "cliente";
}

impl Resource for Suppliers {
    type Record = Supplier;
    type Form = SupplierForm;
    const PATH: &'static str = "/api/fornecedores";
    const LABEL: &'static str = "fornecedor";
}

impl Resource for Products {
    type Record = Product;
    type Form = ProductForm;
    const PATH: &'static str = "/api/produtos";
    const LABEL: &'static str = "produto";
}

impl Resource for Sales {
    type Record = Sale;
    type Form = SaleForm;
    const PATH: &'static str = "/api/vendas";
    const LABEL: &'static str = "venda";
}

impl StatusResource for Sales {
    const STATUS_FIELD: &'static str = "status_pagamento";
}

impl Resource for Expenses {
    type Record = Expense;
    type Form = ExpenseForm;
    const PATH: &'static str = "/api/despesas";
    const LABEL: &'static str = "despesa";
}

impl StatusResource for Expenses {
    const STATUS_FIELD: &'static str = "status";
}

pub type QueryParams = Vec<(&'static str, String)>;

fn push_date(params: &mut QueryParams, key: &'static str, date: Option<NaiveDate>) {
    if let Some(d) = date {
        params.push((key, format_date(d, DateStyle::Iso)));
    }
}

fn push_text(params: &mut QueryParams, key: &'static str, value: &Option<String>) {
    if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        params.push((key, v.to_string()));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    pub term: Option<String>,
    pub group: Option<String>,
}

impl CustomerQuery {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_text(&mut params, "termo", &self.term);
        push_text(&mut params, "grupo", &self.group);
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub customer_id: Option<i64>,
    pub status: Option<PaymentStatus>,
    pub bonus_only: bool,
}

impl SaleQuery {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_date(&mut params, "data_inicio", self.start);
        push_date(&mut params, "data_fim", self.end);
        if let Some(id) = self.customer_id {
            params.push(("cliente_id", id.to_string()));
        }
        if let Some(status) = &self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if self.bonus_only {
            params.push(("bonificacao", "true".to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub category: Option<String>,
    pub supplier_id: Option<i64>,
}

impl ExpenseQuery {
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_date(&mut params, "data_inicio", self.start);
        push_date(&mut params, "data_fim", self.end);
        push_text(&mut params, "categoria", &self.category);
        if let Some(id) = self.supplier_id {
            params.push(("fornecedor_id", id.to_string()));
        }
        params
    }
}
