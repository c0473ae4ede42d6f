use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{wire, PaymentStatus};
use crate::format::currency::{deserialize_amount, serialize_plain};
use crate::format::date::{br_date, br_date_opt};
use crate::validation::{FormErrors, NotFuture, Positive, Required};

pub const DEFAULT_EXPENSE_CATEGORIES: [&str; 10] = [
    "Combustível",
    "Manutenção",
    "Salários",
    "Aluguel",
    "Energia",
    "Telefone/Internet",
    "Impostos",
    "Material de Escritório",
    "Marketing",
    "Outros",
];

pub const MSG_SUPPLIER_REQUIRED: &str = "Por favor, selecione um fornecedor.";
pub const MSG_DUE_DATE_REQUIRED: &str = "Por favor, informe a data de vencimento.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valor", deserialize_with = "deserialize_amount")]
    pub amount: f64,
    #[serde(rename = "data", with = "br_date")]
    pub date: NaiveDate,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(rename = "fornecedor_id", deserialize_with = "wire::optional_id", default)]
    pub supplier_id: Option<i64>,
    #[serde(rename = "fornecedor_nome", default)]
    pub supplier_name: Option<String>,
    #[serde(rename = "numero_nota", default)]
    pub invoice_number: Option<String>,
    #[serde(rename = "vencimento", with = "br_date_opt", default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseForm {
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valor", serialize_with = "serialize_plain")]
    pub amount: f64,
    #[serde(rename = "data", with = "br_date")]
    pub date: NaiveDate,
    #[serde(rename = "categoria")]
    pub category: String,
    pub status: PaymentStatus,
    #[serde(rename = "fornecedor_id")]
    pub supplier_id: Option<i64>,
    #[serde(rename = "numero_nota")]
    pub invoice_number: String,
    #[serde(rename = "vencimento", with = "br_date_opt")]
    pub due_date: Option<NaiveDate>,
    /// "Associate supplier" checkbox; supplier fields are sent only when set.
    #[serde(skip)]
    pub link_supplier: bool,
    /// "Has due date" checkbox.
    #[serde(skip)]
    pub has_due_date: bool,
}

impl ExpenseForm {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        date: NaiveDate,
        category: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
            category: category.into(),
            status: PaymentStatus::Pending,
            supplier_id: None,
            invoice_number: String::new(),
            due_date: None,
            link_supplier: false,
            has_due_date: false,
        }
    }

    pub fn with_supplier(mut self, supplier_id: Option<i64>, invoice_number: impl Into<String>) -> Self {
        self.link_supplier = true;
        self.supplier_id = supplier_id;
        self.invoice_number = invoice_number.into();
        self
    }

    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.has_due_date = true;
        self.due_date = due_date;
        self
    }

    /// Clear the fields whose checkbox is off, so stale values are not sent.
    pub fn normalized(mut self) -> Self {
        if !self.link_supplier {
            self.supplier_id = None;
            self.invoice_number.clear();
        }
        if !self.has_due_date {
            self.due_date = None;
        }
        self
    }

    /// The due date may lie in the future; the expense date may not.
    pub fn validate(&self, today: NaiveDate) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check("descricao", &Required::new(), self.description.as_str());
        errors.check("valor", &Positive, &self.amount);
        errors.check("data", &NotFuture { today }, &self.date);
        errors.check("categoria", &Required::new(), self.category.as_str());
        if self.link_supplier && self.supplier_id.is_none() {
            errors.push("fornecedor_id", MSG_SUPPLIER_REQUIRED);
        }
        if self.has_due_date && self.due_date.is_none() {
            errors.push("vencimento", MSG_DUE_DATE_REQUIRED);
        }
        errors.into_result()
    }
}

impl From<&Expense> for ExpenseForm {
    fn from(e: &Expense) -> Self {
        Self {
            description: e.description.clone(),
            amount: e.amount,
            date: e.date,
            category: e.category.clone(),
            status: e.status.clone(),
            supplier_id: e.supplier_id,
            invoice_number: e.invoice_number.clone().unwrap_or_default(),
            due_date: e.due_date,
            link_supplier: e.supplier_id.is_some(),
            has_due_date: e.due_date.is_some(),
        }
    }
}
