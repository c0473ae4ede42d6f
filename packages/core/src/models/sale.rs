use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{wire, PaymentStatus};
use crate::format::currency::{deserialize_amount, serialize_plain};
use crate::format::date::{br_date, br_date_opt};
use crate::validation::{FormErrors, NotFuture, Positive, Required, MSG_REQUIRED};

/// Recipient shown for sales with neither a customer nor a typed recipient.
pub const WALK_IN_CUSTOMER: &str = "Cliente Avulso";

pub const MSG_CUSTOMER_OR_RECIPIENT: &str = "Selecione um cliente ou informe o destinatário";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    #[serde(rename = "numero_nota", deserialize_with = "wire::string_or_number", default)]
    pub invoice_number: String,
    #[serde(rename = "data_saida", with = "br_date")]
    pub exit_date: NaiveDate,
    #[serde(rename = "cliente_id", deserialize_with = "wire::optional_id", default)]
    pub customer_id: Option<i64>,
    #[serde(rename = "cliente_nome", default)]
    pub customer_name: Option<String>,
    #[serde(rename = "destinatario", default)]
    pub recipient: Option<String>,
    #[serde(rename = "valor", deserialize_with = "deserialize_amount")]
    pub amount: f64,
    #[serde(rename = "forma_pagamento", default)]
    pub payment_method: String,
    #[serde(rename = "data_vencimento", with = "br_date_opt", default)]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "status_pagamento", default)]
    pub status: PaymentStatus,
    #[serde(rename = "bonificacao", deserialize_with = "wire::flag", default)]
    pub bonus: bool,
}

impl Sale {
    /// Typed recipient first, then the registered customer, then walk-in.
    pub fn recipient_name(&self) -> &str {
        [self.recipient.as_deref(), self.customer_name.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(WALK_IN_CUSTOMER)
    }

    /// Invoice number as an integer, when it is purely numeric.
    pub fn numeric_invoice(&self) -> Option<u64> {
        let trimmed = self.invoice_number.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        trimmed.parse().ok()
    }
}

/// Suggested invoice number for a new sale: highest numeric invoice plus
/// one, zero-padded to six digits.
pub fn next_invoice_number<'a, I>(sales: I) -> String
where
    I: IntoIterator<Item = &'a Sale>,
{
    let highest = sales
        .into_iter()
        .filter_map(Sale::numeric_invoice)
        .max()
        .unwrap_or(0);
    format!("{:06}", highest.saturating_add(1))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleForm {
    #[serde(rename = "numero_nota")]
    pub invoice_number: String,
    #[serde(rename = "data_saida", with = "br_date")]
    pub exit_date: NaiveDate,
    #[serde(rename = "cliente_id", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    /// Only sent for walk-in sales.
    #[serde(rename = "destinatario", skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(rename = "valor", serialize_with = "serialize_plain")]
    pub amount: f64,
    #[serde(rename = "forma_pagamento")]
    pub payment_method: String,
    #[serde(rename = "data_vencimento", with = "br_date_opt")]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "status_pagamento")]
    pub status: PaymentStatus,
    #[serde(rename = "bonificacao")]
    pub bonus: bool,
}

impl SaleForm {
    pub fn new(invoice_number: impl Into<String>, exit_date: NaiveDate, amount: f64) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            exit_date,
            customer_id: None,
            recipient: None,
            amount,
            payment_method: String::new(),
            due_date: None,
            status: PaymentStatus::Pending,
            bonus: false,
        }
    }

    /// A registered customer replaces any typed recipient.
    pub fn with_customer(mut self, customer_id: Option<i64>, recipient: Option<String>) -> Self {
        self.customer_id = customer_id;
        self.recipient = match customer_id {
            Some(_) => None,
            None => recipient.filter(|r| !r.trim().is_empty()),
        };
        self
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check("numero_nota", &Required::new(), self.invoice_number.as_str());
        errors.check("data_saida", &NotFuture { today }, &self.exit_date);
        if self.customer_id.is_none() && self.recipient.is_none() {
            errors.push("destinatario", MSG_CUSTOMER_OR_RECIPIENT);
        }
        errors.check("valor", &Positive, &self.amount);
        if self.payment_method.trim().is_empty() {
            errors.push("forma_pagamento", MSG_REQUIRED);
        }
        errors.into_result()
    }
}

impl From<&Sale> for SaleForm {
    fn from(s: &Sale) -> Self {
        Self {
            invoice_number: s.invoice_number.clone(),
            exit_date: s.exit_date,
            customer_id: s.customer_id,
            recipient: s.recipient.clone(),
            amount: s.amount,
            payment_method: s.payment_method.clone(),
            due_date: s.due_date,
            status: s.status.clone(),
            bonus: s.bonus,
        }
        .with_customer(s.customer_id, s.recipient.clone())
    }
}
