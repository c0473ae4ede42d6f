//! Records exchanged with the backend and the forms that create them.
//!
//! Wire names are the backend's Portuguese keys; Rust fields are English and
//! mapped with `#[serde(rename)]`. Decoding is lenient about the shapes the
//! backend has been seen to send (numbers as strings, flags as `"on"`).

pub mod customer;
pub mod expense;
pub mod product;
pub mod report;
pub mod sale;
pub mod supplier;

use std::fmt;

use serde::{Deserialize, Deserializer};

pub use customer::{Customer, CustomerForm};
pub use expense::{Expense, ExpenseForm, DEFAULT_EXPENSE_CATEGORIES};
pub use product::{Product, ProductForm};
pub use report::{Report, ReportKind, ReportRequest};
pub use sale::{Sale, SaleForm, WALK_IN_CUSTOMER};
pub use supplier::{Supplier, SupplierForm};

/// Payment state of a sale or an expense.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Overdue,
    Cancelled,
    Other(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Paid => "pago",
            PaymentStatus::Pending => "pendente",
            PaymentStatus::Overdue => "atrasado",
            PaymentStatus::Cancelled => "cancelado",
            PaymentStatus::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> String {
        crate::format::text::capitalize(self.as_str())
    }

    /// Badge colour used in listings and reports.
    pub fn color(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "success",
            PaymentStatus::Pending => "warning",
            PaymentStatus::Overdue => "danger",
            PaymentStatus::Cancelled => "secondary",
            PaymentStatus::Other(_) => "primary",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "pago" => PaymentStatus::Paid,
            "pendente" => PaymentStatus::Pending,
            "atrasado" => PaymentStatus::Overdue,
            "cancelado" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Other(raw),
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(raw: &str) -> Self {
        PaymentStatus::from(raw.to_string())
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode helpers for loosely typed backend fields.
pub(crate) mod wire {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    /// String field the backend sometimes sends as a number; `null` → `""`.
    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Scalar>::deserialize(deserializer)? {
            None => String::new(),
            Some(Scalar::Text(s)) => s,
            Some(Scalar::Int(n)) => n.to_string(),
            Some(Scalar::Float(n)) => n.to_string(),
            Some(Scalar::Bool(b)) => b.to_string(),
        })
    }

    /// Optional id that may arrive as a number, a numeric string or `""`.
    pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Scalar>::deserialize(deserializer)? {
            Some(Scalar::Int(n)) => Some(n),
            Some(Scalar::Float(n)) => Some(n as i64),
            Some(Scalar::Text(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Checkbox-style flag: `true`, `"on"`, `"true"`, `"1"` or `1`.
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Scalar>::deserialize(deserializer)? {
            Some(Scalar::Bool(b)) => b,
            Some(Scalar::Int(n)) => n != 0,
            Some(Scalar::Float(n)) => n != 0.0,
            Some(Scalar::Text(s)) => {
                matches!(s.trim().to_lowercase().as_str(), "on" | "true" | "1" | "sim")
            }
            None => false,
        })
    }

    pub fn is_false(value: &bool) -> bool {
        !*value
    }
}
