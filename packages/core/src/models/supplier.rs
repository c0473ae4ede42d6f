use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::format::date::br_date_opt;
use crate::format::{mask_cnpj, only_digits};
use crate::validation::{FormErrors, Required, ValidCnpj};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub cnpj: String,
    #[serde(rename = "data_cadastro", with = "br_date_opt", default)]
    pub registered_on: Option<NaiveDate>,
}

impl Supplier {
    pub fn cnpj_digits(&self) -> String {
        only_digits(&self.cnpj)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupplierForm {
    #[serde(rename = "nome")]
    pub name: String,
    pub cnpj: String,
}

impl SupplierForm {
    /// CNPJ is sent masked, whatever the user typed.
    pub fn new(name: impl Into<String>, cnpj: &str) -> Self {
        Self {
            name: name.into(),
            cnpj: mask_cnpj(cnpj),
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check("nome", &Required::new(), self.name.as_str());
        if errors.check("cnpj", &Required::new(), self.cnpj.as_str()) {
            errors.check("cnpj", &ValidCnpj, self.cnpj.as_str());
        }
        errors.into_result()
    }
}
