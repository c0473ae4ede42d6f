use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::wire;
use crate::format::date::br_date_opt;
use crate::validation::{FormErrors, Required, ValidCnpj, ValidEmail, ValidPhone};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "numero_loja", deserialize_with = "wire::string_or_number", default)]
    pub store_number: String,
    #[serde(rename = "endereco", default)]
    pub address: String,
    #[serde(rename = "telefone", default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "observacoes", default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(rename = "grupo", default)]
    pub group: Option<String>,
    #[serde(rename = "data_cadastro", with = "br_date_opt", default)]
    pub registered_on: Option<NaiveDate>,
}

impl Customer {
    /// `"Mercado Central - Loja 12"`, the label used in sale listings.
    pub fn display_name(&self) -> String {
        if self.store_number.is_empty() {
            self.name.clone()
        } else {
            format!("{} - Loja {}", self.name, self.store_number)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerForm {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "numero_loja")]
    pub store_number: String,
    #[serde(rename = "endereco")]
    pub address: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "observacoes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(rename = "grupo", skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl CustomerForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        let required = Required::new();

        errors.check("nome", &required, self.name.as_str());
        errors.check("numero_loja", &required, self.store_number.as_str());
        errors.check("endereco", &required, self.address.as_str());
        if errors.check("telefone", &required, self.phone.as_str()) {
            errors.check("telefone", &ValidPhone, self.phone.as_str());
        }
        if let Some(email) = &self.email {
            errors.check("email", &ValidEmail, email.as_str());
        }
        if let Some(cnpj) = &self.cnpj {
            errors.check("cnpj", &ValidCnpj, cnpj.as_str());
        }

        errors.into_result()
    }
}

impl From<&Customer> for CustomerForm {
    fn from(c: &Customer) -> Self {
        Self {
            name: c.name.clone(),
            store_number: c.store_number.clone(),
            address: c.address.clone(),
            phone: c.phone.clone(),
            email: c.email.clone(),
            notes: c.notes.clone(),
            cnpj: c.cnpj.clone(),
            group: c.group.clone(),
        }
    }
}
