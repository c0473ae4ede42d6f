use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::wire;
use crate::format::currency::deserialize_amount;
use crate::format::date::br_date_opt;
use crate::margin::quick_margin;
use crate::validation::{FormErrors, Positive, Required, MSG_REQUIRED, MSG_SALE_BELOW_COST};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "valor_compra", deserialize_with = "deserialize_amount")]
    pub cost: f64,
    #[serde(rename = "valor_venda", deserialize_with = "deserialize_amount")]
    pub price: f64,
    #[serde(rename = "id_fornecedor", deserialize_with = "wire::optional_id", default)]
    pub supplier_id: Option<i64>,
    #[serde(rename = "fornecedor_nome", default)]
    pub supplier_name: Option<String>,
    #[serde(rename = "data_cadastro", with = "br_date_opt", default)]
    pub registered_on: Option<NaiveDate>,
}

impl Product {
    pub fn margin(&self) -> f64 {
        quick_margin(self.cost, self.price)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductForm {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "valor_compra")]
    pub cost: f64,
    #[serde(rename = "valor_venda")]
    pub price: f64,
    #[serde(rename = "id_fornecedor")]
    pub supplier_id: Option<i64>,
}

impl ProductForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check("nome", &Required::new(), self.name.as_str());
        let cost_ok = errors.check("valor_compra", &Positive, &self.cost);
        let price_ok = errors.check("valor_venda", &Positive, &self.price);
        if cost_ok && price_ok && self.price <= self.cost {
            errors.push("valor_venda", MSG_SALE_BELOW_COST);
        }
        if self.supplier_id.is_none() {
            errors.push("id_fornecedor", MSG_REQUIRED);
        }
        errors.into_result()
    }

    /// Margin shown next to the form while the user types.
    pub fn margin_preview(&self) -> f64 {
        quick_margin(self.cost, self.price)
    }
}

impl From<&Product> for ProductForm {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            cost: p.cost,
            price: p.price,
            supplier_id: p.supplier_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::MSG_POSITIVE;

    fn form(cost: f64, price: f64) -> ProductForm {
        ProductForm {
            name: "Farinha 5kg".into(),
            cost,
            price,
            supplier_id: Some(2),
        }
    }

    #[test]
    fn decodes_amounts_in_either_shape() {
        let json = r#"{"id": 1, "nome": "Farinha", "valor_compra": "10,00",
                       "valor_venda": 15, "id_fornecedor": "2"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.cost, 10.0);
        assert_eq!(product.supplier_id, Some(2));
        assert!((product.margin() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn sale_price_must_exceed_cost() {
        let errors = form(10.0, 10.0).validate().unwrap_err();
        assert_eq!(errors.message_for("valor_venda"), Some(MSG_SALE_BELOW_COST));
        assert!(form(10.0, 12.0).validate().is_ok());
    }

    #[test]
    fn non_positive_amounts_skip_the_comparison() {
        let errors = form(0.0, 5.0).validate().unwrap_err();
        assert_eq!(errors.message_for("valor_compra"), Some(MSG_POSITIVE));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn supplier_is_required() {
        let errors = ProductForm {
            supplier_id: None,
            ..form(1.0, 2.0)
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.message_for("id_fornecedor"), Some(MSG_REQUIRED));
    }

    #[test]
    fn preview_is_zero_until_price_beats_cost() {
        assert_eq!(form(10.0, 9.0).margin_preview(), 0.0);
        assert!((form(10.0, 13.0).margin_preview() - 30.0).abs() < 1e-9);
    }
}
