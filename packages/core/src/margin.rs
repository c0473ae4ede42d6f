//! Margin calculator.
//!
//! Margin is markup over cost: `(sale - cost) / cost * 100`. A sale price at
//! or below cost is rejected rather than reported as a zero or negative
//! margin.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alerts::AlertLevel;
use crate::format::format_brl;

pub const LOW_MARGIN_THRESHOLD: f64 = 15.0;
pub const ACCEPTABLE_MARGIN_THRESHOLD: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarginError {
    #[error("Digite um valor de compra válido")]
    InvalidCost,

    #[error("Digite um valor de venda válido")]
    InvalidSale,

    #[error("O valor de venda deve ser maior que o valor de compra")]
    SaleNotAboveCost,

    #[error("Digite uma margem válida")]
    InvalidMargin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginCalculation {
    #[serde(rename = "valorCompra")]
    pub cost: f64,
    #[serde(rename = "valorVenda")]
    pub sale: f64,
    #[serde(rename = "lucro")]
    pub profit: f64,
    #[serde(rename = "margem")]
    pub margin: f64,
    pub timestamp: DateTime<Utc>,
}

impl MarginCalculation {
    fn new(cost: f64, sale: f64, margin: f64) -> Self {
        Self {
            cost,
            sale,
            profit: sale - cost,
            margin,
            timestamp: Utc::now(),
        }
    }

    pub fn band(&self) -> MarginBand {
        MarginBand::for_margin(self.margin)
    }

    /// Width of the progress bar, in percent.
    pub fn progress(&self) -> f64 {
        self.margin.clamp(0.0, 100.0)
    }
}

fn valid_amount(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

pub fn calculate(cost: f64, sale: f64) -> Result<MarginCalculation, MarginError> {
    if !valid_amount(cost) {
        return Err(MarginError::InvalidCost);
    }
    if !valid_amount(sale) {
        return Err(MarginError::InvalidSale);
    }
    if sale <= cost {
        return Err(MarginError::SaleNotAboveCost);
    }
    Ok(MarginCalculation::new(cost, sale, (sale - cost) / cost * 100.0))
}

/// Sale price that yields `desired_margin` over `cost`.
pub fn reverse(cost: f64, desired_margin: f64) -> Result<MarginCalculation, MarginError> {
    if !valid_amount(cost) {
        return Err(MarginError::InvalidCost);
    }
    if !valid_amount(desired_margin) {
        return Err(MarginError::InvalidMargin);
    }
    let sale = cost * (1.0 + desired_margin / 100.0);
    Ok(MarginCalculation::new(cost, sale, desired_margin))
}

/// Margin for display in lists; `0.0` when the inputs can't form a margin.
pub fn quick_margin(cost: f64, sale: f64) -> f64 {
    calculate(cost, sale).map(|c| c.margin).unwrap_or(0.0)
}

/// Sale price for a margin; `0.0` when either input is not positive.
pub fn price_for_margin(cost: f64, margin: f64) -> f64 {
    reverse(cost, margin).map(|c| c.sale).unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginBand {
    Low,
    Acceptable,
    Excellent,
}

impl MarginBand {
    pub fn for_margin(margin: f64) -> Self {
        if margin < LOW_MARGIN_THRESHOLD {
            MarginBand::Low
        } else if margin < ACCEPTABLE_MARGIN_THRESHOLD {
            MarginBand::Acceptable
        } else {
            MarginBand::Excellent
        }
    }

    pub fn level(self) -> AlertLevel {
        match self {
            MarginBand::Low => AlertLevel::Danger,
            MarginBand::Acceptable => AlertLevel::Warning,
            MarginBand::Excellent => AlertLevel::Success,
        }
    }

    pub fn analysis(self) -> &'static str {
        match self {
            MarginBand::Low => "Margem baixa! Considere revisar seus custos ou ajustar o preço de venda para melhorar a rentabilidade.",
            MarginBand::Acceptable => "Margem aceitável. Monitore regularmente seus custos e explore oportunidades de otimização.",
            MarginBand::Excellent => "Excelente margem! Seu produto tem boa rentabilidade. Considere estratégias de volume de vendas.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantitySimulation {
    pub quantity: u32,
    pub investment: f64,
    pub total_profit: f64,
}

impl fmt::Display for QuantitySimulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} unidades: investimento {}, lucro {}",
            self.quantity,
            format_brl(self.investment),
            format_brl(self.total_profit)
        )
    }
}

pub fn simulate_quantity(calc: &MarginCalculation, quantity: i64) -> QuantitySimulation {
    let quantity = quantity.clamp(1, u32::MAX as i64) as u32;
    QuantitySimulation {
        quantity,
        investment: calc.cost * quantity as f64,
        total_profit: calc.profit * quantity as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn margin_is_markup_over_cost() {
        let calc = calculate(80.0, 100.0).unwrap();
        assert!(approx(calc.profit, 20.0));
        assert!(approx(calc.margin, 25.0));
        assert_eq!(calc.band(), MarginBand::Acceptable);
    }

    #[test]
    fn invalid_inputs_are_reported_in_order() {
        assert_eq!(calculate(0.0, 10.0), Err(MarginError::InvalidCost));
        assert_eq!(calculate(-1.0, -1.0), Err(MarginError::InvalidCost));
        assert_eq!(calculate(10.0, 0.0), Err(MarginError::InvalidSale));
        assert_eq!(calculate(10.0, 10.0), Err(MarginError::SaleNotAboveCost));
        assert_eq!(calculate(f64::NAN, 10.0), Err(MarginError::InvalidCost));
    }

    #[test]
    fn error_messages_are_user_facing() {
        assert_eq!(
            MarginError::SaleNotAboveCost.to_string(),
            "O valor de venda deve ser maior que o valor de compra"
        );
    }

    #[test]
    fn reverse_finds_sale_price() {
        let calc = reverse(50.0, 40.0).unwrap();
        assert!(approx(calc.sale, 70.0));
        assert!(approx(calc.profit, 20.0));
        assert_eq!(reverse(50.0, 0.0), Err(MarginError::InvalidMargin));
        assert_eq!(reverse(0.0, 10.0), Err(MarginError::InvalidCost));
    }

    #[test]
    fn reverse_then_forward_agree() {
        let back = reverse(37.5, 22.0).unwrap();
        let forward = calculate(back.cost, back.sale).unwrap();
        assert!((forward.margin - 22.0).abs() < 1e-9);
    }

    #[test]
    fn quick_helpers_fall_back_to_zero() {
        assert!(approx(quick_margin(10.0, 15.0), 50.0));
        assert_eq!(quick_margin(10.0, 5.0), 0.0);
        assert!(approx(price_for_margin(10.0, 50.0), 15.0));
        assert_eq!(price_for_margin(10.0, -5.0), 0.0);
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(MarginBand::for_margin(14.99), MarginBand::Low);
        assert_eq!(MarginBand::for_margin(15.0), MarginBand::Acceptable);
        assert_eq!(MarginBand::for_margin(29.99), MarginBand::Acceptable);
        assert_eq!(MarginBand::for_margin(30.0), MarginBand::Excellent);
        assert_eq!(MarginBand::Low.level(), AlertLevel::Danger);
        assert!(MarginBand::Excellent.analysis().starts_with("Excelente"));
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(calculate(10.0, 50.0).unwrap().progress(), 100.0);
        assert!(approx(calculate(10.0, 11.0).unwrap().progress(), 10.0));
    }

    #[test]
    fn quantity_below_one_counts_as_one() {
        let calc = calculate(8.0, 10.0).unwrap();
        let sim = simulate_quantity(&calc, 0);
        assert_eq!(sim.quantity, 1);
        assert!(approx(sim.investment, 8.0));

        let sim = simulate_quantity(&calc, 12);
        assert!(approx(sim.investment, 96.0));
        assert!(approx(sim.total_profit, 24.0));
    }
}
