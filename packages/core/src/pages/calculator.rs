use chrono::Local;

use crate::alerts::{Alert, AlertLevel};
use crate::error::AppError;
use crate::format::{format_brl, format_number};
use crate::margin::{self, MarginCalculation, QuantitySimulation};
use crate::services::CrmClient;
use crate::store::{CalculationHistory, HistoryFile};
use crate::table::TableView;

pub const MSG_HISTORY_CLEARED: &str = "Histórico limpo com sucesso";
pub const MSG_HISTORY_EMPTY: &str = "Nenhum cálculo realizado ainda";
pub const MSG_SERVER_CHECK_FAILED: &str = "Erro ao calcular margem no servidor.";

/// Cells in the text progress bar.
const BAR_WIDTH: usize = 20;

/// Largest difference, in percentage points, still reported as agreement.
const SERVER_TOLERANCE: f64 = 0.01;

pub struct CalculatorPage {
    file: HistoryFile,
    history: CalculationHistory,
    last: Option<MarginCalculation>,
}

impl CalculatorPage {
    pub async fn open(file: HistoryFile) -> Result<Self, AppError> {
        let history = file.load().await?;
        Ok(Self {
            file,
            history,
            last: None,
        })
    }

    pub fn history(&self) -> &CalculationHistory {
        &self.history
    }

    pub fn last(&self) -> Option<&MarginCalculation> {
        self.last.as_ref()
    }

    async fn remember(&mut self, calc: MarginCalculation) {
        if self.history.record(calc.clone()) {
            if let Err(err) = self.file.save(&self.history).await {
                tracing::warn!("Could not save calculator history: {}", err);
            }
        }
        self.last = Some(calc);
    }

    /// Margin from cost and sale price. The alert carries the band's level
    /// and its advice.
    pub async fn calculate(&mut self, cost: f64, sale: f64) -> Alert {
        match margin::calculate(cost, sale) {
            Ok(calc) => {
                let band = calc.band();
                let alert = Alert::new(
                    band.level(),
                    format!("Margem de {}%. {}", format_number(calc.margin, 1), band.analysis()),
                );
                self.remember(calc).await;
                alert
            }
            Err(err) => Alert::warning(err.to_string()),
        }
    }

    /// Sale price for a desired margin.
    pub async fn reverse(&mut self, cost: f64, desired_margin: f64) -> Alert {
        match margin::reverse(cost, desired_margin) {
            Ok(calc) => {
                let alert = Alert::success(format!("Preço de venda calculado: {}", format_brl(calc.sale)));
                self.remember(calc).await;
                alert
            }
            Err(err) => Alert::warning(err.to_string()),
        }
    }

    /// Investment and profit for `quantity` units of the last calculation.
    pub fn simulate(&self, quantity: i64) -> Option<QuantitySimulation> {
        self.last.as_ref().map(|calc| margin::simulate_quantity(calc, quantity))
    }

    /// Ask the backend for the same margin and compare.
    pub async fn check_on_server(&self, client: &CrmClient) -> Alert {
        let Some(calc) = &self.last else {
            return Alert::warning("Calcule uma margem primeiro");
        };
        match client.check_margin(calc.cost, calc.sale).await {
            Ok(server) if (server.margin - calc.margin).abs() <= SERVER_TOLERANCE => Alert::success(format!(
                "Servidor confirma margem de {}%",
                format_number(server.margin, 2)
            )),
            Ok(server) => {
                tracing::warn!("Server margin {} differs from local {}", server.margin, calc.margin);
                Alert::warning(format!(
                    "Servidor calculou margem de {}% (local: {}%)",
                    format_number(server.margin, 2),
                    format_number(calc.margin, 2)
                ))
            }
            Err(err) => Alert::from_error(&err, MSG_SERVER_CHECK_FAILED),
        }
    }

    pub async fn clear_history(&mut self) -> Alert {
        self.history.clear();
        match self.file.clear().await {
            Ok(()) => Alert::success(MSG_HISTORY_CLEARED),
            Err(err) => Alert::from_error(&err, "Erro ao limpar histórico"),
        }
    }

    pub fn result_text(&self) -> Option<String> {
        let calc = self.last.as_ref()?;
        let filled = (calc.progress() / 100.0 * BAR_WIDTH as f64).round() as usize;
        Some(format!(
            "Compra: {}\nVenda:  {}\nLucro:  {}\nMargem: {}%\n[{}{}]",
            format_brl(calc.cost),
            format_brl(calc.sale),
            format_brl(calc.profit),
            format_number(calc.margin, 1),
            "#".repeat(filled),
            ".".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
        ))
    }

    pub fn history_table(&self) -> TableView {
        let mut table = TableView::new(["Data", "Compra", "Venda", "Lucro", "Margem"], MSG_HISTORY_EMPTY);
        for calc in self.history.entries() {
            table.push_row(vec![
                calc.timestamp
                    .with_timezone(&Local)
                    .format("%d/%m/%Y %H:%M:%S")
                    .to_string(),
                format_brl(calc.cost),
                format_brl(calc.sale),
                format_brl(calc.profit),
                format!("{}%", format_number(calc.margin, 1)),
            ]);
        }
        table
    }

    pub fn result_level(&self) -> Option<AlertLevel> {
        self.last.as_ref().map(|c| c.band().level())
    }
}
