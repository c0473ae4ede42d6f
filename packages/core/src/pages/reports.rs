use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::alerts::Alert;
use crate::error::AppError;
use crate::export;
use crate::format::{format_brl, format_number};
use crate::models::report::{
    average_margin, expenses_by_category, sales_by_payment_method, sales_by_status, top_customers,
    top_products_by_margin, GroupTotal, TOP_CUSTOMERS, TOP_PRODUCTS,
};
use crate::models::{Report, ReportRequest};
use crate::services::CrmClient;
use crate::table::TableView;

use super::outcome;

pub const MSG_GENERATED: &str = "Relatório gerado com sucesso!";
pub const MSG_GENERATE_FAILED: &str = "Erro ao gerar relatório";
pub const MSG_GENERATE_FIRST: &str = "Gere um relatório primeiro";
pub const MSG_EXPORTED: &str = "Relatório exportado com sucesso!";
pub const MSG_EXPORT_FAILED: &str = "Erro ao exportar relatório";

#[derive(Debug, Default)]
pub struct ReportsPage {
    last: Option<Report>,
}

fn group_table(title: &str, groups: &[GroupTotal]) -> TableView {
    let mut table = TableView::new([title, "Qtd", "Valor"], "Sem dados no período");
    for g in groups {
        table.push_row(vec![g.label.clone(), g.count.to_string(), format_brl(g.amount)]);
    }
    table
}

impl ReportsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report(report: Report) -> Self {
        Self { last: Some(report) }
    }

    pub fn last(&self) -> Option<&Report> {
        self.last.as_ref()
    }

    /// Validation problems come back one at a time, as the form shows them.
    pub async fn generate(&mut self, client: &CrmClient, request: &ReportRequest) -> Alert {
        let (kind, start, end) = match request.validate() {
            Ok(valid) => valid,
            Err(errors) => {
                let message = errors
                    .iter()
                    .next()
                    .map(|e| e.message.clone())
                    .unwrap_or_default();
                return Alert::warning(message);
            }
        };

        match client.generate_report(kind, start, end).await {
            Ok(report) => {
                tracing::info!("Generated {} report", kind);
                self.last = Some(report);
                Alert::success(MSG_GENERATED)
            }
            Err(err) => Alert::from_error(&err, MSG_GENERATE_FAILED),
        }
    }

    /// Derived tables for the last report, as printable text.
    pub fn summary(&self) -> Option<String> {
        let report = self.last.as_ref()?;
        let mut out = String::new();
        match report {
            Report::Sales(r) => {
                out.push_str(&format!(
                    "Vendas: {} | Valor total: {}\n\n",
                    r.count,
                    format_brl(r.total)
                ));
                out.push_str(&group_table("Forma de pagamento", &sales_by_payment_method(&r.sales)).to_string());
                let by_status: Vec<GroupTotal> = sales_by_status(&r.sales)
                    .into_iter()
                    .map(|(status, g)| GroupTotal {
                        label: status.label(),
                        ..g
                    })
                    .collect();
                out.push('\n');
                out.push_str(&group_table("Status", &by_status).to_string());
                out.push('\n');
                out.push_str(&group_table("Cliente", &top_customers(&r.sales, TOP_CUSTOMERS)).to_string());
            }
            Report::Expenses(r) => {
                out.push_str(&format!(
                    "Despesas: {} | Valor total: {}\n\n",
                    r.count,
                    format_brl(r.total)
                ));
                let mut table = TableView::new(["Categoria", "Valor", "%"], "Sem dados no período");
                for share in expenses_by_category(&r.expenses) {
                    table.push_row(vec![
                        share.category,
                        format_brl(share.amount),
                        format_number(share.share, 1),
                    ]);
                }
                out.push_str(&table.to_string());
            }
            Report::Products(r) => {
                let margin = if r.products.is_empty() {
                    r.average_margin
                } else {
                    average_margin(&r.products)
                };
                out.push_str(&format!(
                    "Produtos: {} | Margem média: {}%\n\n",
                    r.count,
                    format_number(margin, 2)
                ));
                let mut table = TableView::new(["Produto", "Compra", "Venda", "Margem"], "Nenhum produto");
                for p in top_products_by_margin(&r.products, TOP_PRODUCTS) {
                    table.push_row(vec![
                        p.name.clone(),
                        format_brl(p.cost),
                        format_brl(p.price),
                        format!("{}%", format_number(p.margin(), 2)),
                    ]);
                }
                out.push_str(&table.to_string());
            }
            Report::Profit(r) => {
                out.push_str(&format!("Receita:        {}\n", format_brl(r.revenue)));
                out.push_str(&format!("Despesas:       {}\n", format_brl(r.expenses)));
                out.push_str(&format!("Lucro líquido:  {}\n", format_brl(r.net_profit())));
            }
        }
        Some(out)
    }

    pub async fn export_csv(&self, dir: &Path, at: DateTime<Utc>) -> Alert {
        let Some(report) = &self.last else {
            return Alert::warning(MSG_GENERATE_FIRST);
        };
        let target: PathBuf = dir.join(export::report_file_name(report.kind(), at));
        let result: Result<(), AppError> = async {
            let csv = export::report_csv(report)?;
            export::save(&target, csv.as_bytes()).await
        }
        .await;
        outcome(result, MSG_EXPORTED, MSG_EXPORT_FAILED)
    }
}
