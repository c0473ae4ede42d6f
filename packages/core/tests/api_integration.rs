//! Integration tests against a stubbed CRM backend.
//!
//! Each test starts a wiremock server standing in for the backend and drives
//! the real `CrmClient` and page controllers against it. No live backend is
//! needed.

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, body_string_contains, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use distributor_crm::alerts::{Alert, AlertLevel};
use distributor_crm::error::AppError;
use distributor_crm::models::{
    ExpenseForm, PaymentStatus, ReportKind, ReportRequest, SaleForm, WALK_IN_CUSTOMER,
};
use distributor_crm::pages::{
    self, CalculatorPage, CustomersPage, DashboardPage, ExpensesPage, ProductsPage, ReportsPage, SalesPage,
};
use distributor_crm::services::resource::{CustomerQuery, SaleQuery};
use distributor_crm::services::{CrmClient, Customers};
use distributor_crm::store::HistoryFile;

// ---- Helpers ----------------------------------------------------------------

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn client_for(server: &MockServer) -> CrmClient {
    CrmClient::new(server.uri(), Duration::from_secs(5)).unwrap()
}

/// Stub an empty listing, used by the reload that follows a successful save.
async fn mount_empty_list(server: &MockServer, list_path: &str) {
    Mock::given(method("GET"))
        .and(path(list_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

fn customers_body() -> serde_json::Value {
    json!([
        {
            "id": 1,
            "nome": "Mercado São José",
            "numero_loja": 12,
            "endereco": "Rua A, 1",
            "telefone": "11987654321",
            "grupo": "Varejo",
            "data_cadastro": "05/01/2024"
        },
        {
            "id": 2,
            "nome": "Padaria Central",
            "numero_loja": "3",
            "endereco": "Rua B, 2",
            "telefone": "1133334444"
        }
    ])
}

fn sales_body() -> serde_json::Value {
    json!([
        {
            "id": 10,
            "numero_nota": "000041",
            "data_saida": "02/05/2024",
            "cliente_id": 1,
            "valor": "1.500,00",
            "forma_pagamento": "30 dias",
            "status_pagamento": "pendente",
            "bonificacao": false
        },
        {
            "id": 11,
            "numero_nota": 42,
            "data_saida": "03/05/2024",
            "destinatario": "Balcão",
            "valor": 80.5,
            "forma_pagamento": "PIX",
            "status_pagamento": "pago",
            "bonificacao": "on"
        }
    ])
}

// ---- Listings ---------------------------------------------------------------

#[tokio::test]
async fn customer_listing_sends_query_and_decodes_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clientes"))
        .and(query_param("grupo", "Varejo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customers_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut page = CustomersPage::new();
    page.set_query(CustomerQuery {
        term: None,
        group: Some("Varejo".into()),
    });

    assert!(page.load(&client).await.is_none());
    assert_eq!(page.rows().len(), 2);
    assert_eq!(page.rows()[0].store_number, "12");
    assert_eq!(page.rows()[0].registered_on, Some(day(2024, 1, 5)));

    let text = page.table().to_string();
    assert!(text.contains("(11) 98765-4321"));
    assert_eq!(page.count_label(), "Total: 2");
}

#[tokio::test]
async fn sales_listing_resolves_customer_names_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/vendas"))
        .and(query_param("data_inicio", "2024-05-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sales_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/clientes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customers_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut page = SalesPage::new();
    page.set_query(SaleQuery {
        start: Some(day(2024, 5, 1)),
        ..SaleQuery::default()
    });

    assert!(page.load(&client).await.is_none());
    // The customer table is still fresh; no second fetch.
    page.refresh(&client).await.unwrap();

    let rows = page.rows();
    assert_eq!(rows[0].amount, 1500.0);
    assert!(rows[1].bonus);
    assert_eq!(page.recipient_label(&rows[0]), "Mercado São José - Loja 12");
    assert_eq!(page.totals().amount, 1580.5);
    assert_eq!(page.next_invoice_number(), "000043");
}

#[tokio::test]
async fn sales_listing_survives_failed_customer_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/vendas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sales_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/clientes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut page = SalesPage::new();

    assert!(page.load(&client).await.is_none());
    let rows = page.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(page.recipient_label(&rows[0]), WALK_IN_CUSTOMER);
    assert_eq!(page.recipient_label(&rows[1]), "Balcão");
}

#[tokio::test]
async fn product_and_expense_listings_survive_failed_supplier_lookup() {
    let server = MockServer::start().await;
    mount_empty_list(&server, "/api/produtos").await;
    mount_empty_list(&server, "/api/despesas").await;
    Mock::given(method("GET"))
        .and(path("/api/fornecedores"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(ProductsPage::new().load(&client).await.is_none());
    assert!(ExpensesPage::new().load(&client).await.is_none());
}

#[tokio::test]
async fn missing_record_is_http_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clientes/99"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = client_for(&server).get::<Customers>(99).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn unreachable_backend_reports_load_failure() {
    let client = CrmClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
    let alert = CustomersPage::new().load(&client).await.unwrap();
    assert_eq!(alert, Alert::danger(pages::customers::MESSAGES.load_failed));
}

// ---- Saving -----------------------------------------------------------------

#[tokio::test]
async fn sale_is_posted_with_brazilian_amount_and_dates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/vendas"))
        .and(body_partial_json(json!({
            "numero_nota": "000010",
            "data_saida": "02/05/2024",
            "destinatario": "Balcão",
            "valor": "1.234,50",
            "forma_pagamento": "PIX",
            "status_pagamento": "pendente"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true, "id": 12})))
        .expect(1)
        .mount(&server)
        .await;
    mount_empty_list(&server, "/api/vendas").await;
    mount_empty_list(&server, "/api/clientes").await;

    let mut form = SaleForm::new("000010", day(2024, 5, 2), 1234.5).with_customer(None, Some("Balcão".into()));
    form.payment_method = "PIX".into();

    let alert = SalesPage::new()
        .save(&client_for(&server), None, &form, day(2024, 5, 3))
        .await;
    assert_eq!(alert, Alert::success(pages::sales::MESSAGES.created));
}

#[tokio::test]
async fn invalid_sale_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let form = SaleForm::new("", day(2024, 5, 2), 0.0);
    let alert = SalesPage::new()
        .save(&client_for(&server), None, &form, day(2024, 5, 3))
        .await;
    assert_eq!(alert.level, AlertLevel::Warning);
    assert!(alert.message.contains("numero_nota"));
}

#[tokio::test]
async fn backend_refusal_shows_its_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/despesas/4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": "Despesa não encontrada"})),
        )
        .mount(&server)
        .await;

    let form = ExpenseForm::new("Diesel", 300.0, day(2024, 5, 2), "Combustível");
    let alert = ExpensesPage::new()
        .save(&client_for(&server), Some(4), form, day(2024, 5, 3))
        .await;
    assert_eq!(alert, Alert::danger("Despesa não encontrada"));
}

#[tokio::test]
async fn unchecked_expense_sections_send_no_stale_values() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/despesas"))
        .and(body_partial_json(json!({
            "descricao": "Diesel",
            "valor": "300,00",
            "data": "02/05/2024",
            "fornecedor_id": null,
            "numero_nota": "",
            "vencimento": null
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    mount_empty_list(&server, "/api/despesas").await;
    mount_empty_list(&server, "/api/fornecedores").await;

    let mut form = ExpenseForm::new("Diesel", 300.0, day(2024, 5, 2), "Combustível");
    // Typed, then unchecked.
    form.supplier_id = Some(3);
    form.invoice_number = "NF-9".into();
    form.due_date = Some(day(2024, 6, 1));

    let alert = ExpensesPage::new()
        .save(&client_for(&server), None, form, day(2024, 5, 3))
        .await;
    assert!(alert.is_success(), "{}", alert);
}

#[tokio::test]
async fn status_change_patches_only_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/vendas/10"))
        .and(body_partial_json(json!({"status_pagamento": "pago"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let alert = SalesPage::new()
        .set_status(&client_for(&server), 10, PaymentStatus::Paid)
        .await;
    assert_eq!(alert, Alert::success(pages::sales::MSG_STATUS_UPDATED));
}

// ---- Spreadsheets -----------------------------------------------------------

#[tokio::test]
async fn sales_import_uploads_file_and_reports_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/importar_vendas_excel"))
        .and(body_string_contains("vendas_maio.xlsx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "vendas_importadas": 3,
            "vendas_com_erro": 1,
            "erros": ["Linha 4: valor inválido"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_empty_list(&server, "/api/vendas").await;
    mount_empty_list(&server, "/api/clientes").await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("vendas_maio.xlsx");
    std::fs::write(&file, b"fake spreadsheet").unwrap();

    let alert = SalesPage::new().import(&client_for(&server), &file).await;
    assert_eq!(
        alert,
        Alert::warning("Importação concluída! 3 vendas importadas. 1 com erro.")
    );
}

#[tokio::test]
async fn yearly_export_is_generated_then_downloaded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/exportar_vendas_por_ano"))
        .and(query_param("ano", "2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "arquivo": "vendas_2024.xlsx",
            "message": "Planilha gerada"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/exportacao/vendas_2024.xlsx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"xlsx bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let alert = SalesPage::new()
        .export_spreadsheet(&client_for(&server), Some(2024), dir.path())
        .await;

    assert!(alert.is_success());
    assert!(alert.message.starts_with("Planilha gerada"));
    let saved = std::fs::read(dir.path().join("vendas_2024.xlsx")).unwrap();
    assert_eq!(saved, b"xlsx bytes");
}

#[tokio::test]
async fn generated_file_name_cannot_leave_the_target_folder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/exportar_vendas_excel"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "arquivo": "../escaped.xlsx"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"xlsx bytes".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("downloads");
    let alert = SalesPage::new()
        .export_spreadsheet(&client_for(&server), None, &target)
        .await;

    assert_eq!(alert.level, AlertLevel::Danger);
    assert!(!root.path().join("escaped.xlsx").exists());
    assert!(!target.exists());
}

#[tokio::test]
async fn export_with_nothing_to_export_is_a_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/exportar_vendas_excel"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": "Nenhuma venda cadastrada"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let alert = SalesPage::new()
        .export_spreadsheet(&client_for(&server), None, dir.path())
        .await;
    assert_eq!(alert, Alert::danger("Nenhuma venda cadastrada"));
}

// ---- Reports, margin, dashboard ---------------------------------------------

#[tokio::test]
async fn profit_report_is_generated_from_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/relatorios/gerar"))
        .and(body_string_contains("tipo=lucro"))
        .and(body_string_contains("data_inicio=2024-05-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "receita_total": 1000.0,
            "despesas_total": 250.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut page = ReportsPage::new();
    let request = ReportRequest::month_to_date(ReportKind::Profit, day(2024, 5, 20));
    let alert = page.generate(&client_for(&server), &request).await;

    assert_eq!(alert, Alert::success(pages::reports::MSG_GENERATED));
    assert!(page.summary().unwrap().contains("R$ 750,00"));
}

#[tokio::test]
async fn server_margin_check_agrees_with_local_calculation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/calcular-margem"))
        .and(body_partial_json(json!({"valor_compra": 10.0, "valor_venda": 14.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"margem": 40.0, "lucro": 4.0})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut page = CalculatorPage::open(HistoryFile::new(dir.path().join("h.json")))
        .await
        .unwrap();
    page.calculate(10.0, 14.0).await;

    let alert = page.check_on_server(&client_for(&server)).await;
    assert_eq!(alert, Alert::success("Servidor confirma margem de 40,00%"));
}

#[tokio::test]
async fn dashboard_reads_every_listing_from_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/vendas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sales_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/clientes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customers_body()))
        .mount(&server)
        .await;
    mount_empty_list(&server, "/api/despesas").await;
    mount_empty_list(&server, "/api/produtos").await;

    let client = client_for(&server);
    let mut page = DashboardPage::new();
    let dash = page.refresh(&client, day(2024, 5, 20)).await.unwrap();

    assert_eq!(dash.sales_month_total, 1580.5);
    assert_eq!(dash.pending_total, 1500.0);
    assert_eq!(dash.customer_count, 2);
    assert_eq!(dash.recent_sales[0].id, 11);
}

#[tokio::test]
async fn backend_error_body_on_2xx_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/clientes/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"erro": "Cliente possui vendas"})))
        .mount(&server)
        .await;

    let err = client_for(&server).delete::<Customers>(3).await.unwrap_err();
    assert!(matches!(err, AppError::Backend(ref m) if m == "Cliente possui vendas"));
}
