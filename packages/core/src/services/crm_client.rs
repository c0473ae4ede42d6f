use std::time::Duration;

use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::resource::{Resource, StatusResource};
use crate::config::Config;
use crate::error::AppError;
use crate::models::{PaymentStatus, Report, ReportKind, ReportRequest};

/// Typed HTTP client for the CRM backend.
#[derive(Clone)]
pub struct CrmClient {
    base_url: String,
    http: Client,
}

/// Where the backend leaves files it generates on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileArea {
    Export,
    Template,
}

impl FileArea {
    fn prefix(self) -> &'static str {
        match self {
            FileArea::Export => "/data/exportacao",
            FileArea::Template => "/data/modelos",
        }
    }
}

/// `{success, arquivo, message}` answer of the export/template endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedFile {
    #[serde(rename = "arquivo")]
    pub file_name: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SalesImportSummary {
    #[serde(rename = "vendas_importadas", default)]
    pub imported: u64,
    #[serde(rename = "vendas_com_erro", default)]
    pub failed: u64,
    #[serde(rename = "erros", default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpensesImportSummary {
    #[serde(default)]
    pub total: u64,
}

/// Server-side margin check result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerMargin {
    #[serde(rename = "margem")]
    pub margin: f64,
    #[serde(rename = "lucro")]
    pub profit: f64,
}

impl CrmClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(err.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(config.base_url.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and decode a JSON body. Non-2xx statuses and 2xx bodies that
    /// flag a failure both come back as errors.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let body = self.send_value(request).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn send_value(&self, request: RequestBuilder) -> Result<Value, AppError> {
        let text = self.send_text(request).await?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        check_backend_flags(&body)?;
        Ok(body)
    }

    async fn send_text(&self, request: RequestBuilder) -> Result<String, AppError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AppError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    async fn send_bytes(&self, request: RequestBuilder) -> Result<Vec<u8>, AppError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    // ---- collections ----

    pub async fn list<R: Resource>(&self, params: &[(&str, String)]) -> Result<Vec<R::Record>, AppError> {
        let rows: Vec<R::Record> = self
            .send_json(self.http.get(self.url(R::PATH)).query(params))
            .await?;
        tracing::debug!("Fetched {} {} rows", rows.len(), R::LABEL);
        Ok(rows)
    }

    pub async fn get<R: Resource>(&self, id: i64) -> Result<R::Record, AppError> {
        self.send_json(self.http.get(self.url(&format!("{}/{}", R::PATH, id))))
            .await
    }

    pub async fn create<R: Resource>(&self, form: &R::Form) -> Result<Value, AppError> {
        let body = self
            .send_value(self.http.post(self.url(R::PATH)).json(form))
            .await?;
        tracing::info!("Created {}", R::LABEL);
        Ok(body)
    }

    pub async fn update<R: Resource>(&self, id: i64, form: &R::Form) -> Result<Value, AppError> {
        let body = self
            .send_value(self.http.put(self.url(&format!("{}/{}", R::PATH, id))).json(form))
            .await?;
        tracing::info!("Updated {} {}", R::LABEL, id);
        Ok(body)
    }

    pub async fn delete<R: Resource>(&self, id: i64) -> Result<(), AppError> {
        self.send_value(self.http.delete(self.url(&format!("{}/{}", R::PATH, id))))
            .await?;
        tracing::info!("Deleted {} {}", R::LABEL, id);
        Ok(())
    }

    pub async fn patch_status<R: StatusResource>(
        &self,
        id: i64,
        status: &PaymentStatus,
    ) -> Result<Value, AppError> {
        let mut payload = serde_json::Map::new();
        payload.insert(R::STATUS_FIELD.to_string(), Value::String(status.as_str().to_string()));
        let body = self
            .send_value(
                self.http
                    .patch(self.url(&format!("{}/{}", R::PATH, id)))
                    .json(&Value::Object(payload)),
            )
            .await?;
        tracing::info!("Set {} {} status to {}", R::LABEL, id, status);
        Ok(body)
    }

    // ---- spreadsheets ----

    fn spreadsheet_form(file_name: &str, bytes: Vec<u8>) -> Form {
        Form::new().part("arquivo", Part::bytes(bytes).file_name(file_name.to_string()))
    }

    pub async fn import_sales(&self, file_name: &str, bytes: Vec<u8>) -> Result<SalesImportSummary, AppError> {
        self.send_json(
            self.http
                .post(self.url("/api/importar_vendas_excel"))
                .multipart(Self::spreadsheet_form(file_name, bytes)),
        )
        .await
    }

    pub async fn import_expenses(&self, file_name: &str, bytes: Vec<u8>) -> Result<ExpensesImportSummary, AppError> {
        self.send_json(
            self.http
                .post(self.url("/api/despesas/importar_excel"))
                .multipart(Self::spreadsheet_form(file_name, bytes)),
        )
        .await
    }

    pub async fn export_sales(&self) -> Result<GeneratedFile, AppError> {
        self.send_json(self.http.get(self.url("/api/exportar_vendas_excel")))
            .await
    }

    pub async fn export_sales_by_year(&self, year: i32) -> Result<GeneratedFile, AppError> {
        self.send_json(
            self.http
                .get(self.url("/api/exportar_vendas_por_ano"))
                .query(&[("ano", year)]),
        )
        .await
    }

    pub async fn import_template(&self) -> Result<GeneratedFile, AppError> {
        self.send_json(self.http.get(self.url("/api/gerar_modelo_importacao")))
            .await
    }

    pub async fn download(&self, area: FileArea, file_name: &str) -> Result<Vec<u8>, AppError> {
        self.send_bytes(
            self.http
                .get(self.url(&format!("{}/{}", area.prefix(), file_name))),
        )
        .await
    }

    pub async fn export_expenses(&self, year: i32) -> Result<Vec<u8>, AppError> {
        self.send_bytes(
            self.http
                .get(self.url("/api/despesas/exportar_excel"))
                .query(&[("ano", year)]),
        )
        .await
    }

    // ---- reports, margin, backup ----

    pub async fn generate_report(
        &self,
        kind: ReportKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Report, AppError> {
        let fields = ReportRequest::form_fields(kind, start, end);
        let body = self
            .send_value(self.http.post(self.url("/relatorios/gerar")).form(&fields))
            .await?;
        Ok(Report::decode(kind, body)?)
    }

    pub async fn check_margin(&self, cost: f64, sale: f64) -> Result<ServerMargin, AppError> {
        self.send_json(
            self.http
                .post(self.url("/api/calcular-margem"))
                .json(&json!({ "valor_compra": cost, "valor_venda": sale })),
        )
        .await
    }

    pub async fn backup(&self) -> Result<(), AppError> {
        self.send_text(self.http.get(self.url("/backup"))).await?;
        tracing::info!("Backup requested");
        Ok(())
    }
}

/// `success: false`, `erro` or `error` in a JSON object mean the backend
/// refused the operation even though it answered 2xx.
pub fn check_backend_flags(body: &Value) -> Result<(), AppError> {
    let Some(obj) = body.as_object() else {
        return Ok(());
    };

    let message = || {
        ["erro", "error", "message"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .unwrap_or("Operação não concluída")
            .to_string()
    };

    if obj.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(AppError::Backend(message()));
    }
    for key in ["erro", "error"] {
        if let Some(msg) = obj.get(key).and_then(Value::as_str) {
            return Err(AppError::Backend(msg.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bodies_pass_the_flag_check() {
        assert!(check_backend_flags(&json!([1, 2])).is_ok());
        assert!(check_backend_flags(&json!({"success": true, "arquivo": "x.xlsx"})).is_ok());
        assert!(check_backend_flags(&Value::Null).is_ok());
    }

    #[test]
    fn failure_flags_carry_backend_message() {
        let err = check_backend_flags(&json!({"success": false, "message": "Sem vendas"})).unwrap_err();
        assert!(matches!(err, AppError::Backend(ref m) if m == "Sem vendas"));

        let err = check_backend_flags(&json!({"erro": "Tipo inválido"})).unwrap_err();
        assert!(matches!(err, AppError::Backend(ref m) if m == "Tipo inválido"));

        let err = check_backend_flags(&json!({"success": false})).unwrap_err();
        assert!(matches!(err, AppError::Backend(ref m) if m == "Operação não concluída"));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = CrmClient::new("http://crm.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://crm.local");
        assert_eq!(client.url("/api/vendas"), "http://crm.local/api/vendas");
    }

    #[test]
    fn file_areas_map_to_download_folders() {
        assert_eq!(FileArea::Export.prefix(), "/data/exportacao");
        assert_eq!(FileArea::Template.prefix(), "/data/modelos");
    }
}
