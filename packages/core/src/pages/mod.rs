//! Page controllers.
//!
//! Each page keeps the rows it last fetched, filters them locally, renders a
//! [`TableView`](crate::table::TableView) and runs its actions through the
//! [`CrmClient`]. Actions never fail outward: they come back as an [`Alert`].

pub mod calculator;
pub mod customers;
pub mod dashboard;
pub mod expenses;
pub mod products;
pub mod reports;
pub mod sales;
pub mod suppliers;

use std::path::{Path, PathBuf};

use crate::alerts::Alert;
use crate::error::AppError;
use crate::export;
use crate::services::{CrmClient, FileArea, GeneratedFile, Resource};
use crate::validation::FormErrors;

pub use calculator::CalculatorPage;
pub use customers::CustomersPage;
pub use dashboard::{Dashboard, DashboardPage};
pub use expenses::ExpensesPage;
pub use products::{ProductSort, ProductsPage};
pub use reports::ReportsPage;
pub use sales::SalesPage;
pub use suppliers::SuppliersPage;

/// What a page tells the user after each CRUD action.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub created: &'static str,
    pub create_failed: &'static str,
    pub updated: &'static str,
    pub update_failed: &'static str,
    pub deleted: &'static str,
    pub delete_failed: &'static str,
    pub load_failed: &'static str,
    pub no_results: &'static str,
}

/// Success message on `Ok`, error alert with `fallback` otherwise.
pub fn outcome<T>(result: Result<T, AppError>, success: impl Into<String>, fallback: &str) -> Alert {
    match result {
        Ok(_) => Alert::success(success),
        Err(err) => Alert::from_error(&err, fallback),
    }
}

/// Validate, then POST (no id) or PUT (with id).
pub(crate) async fn save_record<R: Resource>(
    client: &CrmClient,
    id: Option<i64>,
    form: &R::Form,
    validation: Result<(), FormErrors>,
    messages: &Messages,
) -> Alert {
    let fallback = match id {
        Some(_) => messages.update_failed,
        None => messages.create_failed,
    };
    if let Err(errors) = validation {
        return Alert::from_error(&AppError::Validation(errors), fallback);
    }

    match id {
        Some(id) => outcome(client.update::<R>(id, form).await, messages.updated, fallback),
        None => outcome(client.create::<R>(form).await, messages.created, fallback),
    }
}

pub(crate) async fn delete_record<R: Resource>(client: &CrmClient, id: i64, messages: &Messages) -> Alert {
    outcome(client.delete::<R>(id).await, messages.deleted, messages.delete_failed)
}

/// File name and contents of a spreadsheet picked for upload.
pub(crate) async fn read_upload(path: &Path) -> Result<(String, Vec<u8>), AppError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::Config(format!("Arquivo inválido: {}", path.display())))?
        .to_string();
    let bytes = tokio::fs::read(path).await?;
    Ok((file_name, bytes))
}

/// Download a file the backend just generated and store it under `dir`.
pub(crate) async fn download_generated(
    client: &CrmClient,
    area: FileArea,
    generated: &GeneratedFile,
    dir: &Path,
) -> Result<PathBuf, AppError> {
    let file_name = plain_file_name(&generated.file_name)?;
    let bytes = client.download(area, file_name).await?;
    let target = dir.join(file_name);
    export::save(&target, &bytes).await?;
    Ok(target)
}

/// A generated file name must be a bare name, so the download stays in the
/// folder the user picked.
fn plain_file_name(name: &str) -> Result<&str, AppError> {
    match Path::new(name).file_name().and_then(|n| n.to_str()) {
        Some(plain) if plain == name => Ok(plain),
        _ => Err(AppError::Parse(format!("Nome de arquivo inválido: {}", name))),
    }
}

/// Reload after a successful action; a failed reload only costs a stale
/// table, so it is logged rather than reported.
pub(crate) fn log_reload_failure(result: Result<usize, AppError>, label: &str) {
    if let Err(err) = result {
        tracing::warn!("Could not reload {} after update: {}", label, err);
    }
}
