//! Data source abstraction for the dashboard.
//!
//! The dashboard only reads; putting those reads behind a trait lets the
//! refresh loop run against a canned source in tests.

use async_trait::async_trait;

use super::crm_client::CrmClient;
use super::resource::{Customers, Expenses, Products, Sales};
use crate::error::AppError;
use crate::models::{Customer, Expense, Product, Sale};

#[async_trait]
pub trait DashboardSource {
    async fn sales(&self) -> Result<Vec<Sale>, AppError>;

    async fn expenses(&self) -> Result<Vec<Expense>, AppError>;

    async fn customers(&self) -> Result<Vec<Customer>, AppError>;

    async fn products(&self) -> Result<Vec<Product>, AppError>;

    /// Name used in log lines.
    fn source_name(&self) -> &str;
}

#[async_trait]
impl DashboardSource for CrmClient {
    async fn sales(&self) -> Result<Vec<Sale>, AppError> {
        self.list::<Sales>(&[]).await
    }

    async fn expenses(&self) -> Result<Vec<Expense>, AppError> {
        self.list::<Expenses>(&[]).await
    }

    async fn customers(&self) -> Result<Vec<Customer>, AppError> {
        self.list::<Customers>(&[]).await
    }

    async fn products(&self) -> Result<Vec<Product>, AppError> {
        self.list::<Products>(&[]).await
    }

    fn source_name(&self) -> &str {
        self.base_url()
    }
}
