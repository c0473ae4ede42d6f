//! Canned [`DashboardSource`] for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::dashboard_source::DashboardSource;
use crate::error::AppError;
use crate::models::{Customer, Expense, Product, Sale};

#[derive(Clone, Default)]
pub struct MockSource {
    sales: Vec<Sale>,
    expenses: Vec<Expense>,
    customers: Vec<Customer>,
    products: Vec<Product>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sales(mut self, sales: Vec<Sale>) -> Self {
        self.sales = sales;
        self
    }

    pub fn with_expenses(mut self, expenses: Vec<Expense>) -> Self {
        self.expenses = expenses;
        self
    }

    pub fn with_customers(mut self, customers: Vec<Customer>) -> Self {
        self.customers = customers;
        self
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    /// Every call fails with a network error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of fetches served, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn serve<T: Clone>(&self, rows: &[T]) -> Result<Vec<T>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(AppError::Network("mock source unavailable".into()))
        } else {
            Ok(rows.to_vec())
        }
    }
}

#[async_trait]
impl DashboardSource for MockSource {
    async fn sales(&self) -> Result<Vec<Sale>, AppError> {
        self.serve(&self.sales)
    }

    async fn expenses(&self) -> Result<Vec<Expense>, AppError> {
        self.serve(&self.expenses)
    }

    async fn customers(&self) -> Result<Vec<Customer>, AppError> {
        self.serve(&self.customers)
    }

    async fn products(&self) -> Result<Vec<Product>, AppError> {
        self.serve(&self.products)
    }

    fn source_name(&self) -> &str {
        "mock"
    }
}
