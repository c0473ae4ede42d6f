pub mod crm_client;
pub mod dashboard_source;
pub mod resource;

#[cfg(test)]
pub mod mock_source;

pub use crm_client::{CrmClient, ExpensesImportSummary, FileArea, GeneratedFile, SalesImportSummary, ServerMargin};
pub use dashboard_source::DashboardSource;
pub use resource::{Customers, Expenses, Products, Resource, Sales, StatusResource, Suppliers};
