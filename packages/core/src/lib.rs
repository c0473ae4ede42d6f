// Library root: exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod alerts;
pub mod cache;
pub mod error;
pub mod export;
pub mod format;
pub mod margin;
pub mod models;
pub mod pages;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod table;
pub mod validation;

// These modules are only needed by the binary.
// Declared pub so integration tests can reach them if needed.
pub mod cli;
pub mod config;
pub mod logging;
