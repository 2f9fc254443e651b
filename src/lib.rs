pub mod api;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;
pub mod worker;

pub use core::errors::LedgerError;
pub use core::services::LedgerService;
pub use worker::ExpenseWorker;

#[cfg(test)]
mod tests;
