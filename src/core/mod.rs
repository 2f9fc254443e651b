pub mod balance_cache;
pub mod balance_service;
pub mod engine;
pub mod errors;
pub mod models;
pub mod services;
