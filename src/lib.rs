pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

#[cfg(test)]
pub mod testing;
