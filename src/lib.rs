//! Sheetlinker - a URL shortener with a spreadsheet mirror
//!
//! # Architecture
//! - `storage`: authoritative link store (sea-orm)
//! - `codegen`: short code generation with collision handling
//! - `mirror`: Google Sheets projection, sync engine and reconcile loop
//! - `services`: link operations shared by the HTTP handlers
//! - `api`: actix-web routes
//! - `config` / `system`: static configuration and logging
//! - `runtime`: startup wiring and server mode

pub mod api;
pub mod codegen;
pub mod config;
pub mod errors;
pub mod mirror;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
