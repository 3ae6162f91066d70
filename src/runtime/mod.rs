//! Application lifecycle
//!
//! - `lifetime`: startup wiring and shutdown
//! - `modes`: execution modes (HTTP server)

pub mod lifetime;
pub mod modes;
