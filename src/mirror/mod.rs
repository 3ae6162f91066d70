//! Spreadsheet mirror
//!
//! The mirror is a human-readable projection of the link store: one header
//! row followed by one row per link. It is never authoritative and every
//! operation on it may fail independently.
//!
//! - `traits`: the tabular contract the sync engine relies on
//! - `google`: Google Sheets REST implementation
//! - `memory` / `disabled`: in-process and no-op implementations
//! - `sync`: per-row push with full-resync recovery
//! - `reconcile`: periodic background convergence

pub mod disabled;
pub mod google;
pub mod memory;
pub mod reconcile;
pub mod sync;
pub mod traits;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::MirrorConfig;

pub use disabled::DisabledSheet;
pub use google::{GoogleSheet, ServiceAccountKey};
pub use memory::MemorySheet;
pub use reconcile::{ReconcileConfig, ReconcileReport, ReconcilerHandle, run_once, spawn_reconciler};
pub use sync::{MirrorSyncEngine, PushOutcome};
pub use traits::SheetMirror;

/// Fixed header row of the mirror.
pub const HEADER: [&str; 3] = ["Short Code", "Original URL", "Clicks"];

/// Whether `cells` starts with the expected header.
pub fn is_header(cells: &[String]) -> bool {
    cells.len() >= HEADER.len() && cells.iter().zip(HEADER).all(|(cell, want)| cell == want)
}

/// Build the mirror described by `config`.
///
/// Missing or unreadable credentials are not fatal: the service runs with a
/// [`DisabledSheet`] and keeps serving links from the local store.
pub fn build_mirror(config: &MirrorConfig) -> Arc<dyn SheetMirror> {
    if !config.enabled {
        info!("Spreadsheet mirror is disabled by configuration");
        return Arc::new(DisabledSheet);
    }

    match config.backend.as_str() {
        "google" => {}
        "memory" => {
            warn!("Using the in-memory mirror; its rows are lost when the process exits");
            return Arc::new(MemorySheet::new());
        }
        other => {
            warn!("Unknown mirror.backend '{}'; spreadsheet mirror disabled", other);
            return Arc::new(DisabledSheet);
        }
    }

    if config.spreadsheet_id.is_empty() {
        warn!("mirror.spreadsheet_id is not set; spreadsheet mirror disabled");
        return Arc::new(DisabledSheet);
    }

    let key = match ServiceAccountKey::load(config) {
        Ok(Some(key)) => key,
        Ok(None) => {
            warn!(
                "No service-account credentials found (credentials_file or ${}); spreadsheet mirror disabled",
                config.credentials_env
            );
            return Arc::new(DisabledSheet);
        }
        Err(e) => {
            warn!("Could not load service-account credentials: {}", e);
            return Arc::new(DisabledSheet);
        }
    };

    info!(
        "Spreadsheet mirror enabled (share the sheet with {})",
        key.client_email
    );
    Arc::new(GoogleSheet::new(config, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_header() {
        assert!(is_header(&cells(&["Short Code", "Original URL", "Clicks"])));
        assert!(is_header(&cells(&["Short Code", "Original URL", "Clicks", "extra"])));
        assert!(!is_header(&cells(&["Short Code", "Original URL"])));
        assert!(!is_header(&cells(&["abc123", "https://example.com", "0"])));
        assert!(!is_header(&[]));
    }

    #[test]
    fn test_build_mirror_disabled_without_spreadsheet() {
        let config = MirrorConfig::default();
        let mirror = build_mirror(&config);
        assert!(!mirror.is_configured());

        let config = MirrorConfig {
            enabled: false,
            spreadsheet_id: "abc".to_string(),
            ..MirrorConfig::default()
        };
        assert!(!build_mirror(&config).is_configured());
    }

    #[test]
    fn test_build_mirror_backend_selection() {
        let config = MirrorConfig {
            backend: "memory".to_string(),
            ..MirrorConfig::default()
        };
        let mirror = build_mirror(&config);
        assert!(mirror.is_configured());
        assert_eq!(mirror.name(), "memory");

        let config = MirrorConfig {
            backend: "excel".to_string(),
            spreadsheet_id: "abc".to_string(),
            ..MirrorConfig::default()
        };
        assert!(!build_mirror(&config).is_configured());
    }
}
