use async_trait::async_trait;

use super::SheetMirror;
use crate::errors::{Result, SheetlinkerError};
use crate::storage::MirrorRow;

/// Stand-in used when no spreadsheet is configured.
pub struct DisabledSheet;

fn not_configured<T>() -> Result<T> {
    Err(SheetlinkerError::mirror_config("spreadsheet mirror is not configured"))
}

#[async_trait]
impl SheetMirror for DisabledSheet {
    async fn row_values(&self, _row: usize) -> Result<Vec<String>> {
        not_configured()
    }

    async fn find_rows(&self, _short_code: &str) -> Result<Vec<usize>> {
        not_configured()
    }

    async fn update_row(&self, _row: usize, _values: &MirrorRow) -> Result<()> {
        not_configured()
    }

    async fn append_row(&self, _values: &MirrorRow) -> Result<()> {
        not_configured()
    }

    async fn append_header(&self) -> Result<()> {
        not_configured()
    }

    async fn clear(&self) -> Result<()> {
        not_configured()
    }

    fn name(&self) -> &'static str {
        "disabled"
    }

    fn is_configured(&self) -> bool {
        false
    }
}
