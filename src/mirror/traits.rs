use async_trait::async_trait;

use crate::errors::Result;
use crate::storage::MirrorRow;

/// Row-level operations on a two-dimensional sheet.
///
/// Rows are 1-based; row 1 is the header. No operation is transactional.
#[async_trait]
pub trait SheetMirror: Send + Sync {
    /// Cells of `row`, empty if the row does not exist.
    async fn row_values(&self, row: usize) -> Result<Vec<String>>;

    /// Every data row whose short-code cell equals `short_code` exactly.
    /// The header row is never matched.
    async fn find_rows(&self, short_code: &str) -> Result<Vec<usize>>;

    /// Overwrite the three cells of `row`.
    async fn update_row(&self, row: usize, values: &MirrorRow) -> Result<()>;

    async fn append_row(&self, values: &MirrorRow) -> Result<()>;

    async fn append_header(&self) -> Result<()>;

    /// Remove every row, header included.
    async fn clear(&self) -> Result<()>;

    fn name(&self) -> &'static str;

    fn is_configured(&self) -> bool {
        true
    }
}
