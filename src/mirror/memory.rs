//! In-process sheet
//!
//! Behaves like a spreadsheet grid and can be switched offline or told to
//! fail the next N operations, so recovery paths can be exercised without a
//! network.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{HEADER, SheetMirror};
use crate::errors::{Result, SheetlinkerError};
use crate::storage::MirrorRow;

#[derive(Default)]
pub struct MemorySheet {
    rows: Mutex<Vec<Vec<String>>>,
    offline: AtomicBool,
    fail_next: AtomicUsize,
    writes: AtomicUsize,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sheet that already holds `rows` (header not added automatically).
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make the next `count` operations fail, then recover.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Snapshot of the grid.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().clone()
    }

    /// Data rows parsed back into projections (header and malformed rows skipped).
    pub fn data_rows(&self) -> Vec<MirrorRow> {
        self.rows
            .lock()
            .iter()
            .skip(1)
            .filter_map(|cells| MirrorRow::from_cells(cells))
            .collect()
    }

    /// Number of successful write operations so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Append arbitrary cells, bypassing the header logic.
    pub fn push_raw(&self, cells: &[&str]) {
        self.rows
            .lock()
            .push(cells.iter().map(|c| c.to_string()).collect());
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SheetlinkerError::mirror_unavailable("memory sheet is offline"));
        }
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(SheetlinkerError::mirror_unavailable("injected failure"));
        }
        Ok(())
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SheetMirror for MemorySheet {
    async fn row_values(&self, row: usize) -> Result<Vec<String>> {
        self.check()?;
        let rows = self.rows.lock();
        Ok(row
            .checked_sub(1)
            .and_then(|idx| rows.get(idx))
            .cloned()
            .unwrap_or_default())
    }

    async fn find_rows(&self, short_code: &str) -> Result<Vec<usize>> {
        self.check()?;
        let rows = self.rows.lock();
        Ok(rows
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, cells)| cells.first().is_some_and(|c| c == short_code))
            .map(|(idx, _)| idx + 1)
            .collect())
    }

    async fn update_row(&self, row: usize, values: &MirrorRow) -> Result<()> {
        self.check()?;
        let mut rows = self.rows.lock();
        let cells = row
            .checked_sub(1)
            .and_then(|idx| rows.get_mut(idx))
            .ok_or_else(|| SheetlinkerError::mirror_unavailable(format!("row {} does not exist", row)))?;
        *cells = values.to_cells();
        drop(rows);
        self.wrote();
        Ok(())
    }

    async fn append_row(&self, values: &MirrorRow) -> Result<()> {
        self.check()?;
        self.rows.lock().push(values.to_cells());
        self.wrote();
        Ok(())
    }

    async fn append_header(&self) -> Result<()> {
        self.check()?;
        self.rows
            .lock()
            .push(HEADER.iter().map(|h| h.to_string()).collect());
        self.wrote();
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.check()?;
        self.rows.lock().clear();
        self.wrote();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
