use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short code → URL mapping with its visit counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub short_code: String,
    pub original_url: String,
    #[serde(default)]
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Full public URL for this link under `base_url`.
    pub fn short_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.short_code)
    }

    pub fn mirror_row(&self) -> MirrorRow {
        MirrorRow {
            short_code: self.short_code.clone(),
            original_url: self.original_url.clone(),
            clicks: self.clicks,
        }
    }
}

/// Projection of a [`Link`] as written to the spreadsheet mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRow {
    pub short_code: String,
    pub original_url: String,
    pub clicks: u64,
}

impl MirrorRow {
    pub fn new(short_code: impl Into<String>, original_url: impl Into<String>, clicks: u64) -> Self {
        Self {
            short_code: short_code.into(),
            original_url: original_url.into(),
            clicks,
        }
    }

    /// Cell values in header order: short code, original URL, clicks.
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.short_code.clone(),
            self.original_url.clone(),
            self.clicks.to_string(),
        ]
    }

    /// Parse a sheet row back into a projection. Missing or non-numeric
    /// click cells yield `None`.
    pub fn from_cells(cells: &[String]) -> Option<Self> {
        let short_code = cells.first()?.clone();
        let original_url = cells.get(1)?.clone();
        let clicks = cells.get(2)?.trim().parse().ok()?;
        Some(Self {
            short_code,
            original_url,
            clicks,
        })
    }
}
