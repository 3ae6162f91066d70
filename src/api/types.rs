//! API 类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Link;

/// 统一响应包
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RenameRequest {
    pub short_code: String,
    pub original_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LinkResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn new(link: Link, base_url: &str) -> Self {
        Self {
            short_url: link.short_url(base_url),
            short_code: link.short_code,
            original_url: link.original_url,
            clicks: link.clicks,
            created_at: link.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ClearResponse {
    pub removed: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SyncResponse {
    pub rows: usize,
}

/// Public origin prepended to short codes when rendering `short_url`.
#[derive(Clone, Debug)]
pub struct BaseUrl(pub String);
