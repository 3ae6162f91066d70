//! 输入校验
//!
//! 目标 URL 只允许 http/https，短码只允许 URL 安全字符

use url::Url;

use crate::errors::{Result, SheetlinkerError};

/// 危险协议列表
const BLOCKED_SCHEMES: &[&str] = &["javascript:", "data:", "file:", "vbscript:", "about:", "blob:"];

/// 与路由冲突的短码
const RESERVED_CODES: &[&str] = &["api"];

pub const MAX_CODE_LEN: usize = 64;

/// Validate a destination URL and return it trimmed.
pub fn validate_url(raw: &str) -> Result<String> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(SheetlinkerError::validation("URL cannot be empty"));
    }

    let lower = url.to_ascii_lowercase();
    if let Some(scheme) = BLOCKED_SCHEMES.iter().find(|s| lower.starts_with(*s)) {
        return Err(SheetlinkerError::validation(format!(
            "URL scheme '{}' is not allowed",
            scheme
        )));
    }

    let parsed = Url::parse(url)
        .map_err(|e| SheetlinkerError::validation(format!("Invalid URL format: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SheetlinkerError::validation(
            "URL must start with http:// or https://",
        ));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(SheetlinkerError::validation("URL must include a host"));
    }

    Ok(url.to_string())
}

pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !RESERVED_CODES.contains(&code.to_ascii_lowercase().as_str())
}

pub fn validate_short_code(code: &str) -> Result<String> {
    let code = code.trim();
    if !is_valid_short_code(code) {
        return Err(SheetlinkerError::validation(format!(
            "Invalid short code '{}': use 1-{} letters, digits, '_' or '-'",
            code, MAX_CODE_LEN
        )));
    }
    Ok(code.to_string())
}
