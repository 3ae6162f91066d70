//! Short code generation
//!
//! Primary codes are random alphanumerics. When every primary candidate
//! collides the generator degrades to a numeric fallback, which is checked
//! again with its own bounded loop before giving up.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::LinksConfig;
use crate::errors::{Result, SheetlinkerError};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Existence check the generator runs candidates against.
#[async_trait]
pub trait CodeIndex: Send + Sync {
    async fn code_exists(&self, code: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeGenerator {
    length: usize,
    max_attempts: u32,
    fallback_length: usize,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(6, 10, 8)
    }
}

impl From<&LinksConfig> for CodeGenerator {
    fn from(config: &LinksConfig) -> Self {
        Self::new(config.code_length, config.max_attempts, config.fallback_length)
    }
}

impl CodeGenerator {
    pub fn new(length: usize, max_attempts: u32, fallback_length: usize) -> Self {
        Self {
            length: length.max(1),
            max_attempts: max_attempts.max(1),
            fallback_length: fallback_length.max(1),
        }
    }

    /// A random `[A-Za-z0-9]` code of the configured length.
    pub fn generate(&self) -> String {
        std::iter::repeat_with(|| ALPHABET[rand::random_range(0..ALPHABET.len())] as char)
            .take(self.length)
            .collect()
    }

    /// Decimal rendering of a random 40-bit value, truncated to the fallback
    /// length. Not guaranteed unique on its own.
    pub fn fallback_code(&self) -> String {
        let value: u64 = rand::random::<u64>() >> 24;
        let mut code = value.to_string();
        code.truncate(self.fallback_length);
        code
    }

    /// Produce a code not yet present in `index`.
    pub async fn ensure_unique(&self, index: &dyn CodeIndex) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.generate();
            if !index.code_exists(&candidate).await? {
                return Ok(candidate);
            }
            debug!("Short code collision on attempt {}: {}", attempt, candidate);
        }

        warn!(
            "All {} random short codes collided, falling back to numeric codes",
            self.max_attempts
        );

        for _ in 0..self.max_attempts {
            let candidate = self.fallback_code();
            if !index.code_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(SheetlinkerError::generation_exhausted(format!(
            "no free short code after {} random and {} fallback attempts",
            self.max_attempts, self.max_attempts
        )))
    }
}
