//! 统一 API 错误码定义
//!
//! 按千位分域：
//! - 0: 成功
//! - 1000-1099: 通用错误
//! - 3000-3099: 链接错误
//! - 6000-6099: 镜像表错误

use crate::errors::SheetlinkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,

    LinkNotFound = 3000,
    LinkAlreadyExists = 3001,
    LinkInvalidInput = 3002,
    LinkDatabaseError = 3005,
    LinkCodeExhausted = 3007,

    MirrorUnavailable = 6000,
    MirrorNotConfigured = 6001,
}

impl From<&SheetlinkerError> for ErrorCode {
    fn from(err: &SheetlinkerError) -> Self {
        match err {
            SheetlinkerError::Conflict(_) => ErrorCode::LinkAlreadyExists,
            SheetlinkerError::NotFound(_) => ErrorCode::LinkNotFound,
            SheetlinkerError::Validation(_) => ErrorCode::LinkInvalidInput,
            SheetlinkerError::MirrorUnavailable(_) => ErrorCode::MirrorUnavailable,
            SheetlinkerError::MirrorConfig(_) => ErrorCode::MirrorNotConfigured,
            SheetlinkerError::GenerationExhausted(_) => ErrorCode::LinkCodeExhausted,
            SheetlinkerError::DatabaseConfig(_)
            | SheetlinkerError::DatabaseConnection(_)
            | SheetlinkerError::DatabaseOperation(_) => ErrorCode::LinkDatabaseError,
            SheetlinkerError::FileOperation(_) | SheetlinkerError::Serialization(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}
