use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetlinkerError {
    Conflict(String),
    NotFound(String),
    Validation(String),
    MirrorUnavailable(String),
    MirrorConfig(String),
    GenerationExhausted(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
}

impl SheetlinkerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            SheetlinkerError::Conflict(_) => "E001",
            SheetlinkerError::NotFound(_) => "E002",
            SheetlinkerError::Validation(_) => "E003",
            SheetlinkerError::MirrorUnavailable(_) => "E004",
            SheetlinkerError::MirrorConfig(_) => "E005",
            SheetlinkerError::GenerationExhausted(_) => "E006",
            SheetlinkerError::DatabaseConfig(_) => "E007",
            SheetlinkerError::DatabaseConnection(_) => "E008",
            SheetlinkerError::DatabaseOperation(_) => "E009",
            SheetlinkerError::FileOperation(_) => "E010",
            SheetlinkerError::Serialization(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            SheetlinkerError::Conflict(_) => "Conflict",
            SheetlinkerError::NotFound(_) => "Resource Not Found",
            SheetlinkerError::Validation(_) => "Validation Error",
            SheetlinkerError::MirrorUnavailable(_) => "Mirror Unavailable",
            SheetlinkerError::MirrorConfig(_) => "Mirror Configuration Error",
            SheetlinkerError::GenerationExhausted(_) => "Code Generation Exhausted",
            SheetlinkerError::DatabaseConfig(_) => "Database Configuration Error",
            SheetlinkerError::DatabaseConnection(_) => "Database Connection Error",
            SheetlinkerError::DatabaseOperation(_) => "Database Operation Error",
            SheetlinkerError::FileOperation(_) => "File Operation Error",
            SheetlinkerError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            SheetlinkerError::Conflict(msg)
            | SheetlinkerError::NotFound(msg)
            | SheetlinkerError::Validation(msg)
            | SheetlinkerError::MirrorUnavailable(msg)
            | SheetlinkerError::MirrorConfig(msg)
            | SheetlinkerError::GenerationExhausted(msg)
            | SheetlinkerError::DatabaseConfig(msg)
            | SheetlinkerError::DatabaseConnection(msg)
            | SheetlinkerError::DatabaseOperation(msg)
            | SheetlinkerError::FileOperation(msg)
            | SheetlinkerError::Serialization(msg) => msg,
        }
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> StatusCode {
        match self {
            SheetlinkerError::Conflict(_) => StatusCode::CONFLICT,
            SheetlinkerError::NotFound(_) => StatusCode::NOT_FOUND,
            SheetlinkerError::Validation(_) => StatusCode::BAD_REQUEST,
            SheetlinkerError::MirrorUnavailable(_) | SheetlinkerError::MirrorConfig(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Errors raised by the spreadsheet side rather than local storage.
    pub fn is_mirror(&self) -> bool {
        matches!(
            self,
            SheetlinkerError::MirrorUnavailable(_) | SheetlinkerError::MirrorConfig(_)
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for SheetlinkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SheetlinkerError {}

// 便捷的构造函数
impl SheetlinkerError {
    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::Conflict(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::NotFound(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::Validation(msg.into())
    }

    pub fn mirror_unavailable<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::MirrorUnavailable(msg.into())
    }

    pub fn mirror_config<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::MirrorConfig(msg.into())
    }

    pub fn generation_exhausted<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::GenerationExhausted(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        SheetlinkerError::Serialization(msg.into())
    }
}

impl From<sea_orm::DbErr> for SheetlinkerError {
    fn from(err: sea_orm::DbErr) -> Self {
        // 唯一约束冲突单独映射，调用方据此区分 Conflict
        if let Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return SheetlinkerError::Conflict(detail);
        }
        SheetlinkerError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for SheetlinkerError {
    fn from(err: std::io::Error) -> Self {
        SheetlinkerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for SheetlinkerError {
    fn from(err: serde_json::Error) -> Self {
        SheetlinkerError::Serialization(err.to_string())
    }
}

impl From<ureq::Error> for SheetlinkerError {
    fn from(err: ureq::Error) -> Self {
        SheetlinkerError::MirrorUnavailable(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for SheetlinkerError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        SheetlinkerError::MirrorUnavailable(format!("failed to sign token request: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, SheetlinkerError>;
