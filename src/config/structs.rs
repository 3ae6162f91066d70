use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 优先级：ENV > config.toml > 默认值
/// ENV 前缀：SL，分隔符：__
/// 示例：SL__MIRROR__SPREADSHEET_ID=1AbC...
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
}

impl StaticConfig {
    /// 从指定 TOML 文件和环境变量加载配置
    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix("SL")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Public prefix used when rendering full short URLs
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 短码生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_fallback_length")]
    pub fallback_length: usize,
}

/// 表格镜像配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default = "default_mirror_enabled")]
    pub enabled: bool,
    /// `google`, or `memory` for a process-local sheet that needs no credentials
    #[serde(default = "default_mirror_backend")]
    pub backend: String,
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    /// Path to a service-account JSON key; takes precedence over `credentials_env`
    #[serde(default)]
    pub credentials_file: Option<String>,
    /// Name of the env var holding the base64-encoded service-account JSON
    #[serde(default = "default_credentials_env")]
    pub credentials_env: String,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    5000
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_database_url() -> String {
    "sqlite://database.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_code_length() -> usize {
    6
}

fn default_max_attempts() -> u32 {
    10
}

fn default_fallback_length() -> usize {
    8
}

fn default_mirror_enabled() -> bool {
    true
}

fn default_mirror_backend() -> String {
    "google".to_string()
}

fn default_worksheet() -> String {
    "Sheet1".to_string()
}

fn default_credentials_env() -> String {
    "GOOGLE_CREDENTIALS_B64".to_string()
}

fn default_sync_interval_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            base_url: default_base_url(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            max_attempts: default_max_attempts(),
            fallback_length: default_fallback_length(),
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: default_mirror_enabled(),
            backend: default_mirror_backend(),
            spreadsheet_id: String::new(),
            worksheet: default_worksheet(),
            credentials_file: None,
            credentials_env: default_credentials_env(),
            sync_interval_secs: default_sync_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
