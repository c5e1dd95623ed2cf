use crate::domain::loan::DEFAULT_RETURN_PERIOD_DAYS;
use std::time::Duration;
use thiserror::Error;

/// 設定のエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 数値などの値が解釈できない
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    /// 未対応のDSN
    #[error("Unsupported DATABASE_URL scheme: {0}")]
    UnsupportedDsn(String),
}

/// 台帳の保存先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// プロセス内のメモリ（再起動で消える）
    Memory,
    /// PostgreSQL（接続URL）
    Postgres(String),
}

impl StorageConfig {
    /// DSNのスキームから保存先を決める
    pub fn from_dsn(dsn: &str) -> Result<Self, ConfigError> {
        if dsn.starts_with("memory://") {
            Ok(StorageConfig::Memory)
        } else if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") {
            Ok(StorageConfig::Postgres(dsn.to_string()))
        } else {
            Err(ConfigError::UnsupportedDsn(dsn.to_string()))
        }
    }
}

/// サービスの設定
///
/// 環境変数から読み込む。未設定の項目は既定値を使う。
#[derive(Debug, Clone)]
pub struct Config {
    /// 公開APIのアドレス
    pub public_addr: String,
    /// 内部APIのアドレス（信頼できるネットワークのみ）
    pub internal_addr: String,
    pub storage: StorageConfig,
    pub user_service_url: String,
    pub book_service_url: String,
    /// 貸出から返却期限までの期間
    pub book_return_period: chrono::Duration,
    /// 外部サービス呼び出しのタイムアウト
    pub collaborator_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を組み立てる（テスト用に環境変数から切り離している）
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let default_return_period =
            chrono::Duration::days(DEFAULT_RETURN_PERIOD_DAYS).num_seconds().to_string();
        let return_period_secs = parse_secs(
            "BOOK_RETURN_PERIOD_SECS",
            get("BOOK_RETURN_PERIOD_SECS", &default_return_period),
            MAX_RETURN_PERIOD_SECS,
        )?;
        let timeout_secs = parse_secs(
            "COLLABORATOR_TIMEOUT_SECS",
            get("COLLABORATOR_TIMEOUT_SECS", "10"),
            MAX_TIMEOUT_SECS,
        )?;

        Ok(Self {
            public_addr: get("PUBLIC_ADDR", "0.0.0.0:3000"),
            internal_addr: get("INTERNAL_ADDR", "127.0.0.1:3001"),
            storage: StorageConfig::from_dsn(&get("DATABASE_URL", "memory://"))?,
            user_service_url: get("USER_SERVICE_URL", "http://localhost:8081"),
            book_service_url: get("BOOK_SERVICE_URL", "http://localhost:8082"),
            book_return_period: chrono::Duration::seconds(return_period_secs as i64),
            collaborator_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// 返却期間の上限（約100年）
const MAX_RETURN_PERIOD_SECS: u64 = 100 * 366 * 24 * 60 * 60;

/// タイムアウトの上限（1時間）
const MAX_TIMEOUT_SECS: u64 = 60 * 60;

fn parse_secs(key: &'static str, value: String, max: u64) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 && secs <= max => Ok(secs),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}
