use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::LoanRecord;

/// 貸出・返却リクエストのフォーム
///
/// `user`が空または省略された場合は認証された本人として扱う。
#[derive(Debug, Deserialize)]
pub struct LoanForm {
    pub auth: Option<String>,
    pub user: Option<String>,
}

/// 認証のみを受け取るクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub auth: Option<String>,
}

/// 時点指定の一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct AtTimeQuery {
    pub auth: Option<String>,
    /// UNIX時刻（秒）。省略時は現在時刻
    #[serde(rename = "atTime")]
    pub at_time: Option<String>,
}

/// 貸出レスポンス
///
/// 時刻はUNIX時刻（秒）。未返却の場合`returned_at`は0。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub user_id: String,
    pub book_id: String,
    pub taken_at: i64,
    pub return_deadline: i64,
    pub returned: bool,
    pub returned_at: i64,
}

impl From<LoanRecord> for LoanResponse {
    fn from(record: LoanRecord) -> Self {
        Self {
            id: record.id.value(),
            returned: record.is_returned(),
            returned_at: record.returned_at.map_or(0, |at| at.timestamp()),
            taken_at: record.taken_at.timestamp(),
            return_deadline: record.return_deadline.timestamp(),
            user_id: record.user_id.to_string(),
            book_id: record.book_id.to_string(),
        }
    }
}

/// 貸出可能冊数レスポンス（GET /api/v1/book/:book_id/avail）
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailableResponse {
    pub available: u64,
}

/// 貸出中一覧レスポンス（GET /api/v1/reserved）
#[derive(Debug, Serialize, Deserialize)]
pub struct ReservedResponse {
    pub reserved: Vec<LoanResponse>,
}

/// 延滞一覧レスポンス（GET /api/v1/overdue）
#[derive(Debug, Serialize, Deserialize)]
pub struct OverdueResponse {
    pub overdue: Vec<LoanResponse>,
}

/// 未返却数レスポンス（内部API GET /api/v1/userloans/:user_id）
#[derive(Debug, Serialize, Deserialize)]
pub struct UnreturnedResponse {
    pub unreturned: u64,
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// atTimeクエリパラメータのパースとバリデーション
pub fn parse_at_time(at_time: Option<&str>) -> Result<DateTime<Utc>, String> {
    let Some(raw) = at_time.filter(|s| !s.is_empty()) else {
        return Ok(Utc::now());
    };

    let secs: i64 = raw
        .parse()
        .map_err(|e| format!("failed to parse atTime: {}", e))?;

    DateTime::from_timestamp(secs, 0).ok_or_else(|| format!("atTime out of range: {}", secs))
}
