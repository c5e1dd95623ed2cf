use crate::domain::{AuthToken, Permissions, UserId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 認証済みの利用者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub permissions: Permissions,
}

/// ユーザーサービスポート
///
/// 貸出台帳と利用者管理の境界を維持する。
/// 台帳はトークンから得た利用者IDと権限のみを知る。
#[async_trait]
pub trait UserService: Send + Sync {
    /// 認証トークンを検証し、対応する利用者を返す
    async fn verify_token(&self, token: &AuthToken) -> Result<User>;
}
