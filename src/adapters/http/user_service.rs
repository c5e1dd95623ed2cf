use crate::adapters::error::CollaboratorError;
use crate::domain::{AuthToken, Permissions, UserId};
use crate::ports::user_service::{Result, User, UserService as UserServiceTrait};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct TokenRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct IdResponse {
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Deserialize)]
struct PermissionsResponse {
    // ユーザーサービス側のキー名の綴り誤りに合わせている
    #[serde(rename = "permissios")]
    permissions: String,
}

/// UserServiceのHTTP実装
///
/// ユーザーサービスの内部APIでトークンを検証する。
/// - POST /user/id           → 利用者ID
/// - POST /user/permissions  → 権限ビットマスク（10進文字列）
pub struct UserService {
    base_url: String,
    client: Client,
}

impl UserService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    async fn post_token(
        &self,
        endpoint: &str,
        token: &AuthToken,
    ) -> std::result::Result<reqwest::Response, CollaboratorError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint))
            .json(&TokenRequest {
                token: token.as_str(),
            })
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(CollaboratorError::InvalidToken);
        }

        super::ensure_success(response).await
    }
}

#[async_trait]
impl UserServiceTrait for UserService {
    #[tracing::instrument(skip(self, token))]
    async fn verify_token(&self, token: &AuthToken) -> Result<User> {
        let id: IdResponse = self
            .post_token("/user/id", token)
            .await?
            .json()
            .await
            .map_err(CollaboratorError::from)?;

        let permissions: PermissionsResponse = self
            .post_token("/user/permissions", token)
            .await?
            .json()
            .await
            .map_err(CollaboratorError::from)?;

        let bits: u64 = permissions.permissions.parse().map_err(|e| {
            CollaboratorError::InvalidPayload(format!("failed to parse permissions: {}", e))
        })?;

        tracing::debug!(user_id = %id.id, permissions = bits, "Token verified");

        Ok(User {
            id: UserId::new(id.id),
            permissions: Permissions::from_bits(bits),
        })
    }
}
