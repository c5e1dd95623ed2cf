pub mod book_service;
pub mod user_service;

pub use book_service::BookService as HttpBookService;
pub use user_service::UserService as HttpUserService;

use crate::adapters::error::CollaboratorError;

/// 200以外のレスポンスをエラーに変換する
async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, CollaboratorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CollaboratorError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}
