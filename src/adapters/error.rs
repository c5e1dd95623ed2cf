use crate::domain::BookId;
use thiserror::Error;

/// 外部サービス（ユーザー・カタログ）アダプターのエラー
///
/// アプリケーション層では`UserServiceError`/`BookServiceError`に包まれ、
/// 種別を保ったまま境界まで伝播する。
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// 認証トークンが無効
    #[error("Invalid auth token")]
    InvalidToken,

    /// カタログに書籍が存在しない
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// 想定外のHTTPステータス
    #[error("Unexpected response: {status} {body:?}")]
    UnexpectedStatus { status: u16, body: String },

    /// レスポンスの内容が解釈できない
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// 通信エラー（タイムアウトを含む）
    #[error("Request failed")]
    Request(#[from] reqwest::Error),
}
