use crate::application::loan::LoanApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
/// 入力パラメータの不足・不正はアプリケーション層に届く前にここで扱う。
#[derive(Debug)]
pub enum ApiError {
    /// 必須パラメータの不足・不正
    MissingParams(String),
    Application(LoanApplicationError),
}

impl From<LoanApplicationError> for ApiError {
    fn from(err: LoanApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            // 400 Bad Request - リクエストの不備
            ApiError::MissingParams(msg) => (
                StatusCode::BAD_REQUEST,
                "MISSING_PARAMS",
                format!("missing required parameters: {}", msg),
            ),

            // 403 Forbidden - 権限不足
            ApiError::Application(LoanApplicationError::Forbidden) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Insufficient permissions".to_string(),
            ),

            // 404 Not Found - 対象の貸出が存在しない
            ApiError::Application(LoanApplicationError::NotFound) => (
                StatusCode::NOT_FOUND,
                "LOAN_NOT_FOUND",
                "Loan not found".to_string(),
            ),

            // 409 Conflict - 在庫切れ・競合（再試行で解消し得る）
            ApiError::Application(LoanApplicationError::NoStock) => (
                StatusCode::CONFLICT,
                "NO_STOCK",
                "Insufficient stock".to_string(),
            ),
            ApiError::Application(LoanApplicationError::Collision) => (
                StatusCode::CONFLICT,
                "COLLISION",
                "Loan record changed concurrently".to_string(),
            ),

            // 500 Internal Server Error - 外部サービス・永続化の障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ApiError::Application(LoanApplicationError::DeadlineOutOfRange) => {
                tracing::error!("Return period does not yield a valid deadline");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DEADLINE_OUT_OF_RANGE",
                    "Failed to compute return deadline".to_string(),
                )
            }
            ApiError::Application(LoanApplicationError::UserServiceError(ref e)) => {
                tracing::error!("User service error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "USER_SERVICE_ERROR",
                    "User service error".to_string(),
                )
            }
            ApiError::Application(LoanApplicationError::BookServiceError(ref e)) => {
                tracing::error!("Book service error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "BOOK_SERVICE_ERROR",
                    "Book service error".to_string(),
                )
            }
            ApiError::Application(LoanApplicationError::RepositoryError(ref e)) => {
                tracing::error!("Repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPOSITORY_ERROR",
                    "Failed to access loan ledger".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
