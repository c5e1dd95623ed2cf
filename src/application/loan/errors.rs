use crate::ports::RepositoryError;
use thiserror::Error;

/// 貸出管理アプリケーション層のエラー
///
/// 閉じた列挙型として定義し、呼び出し元（API層）が網羅的に分岐できるようにする。
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    /// 貸出記録が見つからない（返却対象なしを含む）
    #[error("Loan not found")]
    NotFound,

    /// 貸出記録の衝突（ID重複、返却済み、並行返却の競合）
    #[error("Loan record collision")]
    Collision,

    /// 権限不足
    #[error("Insufficient permissions")]
    Forbidden,

    /// 在庫上限に達している
    #[error("Insufficient stock")]
    NoStock,

    /// 返却期間が長すぎて返却期限を計算できない（設定の誤り）
    #[error("Return deadline out of range")]
    DeadlineOutOfRange,

    /// UserServiceのエラー
    #[error("User service error")]
    UserServiceError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// BookServiceのエラー
    #[error("Book service error")]
    BookServiceError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// LoanRepositoryの永続化エラー
    #[error("Repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<RepositoryError> for LoanApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => LoanApplicationError::NotFound,
            RepositoryError::Collision => LoanApplicationError::Collision,
            RepositoryError::NoStock => LoanApplicationError::NoStock,
            RepositoryError::Storage(e) => LoanApplicationError::RepositoryError(e),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
