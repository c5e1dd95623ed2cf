use crate::domain::{BookId, LoanId, LoanRecord, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// 貸出台帳のエラー
///
/// 台帳は自身のエラーから回復せず、確定した種別として呼び出し元に返す。
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// 記録が存在しない
    #[error("Loan not found")]
    NotFound,

    /// ID重複・返却済み・記録の不一致
    #[error("Loan record collision")]
    Collision,

    /// 在庫上限に達している
    #[error("Insufficient stock")]
    NoStock,

    /// 永続化層の障害
    #[error("Storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// 貸出台帳ポート
///
/// 貸出記録の保存と時点指定の検索を抽象化する。
/// インメモリ実装とPostgreSQL実装は同じ契約を満たし、入れ替え可能。
///
/// 変更操作（`insert`, `mark_returned`）は互いに排他的に実行される。
/// 読み取り操作は並行に実行でき、書き込み途中の状態は見えない。
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// 貸出記録を追加する
    ///
    /// - 同じIDの記録が既にある場合は`Collision`
    /// - 同じ書籍の未返却記録が`total_stock`以上ある場合は`NoStock`
    ///
    /// 失敗時は台帳を変更しない。
    async fn insert(&self, record: LoanRecord, total_stock: u64) -> Result<()>;

    /// 返却済みの記録で置き換える
    ///
    /// - 記録が存在しない場合は`NotFound`
    /// - 保存済みの記録が返却済み、または利用者・書籍が一致しない場合は`Collision`
    async fn mark_returned(&self, record: LoanRecord) -> Result<()>;

    /// 指定時点で貸出中だった記録を返す（順序は不定）
    async fn find_active_at(&self, at: DateTime<Utc>) -> Result<Vec<LoanRecord>>;

    /// 指定時点で延滞していた記録を返す（順序は不定）
    async fn find_overdue_at(&self, at: DateTime<Utc>) -> Result<Vec<LoanRecord>>;

    /// 利用者・書籍で絞り込んだ記録を返す
    ///
    /// Noneのフィルタはすべてに一致する。
    async fn find_loans_of(
        &self,
        user_id: Option<&UserId>,
        book_id: Option<&BookId>,
    ) -> Result<Vec<LoanRecord>>;

    /// IDで記録を取得する
    async fn get_by_id(&self, id: LoanId) -> Result<Option<LoanRecord>>;
}
