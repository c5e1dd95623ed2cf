use crate::domain::BookId;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// カタログ上の書籍
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub description: String,
    /// 図書館が所蔵する総冊数
    pub total_stock: u64,
}

/// 書籍サービスポート
///
/// 貸出台帳とカタログの境界を維持する。
/// 台帳は書籍情報を変更せず、在庫上限の確認にのみ参照する。
#[async_trait]
pub trait BookService: Send + Sync {
    /// 書籍を取得する
    ///
    /// 存在しない書籍はエラーとして返す。
    async fn lookup_book(&self, book_id: &BookId) -> Result<Book>;
}
