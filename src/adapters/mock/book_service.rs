use crate::adapters::error::CollaboratorError;
use crate::domain::BookId;
use crate::ports::book_service::{Book, BookService as BookServiceTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// BookServiceのモック実装
///
/// 書籍を登録することで状態を持ったテストをサポート。
/// 未登録の書籍は`CollaboratorError::BookNotFound`を返す。
pub struct BookService {
    books: Mutex<HashMap<BookId, Book>>,
}

impl BookService {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(HashMap::new()),
        }
    }

    /// テスト用に書籍を登録
    pub fn add_book(&self, book_id: BookId, total_stock: u64) {
        let book = Book {
            id: book_id.clone(),
            title: "Mock Book Title".to_string(),
            author: "Mock Author".to_string(),
            description: String::new(),
            total_stock,
        };
        self.books.lock().unwrap().insert(book_id, book);
    }
}

impl Default for BookService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookServiceTrait for BookService {
    /// 登録された書籍を返す
    async fn lookup_book(&self, book_id: &BookId) -> Result<Book> {
        self.books
            .lock()
            .unwrap()
            .get(book_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::BookNotFound(book_id.clone()).into())
    }
}
