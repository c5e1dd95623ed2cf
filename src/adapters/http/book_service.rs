use crate::adapters::error::CollaboratorError;
use crate::domain::BookId;
use crate::ports::book_service::{Book, BookService as BookServiceTrait, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize)]
struct BookResponse {
    id: String,
    title: String,
    author: String,
    description: String,
    /// 総冊数（10進文字列）
    stock: String,
}

/// BookServiceのHTTP実装
///
/// カタログサービスの GET /api/v1/books/{id} を呼び出す。
pub struct BookService {
    base_url: String,
    client: Client,
}

impl BookService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl BookServiceTrait for BookService {
    #[tracing::instrument(skip(self))]
    async fn lookup_book(&self, book_id: &BookId) -> Result<Book> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            CollaboratorError::InvalidPayload(format!("invalid book service URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                CollaboratorError::InvalidPayload("book service URL cannot be a base".to_string())
            })?
            .pop_if_empty()
            .extend(["api", "v1", "books", book_id.as_str()]);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(CollaboratorError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CollaboratorError::BookNotFound(book_id.clone()).into());
        }

        let book: BookResponse = super::ensure_success(response)
            .await?
            .json()
            .await
            .map_err(CollaboratorError::from)?;

        let total_stock: u64 = book.stock.parse().map_err(|e| {
            CollaboratorError::InvalidPayload(format!("failed to parse stock: {}", e))
        })?;

        Ok(Book {
            id: BookId::new(book.id),
            title: book.title,
            author: book.author,
            description: book.description,
            total_stock,
        })
    }
}
