use chrono::{DateTime, Utc};

use super::{AuthToken, BookId, UserId};

/// コマンド：書籍を借りる
///
/// `user_id`がNoneの場合は認証された利用者本人の貸出として扱う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeBook {
    pub auth_token: AuthToken,
    pub user_id: Option<UserId>,
    pub book_id: BookId,
    pub taken_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
///
/// `user_id`がNoneの場合は認証された利用者本人の返却として扱う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnBook {
    pub auth_token: AuthToken,
    pub user_id: Option<UserId>,
    pub book_id: BookId,
    pub returned_at: DateTime<Utc>,
}
