use crate::domain::{BookId, LoanId, LoanRecord, UserId};
use crate::ports::loan_repository::{
    LoanRepository as LoanRepositoryTrait, RepositoryError, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// LoanRepositoryのインメモリ実装
///
/// 全記録を1つのマップに保持し、1つのRwLockで保護する。
/// 変更操作は書き込みロックの中で検査と更新を行うため、
/// 在庫上限と返却1回の不変条件が並行実行下でも保たれる。
#[derive(Default)]
pub struct LoanRepository {
    loans: RwLock<HashMap<LoanId, LoanRecord>>,
}

impl LoanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用に台帳の内容を丸ごと置き換える
    pub fn reset_raw_data(&self, records: impl IntoIterator<Item = LoanRecord>) {
        let mut loans = self.write_guard();
        loans.clear();
        loans.extend(records.into_iter().map(|record| (record.id, record)));
    }

    /// テスト用に台帳の内容を複製して返す
    pub fn raw_data(&self) -> HashMap<LoanId, LoanRecord> {
        self.read_guard().clone()
    }

    // 保持中にパニックしたスレッドがあっても、各変更は検査後の単一の挿入・置換のみで
    // 中途半端な状態を残さないため、ポイズンは無視してよい
    fn read_guard(&self) -> RwLockReadGuard<'_, HashMap<LoanId, LoanRecord>> {
        self.loans.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, HashMap<LoanId, LoanRecord>> {
        self.loans.write().unwrap_or_else(|e| e.into_inner())
    }

    fn scan(&self, predicate: impl Fn(&LoanRecord) -> bool) -> Vec<LoanRecord> {
        self.read_guard()
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn insert(&self, record: LoanRecord, total_stock: u64) -> Result<()> {
        let mut loans = self.write_guard();

        if loans.contains_key(&record.id) {
            return Err(RepositoryError::Collision);
        }

        let lent = loans
            .values()
            .filter(|loan| loan.book_id == record.book_id && !loan.is_returned())
            .count() as u64;

        if lent >= total_stock {
            return Err(RepositoryError::NoStock);
        }

        loans.insert(record.id, record);
        Ok(())
    }

    async fn mark_returned(&self, record: LoanRecord) -> Result<()> {
        let mut loans = self.write_guard();

        let stored = loans.get_mut(&record.id).ok_or(RepositoryError::NotFound)?;

        // 返却済み、古い・別の記録、返却日時の逆行
        if !record.is_return_of(stored) {
            return Err(RepositoryError::Collision);
        }

        // 作成後に変化するのはreturned_atのみ
        stored.returned_at = record.returned_at;
        Ok(())
    }

    async fn find_active_at(&self, at: DateTime<Utc>) -> Result<Vec<LoanRecord>> {
        Ok(self.scan(|record| record.is_active_at(at)))
    }

    async fn find_overdue_at(&self, at: DateTime<Utc>) -> Result<Vec<LoanRecord>> {
        Ok(self.scan(|record| record.is_overdue_at(at)))
    }

    async fn find_loans_of(
        &self,
        user_id: Option<&UserId>,
        book_id: Option<&BookId>,
    ) -> Result<Vec<LoanRecord>> {
        Ok(self.scan(|record| {
            user_id.is_none_or(|id| &record.user_id == id)
                && book_id.is_none_or(|id| &record.book_id == id)
        }))
    }

    async fn get_by_id(&self, id: LoanId) -> Result<Option<LoanRecord>> {
        Ok(self.read_guard().get(&id).cloned())
    }
}
