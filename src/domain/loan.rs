use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, ReturnLoanError, TakeLoanError, UserId};

/// 既定の返却期間（日数）
pub const DEFAULT_RETURN_PERIOD_DAYS: i64 = 14;

/// 貸出記録 - 1冊の書籍の1回の貸出
///
/// 台帳は追記専用で、記録は削除されない。
/// 作成後に変化するのは`returned_at`のみ（未返却 → 返却済みの一方向）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    // 識別子
    pub id: LoanId,

    // 他のサービスへの参照（IDのみ）
    pub user_id: UserId,
    pub book_id: BookId,

    // 貸出期間
    pub taken_at: DateTime<Utc>,
    pub return_deadline: DateTime<Utc>,

    /// 返却日時（未返却ならNone）
    pub returned_at: Option<DateTime<Utc>>,
}

impl LoanRecord {
    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    /// 指定時点で既に返却されていたか
    pub fn returned_by(&self, at: DateTime<Utc>) -> bool {
        matches!(self.returned_at, Some(returned_at) if returned_at <= at)
    }

    /// 指定時点で貸出中だったか
    ///
    /// 貸出開始済みで、かつその時点で未返却の記録が該当する。
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.taken_at <= at && !self.returned_by(at)
    }

    /// 指定時点で延滞していたか
    pub fn is_overdue_at(&self, at: DateTime<Utc>) -> bool {
        self.return_deadline <= at && !self.returned_by(at)
    }

    /// 保存済みの未返却記録`stored`に対する正しい返却記録か
    ///
    /// 返却済みの記録、貸出内容の異なる記録（古い・別の記録）、
    /// 返却日時がないか貸出日時より前の記録は該当しない。
    pub fn is_return_of(&self, stored: &LoanRecord) -> bool {
        !stored.is_returned()
            && self.id == stored.id
            && self.user_id == stored.user_id
            && self.book_id == stored.book_id
            && self.taken_at == stored.taken_at
            && self.return_deadline == stored.return_deadline
            && self
                .returned_at
                .is_some_and(|returned_at| returned_at >= stored.taken_at)
    }
}

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 返却期限 = 貸出日時 + 返却期間
/// - 未返却で作成される
///
/// 副作用なし。IDは新規に採番する。
pub fn take_book(
    user_id: UserId,
    book_id: BookId,
    taken_at: DateTime<Utc>,
    return_period: Duration,
) -> Result<LoanRecord, TakeLoanError> {
    let return_deadline = taken_at
        .checked_add_signed(return_period)
        .ok_or(TakeLoanError::DeadlineOutOfRange)?;

    Ok(LoanRecord {
        id: LoanId::new(),
        user_id,
        book_id,
        taken_at,
        return_deadline,
        returned_at: None,
    })
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 返却済みの記録は再度返却できない
/// - 延滞していても返却は受け付ける
/// - 返却日時は貸出日時より前にならない（時計のずれは貸出日時に丸める）
pub fn return_book(
    loan: &LoanRecord,
    returned_at: DateTime<Utc>,
) -> Result<LoanRecord, ReturnLoanError> {
    if loan.is_returned() {
        return Err(ReturnLoanError::AlreadyReturned);
    }

    Ok(LoanRecord {
        returned_at: Some(returned_at.max(loan.taken_at)),
        ..loan.clone()
    })
}

/// 純粋関数：返却対象の貸出を選ぶ
///
/// 未返却の記録のうち返却期限が最も早いものを選ぶ。
/// 期限が同じ場合は貸出日時、IDの順で比較し、結果を決定的にする。
pub fn select_return_target(loans: &[LoanRecord]) -> Option<&LoanRecord> {
    loans
        .iter()
        .filter(|loan| !loan.is_returned())
        .min_by_key(|loan| (loan.return_deadline, loan.taken_at, loan.id))
}

/// 未返却の記録数
pub fn count_unreturned(loans: &[LoanRecord]) -> usize {
    loans.iter().filter(|loan| !loan.is_returned()).count()
}
