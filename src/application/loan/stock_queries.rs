use crate::domain::{self, AuthToken, BookId, LoanRecord, Permission, UserId};
use chrono::{DateTime, Utc};

use super::errors::{LoanApplicationError, Result};
use super::loan_service::{ServiceDependencies, authenticate, authorize};

/// 貸出可能な冊数を数える
///
/// 貸出可能冊数 = 総在庫数 - 未返却の貸出数
///
/// 在庫数がカタログ側で減らされた場合に備え、0未満にはしない。
///
/// # 必要な権限
/// QueryAvailableStock
#[tracing::instrument(skip(deps, auth_token))]
pub async fn count_available(
    deps: &ServiceDependencies,
    auth_token: &AuthToken,
    book_id: &BookId,
) -> Result<u64> {
    let caller = authenticate(deps, auth_token).await?;
    authorize(&caller, Permission::QueryAvailableStock)?;

    let book = deps
        .book_service
        .lookup_book(book_id)
        .await
        .map_err(LoanApplicationError::BookServiceError)?;

    let loans = deps
        .loan_repository
        .find_loans_of(None, Some(book_id))
        .await?;
    let lent = domain::loan::count_unreturned(&loans) as u64;

    Ok(book.total_stock.saturating_sub(lent))
}

/// 指定時点で貸出中の記録を一覧する
///
/// # 必要な権限
/// QueryReservations
#[tracing::instrument(skip(deps, auth_token))]
pub async fn list_reservations(
    deps: &ServiceDependencies,
    auth_token: &AuthToken,
    at: DateTime<Utc>,
) -> Result<Vec<LoanRecord>> {
    let caller = authenticate(deps, auth_token).await?;
    authorize(&caller, Permission::QueryReservations)?;

    Ok(deps.loan_repository.find_active_at(at).await?)
}

/// 指定時点で延滞中の記録を一覧する
///
/// # 必要な権限
/// QueryReservations
#[tracing::instrument(skip(deps, auth_token))]
pub async fn list_overdue(
    deps: &ServiceDependencies,
    auth_token: &AuthToken,
    at: DateTime<Utc>,
) -> Result<Vec<LoanRecord>> {
    let caller = authenticate(deps, auth_token).await?;
    authorize(&caller, Permission::QueryReservations)?;

    Ok(deps.loan_repository.find_overdue_at(at).await?)
}

/// 利用者の未返却の貸出数を数える
///
/// 権限確認を行わないため、内部ネットワークからのみ呼び出すこと。
#[tracing::instrument(skip(deps))]
pub async fn get_unreturned_count_for_user(
    deps: &ServiceDependencies,
    user_id: &UserId,
) -> Result<u64> {
    let loans = deps
        .loan_repository
        .find_loans_of(Some(user_id), None)
        .await?;

    Ok(domain::loan::count_unreturned(&loans) as u64)
}
