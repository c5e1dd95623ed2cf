use crate::domain::{self, AuthToken, LoanRecord, Permission, commands::*};
use crate::ports::*;
use chrono::Duration;
use std::sync::Arc;

use super::errors::{LoanApplicationError, Result};

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
///
/// 台帳はグローバルな状態ではなく明示的に渡されるハンドルのため、
/// テストでは独立した台帳を複数同時に扱える。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub loan_repository: Arc<dyn LoanRepository>,
    pub user_service: Arc<dyn UserService>,
    pub book_service: Arc<dyn BookService>,
    /// 貸出から返却期限までの期間
    pub return_period: Duration,
}

/// 認証トークンから利用者を解決するヘルパー関数
///
/// ユーザーサービスのエラーは種別を保ったまま伝播する。
pub(super) async fn authenticate(deps: &ServiceDependencies, token: &AuthToken) -> Result<User> {
    deps.user_service
        .verify_token(token)
        .await
        .map_err(LoanApplicationError::UserServiceError)
}

/// 利用者が権限を持つことを確認するヘルパー関数
pub(super) fn authorize(user: &User, permission: Permission) -> Result<()> {
    if user.permissions.contains(permission) {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.id, ?permission, "Permission denied");
        Err(LoanApplicationError::Forbidden)
    }
}

/// 書籍を借りる（純粋な関数）
///
/// ビジネスルール：
/// - 利用者IDが省略された場合は認証された本人の貸出とする
/// - 貸出権限（LoanBooks）が必要（本人の貸出でも省略不可）
/// - 書籍がカタログに存在すること
/// - 同じ書籍の未返却冊数が総在庫数未満であること（台帳側で検査）
///
/// 台帳への書き込みは最後の1回のみ。それ以前に失敗・キャンセルされた場合、
/// 台帳は変更されない。
///
/// # 戻り値
/// 成功時は作成された貸出記録
#[tracing::instrument(skip(deps, cmd), fields(book_id = %cmd.book_id))]
pub async fn take_book(deps: &ServiceDependencies, cmd: TakeBook) -> Result<LoanRecord> {
    // 1. 利用者の認証
    let caller = authenticate(deps, &cmd.auth_token).await?;

    // 2. 利用者IDの既定値（本人）
    let user_id = cmd.user_id.unwrap_or_else(|| caller.id.clone());

    // 3. 権限確認
    authorize(&caller, Permission::LoanBooks)?;

    // 4. 書籍の総在庫数を取得
    let book = deps
        .book_service
        .lookup_book(&cmd.book_id)
        .await
        .map_err(LoanApplicationError::BookServiceError)?;

    // 5. ドメイン層の純粋関数を呼び出し
    let record = domain::loan::take_book(user_id, cmd.book_id, cmd.taken_at, deps.return_period)
        .map_err(|_| LoanApplicationError::DeadlineOutOfRange)?;

    // 6. 台帳に追加（在庫上限はここで原子的に検査される）
    deps.loan_repository
        .insert(record.clone(), book.total_stock)
        .await?;

    tracing::info!(
        loan_id = %record.id,
        user_id = %record.user_id,
        return_deadline = %record.return_deadline,
        "Book taken"
    );

    Ok(record)
}

/// 書籍を返却する（純粋な関数）
///
/// ビジネスルール：
/// - 利用者IDと権限の扱いは`take_book()`と同じ
/// - 利用者と書籍が一致する未返却の貸出のうち、返却期限が最も早いものを返却する
/// - 延滞していても返却は受け付ける
///
/// # 並行性
///
/// 検索 → 選択 → 返却記録の3段階は1つの原子的な操作ではない。
/// 同じ貸出に対する並行した返却は、後着側の`mark_returned`が
/// `Collision`で失敗することで検出される（台帳は壊れない）。
/// 再試行するかどうかは呼び出し元が判断する。
///
/// # 戻り値
/// 成功時は返却済みになった貸出記録
#[tracing::instrument(skip(deps, cmd), fields(book_id = %cmd.book_id))]
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<LoanRecord> {
    // 1. 利用者の認証
    let caller = authenticate(deps, &cmd.auth_token).await?;

    // 2. 利用者IDの既定値（本人）
    let user_id = cmd.user_id.unwrap_or_else(|| caller.id.clone());

    // 3. 権限確認
    authorize(&caller, Permission::LoanBooks)?;

    // 4. 返却候補を取得
    let loans = deps
        .loan_repository
        .find_loans_of(Some(&user_id), Some(&cmd.book_id))
        .await?;

    // 5. 返却期限が最も早い未返却の貸出を選択
    let target =
        domain::loan::select_return_target(&loans).ok_or(LoanApplicationError::NotFound)?;

    // 6. ドメイン層の純粋関数で返却済みにし、台帳に記録
    let returned = domain::loan::return_book(target, cmd.returned_at)
        .map_err(|_| LoanApplicationError::Collision)?;

    deps.loan_repository.mark_returned(returned.clone()).await?;

    tracing::info!(loan_id = %returned.id, user_id = %returned.user_id, "Book returned");

    Ok(returned)
}
