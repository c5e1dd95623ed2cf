use crate::application::loan::{
    ServiceDependencies, count_available as execute_count_available,
    get_unreturned_count_for_user as execute_get_unreturned_count,
    list_overdue as execute_list_overdue, list_reservations as execute_list_reservations,
    return_book as execute_return_book, take_book as execute_take_book,
};
use crate::domain::{
    AuthToken, BookId, UserId,
    commands::{ReturnBook, TakeBook},
};
use axum::{
    Form, Json,
    extract::{Path, Query, State, rejection::FormRejection},
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    error::ApiError,
    types::{
        AtTimeQuery, AuthQuery, AvailableResponse, LoanForm, LoanResponse, OverdueResponse,
        ReservedResponse, UnreturnedResponse, parse_at_time,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Helpers
// ============================================================================

/// authパラメータを必須として取り出す
fn require_auth(auth: Option<String>) -> Result<AuthToken, ApiError> {
    auth.filter(|s| !s.is_empty())
        .map(AuthToken::new)
        .ok_or_else(|| ApiError::MissingParams("auth".to_string()))
}

/// フォームを取り出す（Content-Typeの不一致や解析の失敗は400として扱う）
fn require_form(form: Result<Form<LoanForm>, FormRejection>) -> Result<LoanForm, ApiError> {
    form.map(|Form(form)| form)
        .map_err(|rejection| ApiError::MissingParams(rejection.body_text()))
}

/// userパラメータを取り出す（空文字は省略扱い）
fn optional_user(user: Option<String>) -> Option<UserId> {
    user.filter(|s| !s.is_empty()).map(UserId::new)
}

// ============================================================================
// Command handlers (POST)
// ============================================================================

/// POST /api/v1/book/:book_id/take - 書籍を借りる
///
/// フォームパラメータ:
/// - auth: 認証トークン（必須）
/// - user: 借りる利用者のID（省略時は本人）
///
/// 強制されるビジネスルール:
/// - 貸出権限を持つこと
/// - 書籍がカタログに存在すること
/// - 未返却の冊数が総在庫数未満であること
pub async fn take_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
    form: Result<Form<LoanForm>, FormRejection>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let form = require_form(form)?;
    let cmd = TakeBook {
        auth_token: require_auth(form.auth)?,
        user_id: optional_user(form.user),
        book_id: BookId::new(book_id),
        taken_at: chrono::Utc::now(),
    };

    let record = execute_take_book(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(LoanResponse::from(record))))
}

/// POST /api/v1/book/:book_id/return - 書籍を返却
///
/// フォームパラメータは貸出と同じ。
/// 返却期限が最も早い未返却の貸出が返却される。
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
    form: Result<Form<LoanForm>, FormRejection>,
) -> Result<Json<LoanResponse>, ApiError> {
    let form = require_form(form)?;
    let cmd = ReturnBook {
        auth_token: require_auth(form.auth)?,
        user_id: optional_user(form.user),
        book_id: BookId::new(book_id),
        returned_at: chrono::Utc::now(),
    };

    let record = execute_return_book(&state.service_deps, cmd).await?;

    Ok(Json(LoanResponse::from(record)))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /api/v1/book/:book_id/avail - 貸出可能冊数を取得
pub async fn get_available(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
    Query(query): Query<AuthQuery>,
) -> Result<Json<AvailableResponse>, ApiError> {
    let auth_token = require_auth(query.auth)?;

    let available =
        execute_count_available(&state.service_deps, &auth_token, &BookId::new(book_id)).await?;

    Ok(Json(AvailableResponse { available }))
}

/// GET /api/v1/reserved - 指定時点で貸出中の記録一覧
///
/// クエリパラメータ:
/// - auth: 認証トークン（必須）
/// - atTime: UNIX時刻（秒）、省略時は現在時刻
pub async fn list_reserved(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AtTimeQuery>,
) -> Result<Json<ReservedResponse>, ApiError> {
    let auth_token = require_auth(query.auth)?;
    let at = parse_at_time(query.at_time.as_deref()).map_err(ApiError::MissingParams)?;

    let loans = execute_list_reservations(&state.service_deps, &auth_token, at).await?;

    Ok(Json(ReservedResponse {
        reserved: loans.into_iter().map(LoanResponse::from).collect(),
    }))
}

/// GET /api/v1/overdue - 指定時点で延滞中の記録一覧
///
/// クエリパラメータは`list_reserved`と同じ。
pub async fn list_overdue(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AtTimeQuery>,
) -> Result<Json<OverdueResponse>, ApiError> {
    let auth_token = require_auth(query.auth)?;
    let at = parse_at_time(query.at_time.as_deref()).map_err(ApiError::MissingParams)?;

    let loans = execute_list_overdue(&state.service_deps, &auth_token, at).await?;

    Ok(Json(OverdueResponse {
        overdue: loans.into_iter().map(LoanResponse::from).collect(),
    }))
}

// ============================================================================
// Internal handlers
// ============================================================================

/// GET /api/v1/userloans/:user_id - 利用者の未返却数（内部API）
///
/// 権限確認を行わないため、内部用リスナーにのみ登録すること。
pub async fn get_user_loans(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UnreturnedResponse>, ApiError> {
    if user_id.is_empty() {
        return Err(ApiError::MissingParams("userID".to_string()));
    }

    let unreturned =
        execute_get_unreturned_count(&state.service_deps, &UserId::new(user_id)).await?;

    Ok(Json(UnreturnedResponse { unreturned }))
}
