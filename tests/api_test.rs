use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use loan_ledger::adapters::memory::InMemoryLoanRepository;
use loan_ledger::adapters::mock::{BookService, UserService};
use loan_ledger::api::handlers::AppState;
use loan_ledger::api::types::*;
use loan_ledger::api::{create_internal_router, create_router};
use loan_ledger::application::loan::ServiceDependencies;
use loan_ledger::domain::*;
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// テスト用のヘルパー関数
// ============================================================================

struct TestApp {
    public: axum::Router,
    internal: axum::Router,
    repository: Arc<InMemoryLoanRepository>,
}

fn setup_app() -> TestApp {
    let user_service = Arc::new(UserService::new());
    user_service.add_user(
        AuthToken::new("token-regular-user"),
        UserId::new("vasya-pupkin"),
        [Permission::QueryAvailableStock, Permission::QueryReservations]
            .into_iter()
            .collect(),
    );
    user_service.add_user(
        AuthToken::new("token-librarian"),
        UserId::new("librarian"),
        Permissions::all(),
    );

    let book_service = Arc::new(BookService::new());
    book_service.add_book(BookId::new("single-book"), 1);
    book_service.add_book(BookId::new("multi-book"), 5);

    let repository = Arc::new(InMemoryLoanRepository::new());

    let service_deps = ServiceDependencies {
        loan_repository: repository.clone(),
        user_service,
        book_service,
        return_period: Duration::days(14),
    };
    let app_state = Arc::new(AppState { service_deps });

    TestApp {
        public: create_router(app_state.clone()),
        internal: create_internal_router(app_state),
        repository,
    }
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn ts(secs: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(secs, 0).unwrap()
}

// ============================================================================
// 公開API
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();

    let response = app.public.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_take_and_return_book() {
    let app = setup_app();

    let response = app
        .public
        .clone()
        .oneshot(form_post(
            "/api/v1/book/single-book/take",
            "auth=token-librarian&user=vasya-pupkin",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let taken: LoanResponse = read_json(response).await;
    assert_eq!(taken.user_id, "vasya-pupkin");
    assert_eq!(taken.book_id, "single-book");
    assert!(!taken.returned);
    assert_eq!(taken.returned_at, 0);
    assert_eq!(taken.return_deadline - taken.taken_at, 14 * 24 * 60 * 60);

    let response = app
        .public
        .oneshot(form_post(
            "/api/v1/book/single-book/return",
            "auth=token-librarian&user=vasya-pupkin",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let returned: LoanResponse = read_json(response).await;
    assert_eq!(returned.id, taken.id);
    assert!(returned.returned);
    assert!(returned.returned_at >= taken.taken_at);
}

#[tokio::test]
async fn test_take_book_without_permission() {
    let app = setup_app();

    let response = app
        .public
        .oneshot(form_post(
            "/api/v1/book/single-book/take",
            "auth=token-regular-user",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "FORBIDDEN");
    assert!(app.repository.raw_data().is_empty());
}

#[tokio::test]
async fn test_take_book_out_of_stock() {
    let app = setup_app();

    let response = app
        .public
        .clone()
        .oneshot(form_post(
            "/api/v1/book/single-book/take",
            "auth=token-librarian",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .public
        .oneshot(form_post(
            "/api/v1/book/single-book/take",
            "auth=token-librarian&user=vasya-pupkin",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "NO_STOCK");
}

#[tokio::test]
async fn test_take_book_without_auth() {
    let app = setup_app();

    let response = app
        .public
        .oneshot(form_post("/api/v1/book/single-book/take", "user=vasya-pupkin"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "MISSING_PARAMS");
}

#[tokio::test]
async fn test_take_book_without_form_content_type() {
    let app = setup_app();

    let response = app
        .public
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/book/single-book/take")
                .body(Body::from("auth=token-librarian"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "MISSING_PARAMS");
    assert!(app.repository.raw_data().is_empty());
}

#[tokio::test]
async fn test_take_unknown_book() {
    let app = setup_app();

    let response = app
        .public
        .oneshot(form_post("/api/v1/book/bad-book/take", "auth=token-librarian"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "BOOK_SERVICE_ERROR");
}

#[tokio::test]
async fn test_return_book_not_lent() {
    let app = setup_app();

    let response = app
        .public
        .oneshot(form_post(
            "/api/v1/book/multi-book/return",
            "auth=token-librarian",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "LOAN_NOT_FOUND");
}

#[tokio::test]
async fn test_get_available() {
    let app = setup_app();
    app.repository.reset_raw_data([LoanRecord {
        id: LoanId::new(),
        user_id: UserId::new("vasya-pupkin"),
        book_id: BookId::new("multi-book"),
        taken_at: ts(100),
        return_deadline: ts(456),
        returned_at: None,
    }]);

    let response = app
        .public
        .oneshot(get("/api/v1/book/multi-book/avail?auth=token-regular-user"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: AvailableResponse = read_json(response).await;
    assert_eq!(body.available, 4);
}

#[tokio::test]
async fn test_reserved_and_overdue_at_time() {
    let app = setup_app();
    let loan = LoanRecord {
        id: LoanId::new(),
        user_id: UserId::new("vasya-pupkin"),
        book_id: BookId::new("multi-book"),
        taken_at: ts(100),
        return_deadline: ts(456),
        returned_at: None,
    };
    app.repository.reset_raw_data([loan.clone()]);

    let response = app
        .public
        .clone()
        .oneshot(get("/api/v1/reserved?auth=token-regular-user&atTime=200"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: ReservedResponse = read_json(response).await;
    assert_eq!(body.reserved, vec![LoanResponse::from(loan.clone())]);

    let response = app
        .public
        .clone()
        .oneshot(get("/api/v1/overdue?auth=token-regular-user&atTime=200"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: OverdueResponse = read_json(response).await;
    assert!(body.overdue.is_empty());

    let response = app
        .public
        .oneshot(get("/api/v1/overdue?auth=token-regular-user&atTime=500"))
        .await
        .unwrap();
    let body: OverdueResponse = read_json(response).await;
    assert_eq!(body.overdue.len(), 1);
    assert_eq!(body.overdue[0].id, loan.id.value());
    assert_eq!(body.overdue[0].return_deadline, 456);
}

#[tokio::test]
async fn test_reserved_with_invalid_time() {
    let app = setup_app();

    let response = app
        .public
        .oneshot(get("/api/v1/reserved?auth=token-regular-user&atTime=yesterday"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// 内部API
// ============================================================================

#[tokio::test]
async fn test_internal_user_loans() {
    let app = setup_app();
    app.repository.reset_raw_data([
        LoanRecord {
            id: LoanId::new(),
            user_id: UserId::new("vasya-pupkin"),
            book_id: BookId::new("multi-book"),
            taken_at: ts(100),
            return_deadline: ts(456),
            returned_at: None,
        },
        LoanRecord {
            id: LoanId::new(),
            user_id: UserId::new("vasya-pupkin"),
            book_id: BookId::new("single-book"),
            taken_at: ts(100),
            return_deadline: ts(456),
            returned_at: Some(ts(300)),
        },
    ]);

    let response = app
        .internal
        .oneshot(get("/api/v1/userloans/vasya-pupkin"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: UnreturnedResponse = read_json(response).await;
    assert_eq!(body.unreturned, 1);
}

#[tokio::test]
async fn test_internal_routes_not_on_public_router() {
    let app = setup_app();

    let response = app
        .public
        .oneshot(get("/api/v1/userloans/vasya-pupkin"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
