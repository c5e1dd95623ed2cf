//! LoanRepositoryの契約テスト
//!
//! インメモリ実装とPostgreSQL実装の両方に同じケースを適用する。
//! 各関数は空の台帳を受け取る前提。

use loan_ledger::domain::{BookId, LoanId, LoanRecord, UserId};
use loan_ledger::ports::{LoanRepository, RepositoryError};

use super::ts;

fn loan(user: &str, book: &str, taken_at: i64, deadline: i64) -> LoanRecord {
    LoanRecord {
        id: LoanId::new(),
        user_id: UserId::new(user),
        book_id: BookId::new(book),
        taken_at: ts(taken_at),
        return_deadline: ts(deadline),
        returned_at: None,
    }
}

fn returned(record: &LoanRecord, at: i64) -> LoanRecord {
    LoanRecord {
        returned_at: Some(ts(at)),
        ..record.clone()
    }
}

fn sorted_ids(records: &[LoanRecord]) -> Vec<LoanId> {
    let mut ids: Vec<LoanId> = records.iter().map(|r| r.id).collect();
    ids.sort();
    ids
}

pub async fn insert_then_get_by_id(repo: &dyn LoanRepository) {
    let record = loan("vasya-pupkin", "single-book", 100, 999);

    repo.insert(record.clone(), 1).await.unwrap();

    let stored = repo.get_by_id(record.id).await.unwrap();
    assert_eq!(stored, Some(record));
    assert_eq!(repo.get_by_id(LoanId::new()).await.unwrap(), None);
}

pub async fn insert_duplicate_id_collides(repo: &dyn LoanRepository) {
    let record = loan("vasya-pupkin", "multi-book", 100, 999);
    repo.insert(record.clone(), 5).await.unwrap();

    let result = repo.insert(record.clone(), 5).await;
    assert!(matches!(result, Err(RepositoryError::Collision)));

    let all = repo.find_loans_of(None, None).await.unwrap();
    assert_eq!(all.len(), 1);
}

pub async fn insert_respects_total_stock(repo: &dyn LoanRepository) {
    repo.insert(loan("u1", "multi-book", 100, 999), 2)
        .await
        .unwrap();
    repo.insert(loan("u2", "multi-book", 100, 999), 2)
        .await
        .unwrap();

    let result = repo.insert(loan("u3", "multi-book", 100, 999), 2).await;
    assert!(matches!(result, Err(RepositoryError::NoStock)));

    // 他の書籍の在庫には影響しない
    repo.insert(loan("u3", "single-book", 100, 999), 1)
        .await
        .unwrap();

    let book = BookId::new("multi-book");
    let lent = repo.find_loans_of(None, Some(&book)).await.unwrap();
    assert_eq!(lent.len(), 2);
}

pub async fn insert_with_zero_stock_fails(repo: &dyn LoanRepository) {
    let result = repo.insert(loan("u1", "no-stock-book", 100, 999), 0).await;
    assert!(matches!(result, Err(RepositoryError::NoStock)));
    assert!(repo.find_loans_of(None, None).await.unwrap().is_empty());
}

pub async fn returned_loans_free_stock(repo: &dyn LoanRepository) {
    let first = loan("u1", "single-book", 100, 999);
    repo.insert(first.clone(), 1).await.unwrap();

    let second = loan("u2", "single-book", 200, 999);
    let result = repo.insert(second.clone(), 1).await;
    assert!(matches!(result, Err(RepositoryError::NoStock)));

    repo.mark_returned(returned(&first, 150)).await.unwrap();
    repo.insert(second, 1).await.unwrap();
}

pub async fn mark_returned_unknown_loan_is_not_found(repo: &dyn LoanRepository) {
    let record = returned(&loan("u1", "single-book", 100, 999), 200);

    let result = repo.mark_returned(record).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

pub async fn mark_returned_twice_collides(repo: &dyn LoanRepository) {
    let record = loan("u1", "single-book", 100, 999);
    repo.insert(record.clone(), 1).await.unwrap();

    repo.mark_returned(returned(&record, 200)).await.unwrap();
    let result = repo.mark_returned(returned(&record, 300)).await;
    assert!(matches!(result, Err(RepositoryError::Collision)));

    // 最初の返却日時が保たれる
    let stored = repo.get_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(stored.returned_at, Some(ts(200)));
}

pub async fn mark_returned_mismatched_record_collides(repo: &dyn LoanRepository) {
    let record = loan("u1", "single-book", 100, 999);
    repo.insert(record.clone(), 1).await.unwrap();

    let forged = LoanRecord {
        user_id: UserId::new("someone-else"),
        ..returned(&record, 200)
    };
    let result = repo.mark_returned(forged).await;
    assert!(matches!(result, Err(RepositoryError::Collision)));

    let stored = repo.get_by_id(record.id).await.unwrap().unwrap();
    assert!(!stored.is_returned());
}

pub async fn find_active_at_filters_by_time(repo: &dyn LoanRepository) {
    let record = loan("u1", "multi-book", 100, 999);
    let still_out = loan("u2", "multi-book", 200, 999);
    repo.insert(record.clone(), 5).await.unwrap();
    repo.insert(still_out.clone(), 5).await.unwrap();
    repo.mark_returned(returned(&record, 300)).await.unwrap();

    assert!(repo.find_active_at(ts(99)).await.unwrap().is_empty());

    let at_100 = repo.find_active_at(ts(100)).await.unwrap();
    assert_eq!(sorted_ids(&at_100), vec![record.id]);

    let at_299 = repo.find_active_at(ts(299)).await.unwrap();
    assert_eq!(sorted_ids(&at_299), sorted_ids(&[record, still_out.clone()]));

    let at_300 = repo.find_active_at(ts(300)).await.unwrap();
    assert_eq!(sorted_ids(&at_300), vec![still_out.id]);
}

pub async fn find_overdue_at_filters_by_deadline(repo: &dyn LoanRepository) {
    let record = loan("u1", "multi-book", 100, 456);
    let on_time = loan("u2", "multi-book", 100, 10_000);
    repo.insert(record.clone(), 5).await.unwrap();
    repo.insert(on_time, 5).await.unwrap();

    assert!(repo.find_overdue_at(ts(455)).await.unwrap().is_empty());

    let at_456 = repo.find_overdue_at(ts(456)).await.unwrap();
    assert_eq!(sorted_ids(&at_456), vec![record.id]);

    // 延滞後の返却：返却時点より前は延滞として数える
    repo.mark_returned(returned(&record, 500)).await.unwrap();
    assert_eq!(repo.find_overdue_at(ts(499)).await.unwrap().len(), 1);
    assert!(repo.find_overdue_at(ts(500)).await.unwrap().is_empty());
}

pub async fn find_loans_of_filters_by_user_and_book(repo: &dyn LoanRepository) {
    let a = loan("u1", "book-a", 100, 999);
    let b = loan("u1", "book-b", 100, 999);
    let c = loan("u2", "book-a", 100, 999);
    for record in [&a, &b, &c] {
        repo.insert(record.clone(), 5).await.unwrap();
    }

    let u1 = UserId::new("u1");
    let book_a = BookId::new("book-a");

    let all = repo.find_loans_of(None, None).await.unwrap();
    assert_eq!(sorted_ids(&all), sorted_ids(&[a.clone(), b.clone(), c.clone()]));

    let of_user = repo.find_loans_of(Some(&u1), None).await.unwrap();
    assert_eq!(sorted_ids(&of_user), sorted_ids(&[a.clone(), b.clone()]));

    let of_book = repo.find_loans_of(None, Some(&book_a)).await.unwrap();
    assert_eq!(sorted_ids(&of_book), sorted_ids(&[a.clone(), c]));

    let both = repo.find_loans_of(Some(&u1), Some(&book_a)).await.unwrap();
    assert_eq!(sorted_ids(&both), vec![a.id]);

    let nobody = UserId::new("nobody");
    assert!(repo
        .find_loans_of(Some(&nobody), None)
        .await
        .unwrap()
        .is_empty());
}

pub async fn mark_returned_only_records_return_time(repo: &dyn LoanRepository) {
    let record = loan("u1", "single-book", 1000, 2000);
    repo.insert(record.clone(), 1).await.unwrap();

    // 貸出日時・返却期限の書き換え
    let rewritten = LoanRecord {
        taken_at: ts(5000),
        return_deadline: ts(9999),
        ..returned(&record, 6000)
    };
    let result = repo.mark_returned(rewritten).await;
    assert!(matches!(result, Err(RepositoryError::Collision)));

    // 貸出日時より前の返却
    let result = repo.mark_returned(returned(&record, 10)).await;
    assert!(matches!(result, Err(RepositoryError::Collision)));

    // 返却日時なし
    let result = repo.mark_returned(record.clone()).await;
    assert!(matches!(result, Err(RepositoryError::Collision)));

    assert_eq!(repo.get_by_id(record.id).await.unwrap(), Some(record.clone()));

    repo.mark_returned(returned(&record, 1500)).await.unwrap();
    let stored = repo.get_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(stored.taken_at, ts(1000));
    assert_eq!(stored.return_deadline, ts(2000));
    assert_eq!(stored.returned_at, Some(ts(1500)));
}
