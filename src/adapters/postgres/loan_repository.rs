use crate::domain::{BookId, LoanId, LoanRecord, UserId};
use crate::ports::loan_repository::{
    LoanRepository as LoanRepositoryTrait, RepositoryError, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    PgPool, Postgres, Row,
    postgres::{PgArguments, PgRow},
    query::Query,
};

/// sqlxのエラーを永続化層の障害として包む
fn storage_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(Box::new(err))
}

/// PostgreSQLの行データをLoanRecordに変換する
fn map_row_to_loan_record(row: &PgRow) -> Result<LoanRecord> {
    Ok(LoanRecord {
        id: LoanId::from_uuid(row.try_get("loan_id").map_err(storage_error)?),
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(storage_error)?),
        book_id: BookId::new(row.try_get::<String, _>("book_id").map_err(storage_error)?),
        taken_at: row.try_get("taken_at").map_err(storage_error)?,
        return_deadline: row.try_get("return_deadline").map_err(storage_error)?,
        returned_at: row.try_get("returned_at").map_err(storage_error)?,
    })
}

/// LoanRepositoryのPostgreSQL実装
///
/// 変更操作はトランザクション内で行う。
/// - insert: 書籍ごとのアドバイザリロックで同じ書籍への貸出を直列化する
/// - mark_returned: 対象行を`FOR UPDATE`でロックする
///
/// 読み取りは単一のSELECTで行い、コミット済みのスナップショットのみを見る。
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    /// PostgreSQLコネクションプールから新しいLoanRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// スキーマのマイグレーションを実行
    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn fetch(&self, query: Query<'_, Postgres, PgArguments>) -> Result<Vec<LoanRecord>> {
        let rows = query.fetch_all(&self.pool).await.map_err(storage_error)?;
        rows.iter().map(map_row_to_loan_record).collect()
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    /// 在庫上限を確認して貸出記録を追加
    ///
    /// 同じ書籍へのinsertはアドバイザリロックで直列化されるため、
    /// 件数の確認から挿入までの間に他の貸出が割り込むことはない。
    async fn insert(&self, record: LoanRecord, total_stock: u64) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(record.book_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM loans WHERE loan_id = $1)")
                .bind(record.id.value())
                .fetch_one(&mut *tx)
                .await
                .map_err(storage_error)?;

        if exists {
            return Err(RepositoryError::Collision);
        }

        let lent: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM loans
            WHERE book_id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(record.book_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        if lent.max(0) as u64 >= total_stock {
            return Err(RepositoryError::NoStock);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                user_id,
                book_id,
                taken_at,
                return_deadline,
                returned_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.value())
        .bind(record.user_id.as_str())
        .bind(record.book_id.as_str())
        .bind(record.taken_at)
        .bind(record.return_deadline)
        .bind(record.returned_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            // 別の書籍の貸出と同じIDが同時に挿入された場合
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(RepositoryError::Collision);
            }
            Err(e) => return Err(storage_error(e)),
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }

    /// 返却を記録
    ///
    /// 作成後に変化するのはreturned_atのみのため、その列だけを更新する。
    async fn mark_returned(&self, record: LoanRecord) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let stored = sqlx::query(
            r#"
            SELECT loan_id, user_id, book_id, taken_at, return_deadline, returned_at
            FROM loans
            WHERE loan_id = $1
            FOR UPDATE
            "#,
        )
        .bind(record.id.value())
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?
        .ok_or(RepositoryError::NotFound)?;
        let stored = map_row_to_loan_record(&stored)?;

        // 返却済み、古い・別の記録、返却日時の逆行
        if !record.is_return_of(&stored) {
            return Err(RepositoryError::Collision);
        }

        sqlx::query("UPDATE loans SET returned_at = $2 WHERE loan_id = $1")
            .bind(record.id.value())
            .bind(record.returned_at)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }

    async fn find_active_at(&self, at: DateTime<Utc>) -> Result<Vec<LoanRecord>> {
        self.fetch(
            sqlx::query(
                r#"
                SELECT loan_id, user_id, book_id, taken_at, return_deadline, returned_at
                FROM loans
                WHERE taken_at <= $1
                  AND (returned_at IS NULL OR returned_at > $1)
                "#,
            )
            .bind(at),
        )
        .await
    }

    async fn find_overdue_at(&self, at: DateTime<Utc>) -> Result<Vec<LoanRecord>> {
        self.fetch(
            sqlx::query(
                r#"
                SELECT loan_id, user_id, book_id, taken_at, return_deadline, returned_at
                FROM loans
                WHERE return_deadline <= $1
                  AND (returned_at IS NULL OR returned_at > $1)
                "#,
            )
            .bind(at),
        )
        .await
    }

    async fn find_loans_of(
        &self,
        user_id: Option<&UserId>,
        book_id: Option<&BookId>,
    ) -> Result<Vec<LoanRecord>> {
        self.fetch(
            sqlx::query(
                r#"
                SELECT loan_id, user_id, book_id, taken_at, return_deadline, returned_at
                FROM loans
                WHERE ($1::text IS NULL OR user_id = $1)
                  AND ($2::text IS NULL OR book_id = $2)
                "#,
            )
            .bind(user_id.map(UserId::as_str))
            .bind(book_id.map(BookId::as_str)),
        )
        .await
    }

    async fn get_by_id(&self, id: LoanId) -> Result<Option<LoanRecord>> {
        let row = sqlx::query(
            r#"
            SELECT loan_id, user_id, book_id, taken_at, return_deadline, returned_at
            FROM loans
            WHERE loan_id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(map_row_to_loan_record).transpose()
    }
}
