use crate::domain::{
    BookId, EntityKind, InventoryError, Loan, LoanDetails, LoanFilter, LoanId, MemberId, Result,
    TableStats,
};
use crate::ports::loan_ledger::LoanLedger as LoanLedgerTrait;
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{
    PgPool, Postgres,
    postgres::{PgArguments, PgRow},
    query::Query,
};
use std::sync::Arc;

use super::{Statements, begin, book_from_row, loan_from_row, member_from_row};

/// Column offsets of the detailed (joined) select.
const DETAIL_BOOK_OFFSET: usize = 4;
const DETAIL_MEMBER_OFFSET: usize = 8;

fn details_from_row(row: &PgRow) -> std::result::Result<LoanDetails, sqlx::Error> {
    Ok(LoanDetails {
        loan: loan_from_row(row, 0)?,
        book: book_from_row(row, DETAIL_BOOK_OFFSET)?,
        member: member_from_row(row, DETAIL_MEMBER_OFFSET)?,
    })
}

fn bind_filter<'q>(
    query: Query<'q, Postgres, PgArguments>,
    filter: LoanFilter,
) -> Query<'q, Postgres, PgArguments> {
    match filter {
        LoanFilter::Loan(id) => query.bind(id.value()),
        LoanFilter::Member(id) => query.bind(id.value()),
        LoanFilter::Book(id) => query.bind(id.value()),
        LoanFilter::Date(date) => query.bind(date),
    }
}

/// PostgreSQL implementation of LoanLedger
///
/// Loan creation and return each run in one transaction. The member row and
/// the book row are locked with `FOR UPDATE` before they are checked, and the
/// loans table is locked before its max id is read. Concurrent callers on the
/// same member or book wait for each other and then see the committed state;
/// unrelated loans only queue on the id lock.
/// The affected-row checks stay in place as a second line: an unexpected
/// count rolls the whole transaction back.
pub struct LoanLedger {
    pool: PgPool,
    sql: Arc<Statements>,
    max_loans_per_member: i64,
}

impl LoanLedger {
    pub fn new(pool: PgPool, sql: Arc<Statements>, max_loans_per_member: i64) -> Self {
        Self {
            pool,
            sql,
            max_loans_per_member,
        }
    }
}

#[async_trait]
impl LoanLedgerTrait for LoanLedger {
    async fn count_loans(&self) -> Result<TableStats> {
        let (count, max_id): (i64, i32) = sqlx::query_as(&self.sql.loan_stats)
            .fetch_one(&self.pool)
            .await?;
        Ok(TableStats { count, max_id })
    }

    async fn list_loans(&self) -> Result<Vec<Loan>> {
        let loans: Vec<Loan> = sqlx::query(&self.sql.list_loans)
            .fetch(&self.pool)
            .and_then(|row| async move { loan_from_row(&row, 0) })
            .try_collect()
            .await?;
        Ok(loans)
    }

    async fn create_loan(&self, member_id: MemberId, book_id: BookId) -> Result<Loan> {
        let mut tx = begin(&self.pool).await?;

        // 1. 会員の存在確認（行ロック）
        let member: Option<i32> = sqlx::query_scalar(&self.sql.member_for_update)
            .bind(member_id.value())
            .fetch_optional(&mut *tx)
            .await?;
        if member.is_none() {
            return Err(InventoryError::member_not_found_by_id(member_id));
        }

        // 2. 貸出上限確認
        let active: i64 = sqlx::query_scalar(&self.sql.count_member_loans)
            .bind(member_id.value())
            .fetch_one(&mut *tx)
            .await?;
        if active >= self.max_loans_per_member {
            return Err(InventoryError::LoanLimitExceeded {
                member_id,
                limit: self.max_loans_per_member,
            });
        }

        // 3. 書籍の貸出状態確認（行ロック）
        let flags: Vec<bool> = sqlx::query_scalar(&self.sql.book_flags_for_update)
            .bind(book_id.value())
            .fetch_all(&mut *tx)
            .await?;
        if flags.is_empty() {
            return Err(InventoryError::BookNotFound(book_id));
        }
        if flags.iter().any(|lent| *lent) {
            return Err(InventoryError::AlreadyLent(book_id));
        }

        // 4. 貸出フラグを立てる
        let affected = sqlx::query(&self.sql.set_book_lent)
            .bind(book_id.value())
            .bind(true)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        match affected {
            0 => return Err(InventoryError::BookNotFound(book_id)),
            1 => {}
            _ => {
                tx.rollback().await?;
                return Err(InventoryError::IntegrityViolation(format!(
                    "lending book {} updated {} rows",
                    book_id, affected
                )));
            }
        }

        // 5. 貸出行を追加
        sqlx::query(&self.sql.lock_loans).execute(&mut *tx).await?;
        let (_, max_id): (i64, i32) = sqlx::query_as(&self.sql.loan_stats)
            .fetch_one(&mut *tx)
            .await?;

        let row = sqlx::query(&self.sql.insert_loan)
            .bind(max_id + 1)
            .bind(member_id.value())
            .bind(book_id.value())
            .bind(Loan::current_date())
            .fetch_one(&mut *tx)
            .await?;
        let loan = loan_from_row(&row, 0)?;

        tx.commit().await?;
        Ok(loan)
    }

    async fn return_loan(&self, id: LoanId) -> Result<i32> {
        let mut tx = begin(&self.pool).await?;

        let book_ids: Vec<i32> = sqlx::query_scalar(&self.sql.loan_books_for_update)
            .bind(id.value())
            .fetch_all(&mut *tx)
            .await?;
        let book_id = match book_ids.as_slice() {
            [] => return Err(InventoryError::loan_not_found_by_id(id)),
            [book_id] => BookId::new(*book_id),
            _ => {
                return Err(InventoryError::IntegrityViolation(format!(
                    "{} loan rows share id {}",
                    book_ids.len(),
                    id
                )));
            }
        };

        let affected = sqlx::query(&self.sql.set_book_lent)
            .bind(book_id.value())
            .bind(false)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        match affected {
            0 => return Err(InventoryError::BookNotFound(book_id)),
            1 => {}
            _ => {
                tx.rollback().await?;
                return Err(InventoryError::IntegrityViolation(format!(
                    "returning book {} updated {} rows",
                    book_id, affected
                )));
            }
        }

        sqlx::query(&self.sql.delete_loan)
            .bind(id.value())
            .execute(&mut *tx)
            .await?;

        let (_, max_id): (i64, i32) = sqlx::query_as(&self.sql.loan_stats)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(max_id)
    }

    async fn find_loans(&self, filter: LoanFilter) -> Result<Vec<Loan>> {
        let loans: Vec<Loan> = bind_filter(sqlx::query(self.sql.find_loans(&filter)), filter)
            .fetch(&self.pool)
            .and_then(|row| async move { loan_from_row(&row, 0) })
            .try_collect()
            .await?;

        if loans.is_empty() {
            return Err(InventoryError::not_found(EntityKind::Loan, filter.to_string()));
        }
        Ok(loans)
    }

    async fn list_loans_detailed(&self) -> Result<Vec<LoanDetails>> {
        let details: Vec<LoanDetails> = sqlx::query(&self.sql.detailed_all)
            .fetch(&self.pool)
            .and_then(|row| async move { details_from_row(&row) })
            .try_collect()
            .await?;
        Ok(details)
    }

    async fn find_loans_detailed(&self, filter: LoanFilter) -> Result<Vec<LoanDetails>> {
        let details: Vec<LoanDetails> =
            bind_filter(sqlx::query(self.sql.find_loans_detailed(&filter)), filter)
                .fetch(&self.pool)
                .and_then(|row| async move { details_from_row(&row) })
                .try_collect()
                .await?;

        if details.is_empty() {
            return Err(InventoryError::not_found(EntityKind::Loan, filter.to_string()));
        }
        Ok(details)
    }

    async fn active_loans_for_member(&self, member_id: MemberId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&self.sql.count_member_loans)
            .bind(member_id.value())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
