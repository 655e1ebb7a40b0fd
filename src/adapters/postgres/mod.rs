pub mod catalog_store;
pub mod loan_ledger;
pub mod statements;

use crate::domain::{Book, BookId, InventoryError, Loan, LoanId, Member, MemberId, Result};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

// パブリックに型を再エクスポート
pub use catalog_store::CatalogStore as PostgresCatalogStore;
pub use loan_ledger::LoanLedger as PostgresLoanLedger;
pub use statements::Statements;

/// Classify a rejected statement by its SQLSTATE.
///
/// Class 40 (serialization failure, deadlock) means another transaction won
/// a race; class 23 means a constraint caught an inconsistency the checks
/// above it missed. Anything else stays a storage error.
fn database_failure(code: &str, message: &str) -> Option<InventoryError> {
    match code {
        "40001" | "40P01" => Some(InventoryError::Conflict(message.to_string())),
        _ if code.starts_with("23") => Some(InventoryError::IntegrityViolation(format!(
            "{} (sqlstate {})",
            message, code
        ))),
        _ => None,
    }
}

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if let Some(code) = db.code() {
                if let Some(mapped) = database_failure(&code, db.message()) {
                    tracing::warn!(sqlstate = %code, "statement rejected: {}", db.message());
                    return mapped;
                }
            }
        }
        InventoryError::StorageError(Box::new(err))
    }
}

/// Open a transaction for one unit of work.
///
/// READ COMMITTED: every statement sees the rows committed before it ran,
/// and in particular before its lock was granted. Check-then-act sequences
/// therefore take their row or table lock first and read afterwards.
/// Dropping the returned transaction without committing rolls it back, so
/// every early `?` return leaves the tables untouched.
pub(crate) async fn begin(pool: &PgPool) -> Result<Transaction<'static, Postgres>> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Create the books, members and loans tables if they are missing.
pub async fn ensure_schema(pool: &PgPool, sql: &Statements) -> Result<()> {
    let mut tx = pool.begin().await?;
    for statement in [&sql.create_books, &sql.create_members, &sql.create_loans] {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}

// Rows are read by position: column names come from configuration, the
// column order is fixed by `Statements`.

pub(crate) fn book_from_row(row: &PgRow, offset: usize) -> std::result::Result<Book, sqlx::Error> {
    Ok(Book {
        id: BookId::new(row.try_get(offset)?),
        title: row.try_get(offset + 1)?,
        author: row.try_get(offset + 2)?,
        lent: row.try_get(offset + 3)?,
    })
}

pub(crate) fn member_from_row(
    row: &PgRow,
    offset: usize,
) -> std::result::Result<Member, sqlx::Error> {
    Ok(Member {
        id: MemberId::new(row.try_get(offset)?),
        name: row.try_get(offset + 1)?,
        surname: row.try_get(offset + 2)?,
    })
}

pub(crate) fn loan_from_row(row: &PgRow, offset: usize) -> std::result::Result<Loan, sqlx::Error> {
    Ok(Loan {
        id: LoanId::new(row.try_get(offset)?),
        member_id: MemberId::new(row.try_get(offset + 1)?),
        book_id: BookId::new(row.try_get(offset + 2)?),
        date: row.try_get(offset + 3)?,
    })
}
