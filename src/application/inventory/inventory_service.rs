use crate::domain::{
    Book, BookField, BookId, InventoryError, Loan, LoanDetails, LoanFilter, Member, MemberField,
    MemberId, Result, TableStats, commands::*, normalize_text,
};
use crate::ports::*;
use std::sync::Arc;

use super::read_outcome::ReadOutcome;

/// サービスの依存関係
///
/// 起動時に蔵書ストアと貸出台帳を一つずつ構築し、
/// すべてのサービス関数に渡します。
/// グローバルなインスタンスはありません。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub catalog: Arc<dyn CatalogStore>,
    pub ledger: Arc<dyn LoanLedger>,
}

impl ServiceDependencies {
    pub fn new(catalog: Arc<dyn CatalogStore>, ledger: Arc<dyn LoanLedger>) -> Self {
        Self { catalog, ledger }
    }
}

fn log_integrity<T>(result: Result<T>, operation: &str) -> Result<T> {
    if let Err(InventoryError::IntegrityViolation(ref detail)) = result {
        tracing::error!(operation, "Integrity violation: {}", detail);
    }
    result
}

// ============================================================================
// Catalog writes
// ============================================================================

/// Add a book to the catalog.
///
/// Title and author are normalized first, so the duplicate check ignores
/// case and surrounding or repeated whitespace.
pub async fn add_book(deps: &ServiceDependencies, cmd: AddBook) -> Result<Book> {
    let title = normalize_text(&cmd.title);
    let author = normalize_text(&cmd.author);

    let book = deps.catalog.add_book(&title, &author).await?;
    tracing::info!(book_id = %book.id, title = %book.title, "book added");
    Ok(book)
}

/// Register a member.
pub async fn add_member(deps: &ServiceDependencies, cmd: AddMember) -> Result<Member> {
    let name = normalize_text(&cmd.name);
    let surname = normalize_text(&cmd.surname);

    let member = deps.catalog.add_member(&name, &surname).await?;
    tracing::info!(member_id = %member.id, "member added");
    Ok(member)
}

/// Delete a book.
///
/// Guard: a lent book cannot be deleted (`BookStillLent`). The store
/// re-checks the flag inside its own transaction.
///
/// # Returns
/// The books table's max id after the deletion
pub async fn delete_book(deps: &ServiceDependencies, cmd: DeleteBook) -> Result<i32> {
    let book = deps.catalog.find_book_by_id(cmd.book_id).await?;
    if book.lent {
        return Err(InventoryError::BookStillLent(book.id));
    }

    let max_id = deps.catalog.delete_book(cmd.book_id).await?;
    tracing::info!(book_id = %cmd.book_id, max_id, "book deleted");
    Ok(max_id)
}

/// Delete a member.
///
/// Guard: a member with any loan cannot be deleted (`MemberHasActiveLoans`).
pub async fn delete_member(deps: &ServiceDependencies, cmd: DeleteMember) -> Result<i32> {
    let active_loans = deps.ledger.active_loans_for_member(cmd.member_id).await?;
    if active_loans > 0 {
        return Err(InventoryError::MemberHasActiveLoans {
            member_id: cmd.member_id,
            active_loans,
        });
    }

    let max_id = deps.catalog.delete_member(cmd.member_id).await?;
    tracing::info!(member_id = %cmd.member_id, max_id, "member deleted");
    Ok(max_id)
}

// ============================================================================
// Ledger writes
// ============================================================================

/// Lend a book to a member.
///
/// Business rules:
/// - the member exists and holds fewer than the loan cap
/// - the book exists and is not lent
///
/// Ledger failures are passed through unchanged.
pub async fn add_loan(deps: &ServiceDependencies, cmd: AddLoan) -> Result<Loan> {
    let loan = log_integrity(
        deps.ledger.create_loan(cmd.member_id, cmd.book_id).await,
        "add_loan",
    )?;
    tracing::info!(
        loan_id = %loan.id,
        member_id = %loan.member_id,
        book_id = %loan.book_id,
        "loan created"
    );
    Ok(loan)
}

/// Return a loan. The loan row disappears and the book becomes available.
pub async fn return_loan(deps: &ServiceDependencies, cmd: ReturnLoan) -> Result<i32> {
    let max_id = log_integrity(deps.ledger.return_loan(cmd.loan_id).await, "return_loan")?;
    tracing::info!(loan_id = %cmd.loan_id, max_id, "loan returned");
    Ok(max_id)
}

// ============================================================================
// Searches (hard: an empty result is `NotFound`)
// ============================================================================

pub async fn find_books(
    deps: &ServiceDependencies,
    field: BookField,
    fragment: &str,
) -> Result<Vec<Book>> {
    deps.catalog
        .find_books(field, &normalize_text(fragment))
        .await
}

pub async fn find_book(deps: &ServiceDependencies, id: BookId) -> Result<Book> {
    deps.catalog.find_book_by_id(id).await
}

pub async fn find_members(
    deps: &ServiceDependencies,
    field: MemberField,
    fragment: &str,
) -> Result<Vec<Member>> {
    deps.catalog
        .find_members(field, &normalize_text(fragment))
        .await
}

pub async fn find_member(deps: &ServiceDependencies, id: MemberId) -> Result<Member> {
    deps.catalog.find_member_by_id(id).await
}

pub async fn find_loans(deps: &ServiceDependencies, filter: LoanFilter) -> Result<Vec<Loan>> {
    deps.ledger.find_loans(filter).await
}

pub async fn find_loans_detailed(
    deps: &ServiceDependencies,
    filter: LoanFilter,
) -> Result<Vec<LoanDetails>> {
    deps.ledger.find_loans_detailed(filter).await
}

// ============================================================================
// Soft reads (storage failures degrade to a fallback)
// ============================================================================

pub async fn count_books(deps: &ServiceDependencies) -> ReadOutcome<TableStats> {
    ReadOutcome::from_result(deps.catalog.count_books().await, "count_books")
}

pub async fn count_members(deps: &ServiceDependencies) -> ReadOutcome<TableStats> {
    ReadOutcome::from_result(deps.catalog.count_members().await, "count_members")
}

pub async fn count_loans(deps: &ServiceDependencies) -> ReadOutcome<TableStats> {
    ReadOutcome::from_result(deps.ledger.count_loans().await, "count_loans")
}

pub async fn list_books(deps: &ServiceDependencies) -> ReadOutcome<Vec<Book>> {
    ReadOutcome::from_result(deps.catalog.list_books().await, "list_books")
}

pub async fn list_members(deps: &ServiceDependencies) -> ReadOutcome<Vec<Member>> {
    ReadOutcome::from_result(deps.catalog.list_members().await, "list_members")
}

pub async fn list_loans(deps: &ServiceDependencies) -> ReadOutcome<Vec<Loan>> {
    ReadOutcome::from_result(deps.ledger.list_loans().await, "list_loans")
}

pub async fn list_loans_detailed(deps: &ServiceDependencies) -> ReadOutcome<Vec<LoanDetails>> {
    ReadOutcome::from_result(
        deps.ledger.list_loans_detailed().await,
        "list_loans_detailed",
    )
}
