use crate::domain::{BookId, Loan, LoanDetails, LoanFilter, LoanId, MemberId, Result, TableStats};
use async_trait::async_trait;

/// Loan ledger port
///
/// Loan rows plus the book availability flag they drive. Every method that
/// writes runs as one unit of work: either all of its statements apply or
/// none do.
#[async_trait]
pub trait LoanLedger: Send + Sync {
    /// Row count and highest id of the loans table.
    async fn count_loans(&self) -> Result<TableStats>;

    /// All active loans in id order.
    async fn list_loans(&self) -> Result<Vec<Loan>>;

    /// Lend a book, dated today.
    ///
    /// Order of checks: member exists, member is under the loan cap
    /// (`LoanLimitExceeded`), book exists (`BookNotFound`), book is not lent
    /// (`AlreadyLent`). The flag flip must touch exactly one row, otherwise
    /// the operation is undone and fails with `IntegrityViolation`.
    async fn create_loan(&self, member_id: MemberId, book_id: BookId) -> Result<Loan>;

    /// Return a loan: clear the book's flag, delete the row, and report the
    /// new max id.
    async fn return_loan(&self, id: LoanId) -> Result<i32>;

    /// Exact-match lookup; `NotFound` when nothing matches.
    async fn find_loans(&self, filter: LoanFilter) -> Result<Vec<Loan>>;

    /// All loans joined with their book and member.
    async fn list_loans_detailed(&self) -> Result<Vec<LoanDetails>>;

    /// Filtered loans joined with their book and member; `NotFound` when empty.
    async fn find_loans_detailed(&self, filter: LoanFilter) -> Result<Vec<LoanDetails>>;

    /// Number of loans currently held by the member.
    async fn active_loans_for_member(&self, member_id: MemberId) -> Result<i64>;
}
