use crate::domain::{Book, InventoryError, Loan, Member, Result, TableStats};
use std::sync::{Arc, Mutex, MutexGuard};

/// Rows of all three tables.
#[derive(Debug, Default)]
pub(super) struct State {
    pub books: Vec<Book>,
    pub members: Vec<Member>,
    pub loans: Vec<Loan>,
    pub offline: bool,
}

impl State {
    pub fn book_stats(&self) -> TableStats {
        stats(self.books.iter().map(|b| b.id.value()))
    }

    pub fn member_stats(&self) -> TableStats {
        stats(self.members.iter().map(|m| m.id.value()))
    }

    pub fn loan_stats(&self) -> TableStats {
        stats(self.loans.iter().map(|l| l.id.value()))
    }
}

fn stats(ids: impl Iterator<Item = i32>) -> TableStats {
    ids.fold(TableStats::EMPTY, |acc, id| TableStats {
        count: acc.count + 1,
        max_id: acc.max_id.max(id),
    })
}

/// In-memory stand-in for the relational database.
///
/// The catalog store and the loan ledger share one instance, just as the
/// PostgreSQL adapters share one pool. Each operation holds the lock for its
/// whole duration, which makes it atomic with respect to other callers.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    state: Arc<Mutex<State>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the tables for one operation.
    ///
    /// Fails with `StorageError` while the database is offline.
    pub(super) fn open(&self) -> Result<MutexGuard<'_, State>> {
        let state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.offline {
            return Err(InventoryError::storage("in-memory database is offline"));
        }
        Ok(state)
    }

    fn raw(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Simulate losing (or regaining) the connection to storage.
    pub fn set_offline(&self, offline: bool) {
        self.raw().offline = offline;
    }

    /// Insert a book row as-is, skipping id assignment and uniqueness checks.
    ///
    /// Used to seed fixtures, including rows that break the id invariant.
    pub fn insert_book_unchecked(&self, book: Book) {
        self.raw().books.push(book);
    }

    /// Insert a loan row as-is, without touching the book's flag.
    pub fn insert_loan_unchecked(&self, loan: Loan) {
        self.raw().loans.push(loan);
    }
}
