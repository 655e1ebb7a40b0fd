use crate::domain::{
    BookId, EntityKind, InventoryError, Loan, LoanDetails, LoanFilter, LoanId, MemberId, Result,
    TableStats,
};
use crate::ports::loan_ledger::LoanLedger as LoanLedgerTrait;
use async_trait::async_trait;

use super::database::{InMemoryDatabase, State};

/// Set `lent` on every row carrying `book_id` and return how many changed.
fn set_lent(state: &mut State, book_id: BookId, lent: bool) -> usize {
    let mut affected = 0;
    for book in state.books.iter_mut().filter(|b| b.id == book_id) {
        book.lent = lent;
        affected += 1;
    }
    affected
}

fn join(state: &State, loans: impl Iterator<Item = Loan>) -> Vec<LoanDetails> {
    let mut details: Vec<LoanDetails> = loans
        .filter_map(|loan| {
            let book = state.books.iter().find(|b| b.id == loan.book_id)?.clone();
            let member = state.members.iter().find(|m| m.id == loan.member_id)?.clone();
            Some(LoanDetails { loan, book, member })
        })
        .collect();
    details.sort_by_key(|d| d.loan.id);
    details
}

/// In-memory implementation of LoanLedger
pub struct LoanLedger {
    db: InMemoryDatabase,
    max_loans_per_member: i64,
}

impl LoanLedger {
    pub fn new(db: InMemoryDatabase, max_loans_per_member: i64) -> Self {
        Self {
            db,
            max_loans_per_member,
        }
    }
}

#[async_trait]
impl LoanLedgerTrait for LoanLedger {
    async fn count_loans(&self) -> Result<TableStats> {
        Ok(self.db.open()?.loan_stats())
    }

    async fn list_loans(&self) -> Result<Vec<Loan>> {
        let state = self.db.open()?;
        let mut loans = state.loans.clone();
        loans.sort_by_key(|l| l.id);
        Ok(loans)
    }

    async fn create_loan(&self, member_id: MemberId, book_id: BookId) -> Result<Loan> {
        let mut state = self.db.open()?;

        if !state.members.iter().any(|m| m.id == member_id) {
            return Err(InventoryError::member_not_found_by_id(member_id));
        }

        let active = state.loans.iter().filter(|l| l.member_id == member_id).count() as i64;
        if active >= self.max_loans_per_member {
            return Err(InventoryError::LoanLimitExceeded {
                member_id,
                limit: self.max_loans_per_member,
            });
        }

        let flags: Vec<bool> = state
            .books
            .iter()
            .filter(|b| b.id == book_id)
            .map(|b| b.lent)
            .collect();
        if flags.is_empty() {
            return Err(InventoryError::BookNotFound(book_id));
        }
        if flags.iter().any(|lent| *lent) {
            return Err(InventoryError::AlreadyLent(book_id));
        }

        match set_lent(&mut state, book_id, true) {
            0 => return Err(InventoryError::BookNotFound(book_id)),
            1 => {}
            affected => {
                set_lent(&mut state, book_id, false);
                return Err(InventoryError::IntegrityViolation(format!(
                    "lending book {} updated {} rows",
                    book_id, affected
                )));
            }
        }

        let loan = Loan {
            id: LoanId::new(state.loan_stats().next_id()),
            member_id,
            book_id,
            date: Loan::current_date(),
        };
        state.loans.push(loan.clone());
        Ok(loan)
    }

    async fn return_loan(&self, id: LoanId) -> Result<i32> {
        let mut state = self.db.open()?;

        let book_ids: Vec<BookId> = state
            .loans
            .iter()
            .filter(|l| l.id == id)
            .map(|l| l.book_id)
            .collect();
        let book_id = match book_ids.as_slice() {
            [] => return Err(InventoryError::loan_not_found_by_id(id)),
            [book_id] => *book_id,
            _ => {
                return Err(InventoryError::IntegrityViolation(format!(
                    "{} loan rows share id {}",
                    book_ids.len(),
                    id
                )));
            }
        };

        match set_lent(&mut state, book_id, false) {
            0 => return Err(InventoryError::BookNotFound(book_id)),
            1 => {}
            affected => {
                set_lent(&mut state, book_id, true);
                return Err(InventoryError::IntegrityViolation(format!(
                    "returning book {} updated {} rows",
                    book_id, affected
                )));
            }
        }

        state.loans.retain(|l| l.id != id);
        Ok(state.loan_stats().max_id)
    }

    async fn find_loans(&self, filter: LoanFilter) -> Result<Vec<Loan>> {
        let state = self.db.open()?;
        let mut loans: Vec<Loan> = state
            .loans
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();

        if loans.is_empty() {
            return Err(InventoryError::not_found(EntityKind::Loan, filter.to_string()));
        }
        loans.sort_by_key(|l| l.id);
        Ok(loans)
    }

    async fn list_loans_detailed(&self) -> Result<Vec<LoanDetails>> {
        let state = self.db.open()?;
        Ok(join(&state, state.loans.iter().cloned()))
    }

    async fn find_loans_detailed(&self, filter: LoanFilter) -> Result<Vec<LoanDetails>> {
        let state = self.db.open()?;
        let details = join(
            &state,
            state.loans.iter().filter(|l| filter.matches(l)).cloned(),
        );

        if details.is_empty() {
            return Err(InventoryError::not_found(EntityKind::Loan, filter.to_string()));
        }
        Ok(details)
    }

    async fn active_loans_for_member(&self, member_id: MemberId) -> Result<i64> {
        let state = self.db.open()?;
        Ok(state.loans.iter().filter(|l| l.member_id == member_id).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::CatalogStore;
    use crate::domain::Book;
    use crate::ports::catalog_store::CatalogStore as _;

    async fn seeded(max_loans: i64) -> (InMemoryDatabase, LoanLedger) {
        let db = InMemoryDatabase::new();
        let catalog = CatalogStore::new(db.clone(), 100);
        catalog.add_book("Dune", "Frank Herbert").await.unwrap();
        catalog.add_book("Emma", "Jane Austen").await.unwrap();
        catalog.add_member("Ada", "Lovelace").await.unwrap();
        let ledger = LoanLedger::new(db.clone(), max_loans);
        (db, ledger)
    }

    async fn book(db: &InMemoryDatabase, id: i32) -> Book {
        CatalogStore::new(db.clone(), 100)
            .find_book_by_id(BookId::new(id))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_return_loan() {
        let (db, ledger) = seeded(10).await;

        let loan = ledger
            .create_loan(MemberId::new(1), BookId::new(1))
            .await
            .unwrap();
        assert_eq!(loan.id, LoanId::new(1));
        assert!(book(&db, 1).await.lent);

        let max_id = ledger.return_loan(loan.id).await.unwrap();
        assert_eq!(max_id, 0);
        assert!(!book(&db, 1).await.lent);
        assert_eq!(ledger.count_loans().await.unwrap(), TableStats::EMPTY);
    }

    #[tokio::test]
    async fn test_unknown_member_is_not_found() {
        let (_db, ledger) = seeded(10).await;
        let err = ledger
            .create_loan(MemberId::new(7), BookId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InventoryError::NotFound {
                entity: EntityKind::Member,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_book_is_book_not_found() {
        let (_db, ledger) = seeded(10).await;
        let err = ledger
            .create_loan(MemberId::new(1), BookId::new(42))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::BookNotFound(id) if id == BookId::new(42)));
    }

    #[tokio::test]
    async fn test_limit_is_checked_before_book() {
        let (_db, ledger) = seeded(1).await;
        ledger
            .create_loan(MemberId::new(1), BookId::new(1))
            .await
            .unwrap();

        // the book does not exist either, but the cap is reported first
        let err = ledger
            .create_loan(MemberId::new(1), BookId::new(42))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::LoanLimitExceeded { limit: 1, .. }));
    }

    #[tokio::test]
    async fn test_duplicate_book_rows_are_reverted() {
        let (db, ledger) = seeded(10).await;
        db.insert_book_unchecked(Book {
            id: BookId::new(2),
            title: "Emma (copy)".to_string(),
            author: "Jane Austen".to_string(),
            lent: false,
        });

        let err = ledger
            .create_loan(MemberId::new(1), BookId::new(2))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::IntegrityViolation(_)));

        let state = db.open().unwrap();
        assert!(state.books.iter().all(|b| !b.lent));
        assert!(state.loans.is_empty());
    }

    #[tokio::test]
    async fn test_return_with_duplicate_loan_rows_is_integrity_violation() {
        let (db, ledger) = seeded(10).await;
        let loan = ledger
            .create_loan(MemberId::new(1), BookId::new(1))
            .await
            .unwrap();
        db.insert_loan_unchecked(loan.clone());

        let err = ledger.return_loan(loan.id).await.unwrap_err();
        assert!(matches!(err, InventoryError::IntegrityViolation(_)));
        assert!(book(&db, 1).await.lent);
        assert_eq!(ledger.count_loans().await.unwrap().count, 2);
    }

    #[tokio::test]
    async fn test_return_unknown_loan_is_not_found() {
        let (_db, ledger) = seeded(10).await;
        let err = ledger.return_loan(LoanId::new(3)).await.unwrap_err();
        assert!(matches!(
            err,
            InventoryError::NotFound {
                entity: EntityKind::Loan,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_detailed_loans_join_book_and_member() {
        let (_db, ledger) = seeded(10).await;
        ledger
            .create_loan(MemberId::new(1), BookId::new(2))
            .await
            .unwrap();

        let details = ledger.list_loans_detailed().await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].book.title, "Emma");
        assert_eq!(details[0].member.surname, "Lovelace");
        assert!(details[0].book.lent);

        let err = ledger
            .find_loans_detailed(LoanFilter::Book(BookId::new(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::NotFound { .. }));
    }
}
