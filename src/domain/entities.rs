use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, MemberId};

/// A catalog entry.
///
/// Invariant: `lent` is true exactly when an active loan references this book.
/// Only the loan ledger flips the flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub lent: bool,
}

impl Book {
    pub fn is_available(&self) -> bool {
        !self.lent
    }
}

/// A library member. (name, surname) is unique, ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub surname: String,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// An active loan.
///
/// A loan exists only while the book is out; returning it deletes the row,
/// so there is no status field and no history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub member_id: MemberId,
    pub book_id: BookId,
    pub date: NaiveDate,
}

impl Loan {
    /// Date stamped on loans created now (local calendar day).
    pub fn current_date() -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A loan joined with the book and member it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDetails {
    pub loan: Loan,
    pub book: Book,
    pub member: Member,
}
