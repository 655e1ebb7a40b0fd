use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{BookId, LoanId, MemberId};

/// Text column a book search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookField {
    Title,
    Author,
}

impl BookField {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
        }
    }
}

impl std::str::FromStr for BookField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(BookField::Title),
            "author" => Ok(BookField::Author),
            _ => Err(format!("Invalid book field: {}", s)),
        }
    }
}

/// Text column a member search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberField {
    Name,
    Surname,
}

impl MemberField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberField::Name => "name",
            MemberField::Surname => "surname",
        }
    }
}

impl std::str::FromStr for MemberField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(MemberField::Name),
            "surname" => Ok(MemberField::Surname),
            _ => Err(format!("Invalid member field: {}", s)),
        }
    }
}

/// Exact-match filter for loan lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanFilter {
    Loan(LoanId),
    Member(MemberId),
    Book(BookId),
    Date(NaiveDate),
}

impl LoanFilter {
    pub fn matches(&self, loan: &super::Loan) -> bool {
        match *self {
            LoanFilter::Loan(id) => loan.id == id,
            LoanFilter::Member(id) => loan.member_id == id,
            LoanFilter::Book(id) => loan.book_id == id,
            LoanFilter::Date(date) => loan.date == date,
        }
    }
}

impl fmt::Display for LoanFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanFilter::Loan(id) => write!(f, "loan id {}", id),
            LoanFilter::Member(id) => write!(f, "member id {}", id),
            LoanFilter::Book(id) => write!(f, "book id {}", id),
            LoanFilter::Date(date) => write!(f, "date {}", date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Loan;

    #[test]
    fn test_book_field_from_str() {
        assert_eq!("Title".parse::<BookField>(), Ok(BookField::Title));
        assert_eq!("author".parse::<BookField>(), Ok(BookField::Author));
        assert!("isbn".parse::<BookField>().is_err());
    }

    #[test]
    fn test_member_field_from_str() {
        assert_eq!("name".parse::<MemberField>(), Ok(MemberField::Name));
        assert_eq!("SURNAME".parse::<MemberField>(), Ok(MemberField::Surname));
        assert!("email".parse::<MemberField>().is_err());
    }

    #[test]
    fn test_loan_filter_matches() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let loan = Loan {
            id: LoanId::new(4),
            member_id: MemberId::new(2),
            book_id: BookId::new(9),
            date,
        };

        assert!(LoanFilter::Loan(LoanId::new(4)).matches(&loan));
        assert!(LoanFilter::Member(MemberId::new(2)).matches(&loan));
        assert!(LoanFilter::Book(BookId::new(9)).matches(&loan));
        assert!(LoanFilter::Date(date).matches(&loan));
        assert!(!LoanFilter::Book(BookId::new(2)).matches(&loan));
    }
}
