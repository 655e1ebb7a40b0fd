//! Read-side ordering of listed entities.
//!
//! Sorting is a presentation concern: the service returns rows in storage
//! order and the caller picks an order here. Text keys compare
//! case-insensitively and every order breaks ties on id ascending.

use crate::domain::{Book, Loan, LoanDetails, Member};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookOrder {
    #[default]
    Id,
    Title,
    Author,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberOrder {
    #[default]
    Id,
    Name,
    Surname,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoanOrder {
    #[default]
    Id,
    Date,
    Member,
    Book,
}

/// Orders for detailed loans, which can also sort on the joined rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoanDetailsOrder {
    #[default]
    Id,
    Date,
    Member,
    Book,
    Title,
    Surname,
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

pub fn sort_books(books: &mut [Book], order: BookOrder) {
    books.sort_by(|a, b| {
        let primary = match order {
            BookOrder::Id => Ordering::Equal,
            BookOrder::Title => cmp_text(&a.title, &b.title),
            BookOrder::Author => cmp_text(&a.author, &b.author),
        };
        primary.then(a.id.cmp(&b.id))
    });
}

pub fn sort_members(members: &mut [Member], order: MemberOrder) {
    members.sort_by(|a, b| {
        let primary = match order {
            MemberOrder::Id => Ordering::Equal,
            MemberOrder::Name => cmp_text(&a.name, &b.name),
            MemberOrder::Surname => cmp_text(&a.surname, &b.surname),
        };
        primary.then(a.id.cmp(&b.id))
    });
}

fn cmp_loans(a: &Loan, b: &Loan, order: LoanOrder) -> Ordering {
    let primary = match order {
        LoanOrder::Id => Ordering::Equal,
        LoanOrder::Date => a.date.cmp(&b.date),
        LoanOrder::Member => a.member_id.cmp(&b.member_id),
        LoanOrder::Book => a.book_id.cmp(&b.book_id),
    };
    primary.then(a.id.cmp(&b.id))
}

pub fn sort_loans(loans: &mut [Loan], order: LoanOrder) {
    loans.sort_by(|a, b| cmp_loans(a, b, order));
}

pub fn sort_loan_details(loans: &mut [LoanDetails], order: LoanDetailsOrder) {
    loans.sort_by(|a, b| {
        let by_loan = |order| cmp_loans(&a.loan, &b.loan, order);
        match order {
            LoanDetailsOrder::Id => by_loan(LoanOrder::Id),
            LoanDetailsOrder::Date => by_loan(LoanOrder::Date),
            LoanDetailsOrder::Member => by_loan(LoanOrder::Member),
            LoanDetailsOrder::Book => by_loan(LoanOrder::Book),
            LoanDetailsOrder::Title => {
                cmp_text(&a.book.title, &b.book.title).then(a.loan.id.cmp(&b.loan.id))
            }
            LoanDetailsOrder::Surname => {
                cmp_text(&a.member.surname, &b.member.surname).then(a.loan.id.cmp(&b.loan.id))
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookId, LoanId, MemberId};
    use chrono::NaiveDate;

    fn book(id: i32, title: &str, author: &str) -> Book {
        Book {
            id: BookId::new(id),
            title: title.to_string(),
            author: author.to_string(),
            lent: false,
        }
    }

    fn member(id: i32, name: &str, surname: &str) -> Member {
        Member {
            id: MemberId::new(id),
            name: name.to_string(),
            surname: surname.to_string(),
        }
    }

    fn loan(id: i32, member_id: i32, book_id: i32, day: u32) -> Loan {
        Loan {
            id: LoanId::new(id),
            member_id: MemberId::new(member_id),
            book_id: BookId::new(book_id),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        }
    }

    fn ids<T>(items: &[T], id: impl Fn(&T) -> i32) -> Vec<i32> {
        items.iter().map(id).collect()
    }

    #[test]
    fn test_sort_books_by_title_ignores_case_and_breaks_ties_on_id() {
        let mut books = vec![
            book(3, "dune", "Herbert"),
            book(1, "Emma", "Austen"),
            book(2, "Dune", "Someone Else"),
        ];
        sort_books(&mut books, BookOrder::Title);
        assert_eq!(ids(&books, |b| b.id.value()), vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_books_by_id() {
        let mut books = vec![book(3, "a", "a"), book(1, "b", "b"), book(2, "c", "c")];
        sort_books(&mut books, BookOrder::Id);
        assert_eq!(ids(&books, |b| b.id.value()), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_books_by_author() {
        let mut books = vec![book(1, "x", "Zola"), book(2, "y", "austen")];
        sort_books(&mut books, BookOrder::Author);
        assert_eq!(ids(&books, |b| b.id.value()), vec![2, 1]);
    }

    #[test]
    fn test_sort_members_by_surname() {
        let mut members = vec![
            member(1, "Alan", "Turing"),
            member(2, "Ada", "Lovelace"),
            member(3, "Grace", "hopper"),
        ];
        sort_members(&mut members, MemberOrder::Surname);
        assert_eq!(ids(&members, |m| m.id.value()), vec![3, 2, 1]);

        sort_members(&mut members, MemberOrder::Name);
        assert_eq!(ids(&members, |m| m.id.value()), vec![2, 1, 3]);
    }

    #[test]
    fn test_sort_loans_by_date_then_id() {
        let mut loans = vec![loan(3, 1, 1, 2), loan(1, 1, 2, 9), loan(2, 2, 3, 2)];
        sort_loans(&mut loans, LoanOrder::Date);
        assert_eq!(ids(&loans, |l| l.id.value()), vec![2, 3, 1]);

        sort_loans(&mut loans, LoanOrder::Book);
        assert_eq!(ids(&loans, |l| l.id.value()), vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_loan_details_by_joined_fields() {
        let mut details = vec![
            LoanDetails {
                loan: loan(1, 1, 1, 1),
                book: book(1, "Solaris", "Lem"),
                member: member(1, "Ada", "Lovelace"),
            },
            LoanDetails {
                loan: loan(2, 2, 2, 1),
                book: book(2, "Dune", "Herbert"),
                member: member(2, "Alan", "Turing"),
            },
        ];

        sort_loan_details(&mut details, LoanDetailsOrder::Title);
        assert_eq!(ids(&details, |d| d.loan.id.value()), vec![2, 1]);

        sort_loan_details(&mut details, LoanDetailsOrder::Surname);
        assert_eq!(ids(&details, |d| d.loan.id.value()), vec![1, 2]);
    }
}
