mod inventory_service;
mod read_outcome;

pub use inventory_service::{
    ServiceDependencies, add_book, add_loan, add_member, count_books, count_loans, count_members,
    delete_book, delete_member, find_book, find_books, find_loans, find_loans_detailed,
    find_member, find_members, list_books, list_loans, list_loans_detailed, list_members,
    return_loan,
};
pub use read_outcome::ReadOutcome;
