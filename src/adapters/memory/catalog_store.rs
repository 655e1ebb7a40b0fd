use crate::domain::{
    Book, BookField, BookId, EntityKind, InventoryError, Member, MemberField, MemberId, Result,
    TableStats, identity_key,
};
use crate::ports::catalog_store::CatalogStore as CatalogStoreTrait;
use async_trait::async_trait;

use super::database::InMemoryDatabase;

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// In-memory implementation of CatalogStore
pub struct CatalogStore {
    db: InMemoryDatabase,
    max_members: i64,
}

impl CatalogStore {
    pub fn new(db: InMemoryDatabase, max_members: i64) -> Self {
        Self { db, max_members }
    }
}

#[async_trait]
impl CatalogStoreTrait for CatalogStore {
    async fn count_books(&self) -> Result<TableStats> {
        Ok(self.db.open()?.book_stats())
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        let state = self.db.open()?;
        let mut books = state.books.clone();
        books.sort_by_key(|b| b.id);
        Ok(books)
    }

    async fn add_book(&self, title: &str, author: &str) -> Result<Book> {
        let mut state = self.db.open()?;

        let key = identity_key(title, author);
        if state
            .books
            .iter()
            .any(|b| identity_key(&b.title, &b.author) == key)
        {
            return Err(InventoryError::DuplicateEntity {
                entity: EntityKind::Book,
                key: format!("{} / {}", title, author),
            });
        }

        let book = Book {
            id: BookId::new(state.book_stats().next_id()),
            title: title.to_string(),
            author: author.to_string(),
            lent: false,
        };
        state.books.push(book.clone());
        Ok(book)
    }

    async fn find_books(&self, field: BookField, fragment: &str) -> Result<Vec<Book>> {
        let state = self.db.open()?;
        let mut books: Vec<Book> = state
            .books
            .iter()
            .filter(|b| match field {
                BookField::Title => contains_ignore_case(&b.title, fragment),
                BookField::Author => contains_ignore_case(&b.author, fragment),
            })
            .cloned()
            .collect();

        if books.is_empty() {
            return Err(InventoryError::not_found(
                EntityKind::Book,
                format!("{} containing {:?}", field.as_str(), fragment),
            ));
        }
        books.sort_by_key(|b| b.id);
        Ok(books)
    }

    async fn find_book_by_id(&self, id: BookId) -> Result<Book> {
        let state = self.db.open()?;
        state
            .books
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| InventoryError::book_not_found_by_id(id))
    }

    async fn delete_book(&self, id: BookId) -> Result<i32> {
        let mut state = self.db.open()?;

        let rows: Vec<&Book> = state.books.iter().filter(|b| b.id == id).collect();
        if rows.is_empty() {
            return Err(InventoryError::book_not_found_by_id(id));
        }
        if rows.iter().any(|b| b.lent) {
            return Err(InventoryError::BookStillLent(id));
        }

        state.books.retain(|b| b.id != id);
        Ok(state.book_stats().max_id)
    }

    async fn count_members(&self) -> Result<TableStats> {
        Ok(self.db.open()?.member_stats())
    }

    async fn list_members(&self) -> Result<Vec<Member>> {
        let state = self.db.open()?;
        let mut members = state.members.clone();
        members.sort_by_key(|m| m.id);
        Ok(members)
    }

    async fn add_member(&self, name: &str, surname: &str) -> Result<Member> {
        let mut state = self.db.open()?;

        let key = identity_key(name, surname);
        if state
            .members
            .iter()
            .any(|m| identity_key(&m.name, &m.surname) == key)
        {
            return Err(InventoryError::DuplicateEntity {
                entity: EntityKind::Member,
                key: format!("{} {}", name, surname),
            });
        }

        let stats = state.member_stats();
        if stats.count >= self.max_members {
            return Err(InventoryError::CapacityExceeded {
                entity: EntityKind::Member,
                limit: self.max_members,
            });
        }

        let member = Member {
            id: MemberId::new(stats.next_id()),
            name: name.to_string(),
            surname: surname.to_string(),
        };
        state.members.push(member.clone());
        Ok(member)
    }

    async fn find_members(&self, field: MemberField, fragment: &str) -> Result<Vec<Member>> {
        let state = self.db.open()?;
        let mut members: Vec<Member> = state
            .members
            .iter()
            .filter(|m| match field {
                MemberField::Name => contains_ignore_case(&m.name, fragment),
                MemberField::Surname => contains_ignore_case(&m.surname, fragment),
            })
            .cloned()
            .collect();

        if members.is_empty() {
            return Err(InventoryError::not_found(
                EntityKind::Member,
                format!("{} containing {:?}", field.as_str(), fragment),
            ));
        }
        members.sort_by_key(|m| m.id);
        Ok(members)
    }

    async fn find_member_by_id(&self, id: MemberId) -> Result<Member> {
        let state = self.db.open()?;
        state
            .members
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| InventoryError::member_not_found_by_id(id))
    }

    async fn delete_member(&self, id: MemberId) -> Result<i32> {
        let mut state = self.db.open()?;

        if !state.members.iter().any(|m| m.id == id) {
            return Err(InventoryError::member_not_found_by_id(id));
        }
        let active_loans = state.loans.iter().filter(|l| l.member_id == id).count() as i64;
        if active_loans > 0 {
            return Err(InventoryError::MemberHasActiveLoans {
                member_id: id,
                active_loans,
            });
        }

        state.members.retain(|m| m.id != id);
        Ok(state.member_stats().max_id)
    }
}
