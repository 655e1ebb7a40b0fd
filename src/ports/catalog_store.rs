use crate::domain::{
    Book, BookField, BookId, Member, MemberField, MemberId, Result, TableStats,
};
use async_trait::async_trait;

/// Catalog store port
///
/// Durable storage for book and member rows. Implementations own id
/// assignment (`max_id + 1`) and uniqueness of the identifying text pairs.
/// Callers go through the inventory service, never straight to the store.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Row count and highest id of the books table.
    async fn count_books(&self) -> Result<TableStats>;

    /// All books in id order.
    async fn list_books(&self) -> Result<Vec<Book>>;

    /// Insert a book with `lent = false`.
    ///
    /// Fails with `DuplicateEntity` on a case-insensitive (title, author) match.
    async fn add_book(&self, title: &str, author: &str) -> Result<Book>;

    /// Case-insensitive substring search; `NotFound` when nothing matches.
    async fn find_books(&self, field: BookField, fragment: &str) -> Result<Vec<Book>>;

    async fn find_book_by_id(&self, id: BookId) -> Result<Book>;

    /// Delete a book that is not lent and return the new max id.
    async fn delete_book(&self, id: BookId) -> Result<i32>;

    /// Row count and highest id of the members table.
    async fn count_members(&self) -> Result<TableStats>;

    /// All members in id order.
    async fn list_members(&self) -> Result<Vec<Member>>;

    /// Insert a member.
    ///
    /// Fails with `DuplicateEntity` on a case-insensitive (name, surname) match
    /// and with `CapacityExceeded` once the member cap is reached.
    async fn add_member(&self, name: &str, surname: &str) -> Result<Member>;

    /// Case-insensitive substring search; `NotFound` when nothing matches.
    async fn find_members(&self, field: MemberField, fragment: &str) -> Result<Vec<Member>>;

    async fn find_member_by_id(&self, id: MemberId) -> Result<Member>;

    /// Delete a member without loans and return the new max id.
    async fn delete_member(&self, id: MemberId) -> Result<i32>;
}
