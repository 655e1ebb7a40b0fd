use crate::domain::{
    Book, BookField, BookId, EntityKind, InventoryError, Member, MemberField, MemberId, Result,
    TableStats,
};
use crate::ports::catalog_store::CatalogStore as CatalogStoreTrait;
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::PgPool;
use std::sync::Arc;

use super::{Statements, begin, book_from_row, member_from_row};

/// PostgreSQL implementation of CatalogStore
///
/// Each write runs in its own transaction. Adds lock the table before they
/// read, so the duplicate check and the `max_id + 1` choice see every row
/// committed by earlier adds. Deletes lock the row first and re-check the
/// guard afterwards.
pub struct CatalogStore {
    pool: PgPool,
    sql: Arc<Statements>,
    max_members: i64,
}

impl CatalogStore {
    pub fn new(pool: PgPool, sql: Arc<Statements>, max_members: i64) -> Self {
        Self {
            pool,
            sql,
            max_members,
        }
    }

    async fn stats(&self, statement: &str) -> Result<TableStats> {
        let (count, max_id): (i64, i32) = sqlx::query_as(statement)
            .fetch_one(&self.pool)
            .await?;
        Ok(TableStats { count, max_id })
    }
}

#[async_trait]
impl CatalogStoreTrait for CatalogStore {
    async fn count_books(&self) -> Result<TableStats> {
        self.stats(&self.sql.book_stats).await
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        let books: Vec<Book> = sqlx::query(&self.sql.list_books)
            .fetch(&self.pool)
            .and_then(|row| async move { book_from_row(&row, 0) })
            .try_collect()
            .await?;
        Ok(books)
    }

    async fn add_book(&self, title: &str, author: &str) -> Result<Book> {
        let mut tx = begin(&self.pool).await?;

        sqlx::query(&self.sql.lock_books).execute(&mut *tx).await?;

        let exists: bool = sqlx::query_scalar(&self.sql.book_exists)
            .bind(title)
            .bind(author)
            .fetch_one(&mut *tx)
            .await?;
        if exists {
            return Err(InventoryError::DuplicateEntity {
                entity: EntityKind::Book,
                key: format!("{} / {}", title, author),
            });
        }

        let (_, max_id): (i64, i32) = sqlx::query_as(&self.sql.book_stats)
            .fetch_one(&mut *tx)
            .await?;

        let row = sqlx::query(&self.sql.insert_book)
            .bind(max_id + 1)
            .bind(title)
            .bind(author)
            .fetch_one(&mut *tx)
            .await?;
        let book = book_from_row(&row, 0)?;

        tx.commit().await?;
        Ok(book)
    }

    async fn find_books(&self, field: BookField, fragment: &str) -> Result<Vec<Book>> {
        let books: Vec<Book> = sqlx::query(self.sql.find_books(field))
            .bind(fragment)
            .fetch(&self.pool)
            .and_then(|row| async move { book_from_row(&row, 0) })
            .try_collect()
            .await?;

        if books.is_empty() {
            return Err(InventoryError::not_found(
                EntityKind::Book,
                format!("{} containing {:?}", field.as_str(), fragment),
            ));
        }
        Ok(books)
    }

    async fn find_book_by_id(&self, id: BookId) -> Result<Book> {
        let row = sqlx::query(&self.sql.book_by_id)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(book_from_row(&row, 0)?),
            None => Err(InventoryError::book_not_found_by_id(id)),
        }
    }

    async fn delete_book(&self, id: BookId) -> Result<i32> {
        let mut tx = begin(&self.pool).await?;

        let flags: Vec<bool> = sqlx::query_scalar(&self.sql.book_flags_for_update)
            .bind(id.value())
            .fetch_all(&mut *tx)
            .await?;
        if flags.is_empty() {
            return Err(InventoryError::book_not_found_by_id(id));
        }
        // the guard is re-checked under the row lock
        if flags.iter().any(|lent| *lent) {
            return Err(InventoryError::BookStillLent(id));
        }

        sqlx::query(&self.sql.delete_book)
            .bind(id.value())
            .execute(&mut *tx)
            .await?;

        let (_, max_id): (i64, i32) = sqlx::query_as(&self.sql.book_stats)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(max_id)
    }

    async fn count_members(&self) -> Result<TableStats> {
        self.stats(&self.sql.member_stats).await
    }

    async fn list_members(&self) -> Result<Vec<Member>> {
        let members: Vec<Member> = sqlx::query(&self.sql.list_members)
            .fetch(&self.pool)
            .and_then(|row| async move { member_from_row(&row, 0) })
            .try_collect()
            .await?;
        Ok(members)
    }

    async fn add_member(&self, name: &str, surname: &str) -> Result<Member> {
        let mut tx = begin(&self.pool).await?;

        sqlx::query(&self.sql.lock_members).execute(&mut *tx).await?;

        let exists: bool = sqlx::query_scalar(&self.sql.member_exists)
            .bind(name)
            .bind(surname)
            .fetch_one(&mut *tx)
            .await?;
        if exists {
            return Err(InventoryError::DuplicateEntity {
                entity: EntityKind::Member,
                key: format!("{} {}", name, surname),
            });
        }

        let (count, max_id): (i64, i32) = sqlx::query_as(&self.sql.member_stats)
            .fetch_one(&mut *tx)
            .await?;
        if count >= self.max_members {
            return Err(InventoryError::CapacityExceeded {
                entity: EntityKind::Member,
                limit: self.max_members,
            });
        }

        let row = sqlx::query(&self.sql.insert_member)
            .bind(max_id + 1)
            .bind(name)
            .bind(surname)
            .fetch_one(&mut *tx)
            .await?;
        let member = member_from_row(&row, 0)?;

        tx.commit().await?;
        Ok(member)
    }

    async fn find_members(&self, field: MemberField, fragment: &str) -> Result<Vec<Member>> {
        let members: Vec<Member> = sqlx::query(self.sql.find_members(field))
            .bind(fragment)
            .fetch(&self.pool)
            .and_then(|row| async move { member_from_row(&row, 0) })
            .try_collect()
            .await?;

        if members.is_empty() {
            return Err(InventoryError::not_found(
                EntityKind::Member,
                format!("{} containing {:?}", field.as_str(), fragment),
            ));
        }
        Ok(members)
    }

    async fn find_member_by_id(&self, id: MemberId) -> Result<Member> {
        let row = sqlx::query(&self.sql.member_by_id)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(member_from_row(&row, 0)?),
            None => Err(InventoryError::member_not_found_by_id(id)),
        }
    }

    async fn delete_member(&self, id: MemberId) -> Result<i32> {
        let mut tx = begin(&self.pool).await?;

        let locked: Option<i32> = sqlx::query_scalar(&self.sql.member_for_update)
            .bind(id.value())
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(InventoryError::member_not_found_by_id(id));
        }

        // a loan being created for this member holds the same row lock, so the
        // count below already includes it once the lock is granted
        let active_loans: i64 = sqlx::query_scalar(&self.sql.count_member_loans)
            .bind(id.value())
            .fetch_one(&mut *tx)
            .await?;
        if active_loans > 0 {
            return Err(InventoryError::MemberHasActiveLoans {
                member_id: id,
                active_loans,
            });
        }

        sqlx::query(&self.sql.delete_member)
            .bind(id.value())
            .execute(&mut *tx)
            .await?;

        let (_, max_id): (i64, i32) = sqlx::query_as(&self.sql.member_stats)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(max_id)
    }
}
