use thiserror::Error;

use super::{BookId, EntityKind, LoanId, MemberId};

/// Failures of catalog, ledger and inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// An add would create a case-insensitive duplicate
    #[error("{entity} already exists: {key}")]
    DuplicateEntity { entity: EntityKind, key: String },

    /// A lookup or search matched no rows
    #[error("no {entity} matches {criteria}")]
    NotFound { entity: EntityKind, criteria: String },

    /// A configured table cap would be exceeded
    #[error("{entity} capacity exceeded (max {limit})")]
    CapacityExceeded { entity: EntityKind, limit: i64 },

    /// The member already holds the maximum number of active loans
    #[error("member {member_id} reached the loan limit (max {limit})")]
    LoanLimitExceeded { member_id: MemberId, limit: i64 },

    #[error("book {0} is already lent")]
    AlreadyLent(BookId),

    #[error("book {0} does not exist")]
    BookNotFound(BookId),

    /// Deletion refused: the book is out on loan
    #[error("book {0} is still lent")]
    BookStillLent(BookId),

    /// Deletion refused: the member still has loans
    #[error("member {member_id} has {active_loans} active loan(s)")]
    MemberHasActiveLoans {
        member_id: MemberId,
        active_loans: i64,
    },

    /// An internal consistency check failed; never retried
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    /// A concurrent transaction won a lock or serialization race; the
    /// operation changed nothing and may be retried
    #[error("conflicting concurrent update: {0}")]
    Conflict(String),

    /// The persistence backend could not be reached or failed
    #[error("storage error: {0}")]
    StorageError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl InventoryError {
    pub fn not_found(entity: EntityKind, criteria: impl Into<String>) -> Self {
        InventoryError::NotFound {
            entity,
            criteria: criteria.into(),
        }
    }

    pub fn book_not_found_by_id(id: BookId) -> Self {
        Self::not_found(EntityKind::Book, format!("id {}", id))
    }

    pub fn member_not_found_by_id(id: MemberId) -> Self {
        Self::not_found(EntityKind::Member, format!("id {}", id))
    }

    pub fn loan_not_found_by_id(id: LoanId) -> Self {
        Self::not_found(EntityKind::Loan, format!("id {}", id))
    }

    pub fn storage(message: impl Into<String>) -> Self {
        let message: String = message.into();
        InventoryError::StorageError(message.into())
    }

    /// True for failures of the backend itself rather than of a business rule.
    pub fn is_storage(&self) -> bool {
        matches!(self, InventoryError::StorageError(_))
    }
}

/// Result type of every catalog, ledger and inventory operation
pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_entity() {
        let err = InventoryError::DuplicateEntity {
            entity: EntityKind::Book,
            key: "Dune / Frank Herbert".to_string(),
        };
        assert_eq!(err.to_string(), "book already exists: Dune / Frank Herbert");

        let err = InventoryError::member_not_found_by_id(MemberId::new(5));
        assert_eq!(err.to_string(), "no member matches id 5");
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let err = InventoryError::storage("connection refused");
        assert!(err.is_storage());
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "storage error: connection refused");
    }

    #[test]
    fn test_business_errors_are_not_storage() {
        assert!(!InventoryError::AlreadyLent(BookId::new(1)).is_storage());
        assert!(!InventoryError::IntegrityViolation("x".into()).is_storage());
        assert!(!InventoryError::Conflict("deadlock detected".into()).is_storage());
    }
}
