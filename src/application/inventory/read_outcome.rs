use crate::domain::InventoryError;

/// Outcome of a soft read (count or list).
///
/// Soft reads never fail outright: when the backend errors, the caller gets
/// the fallback value (empty list, `TableStats::EMPTY`) together with the
/// error that caused it, and decides whether to show a warning.
#[derive(Debug)]
pub enum ReadOutcome<T> {
    /// The value read from storage
    Fresh(T),
    /// Storage failed; `fallback` stands in for the value
    Degraded { fallback: T, error: InventoryError },
}

impl<T: Default> ReadOutcome<T> {
    /// Convert a store result, logging and absorbing the error.
    pub(crate) fn from_result(result: Result<T, InventoryError>, operation: &str) -> Self {
        match result {
            Ok(value) => ReadOutcome::Fresh(value),
            Err(error) => {
                tracing::warn!(operation, error = %error, "soft read degraded to fallback");
                ReadOutcome::Degraded {
                    fallback: T::default(),
                    error,
                }
            }
        }
    }
}

impl<T> ReadOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            ReadOutcome::Fresh(value) => value,
            ReadOutcome::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            ReadOutcome::Fresh(value) => value,
            ReadOutcome::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn error(&self) -> Option<&InventoryError> {
        match self {
            ReadOutcome::Fresh(_) => None,
            ReadOutcome::Degraded { error, .. } => Some(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ReadOutcome::Degraded { .. })
    }

    /// Split into the usable value and the error, if any.
    pub fn into_parts(self) -> (T, Option<InventoryError>) {
        match self {
            ReadOutcome::Fresh(value) => (value, None),
            ReadOutcome::Degraded { fallback, error } => (fallback, Some(error)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReadOutcome<U> {
        match self {
            ReadOutcome::Fresh(value) => ReadOutcome::Fresh(f(value)),
            ReadOutcome::Degraded { fallback, error } => ReadOutcome::Degraded {
                fallback: f(fallback),
                error,
            },
        }
    }
}
