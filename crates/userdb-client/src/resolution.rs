//! Outcome of a query that did not fail.

/// Either the service answered, or it cannot answer this kind of query.
///
/// [`Resolution::Unavailable`] tells the caller to try another identity
/// source. A [`Resolution::Resolved`] value is final, even when it carries
/// `None` for a record that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The socket is absent or the service reported itself unavailable.
    Unavailable,
    /// The service handled the query.
    Resolved(T),
}

impl<T> Resolution<T> {
    /// Whether the service handled the query.
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Maps the resolved value.
    #[must_use]
    pub fn map<U, F>(self, op: F) -> Resolution<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Unavailable => Resolution::Unavailable,
            Self::Resolved(value) => Resolution::Resolved(op(value)),
        }
    }

    /// The resolved value, discarding availability.
    #[must_use]
    pub fn resolved(self) -> Option<T> {
        match self {
            Self::Unavailable => None,
            Self::Resolved(value) => Some(value),
        }
    }
}
