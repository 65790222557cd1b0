/// An ORM iteration or store error.
///
/// Errors are cheap to clone so that a terminal iterator can hand back the
/// same error from every subsequent call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrmError {
    /// The producer does not support the requested operation.
    #[error("unsupported operation")]
    UnsupportedOperation,
    /// An accessor was called while the iterator is not positioned on a
    /// record.
    #[error("iterator is not positioned on a record")]
    NotPositioned,
    /// The iterator was used after being closed.
    #[error("iterator is closed")]
    Closed,
    /// Preparing the scan failed.
    #[error("failed to construct iterator: {0}")]
    Construction(String),
    /// The requested key range is malformed.
    #[error("invalid range: {0}")]
    InvalidRange(String),
    /// The cursor was not issued for this keyspace.
    #[error("invalid cursor")]
    InvalidCursor,
    /// The underlying store is inconsistent.
    #[error("storage failure: {0}")]
    Storage(String),
    /// A record body could not be decoded.
    #[error("decode failure: {0}")]
    Decode(String),
    /// An encoded key ended before all of its fields were read.
    #[error("truncated key")]
    TruncatedKey,
    /// A table definition is malformed.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A table with this name already exists.
    #[error("table {0} already exists")]
    TableExists(String),
    /// The store was configured with fewer tables than requested.
    #[error("store is limited to {0} tables")]
    TooManyTables(usize),
    /// A record did not provide a key field.
    #[error("record is missing field {0}")]
    MissingField(String),
    /// A key value does not match the declared field kind.
    #[error("field {field} expects a {expected} value")]
    TypeMismatch {
        /// The field name.
        field: String,
        /// The declared kind of the field.
        expected: &'static str,
    },
    /// The primary key or a unique index entry already exists.
    #[error("duplicate key")]
    DuplicateKey,
    /// No record exists for the key.
    #[error("not found")]
    NotFound,
}

impl OrmError {
    /// Returns `true` if this is [`OrmError::UnsupportedOperation`].
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation)
    }

    /// Wraps an arbitrary failure that occurred while preparing a scan.
    pub fn construction(err: impl core::fmt::Display) -> Self {
        Self::Construction(err.to_string())
    }
}

/// An ORM result.
pub type OrmResult<T> = Result<T, OrmError>;
