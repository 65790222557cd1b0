use crate::{Cursor, KeyValues, Message, OrmError, OrmResult, iter::OrmIterator};

/// A producer that carries a single terminal error.
///
/// Used when preparing a scan fails. The caller still receives an iterator
/// and discovers the failure from the first `advance`, exactly as it would
/// a failure in the middle of a scan. Every operation returns a clone of the
/// same error, for as long as the iterator lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrIterator {
    err: OrmError,
}

impl ErrIterator {
    /// Creates an iterator that reports `err` from every operation.
    pub const fn new(err: OrmError) -> Self {
        Self { err }
    }

    /// The terminal error.
    pub const fn error(&self) -> &OrmError {
        &self.err
    }

    /// Consumes the iterator, returning the terminal error.
    pub fn into_error(self) -> OrmError {
        self.err
    }
}

impl From<OrmError> for ErrIterator {
    fn from(err: OrmError) -> Self {
        Self::new(err)
    }
}

impl OrmIterator for ErrIterator {
    fn advance(&mut self) -> OrmResult<bool> {
        Err(self.err.clone())
    }

    fn index_key(&mut self) -> OrmResult<KeyValues> {
        Err(self.err.clone())
    }

    fn primary_key(&mut self) -> OrmResult<KeyValues> {
        Err(self.err.clone())
    }

    fn get_message(&mut self, _dst: &mut dyn Message) -> OrmResult<()> {
        Err(self.err.clone())
    }

    fn cursor(&self) -> Cursor {
        Cursor::empty()
    }

    // Nothing to release; the error outlives close.
    fn close(&mut self) {}
}
