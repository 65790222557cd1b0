//! The iteration protocol for table scans.
//!
//! Every scan over a table, whether driven by the primary key or by a
//! secondary index, is consumed through [`OrmIterator`]. The query layer
//! always hands back a [`ScanIter`], even when the scan could not be
//! prepared, so callers drive every scan with the same loop:
//!
//! ```
//! # use signet_orm_iter::{OrmError, OrmIterator, ScanIter};
//! let mut it = ScanIter::from(OrmError::construction("range invalid"));
//! let mut seen = 0;
//! let res = (|| {
//!     while it.advance()? {
//!         seen += 1;
//!     }
//!     Ok::<_, OrmError>(())
//! })();
//! it.close();
//! assert_eq!(seen, 0);
//! assert_eq!(res, Err(OrmError::construction("range invalid")));
//! ```
//!
//! # Producers
//!
//! | Producer | Supports |
//! |----------|----------|
//! | [`UnimplementedIterator`] | nothing; every operation is unsupported |
//! | [`ErrIterator`] | nothing; every operation returns one terminal error |
//! | [`PrimaryKeyIterator`] | primary key, message, cursor |
//! | [`IndexIterator`] | index key, primary key, message, cursor |
//!
//! # States
//!
//! ```text
//! Unpositioned --advance--> Positioned --advance--> Positioned
//!                                     \-----------> Exhausted (terminal)
//!                                      \----------> Errored   (terminal)
//! ```
//!
//! - `Unpositioned`: accessors fail with [`OrmError::NotPositioned`] and the
//!   cursor is empty.
//! - `Positioned`: accessors describe the current record.
//! - `Exhausted`: `advance` keeps returning `Ok(false)`; accessors fail with
//!   [`OrmError::NotPositioned`].
//! - `Errored`: every operation returns the error that ended the scan.
//!
//! [`OrmIterator::close`] is allowed in every state and never fails. Once
//! closed, `advance` and the accessors return [`OrmError::Closed`]. Dropping
//! a producer closes it, so early returns release the underlying snapshot.
//!
//! Iterators are not synchronized. `advance` runs synchronously against the
//! snapshot taken when the scan was opened.

mod err;
pub use err::ErrIterator;

mod table;
pub use table::{IndexIterator, PrimaryKeyIterator};
pub(crate) use table::Scan;

mod unimplemented;
pub use unimplemented::UnimplementedIterator;

use crate::{Cursor, KeyValues, Message, OrmError, OrmResult};

pub(crate) mod private {
    pub trait Sealed {}
    impl Sealed for super::UnimplementedIterator {}
    impl Sealed for super::ErrIterator {}
    impl Sealed for super::PrimaryKeyIterator {}
    impl Sealed for super::IndexIterator {}
    impl Sealed for super::ScanIter {}
}

/// The capability contract shared by every scan producer.
///
/// The trait is sealed. Every method defaults to the capability-less
/// behaviour of [`UnimplementedIterator`], so a producer only overrides the
/// operations it actually supports.
pub trait OrmIterator: private::Sealed + core::fmt::Debug {
    /// Moves to the next record.
    ///
    /// Returns `Ok(true)` if the iterator is now positioned on a record,
    /// `Ok(false)` if the scan is exhausted, or `Err` if the scan failed.
    /// The first call positions the iterator on the first record.
    fn advance(&mut self) -> OrmResult<bool> {
        Err(OrmError::UnsupportedOperation)
    }

    /// The current record's index key values, in the index's declared
    /// field order.
    fn index_key(&mut self) -> OrmResult<KeyValues> {
        Err(OrmError::UnsupportedOperation)
    }

    /// The current record's primary key values, in declared field order.
    fn primary_key(&mut self) -> OrmResult<KeyValues> {
        Err(OrmError::UnsupportedOperation)
    }

    /// Decodes the current record's body into `dst`.
    fn get_message(&mut self, _dst: &mut dyn Message) -> OrmResult<()> {
        Err(OrmError::UnsupportedOperation)
    }

    /// A cursor for the current record, or an empty cursor if the iterator
    /// is not positioned.
    fn cursor(&self) -> Cursor {
        Cursor::empty()
    }

    /// Releases any resource held by the producer. Idempotent.
    fn close(&mut self) {}
}

/// The iterator returned by the query layer.
///
/// Scans that cannot be served are folded into the [`Unimplemented`] and
/// [`Err`] variants instead of being reported through a separate `Result`.
///
/// [`Unimplemented`]: ScanIter::Unimplemented
/// [`Err`]: ScanIter::Err
#[derive(Debug)]
pub enum ScanIter {
    /// The requested capability does not exist.
    Unimplemented(UnimplementedIterator),
    /// Preparing the scan failed.
    Err(ErrIterator),
    /// A scan over the primary keyspace.
    Primary(PrimaryKeyIterator),
    /// A scan over a secondary index.
    Index(IndexIterator),
}

impl ScanIter {
    /// Returns the construction error, if the scan could not be prepared.
    pub const fn construction_error(&self) -> Option<&OrmError> {
        match self {
            Self::Err(it) => Some(it.error()),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn OrmIterator {
        match self {
            Self::Unimplemented(it) => it,
            Self::Err(it) => it,
            Self::Primary(it) => it,
            Self::Index(it) => it,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn OrmIterator {
        match self {
            Self::Unimplemented(it) => it,
            Self::Err(it) => it,
            Self::Primary(it) => it,
            Self::Index(it) => it,
        }
    }
}

impl OrmIterator for ScanIter {
    fn advance(&mut self) -> OrmResult<bool> {
        self.inner_mut().advance()
    }

    fn index_key(&mut self) -> OrmResult<KeyValues> {
        self.inner_mut().index_key()
    }

    fn primary_key(&mut self) -> OrmResult<KeyValues> {
        self.inner_mut().primary_key()
    }

    fn get_message(&mut self, dst: &mut dyn Message) -> OrmResult<()> {
        self.inner_mut().get_message(dst)
    }

    fn cursor(&self) -> Cursor {
        self.inner().cursor()
    }

    fn close(&mut self) {
        self.inner_mut().close()
    }
}

impl From<OrmError> for ScanIter {
    fn from(err: OrmError) -> Self {
        Self::Err(ErrIterator::new(err))
    }
}

impl From<UnimplementedIterator> for ScanIter {
    fn from(it: UnimplementedIterator) -> Self {
        Self::Unimplemented(it)
    }
}

impl From<PrimaryKeyIterator> for ScanIter {
    fn from(it: PrimaryKeyIterator) -> Self {
        Self::Primary(it)
    }
}

impl From<IndexIterator> for ScanIter {
    fn from(it: IndexIterator) -> Self {
        Self::Index(it)
    }
}
