//! The iteration protocol for an object store over an ordered key-value
//! store.
//!
//! # Overview
//!
//! Records live in tables. Each table has a primary key and any number of
//! secondary indexes, and every key is stored in an order-preserving
//! encoding, so scanning a range of keys walks records in key order. This
//! crate provides:
//!
//! - [`OrmIterator`], the contract every scan producer implements
//! - [`Cursor`], an opaque position a scan can be resumed from
//! - [`UnimplementedIterator`] and [`ErrIterator`], the capability-less and
//!   error-carrying producers
//! - [`Store`] and [`Table`], an in-memory store whose [`Table::list`]
//!   serves scans by primary key or by index
//!
//! # Quick Start
//!
//! ```
//! use signet_orm_iter::{
//!     FieldDef, FieldKind, ListRequest, OrmIterator, OrmResult, Store, TableDef, Value,
//! };
//!
//! fn main() -> OrmResult<()> {
//!     let store = Store::new();
//!     let table = store.create_table(
//!         TableDef::new("notes").with_primary_key([FieldDef::new("body", FieldKind::Bytes)]),
//!     )?;
//!
//!     let mut it = table.list(ListRequest::primary().prefix([Value::Bytes(b"x".to_vec())]));
//!     while it.advance()? {
//!         let mut body = Vec::<u8>::new();
//!         it.get_message(&mut body)?;
//!     }
//!     it.close();
//!     Ok(())
//! }
//! ```
//!
//! # Key Concepts
//!
//! - [`Table::list`] never returns a `Result`. A scan that cannot be served
//!   comes back as a [`ScanIter`] whose `advance` reports the problem, so
//!   every caller checks for errors in exactly one place.
//! - Producers only override the [`OrmIterator`] operations they support.
//!   The rest fail with [`OrmError::UnsupportedOperation`]. A primary key
//!   scan, for instance, has no index key.
//! - Once `advance` returns `Ok(false)` or an error, the iterator stays
//!   there: it never moves back onto a record.
//! - [`OrmIterator::close`] releases the scan's snapshot. It is idempotent,
//!   never fails, and runs on drop.
//!
//! See the [`iter`] module for the full state machine.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod codec;
pub use codec::{Message, Record};

mod cursor;
pub use cursor::Cursor;

mod error;
pub use error::{OrmError, OrmResult};

pub mod iter;
pub use iter::{
    ErrIterator, IndexIterator, OrmIterator, PrimaryKeyIterator, ScanIter, UnimplementedIterator,
};

pub mod store;
pub use store::{
    FieldDef, IndexDef, ListRequest, ScanFlags, Store, StoreBuilder, Table, TableDef,
};

pub mod value;
pub use value::{FieldKind, KeyValues, Value};
