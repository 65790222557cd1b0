//! An in-memory ordered object store.
//!
//! The store keeps every table in one ordered key-value map. Each table owns
//! a set of keyspaces: one for records, addressed by primary key, and one
//! per secondary index. Keys are laid out as
//!
//! ```text
//! [table id: u32 BE][space: u8][encoded key fields]
//! ```
//!
//! where space `0` holds records and space `1 + n` holds the entries of
//! index `n`. An index entry's key is the encoded index fields followed by
//! the encoded primary key; its value is empty.
//!
//! Writers replace the map copy-on-write. A scan takes a snapshot of the map
//! when it is opened and owns it until it is closed, so writes never disturb
//! an open scan.

mod request;
pub use request::{ListRequest, ScanFlags};

mod schema;
pub use schema::{FieldDef, IndexDef, MAX_INDEXES, TableDef};
pub(crate) use schema::{check_full_key, check_values, decode_fields, project};

mod table;
pub use table::Table;

use crate::{OrmError, OrmResult};
use byteorder::{BigEndian, ByteOrder};
use parking_lot::RwLock;
use std::{collections::BTreeMap, fmt, sync::Arc};

/// A point-in-time view of the whole store.
pub(crate) type Snapshot = Arc<BTreeMap<Vec<u8>, Vec<u8>>>;

pub(crate) const KEYSPACE_LEN: usize = 5;

/// The key prefix shared by every key in one table keyspace.
pub(crate) type Keyspace = [u8; KEYSPACE_LEN];

/// The space holding a table's records.
pub(crate) const RECORDS: u8 = 0;

/// The default maximum number of tables.
pub const DEFAULT_MAX_TABLES: usize = 64;

pub(crate) fn keyspace(table: u32, space: u8) -> Keyspace {
    let mut out = [0u8; KEYSPACE_LEN];
    BigEndian::write_u32(&mut out[..4], table);
    out[4] = space;
    out
}

/// The space holding the entries of the index at `position`.
pub(crate) fn index_space(position: usize) -> OrmResult<u8> {
    u8::try_from(position + 1)
        .map_err(|_| OrmError::InvalidSchema(format!("index position {position} out of range")))
}

/// The smallest key greater than every key starting with `prefix`, or
/// `None` if no such key exists.
pub(crate) fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Options for opening a [`Store`].
#[derive(Debug, Clone, Copy)]
pub struct StoreBuilder {
    max_tables: usize,
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self { max_tables: DEFAULT_MAX_TABLES }
    }
}

impl StoreBuilder {
    /// Set the maximum number of tables the store accepts.
    pub const fn set_max_tables(&mut self, max_tables: usize) -> &mut Self {
        self.max_tables = max_tables;
        self
    }

    /// Open an empty store.
    pub fn build(&self) -> Store {
        tracing::debug!(target: "orm", max_tables = self.max_tables, "opened store");
        Store {
            inner: Arc::new(StoreInner {
                data: RwLock::new(Snapshot::default()),
                tables: RwLock::new(Vec::new()),
                max_tables: self.max_tables,
            }),
        }
    }
}

struct StoreInner {
    data: RwLock<Snapshot>,
    tables: RwLock<Vec<Arc<TableDef>>>,
    max_tables: usize,
}

/// An in-memory ordered object store.
///
/// Cloning a store is cheap and yields another handle to the same data.
///
/// ```
/// # use signet_orm_iter::{FieldDef, FieldKind, ListRequest, OrmIterator, Store, TableDef};
/// let store = Store::new();
/// let table = store
///     .create_table(TableDef::new("blobs").with_primary_key([FieldDef::new("id", FieldKind::U64)]))
///     .unwrap();
///
/// let mut it = table.list(ListRequest::primary());
/// assert_eq!(it.advance(), Ok(false));
/// it.close();
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("tables", &self.inner.tables.read().len())
            .field("max_tables", &self.inner.max_tables)
            .finish_non_exhaustive()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Open an empty store with default options.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Options for opening a store.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Create a table.
    pub fn create_table(&self, def: TableDef) -> OrmResult<Table> {
        def.validate()?;

        let mut tables = self.inner.tables.write();
        if tables.iter().any(|t| t.name() == def.name()) {
            return Err(OrmError::TableExists(def.name().to_owned()));
        }
        if tables.len() >= self.inner.max_tables {
            return Err(OrmError::TooManyTables(self.inner.max_tables));
        }

        let id = u32::try_from(tables.len())
            .map_err(|_| OrmError::TooManyTables(u32::MAX as usize))?;
        tracing::debug!(target: "orm", table = def.name(), id, "created table");
        let def = Arc::new(def);
        tables.push(def.clone());
        Ok(Table::new(self.clone(), id, def))
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<Table> {
        let tables = self.inner.tables.read();
        let id = tables.iter().position(|t| t.name() == name)?;
        // Table ids are positions, bounded by `create_table`.
        Some(Table::new(self.clone(), id as u32, tables[id].clone()))
    }

    /// Take a snapshot of the current contents.
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.inner.data.read().clone()
    }

    /// Apply `f` to the contents under the write lock. `f` must check
    /// everything that can fail before it mutates the map.
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<Vec<u8>, Vec<u8>>) -> OrmResult<T>,
    ) -> OrmResult<T> {
        let mut data = self.inner.data.write();
        f(Arc::make_mut(&mut data))
    }
}
