use crate::{
    Message, OrmError, OrmResult, Record, Value,
    iter::{IndexIterator, PrimaryKeyIterator, Scan, ScanIter, UnimplementedIterator},
    store::{
        KEYSPACE_LEN, Keyspace, ListRequest, RECORDS, ScanFlags, Store, TableDef, check_full_key,
        index_space, keyspace, project,
    },
    value::encode_values,
};
use smallvec::SmallVec;
use std::{collections::BTreeMap, ops::Bound, sync::Arc};

/// One secondary index entry for a record.
#[derive(Debug)]
struct IndexEntry {
    unique: bool,
    key: Vec<u8>,
    /// Length of the keyspace and index values, before the primary key.
    values_len: usize,
}

type IndexEntries = SmallVec<[IndexEntry; 4]>;

/// A handle to one table of a [`Store`].
///
/// Writes go straight to the store. Reads through [`Table::list`] see the
/// store as it was when the scan was opened.
#[derive(Debug, Clone)]
pub struct Table {
    store: Store,
    id: u32,
    def: Arc<TableDef>,
}

impl Table {
    pub(crate) const fn new(store: Store, id: u32, def: Arc<TableDef>) -> Self {
        Self { store, id, def }
    }

    /// The table name.
    pub fn name(&self) -> &str {
        self.def.name()
    }

    /// The table definition.
    pub fn def(&self) -> &TableDef {
        &self.def
    }

    fn records(&self) -> Keyspace {
        keyspace(self.id, RECORDS)
    }

    fn record_key(&self, pk: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(KEYSPACE_LEN + pk.len());
        key.extend_from_slice(&self.records());
        key.extend_from_slice(pk);
        key
    }

    fn encode_pk(&self, record: &dyn Record) -> OrmResult<Vec<u8>> {
        let pk = project(self.def.primary_key(), record)?;
        let mut out = Vec::new();
        encode_values(&pk, &mut out);
        Ok(out)
    }

    fn index_entries(&self, record: &dyn Record, pk: &[u8]) -> OrmResult<IndexEntries> {
        self.def
            .indexes()
            .iter()
            .enumerate()
            .map(|(position, index)| {
                let values = project(index.fields(), record)?;
                let mut key = keyspace(self.id, index_space(position)?).to_vec();
                encode_values(&values, &mut key);
                let values_len = key.len();
                key.extend_from_slice(pk);
                Ok(IndexEntry { unique: index.is_unique(), key, values_len })
            })
            .collect()
    }

    /// Fails if a unique index entry for another record already holds the
    /// same index values.
    fn check_unique(
        map: &BTreeMap<Vec<u8>, Vec<u8>>,
        entries: &IndexEntries,
        pk: &[u8],
    ) -> OrmResult<()> {
        for entry in entries.iter().filter(|e| e.unique) {
            let prefix = &entry.key[..entry.values_len];
            let taken = map
                .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(|(k, _)| k.starts_with(prefix))
                .any(|(k, _)| &k[entry.values_len..] != pk);
            if taken {
                return Err(OrmError::DuplicateKey);
            }
        }
        Ok(())
    }

    /// Insert a new record. Fails with [`OrmError::DuplicateKey`] if a record
    /// with the same primary key, or the same values for a unique index,
    /// exists.
    pub fn insert(&self, record: &dyn Record) -> OrmResult<()> {
        let pk = self.encode_pk(record)?;
        let entries = self.index_entries(record, &pk)?;
        let record_key = self.record_key(&pk);
        let body = record.encode();

        self.store.write(|map| {
            if map.contains_key(&record_key) {
                return Err(OrmError::DuplicateKey);
            }
            Self::check_unique(map, &entries, &pk)?;
            map.insert(record_key, body);
            for entry in entries {
                map.insert(entry.key, Vec::new());
            }
            Ok(())
        })
    }

    /// Insert or replace a record, keeping its index entries current.
    ///
    /// The stored record, if any, is decoded as `R` to find the index
    /// entries it leaves behind.
    pub fn save<R: Record + Default>(&self, record: &R) -> OrmResult<()> {
        let pk = self.encode_pk(record)?;
        let entries = self.index_entries(record, &pk)?;
        let record_key = self.record_key(&pk);
        let body = record.encode();

        self.store.write(|map| {
            let stale = match map.get(&record_key) {
                Some(bytes) => {
                    let mut old = R::default();
                    old.decode_into(bytes)?;
                    self.index_entries(&old, &pk)?
                }
                None => IndexEntries::new(),
            };
            Self::check_unique(map, &entries, &pk)?;

            for entry in stale {
                map.remove(&entry.key);
            }
            map.insert(record_key, body);
            for entry in entries {
                map.insert(entry.key, Vec::new());
            }
            Ok(())
        })
    }

    /// Delete the record with primary key `pk`, decoding it as `R` to find
    /// its index entries. Fails with [`OrmError::NotFound`] if there is no
    /// such record.
    pub fn delete<R: Record + Default>(&self, pk: &[Value]) -> OrmResult<()> {
        check_full_key(self.def.primary_key(), pk)?;
        let mut pk_bytes = Vec::new();
        encode_values(pk, &mut pk_bytes);
        let record_key = self.record_key(&pk_bytes);

        self.store.write(|map| {
            let bytes = map.get(&record_key).ok_or(OrmError::NotFound)?;
            let mut old = R::default();
            old.decode_into(bytes)?;
            let stale = self.index_entries(&old, &pk_bytes)?;

            for entry in stale {
                map.remove(&entry.key);
            }
            map.remove(&record_key);
            Ok(())
        })
    }

    /// Decode the record with primary key `pk` into `dst`.
    pub fn get(&self, pk: &[Value], dst: &mut dyn Message) -> OrmResult<()> {
        check_full_key(self.def.primary_key(), pk)?;
        let mut pk_bytes = Vec::new();
        encode_values(pk, &mut pk_bytes);

        let snapshot = self.store.snapshot();
        let body = snapshot.get(self.record_key(&pk_bytes).as_slice()).ok_or(OrmError::NotFound)?;
        dst.decode_into(body)
    }

    /// Returns `true` if a record with primary key `pk` exists.
    pub fn has(&self, pk: &[Value]) -> OrmResult<bool> {
        check_full_key(self.def.primary_key(), pk)?;
        let mut pk_bytes = Vec::new();
        encode_values(pk, &mut pk_bytes);
        Ok(self.store.snapshot().contains_key(self.record_key(&pk_bytes).as_slice()))
    }

    /// Open a scan over the table.
    ///
    /// This never fails outright. A request for an index the table does not
    /// declare yields [`ScanIter::Unimplemented`]; a malformed request
    /// yields [`ScanIter::Err`], whose error surfaces from the first
    /// `advance`.
    pub fn list(&self, req: ListRequest) -> ScanIter {
        match self.prepare(req) {
            Ok(it) => it,
            Err(err) => {
                tracing::debug!(target: "orm", table = self.name(), %err, "could not prepare scan");
                ScanIter::from(err)
            }
        }
    }

    fn prepare(&self, req: ListRequest) -> OrmResult<ScanIter> {
        let ListRequest { index, bounds, cursor, flags } = req;

        let (space, fields, position) = match index.as_deref() {
            None => (RECORDS, self.def.primary_key(), None),
            Some(name) => match self.def.index_position(name) {
                Some(position) => {
                    (index_space(position)?, self.def.indexes()[position].fields(), Some(position))
                }
                None => {
                    tracing::debug!(target: "orm", table = self.name(), index = name, "no such index");
                    return Ok(UnimplementedIterator.into());
                }
            },
        };

        let prefix = keyspace(self.id, space);
        let (lower, upper) = bounds.resolve(&prefix, fields)?;

        let resume = match cursor {
            Some(cursor) if !cursor.is_empty() => {
                let key = cursor.into_bytes();
                if !key.starts_with(&prefix) || !within(&lower, &upper, &key) {
                    return Err(OrmError::InvalidCursor);
                }
                Some(key)
            }
            _ => None,
        };

        let span = tracing::debug_span!(
            target: "orm",
            "orm_scan",
            table = self.name(),
            index = index.as_deref().unwrap_or("primary"),
            reverse = flags.contains(ScanFlags::REVERSE),
        );
        tracing::trace!(target: "orm", parent: &span, resumed = resume.is_some(), "opened scan");

        let reverse = flags.contains(ScanFlags::REVERSE);
        let keys_only = flags.contains(ScanFlags::KEYS_ONLY);
        let scan = Scan::new(self.store.snapshot(), lower, upper, reverse, resume, span);

        Ok(match position {
            None => PrimaryKeyIterator::new(scan, self.def.clone(), keys_only).into(),
            Some(position) => {
                IndexIterator::new(scan, self.def.clone(), position, self.records(), keys_only)
                    .into()
            }
        })
    }
}

fn within(lower: &Bound<Vec<u8>>, upper: &Bound<Vec<u8>>, key: &[u8]) -> bool {
    let above = match lower {
        Bound::Included(l) => key >= l.as_slice(),
        Bound::Excluded(l) => key > l.as_slice(),
        Bound::Unbounded => true,
    };
    let below = match upper {
        Bound::Included(u) => key <= u.as_slice(),
        Bound::Excluded(u) => key < u.as_slice(),
        Bound::Unbounded => true,
    };
    above && below
}
