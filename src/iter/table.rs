//! Producers that walk a table keyspace over a store snapshot.

use crate::{
    Cursor, KeyValues, Message, OrmError, OrmResult,
    iter::OrmIterator,
    store::{KEYSPACE_LEN, Keyspace, Snapshot, TableDef, decode_fields},
};
use std::{fmt, ops::Bound, sync::Arc};

#[derive(Debug)]
enum State {
    Unpositioned,
    /// Holds the value stored under the current key.
    Positioned(Vec<u8>),
    Exhausted,
    Errored(OrmError),
    Closed,
}

/// Walks the keys of one keyspace between two bounds, forward or in
/// reverse, over a snapshot it owns until closed.
pub(crate) struct Scan {
    snapshot: Option<Snapshot>,
    lower: Bound<Vec<u8>>,
    upper: Bound<Vec<u8>>,
    reverse: bool,
    /// The last key yielded. Always inside the bounds.
    last: Option<Vec<u8>>,
    state: State,
    span: tracing::Span,
}

impl fmt::Debug for Scan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scan")
            .field("reverse", &self.reverse)
            .field("last", &self.last)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Scan {
    /// Create a scan over `snapshot`. If `resume` is set, the scan starts
    /// strictly after it in scan order.
    pub(crate) const fn new(
        snapshot: Snapshot,
        lower: Bound<Vec<u8>>,
        upper: Bound<Vec<u8>>,
        reverse: bool,
        resume: Option<Vec<u8>>,
        span: tracing::Span,
    ) -> Self {
        Self {
            snapshot: Some(snapshot),
            lower,
            upper,
            reverse,
            last: resume,
            state: State::Unpositioned,
            span,
        }
    }

    fn step(&mut self) -> OrmResult<bool> {
        match &self.state {
            State::Exhausted => return Ok(false),
            State::Errored(err) => return Err(err.clone()),
            State::Closed => return Err(OrmError::Closed),
            State::Unpositioned | State::Positioned(_) => {}
        }
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Err(OrmError::Closed);
        };

        let lower = self.lower.as_ref().map(Vec::as_slice);
        let upper = self.upper.as_ref().map(Vec::as_slice);
        let (lower, upper) = match (self.last.as_deref(), self.reverse) {
            (Some(last), false) => (Bound::Excluded(last), upper),
            (Some(last), true) => (lower, Bound::Excluded(last)),
            (None, _) => (lower, upper),
        };

        let next = if non_empty(lower, upper) {
            let mut range = snapshot.range::<[u8], _>((lower, upper));
            let entry = if self.reverse { range.next_back() } else { range.next() };
            entry.map(|(k, v)| (k.clone(), v.clone()))
        } else {
            None
        };

        match next {
            Some((key, value)) => {
                self.last = Some(key);
                self.state = State::Positioned(value);
                Ok(true)
            }
            None => {
                tracing::trace!(target: "orm", parent: &self.span, "scan exhausted");
                self.state = State::Exhausted;
                Ok(false)
            }
        }
    }

    /// The current key and value.
    fn current(&self) -> OrmResult<(&[u8], &[u8])> {
        match &self.state {
            State::Positioned(value) => {
                Ok((self.last.as_deref().unwrap_or_default(), value.as_slice()))
            }
            State::Unpositioned | State::Exhausted => Err(OrmError::NotPositioned),
            State::Errored(err) => Err(err.clone()),
            State::Closed => Err(OrmError::Closed),
        }
    }

    /// Fails if the scan has ended with an error or been closed. Used by
    /// operations that do not need a current record.
    fn ensure_live(&self) -> OrmResult<()> {
        match &self.state {
            State::Errored(err) => Err(err.clone()),
            State::Closed => Err(OrmError::Closed),
            State::Unpositioned | State::Positioned(_) | State::Exhausted => Ok(()),
        }
    }

    /// Read another key from the same snapshot.
    fn get(&self, key: &[u8]) -> OrmResult<Option<&[u8]>> {
        let snapshot = self.snapshot.as_ref().ok_or(OrmError::Closed)?;
        Ok(snapshot.get(key).map(Vec::as_slice))
    }

    /// Move to the errored state, returning the error.
    fn fail(&mut self, err: OrmError) -> OrmError {
        tracing::debug!(target: "orm", parent: &self.span, %err, "scan failed");
        self.state = State::Errored(err.clone());
        err
    }

    fn cursor(&self) -> Cursor {
        match (&self.state, &self.last) {
            (State::Positioned(_), Some(key)) => Cursor::from(key.clone()),
            _ => Cursor::empty(),
        }
    }

    fn close(&mut self) {
        if matches!(self.state, State::Closed) {
            return;
        }
        self.snapshot = None;
        self.last = None;
        self.state = State::Closed;
        tracing::debug!(target: "orm", parent: &self.span, "scan closed");
    }
}

impl Drop for Scan {
    fn drop(&mut self) {
        self.close();
    }
}

/// `BTreeMap::range` panics on inverted bounds, so check first.
fn non_empty(lower: Bound<&[u8]>, upper: Bound<&[u8]>) -> bool {
    match (lower, upper) {
        (Bound::Included(a), Bound::Included(b)) => a <= b,
        (Bound::Included(a) | Bound::Excluded(a), Bound::Included(b) | Bound::Excluded(b)) => {
            a < b
        }
        _ => true,
    }
}

fn strip_keyspace(key: &[u8]) -> OrmResult<&[u8]> {
    key.get(KEYSPACE_LEN..).ok_or(OrmError::TruncatedKey)
}

/// An iterator over a table's records in primary key order.
///
/// Supports [`primary_key`], [`get_message`] and [`cursor`]. Asking for an
/// index key fails with [`OrmError::UnsupportedOperation`], unless the scan
/// has already failed or been closed.
///
/// [`primary_key`]: OrmIterator::primary_key
/// [`get_message`]: OrmIterator::get_message
/// [`cursor`]: OrmIterator::cursor
#[derive(Debug)]
pub struct PrimaryKeyIterator {
    scan: Scan,
    def: Arc<TableDef>,
    keys_only: bool,
}

impl PrimaryKeyIterator {
    pub(crate) const fn new(scan: Scan, def: Arc<TableDef>, keys_only: bool) -> Self {
        Self { scan, def, keys_only }
    }
}

impl OrmIterator for PrimaryKeyIterator {
    fn advance(&mut self) -> OrmResult<bool> {
        self.scan.step()
    }

    fn index_key(&mut self) -> OrmResult<KeyValues> {
        self.scan.ensure_live()?;
        Err(OrmError::UnsupportedOperation)
    }

    fn primary_key(&mut self) -> OrmResult<KeyValues> {
        let decoded = {
            let (key, _) = self.scan.current()?;
            strip_keyspace(key).and_then(|mut buf| decode_fields(self.def.primary_key(), &mut buf))
        };
        decoded.map_err(|e| self.scan.fail(e))
    }

    fn get_message(&mut self, dst: &mut dyn Message) -> OrmResult<()> {
        if self.keys_only {
            self.scan.ensure_live()?;
            return Err(OrmError::UnsupportedOperation);
        }
        let decoded = {
            let (_, value) = self.scan.current()?;
            dst.decode_into(value)
        };
        decoded.map_err(|e| self.scan.fail(e))
    }

    fn cursor(&self) -> Cursor {
        self.scan.cursor()
    }

    fn close(&mut self) {
        self.scan.close()
    }
}

/// An iterator over a table's records in secondary index order.
///
/// Index entries only reference their record, so unless the scan is keys
/// only, each [`advance`] also reads the record from the scan's snapshot.
/// An entry whose record is missing ends the scan with
/// [`OrmError::Storage`].
///
/// [`advance`]: OrmIterator::advance
#[derive(Debug)]
pub struct IndexIterator {
    scan: Scan,
    def: Arc<TableDef>,
    index: usize,
    records: Keyspace,
    keys_only: bool,
    record: Option<Vec<u8>>,
}

impl IndexIterator {
    pub(crate) const fn new(
        scan: Scan,
        def: Arc<TableDef>,
        index: usize,
        records: Keyspace,
        keys_only: bool,
    ) -> Self {
        Self { scan, def, index, records, keys_only, record: None }
    }

    /// Split an index entry key into the index values and the encoded
    /// primary key that follows them.
    fn split<'a>(&self, key: &'a [u8]) -> OrmResult<(KeyValues, &'a [u8])> {
        let mut buf = strip_keyspace(key)?;
        let values = decode_fields(self.def.indexes()[self.index].fields(), &mut buf)?;
        Ok((values, buf))
    }

    fn fetch_record(&self) -> OrmResult<Vec<u8>> {
        let (key, _) = self.scan.current()?;
        let (_, pk) = self.split(key)?;
        let mut record_key = self.records.to_vec();
        record_key.extend_from_slice(pk);
        self.scan
            .get(&record_key)?
            .map(<[u8]>::to_vec)
            .ok_or_else(|| OrmError::Storage("index entry refers to a missing record".into()))
    }
}

impl OrmIterator for IndexIterator {
    fn advance(&mut self) -> OrmResult<bool> {
        self.record = None;
        if !self.scan.step()? {
            return Ok(false);
        }
        if self.keys_only {
            return Ok(true);
        }
        match self.fetch_record() {
            Ok(record) => {
                self.record = Some(record);
                Ok(true)
            }
            Err(err) => Err(self.scan.fail(err)),
        }
    }

    fn index_key(&mut self) -> OrmResult<KeyValues> {
        let decoded = {
            let (key, _) = self.scan.current()?;
            self.split(key).map(|(values, _)| values)
        };
        decoded.map_err(|e| self.scan.fail(e))
    }

    fn primary_key(&mut self) -> OrmResult<KeyValues> {
        let decoded = {
            let (key, _) = self.scan.current()?;
            self.split(key)
                .and_then(|(_, mut pk)| decode_fields(self.def.primary_key(), &mut pk))
        };
        decoded.map_err(|e| self.scan.fail(e))
    }

    fn get_message(&mut self, dst: &mut dyn Message) -> OrmResult<()> {
        if self.keys_only {
            self.scan.ensure_live()?;
            return Err(OrmError::UnsupportedOperation);
        }
        self.scan.current()?;
        let decoded = match self.record.as_deref() {
            Some(record) => dst.decode_into(record),
            None => Err(OrmError::NotPositioned),
        };
        decoded.map_err(|e| self.scan.fail(e))
    }

    fn cursor(&self) -> Cursor {
        self.scan.cursor()
    }

    fn close(&mut self) {
        self.record = None;
        self.scan.close()
    }
}
