use crate::{
    Cursor, OrmError, OrmResult, Value,
    store::{FieldDef, check_values, prefix_end},
    value::encode_values,
};
use std::ops::Bound;

bitflags::bitflags! {
    /// Options for a [`ListRequest`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScanFlags: u8 {
        /// Walk the keyspace from the last key to the first.
        const REVERSE = 0x01;
        /// Only expose keys. `get_message` is unsupported and index scans
        /// skip reading the referenced record.
        const KEYS_ONLY = 0x02;
    }
}

impl Default for ScanFlags {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum Bounds {
    #[default]
    All,
    Prefix(Vec<Value>),
    Range {
        start: Vec<Value>,
        end: Vec<Value>,
    },
}

impl Bounds {
    /// Resolve the bounds to storage keys inside `keyspace`. The lower bound
    /// is always inclusive, the upper bound exclusive.
    pub(crate) fn resolve(
        &self,
        keyspace: &[u8],
        fields: &[FieldDef],
    ) -> OrmResult<(Bound<Vec<u8>>, Bound<Vec<u8>>)> {
        let prefixed = |values: &[Value]| -> OrmResult<Vec<u8>> {
            check_values(fields, values)?;
            let mut out = keyspace.to_vec();
            encode_values(values, &mut out);
            Ok(out)
        };

        let (lower, upper) = match self {
            Self::All => (keyspace.to_vec(), prefix_end(keyspace)),
            Self::Prefix(values) => {
                let prefix = prefixed(values)?;
                let end = prefix_end(&prefix);
                (prefix, end)
            }
            Self::Range { start, end } => (prefixed(start)?, prefix_end(&prefixed(end)?)),
        };

        if let Some(end) = &upper {
            if lower >= *end {
                return Err(OrmError::InvalidRange("range start is after range end".into()));
            }
        }
        Ok((Bound::Included(lower), upper.map_or(Bound::Unbounded, Bound::Excluded)))
    }
}

/// A request to list the records of a table.
///
/// By default the whole primary keyspace is walked in ascending order.
///
/// ```
/// # use signet_orm_iter::{ListRequest, ScanFlags, Value};
/// let req = ListRequest::index("by_owner")
///     .prefix([Value::from("alice")])
///     .flags(ScanFlags::REVERSE);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub(crate) index: Option<String>,
    pub(crate) bounds: Bounds,
    pub(crate) cursor: Option<Cursor>,
    pub(crate) flags: ScanFlags,
}

impl ListRequest {
    /// List records in primary key order.
    pub fn primary() -> Self {
        Self::default()
    }

    /// List records in the order of the named secondary index.
    pub fn index(name: impl Into<String>) -> Self {
        Self { index: Some(name.into()), ..Self::default() }
    }

    /// Only list records whose key starts with `values`.
    pub fn prefix(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.bounds = Bounds::Prefix(values.into_iter().collect());
        self
    }

    /// Only list records whose key lies between the `start` and `end`
    /// prefixes, both inclusive. An empty prefix leaves that side open.
    pub fn range(
        mut self,
        start: impl IntoIterator<Item = Value>,
        end: impl IntoIterator<Item = Value>,
    ) -> Self {
        self.bounds = Bounds::Range {
            start: start.into_iter().collect(),
            end: end.into_iter().collect(),
        };
        self
    }

    /// Resume strictly after the record a previous scan of the same table
    /// and index was positioned on.
    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Set the scan flags.
    pub fn flags(mut self, flags: ScanFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Walk the keyspace in descending order.
    pub fn reverse(self) -> Self {
        let flags = self.flags | ScanFlags::REVERSE;
        self.flags(flags)
    }
}
