use crate::{FieldKind, KeyValues, OrmError, OrmResult, Record, Value};

/// The largest number of secondary indexes a table may declare.
pub const MAX_INDEXES: usize = u8::MAX as usize;

/// A named, typed key field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    name: String,
    kind: FieldKind,
}

impl FieldDef {
    /// Create a new field definition.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind }
    }

    /// The field name, as passed to [`Record::field`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared kind of the field.
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// A secondary index over one or more record fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    name: String,
    fields: Vec<FieldDef>,
    unique: bool,
}

impl IndexDef {
    /// Create a non-unique index over `fields`, in order.
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        Self { name: name.into(), fields: fields.into_iter().collect(), unique: false }
    }

    /// Make the index unique: no two records may share its field values.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// The index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The indexed fields, in order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Whether the index is unique.
    pub const fn is_unique(&self) -> bool {
        self.unique
    }
}

/// The definition of a table: its primary key and secondary indexes.
///
/// ```
/// # use signet_orm_iter::{FieldDef, FieldKind, IndexDef, TableDef};
/// let def = TableDef::new("balances")
///     .with_primary_key([FieldDef::new("address", FieldKind::Bytes)])
///     .with_index(IndexDef::new("by_denom", [FieldDef::new("denom", FieldKind::Str)]));
/// assert_eq!(def.index_position("by_denom"), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    name: String,
    primary_key: Vec<FieldDef>,
    indexes: Vec<IndexDef>,
}

impl TableDef {
    /// Create a table definition with no key fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), primary_key: Vec::new(), indexes: Vec::new() }
    }

    /// Set the primary key fields, in order.
    pub fn with_primary_key(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.primary_key = fields.into_iter().collect();
        self
    }

    /// Add a secondary index.
    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The primary key fields, in order.
    pub fn primary_key(&self) -> &[FieldDef] {
        &self.primary_key
    }

    /// The secondary indexes, in declaration order.
    pub fn indexes(&self) -> &[IndexDef] {
        &self.indexes
    }

    /// The position of the named index, if the table declares it.
    pub fn index_position(&self, name: &str) -> Option<usize> {
        self.indexes.iter().position(|idx| idx.name == name)
    }

    pub(crate) fn validate(&self) -> OrmResult<()> {
        let invalid = |msg: String| Err(OrmError::InvalidSchema(msg));
        if self.primary_key.is_empty() {
            return invalid(format!("table {} has no primary key", self.name));
        }
        if self.indexes.len() > MAX_INDEXES {
            return invalid(format!("table {} declares more than {MAX_INDEXES} indexes", self.name));
        }
        for (i, idx) in self.indexes.iter().enumerate() {
            if idx.fields.is_empty() {
                return invalid(format!("index {} has no fields", idx.name));
            }
            if self.indexes[..i].iter().any(|other| other.name == idx.name) {
                return invalid(format!("index {} is declared twice", idx.name));
            }
        }
        Ok(())
    }
}

/// Decode one value per field, advancing `buf` past them.
pub(crate) fn decode_fields(fields: &[FieldDef], buf: &mut &[u8]) -> OrmResult<KeyValues> {
    fields.iter().map(|f| Value::decode(f.kind, buf)).collect()
}

/// Check that `values` are a prefix of a key made of `fields`.
pub(crate) fn check_values(fields: &[FieldDef], values: &[Value]) -> OrmResult<()> {
    if values.len() > fields.len() {
        return Err(OrmError::InvalidRange(format!(
            "{} values given for a key of {} fields",
            values.len(),
            fields.len()
        )));
    }
    for (field, value) in fields.iter().zip(values) {
        check_kind(field, value)?;
    }
    Ok(())
}

/// Check that `values` are a complete key made of `fields`.
pub(crate) fn check_full_key(fields: &[FieldDef], values: &[Value]) -> OrmResult<()> {
    check_values(fields, values)?;
    if values.len() != fields.len() {
        return Err(OrmError::InvalidRange(format!(
            "{} values given for a key of {} fields",
            values.len(),
            fields.len()
        )));
    }
    Ok(())
}

/// Read the key fields out of a record.
pub(crate) fn project(fields: &[FieldDef], record: &dyn Record) -> OrmResult<KeyValues> {
    fields
        .iter()
        .map(|field| {
            let value =
                record.field(&field.name).ok_or_else(|| OrmError::MissingField(field.name.clone()))?;
            check_kind(field, &value)?;
            Ok(value)
        })
        .collect()
}

fn check_kind(field: &FieldDef, value: &Value) -> OrmResult<()> {
    if value.kind() != field.kind {
        return Err(OrmError::TypeMismatch {
            field: field.name.clone(),
            expected: field.kind.name(),
        });
    }
    Ok(())
}
