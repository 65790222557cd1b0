//! Typed key field values and their ordered encoding.
//!
//! Keys are stored as the concatenation of their encoded fields. The
//! encoding preserves order, so comparing two encoded keys byte-wise gives
//! the same answer as comparing their values field by field. Every field is
//! self-delimiting, so the encoding of the first `n` fields of a key is a
//! byte prefix of the encoding of the whole key.

use crate::{OrmError, OrmResult};
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use smallvec::SmallVec;

/// Ordered field values of a primary or index key, in declared order.
pub type KeyValues = SmallVec<[Value; 4]>;

const ESCAPE: u8 = 0x00;
const ESCAPED_NUL: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

const SIGN_32: u32 = 1 << 31;
const SIGN_64: u64 = 1 << 63;

/// The declared type of a key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A boolean.
    Bool,
    /// An unsigned 32-bit integer.
    U32,
    /// An unsigned 64-bit integer.
    U64,
    /// A signed 32-bit integer.
    I32,
    /// A signed 64-bit integer.
    I64,
    /// A UTF-8 string.
    Str,
    /// Raw bytes.
    Bytes,
}

impl FieldKind {
    /// Human readable name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Str => "string",
            Self::Bytes => "bytes",
        }
    }
}

/// A single typed key field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// An unsigned 32-bit integer.
    U32(u32),
    /// An unsigned 64-bit integer.
    U64(u64),
    /// A signed 32-bit integer.
    I32(i32),
    /// A signed 64-bit integer.
    I64(i64),
    /// A UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// The kind of this value.
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Bool,
            Self::U32(_) => FieldKind::U32,
            Self::U64(_) => FieldKind::U64,
            Self::I32(_) => FieldKind::I32,
            Self::I64(_) => FieldKind::I64,
            Self::Str(_) => FieldKind::Str,
            Self::Bytes(_) => FieldKind::Bytes,
        }
    }

    /// Appends the ordered encoding of this value to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Bool(b) => out.push(*b as u8),
            Self::U32(v) => put_u32(out, *v),
            Self::U64(v) => put_u64(out, *v),
            Self::I32(v) => put_u32(out, (*v as u32) ^ SIGN_32),
            Self::I64(v) => put_u64(out, (*v as u64) ^ SIGN_64),
            Self::Str(s) => put_escaped(out, s.as_bytes()),
            Self::Bytes(b) => put_escaped(out, b),
        }
    }

    /// Decodes one value of the given kind, advancing `buf` past it.
    pub fn decode(kind: FieldKind, buf: &mut &[u8]) -> OrmResult<Self> {
        let truncated = |_| OrmError::TruncatedKey;
        Ok(match kind {
            FieldKind::Bool => match buf.read_u8().map_err(truncated)? {
                0 => Self::Bool(false),
                1 => Self::Bool(true),
                other => return Err(OrmError::Decode(format!("invalid bool byte {other:#04x}"))),
            },
            FieldKind::U32 => Self::U32(buf.read_u32::<BigEndian>().map_err(truncated)?),
            FieldKind::U64 => Self::U64(buf.read_u64::<BigEndian>().map_err(truncated)?),
            FieldKind::I32 => {
                Self::I32((buf.read_u32::<BigEndian>().map_err(truncated)? ^ SIGN_32) as i32)
            }
            FieldKind::I64 => {
                Self::I64((buf.read_u64::<BigEndian>().map_err(truncated)? ^ SIGN_64) as i64)
            }
            FieldKind::Str => {
                let bytes = take_escaped(buf)?;
                Self::Str(String::from_utf8(bytes).map_err(|e| OrmError::Decode(e.to_string()))?)
            }
            FieldKind::Bytes => Self::Bytes(take_escaped(buf)?),
        })
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

/// Appends the ordered encoding of every value to `out`.
pub fn encode_values(values: &[Value], out: &mut Vec<u8>) {
    values.iter().for_each(|v| v.encode(out));
}

/// Decodes one value per kind, in order, advancing `buf` past them.
pub fn decode_values(kinds: &[FieldKind], buf: &mut &[u8]) -> OrmResult<KeyValues> {
    kinds.iter().map(|kind| Value::decode(*kind, buf)).collect()
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    let mut b = [0u8; 4];
    BigEndian::write_u32(&mut b, v);
    out.extend_from_slice(&b);
}

fn put_u64(out: &mut Vec<u8>, v: u64) {
    let mut b = [0u8; 8];
    BigEndian::write_u64(&mut b, v);
    out.extend_from_slice(&b);
}

fn put_escaped(out: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        out.push(b);
        if b == ESCAPE {
            out.push(ESCAPED_NUL);
        }
    }
    out.extend_from_slice(&[ESCAPE, TERMINATOR]);
}

fn take_escaped(buf: &mut &[u8]) -> OrmResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0;
    loop {
        match buf.get(i) {
            None => return Err(OrmError::TruncatedKey),
            Some(&ESCAPE) => match buf.get(i + 1) {
                Some(&ESCAPED_NUL) => out.push(ESCAPE),
                Some(&TERMINATOR) => {
                    *buf = &buf[i + 2..];
                    return Ok(out);
                }
                Some(other) => {
                    return Err(OrmError::Decode(format!("invalid escape byte {other:#04x}")));
                }
                None => return Err(OrmError::TruncatedKey),
            },
            Some(&b) => out.push(b),
        }
        i += if buf[i] == ESCAPE { 2 } else { 1 };
    }
}
