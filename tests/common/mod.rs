//! Shared records and tables for integration tests.
#![allow(missing_docs, dead_code, unreachable_pub)]

use byteorder::{BigEndian, ReadBytesExt};
use signet_orm_iter::{
    FieldDef, FieldKind, IndexDef, Message, OrmError, OrmIterator, OrmResult, Record, Store,
    Table, TableDef, Value,
};

/// A balance of one denomination held by one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balance {
    pub owner: String,
    pub denom: String,
    pub amount: u64,
}

impl Balance {
    pub fn new(owner: &str, denom: &str, amount: u64) -> Self {
        Self { owner: owner.to_owned(), denom: denom.to_owned(), amount }
    }
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn take_str(buf: &mut &[u8]) -> OrmResult<String> {
    let len = buf.read_u32::<BigEndian>().map_err(|e| OrmError::Decode(e.to_string()))? as usize;
    if buf.len() < len {
        return Err(OrmError::Decode("string runs past end of record".into()));
    }
    let (s, rest) = buf.split_at(len);
    *buf = rest;
    String::from_utf8(s.to_vec()).map_err(|e| OrmError::Decode(e.to_string()))
}

impl Message for Balance {
    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_str(&mut out, &self.owner);
        put_str(&mut out, &self.denom);
        out.extend_from_slice(&self.amount.to_be_bytes());
        out
    }

    fn decode_into(&mut self, mut bytes: &[u8]) -> OrmResult<()> {
        let buf = &mut bytes;
        self.owner = take_str(buf)?;
        self.denom = take_str(buf)?;
        self.amount = buf.read_u64::<BigEndian>().map_err(|e| OrmError::Decode(e.to_string()))?;
        Ok(())
    }
}

impl Record for Balance {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "owner" => Some(Value::from(self.owner.as_str())),
            "denom" => Some(Value::from(self.denom.as_str())),
            "amount" => Some(Value::U64(self.amount)),
            _ => None,
        }
    }
}

/// A message that refuses every body.
#[derive(Debug, Default)]
pub struct Corrupt;

impl Message for Corrupt {
    fn encode(&self) -> Vec<u8> {
        Vec::new()
    }

    fn decode_into(&mut self, _bytes: &[u8]) -> OrmResult<()> {
        Err(OrmError::Decode("corrupt".into()))
    }
}

/// A balance whose stored body decodes with the wrong denomination, so its
/// index entries cannot be found from the decoded record.
#[derive(Debug, Default)]
pub struct Misfiled(pub Balance);

impl Message for Misfiled {
    fn encode(&self) -> Vec<u8> {
        self.0.encode()
    }

    fn decode_into(&mut self, bytes: &[u8]) -> OrmResult<()> {
        self.0.decode_into(bytes)?;
        self.0.denom = "zzz".into();
        Ok(())
    }
}

impl Record for Misfiled {
    fn field(&self, name: &str) -> Option<Value> {
        self.0.field(name)
    }
}

/// Balances keyed by (owner, denom), indexed by denom and by amount.
pub fn balances_def() -> TableDef {
    TableDef::new("balances")
        .with_primary_key([
            FieldDef::new("owner", FieldKind::Str),
            FieldDef::new("denom", FieldKind::Str),
        ])
        .with_index(IndexDef::new("by_denom", [FieldDef::new("denom", FieldKind::Str)]))
        .with_index(IndexDef::new("by_amount", [FieldDef::new("amount", FieldKind::U64)]))
}

/// Rows of the balances table, in primary key order.
pub const BALANCES: &[(&str, &str, u64)] = &[
    ("alice", "atom", 10),
    ("alice", "usdc", 250),
    ("bob", "atom", 7),
    ("carol", "atom", 99),
    ("carol", "eth", 1),
];

/// A store with the balances table populated from [`BALANCES`], inserted
/// out of order.
pub fn balances() -> (Store, Table) {
    let store = Store::new();
    let table = store.create_table(balances_def()).unwrap();
    for (owner, denom, amount) in BALANCES.iter().rev() {
        table.insert(&Balance::new(owner, denom, *amount)).unwrap();
    }
    (store, table)
}

/// Drive `it` to the end, collecting every message.
pub fn drain(it: &mut dyn OrmIterator) -> OrmResult<Vec<Balance>> {
    let mut out = Vec::new();
    while it.advance()? {
        let mut b = Balance::default();
        it.get_message(&mut b)?;
        out.push(b);
    }
    Ok(out)
}

/// Drive `it` to the end, collecting every primary key.
pub fn drain_keys(it: &mut dyn OrmIterator) -> OrmResult<Vec<(String, String)>> {
    let mut out = Vec::new();
    while it.advance()? {
        match it.primary_key()?.as_slice() {
            [Value::Str(owner), Value::Str(denom)] => out.push((owner.clone(), denom.clone())),
            other => panic!("unexpected primary key {other:?}"),
        }
    }
    Ok(out)
}

pub fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
}
