#![no_main]

use libfuzzer_sys::fuzz_target;
use signet_orm_iter::{
    Cursor, FieldDef, FieldKind, IndexDef, ListRequest, Message, OrmIterator, OrmResult, Record,
    ScanFlags, Store, TableDef, Value,
};

struct Blob(Vec<u8>);

impl Message for Blob {
    fn encode(&self) -> Vec<u8> {
        self.0.clone()
    }

    fn decode_into(&mut self, bytes: &[u8]) -> OrmResult<()> {
        self.0 = bytes.to_vec();
        Ok(())
    }
}

impl Record for Blob {
    fn field(&self, name: &str) -> Option<Value> {
        (name == "key").then(|| Value::Bytes(self.0.clone()))
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&flags, cursor)) = data.split_first() else { return };

    let store = Store::new();
    let Ok(table) = store.create_table(
        TableDef::new("blobs")
            .with_primary_key([FieldDef::new("key", FieldKind::Bytes)])
            .with_index(IndexDef::new("by_key", [FieldDef::new("key", FieldKind::Bytes)])),
    ) else {
        return;
    };
    let keys: [&[u8]; 5] = [b"", b"\x00", b"a", b"a\x00b", b"b"];
    for key in keys {
        let _ = table.insert(&Blob(key.to_vec()));
    }

    let req = if flags & 0x80 == 0 { ListRequest::primary() } else { ListRequest::index("by_key") };
    let mut it = table
        .list(req.flags(ScanFlags::from_bits_truncate(flags)).cursor(Cursor::from(cursor)));
    while let Ok(true) = it.advance() {
        let _ = it.primary_key();
        let _ = it.index_key();
    }
    it.close();
});
