#![no_main]

use libfuzzer_sys::fuzz_target;
use signet_orm_iter::{FieldKind, value::decode_values};

const KINDS: [FieldKind; 7] = [
    FieldKind::Bool,
    FieldKind::U32,
    FieldKind::U64,
    FieldKind::I32,
    FieldKind::I64,
    FieldKind::Str,
    FieldKind::Bytes,
];

fuzz_target!(|data: &[u8]| {
    // The first byte picks up to three field kinds, the rest is the key.
    let Some((&shape, mut key)) = data.split_first() else { return };
    let kinds: Vec<_> = (0..shape as usize % 4).map(|i| KINDS[(shape as usize >> i) % 7]).collect();
    let _ = decode_values(&kinds, &mut key);
});
