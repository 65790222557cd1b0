#![allow(missing_docs)]
mod common;

use common::{BALANCES, Balance, balances, drain, drain_keys, pairs};
use signet_orm_iter::*;

#[test]
fn primary_scan_is_ordered() {
    let (_store, table) = balances();
    let mut it = table.list(ListRequest::primary());
    let all = drain(&mut it).unwrap();
    let expected: Vec<_> = BALANCES.iter().map(|(o, d, a)| Balance::new(o, d, *a)).collect();
    assert_eq!(all, expected);
}

#[test]
fn reverse_primary_scan() {
    let (_store, table) = balances();
    let mut it = table.list(ListRequest::primary().reverse());
    let keys = drain_keys(&mut it).unwrap();
    assert_eq!(
        keys,
        pairs(&[
            ("carol", "eth"),
            ("carol", "atom"),
            ("bob", "atom"),
            ("alice", "usdc"),
            ("alice", "atom"),
        ])
    );
}

#[test]
fn prefix_scan() {
    let (_store, table) = balances();

    let mut it = table.list(ListRequest::primary().prefix([Value::from("carol")]));
    assert_eq!(drain_keys(&mut it).unwrap(), pairs(&[("carol", "atom"), ("carol", "eth")]));

    // "al" is not a field prefix of "alice"
    let mut it = table.list(ListRequest::primary().prefix([Value::from("al")]));
    assert!(drain_keys(&mut it).unwrap().is_empty());

    let mut it =
        table.list(ListRequest::primary().prefix([Value::from("alice"), Value::from("usdc")]));
    assert_eq!(drain_keys(&mut it).unwrap(), pairs(&[("alice", "usdc")]));
}

#[test]
fn range_scan_is_inclusive() {
    let (_store, table) = balances();

    let mut it =
        table.list(ListRequest::primary().range([Value::from("alice")], [Value::from("bob")]));
    assert_eq!(
        drain_keys(&mut it).unwrap(),
        pairs(&[("alice", "atom"), ("alice", "usdc"), ("bob", "atom")])
    );

    let mut it = table.list(
        ListRequest::primary()
            .range(
                [Value::from("alice"), Value::from("usdc")],
                [Value::from("carol"), Value::from("atom")],
            )
            .reverse(),
    );
    assert_eq!(
        drain_keys(&mut it).unwrap(),
        pairs(&[("carol", "atom"), ("bob", "atom"), ("alice", "usdc")])
    );

    // open ended
    let mut it = table.list(ListRequest::primary().range([Value::from("bob")], Vec::new()));
    assert_eq!(drain_keys(&mut it).unwrap().len(), 3);
}

#[test]
fn index_scan_reports_both_keys() {
    let (_store, table) = balances();
    let mut it = table.list(ListRequest::index("by_denom").prefix([Value::from("atom")]));

    let mut seen = Vec::new();
    while it.advance().unwrap() {
        let index = it.index_key().unwrap();
        let pk = it.primary_key().unwrap();
        let mut balance = Balance::default();
        it.get_message(&mut balance).unwrap();

        assert_eq!(index.as_slice(), &[Value::from("atom")]);
        assert_eq!(pk[0], Value::from(balance.owner.as_str()));
        assert_eq!(pk[1], Value::from(balance.denom.as_str()));
        seen.push(balance.owner);
    }
    it.close();
    // ties on the index are broken by primary key
    assert_eq!(seen, ["alice", "bob", "carol"]);
}

#[test]
fn index_scan_by_amount() {
    let (_store, table) = balances();

    let mut it = table.list(ListRequest::index("by_amount"));
    let amounts: Vec<_> = drain(&mut it).unwrap().into_iter().map(|b| b.amount).collect();
    assert_eq!(amounts, [1, 7, 10, 99, 250]);

    let mut it = table.list(
        ListRequest::index("by_amount").range([Value::U64(5)], [Value::U64(99)]).reverse(),
    );
    let amounts: Vec<_> = drain(&mut it).unwrap().into_iter().map(|b| b.amount).collect();
    assert_eq!(amounts, [99, 10, 7]);
}

#[test]
fn keys_only_scans_refuse_messages() {
    let (_store, table) = balances();
    for req in [ListRequest::primary(), ListRequest::index("by_denom")] {
        let mut it = table.list(req.flags(ScanFlags::KEYS_ONLY));
        assert!(it.advance().unwrap());
        assert!(it.primary_key().is_ok());
        assert_eq!(it.get_message(&mut Balance::default()), Err(OrmError::UnsupportedOperation));
        assert!(it.advance().unwrap());
    }
}

#[test]
fn unknown_index_is_unimplemented() {
    let (_store, table) = balances();
    let mut it = table.list(ListRequest::index("by_nothing"));
    assert!(matches!(it, ScanIter::Unimplemented(_)));
    assert_eq!(it.advance(), Err(OrmError::UnsupportedOperation));
    assert_eq!(it.index_key(), Err(OrmError::UnsupportedOperation));
    it.close();
}

#[test]
fn malformed_requests_become_err_iterators() {
    let (_store, table) = balances();

    let reqs = [
        ListRequest::primary().range([Value::from("carol")], [Value::from("alice")]),
        ListRequest::primary().prefix([Value::U64(1)]),
        ListRequest::primary().prefix([Value::from("a"), Value::from("b"), Value::from("c")]),
        ListRequest::index("by_amount").prefix([Value::from("ten")]),
        ListRequest::primary().cursor(Cursor::from(vec![0xFF; 3])),
    ];
    for req in reqs {
        let mut it = table.list(req);
        let err = it.construction_error().cloned().expect("scan should not be served");
        let mut iterations = 0;
        let res = (|| {
            while it.advance()? {
                iterations += 1;
            }
            Ok::<_, OrmError>(())
        })();
        assert_eq!(iterations, 0);
        assert_eq!(res, Err(err));
    }
}

#[test]
fn resume_from_cursor() {
    let (_store, table) = balances();

    let mut first = table.list(ListRequest::primary());
    assert!(first.advance().unwrap());
    assert!(first.advance().unwrap());
    let cursor = first.cursor();
    assert!(!cursor.is_empty());
    assert_eq!(first.primary_key().unwrap()[0], Value::from("alice"));
    first.close();

    let mut rest = table.list(ListRequest::primary().cursor(cursor.clone()));
    assert_eq!(
        drain_keys(&mut rest).unwrap(),
        pairs(&[("bob", "atom"), ("carol", "atom"), ("carol", "eth")])
    );

    let mut back = table.list(ListRequest::primary().cursor(cursor).reverse());
    assert_eq!(drain_keys(&mut back).unwrap(), pairs(&[("alice", "atom")]));
}

#[test]
fn paginate_index_scan() {
    let (_store, table) = balances();
    let mut cursor = Cursor::empty();
    let mut pages = Vec::new();

    loop {
        let mut it = table.list(ListRequest::index("by_amount").cursor(cursor.clone()));
        let mut page = Vec::new();
        let mut more = true;
        while page.len() < 2 {
            if !it.advance().unwrap() {
                more = false;
                break;
            }
            let mut b = Balance::default();
            it.get_message(&mut b).unwrap();
            page.push(b.amount);
        }
        cursor = it.cursor();
        it.close();
        if !page.is_empty() {
            pages.push(page);
        }
        if !more {
            break;
        }
    }
    assert_eq!(pages, vec![vec![1, 7], vec![10, 99], vec![250]]);
}

#[test]
fn cursor_from_another_keyspace_is_rejected() {
    let (_store, table) = balances();
    let mut it = table.list(ListRequest::index("by_denom"));
    assert!(it.advance().unwrap());
    let index_cursor = it.cursor();

    let mut it = table.list(ListRequest::primary().cursor(index_cursor));
    assert_eq!(it.advance(), Err(OrmError::InvalidCursor));
}

#[test]
fn scans_read_a_snapshot() {
    let (_store, table) = balances();
    let mut it = table.list(ListRequest::primary());
    assert!(it.advance().unwrap());

    table.insert(&Balance::new("dave", "atom", 3)).unwrap();
    table.delete::<Balance>(&[Value::from("bob"), Value::from("atom")]).unwrap();

    let mut remaining = 1;
    while it.advance().unwrap() {
        remaining += 1;
    }
    assert_eq!(remaining, BALANCES.len());

    let mut fresh = table.list(ListRequest::primary());
    let owners: Vec<_> = drain(&mut fresh).unwrap().into_iter().map(|b| b.owner).collect();
    assert_eq!(owners, ["alice", "alice", "carol", "carol", "dave"]);
}

#[test]
fn save_moves_index_entries() {
    let (_store, table) = balances();
    table.save(&Balance::new("bob", "atom", 500)).unwrap();

    let mut it = table.list(ListRequest::index("by_amount").prefix([Value::U64(7)]));
    assert_eq!(it.advance(), Ok(false));

    let mut it = table.list(ListRequest::index("by_amount").reverse());
    assert!(it.advance().unwrap());
    assert_eq!(it.index_key().unwrap().as_slice(), &[Value::U64(500)]);

    let mut b = Balance::default();
    table.get(&[Value::from("bob"), Value::from("atom")], &mut b).unwrap();
    assert_eq!(b.amount, 500);
}

#[test]
fn delete_removes_index_entries() {
    let (_store, table) = balances();
    let pk = [Value::from("carol"), Value::from("eth")];
    table.delete::<Balance>(&pk).unwrap();

    assert!(!table.has(&pk).unwrap());
    assert_eq!(table.delete::<Balance>(&pk), Err(OrmError::NotFound));

    let mut it = table.list(ListRequest::index("by_denom").prefix([Value::from("eth")]));
    assert_eq!(it.advance(), Ok(false));
}

#[test]
fn index_entry_without_record_ends_scan() {
    let (_store, table) = balances();
    // leaves the ("bob", "atom") entry of by_denom behind
    table.delete::<common::Misfiled>(&[Value::from("bob"), Value::from("atom")]).unwrap();

    let mut it = table.list(ListRequest::index("by_denom").prefix([Value::from("atom")]));
    assert!(it.advance().unwrap());
    assert_eq!(it.primary_key().unwrap()[0], Value::from("alice"));

    let err = it.advance().unwrap_err();
    assert!(matches!(err, OrmError::Storage(_)), "{err:?}");
    assert_eq!(it.advance(), Err(err.clone()));
    assert_eq!(it.primary_key(), Err(err.clone()));
    assert_eq!(it.index_key(), Err(err.clone()));
    assert_eq!(it.get_message(&mut Balance::default()), Err(err));
    assert!(it.cursor().is_empty());

    // keys only scans never read the record
    let mut it = table.list(
        ListRequest::index("by_denom").prefix([Value::from("atom")]).flags(ScanFlags::KEYS_ONLY),
    );
    assert_eq!(drain_keys(&mut it).unwrap().len(), 3);
}

#[test]
fn insert_rejects_duplicates() {
    let (_store, table) = balances();
    assert_eq!(table.insert(&Balance::new("alice", "atom", 1)), Err(OrmError::DuplicateKey));
}

#[test]
fn unique_index_rejects_conflicts() {
    let store = Store::new();
    let table = store
        .create_table(
            TableDef::new("accounts")
                .with_primary_key([FieldDef::new("owner", FieldKind::Str)])
                .with_index(
                    IndexDef::new("by_denom", [FieldDef::new("denom", FieldKind::Str)]).unique(),
                ),
        )
        .unwrap();

    table.insert(&Balance::new("alice", "atom", 1)).unwrap();
    assert_eq!(table.insert(&Balance::new("bob", "atom", 2)), Err(OrmError::DuplicateKey));
    // saving the holder of the entry again is not a conflict
    table.save(&Balance::new("alice", "atom", 3)).unwrap();
    table.save(&Balance::new("alice", "usdc", 3)).unwrap();
    table.insert(&Balance::new("bob", "atom", 2)).unwrap();
}

#[test]
fn get_checks_key_shape() {
    let (_store, table) = balances();
    let mut b = Balance::default();
    assert!(matches!(table.get(&[Value::from("alice")], &mut b), Err(OrmError::InvalidRange(_))));
    assert!(matches!(
        table.get(&[Value::from("alice"), Value::U32(1)], &mut b),
        Err(OrmError::TypeMismatch { .. })
    ));
    assert_eq!(
        table.get(&[Value::from("zed"), Value::from("atom")], &mut b),
        Err(OrmError::NotFound)
    );
}

#[test]
fn tables_do_not_overlap() {
    let (store, balances) = balances();
    let other = store
        .create_table(
            TableDef::new("other").with_primary_key([FieldDef::new("owner", FieldKind::Str)]),
        )
        .unwrap();
    other.insert(&Balance::new("zed", "atom", 1)).unwrap();

    let mut it = balances.list(ListRequest::primary());
    assert_eq!(drain(&mut it).unwrap().len(), BALANCES.len());
    let mut it = other.list(ListRequest::primary());
    assert_eq!(drain(&mut it).unwrap().len(), 1);
    assert_eq!(store.table("other").unwrap().def().name(), "other");
}
