#![no_main]

use libfuzzer_sys::fuzz_target;
use mariadb_client::{SqlValue, bind};

fuzz_target!(|rows: Vec<(i64, Option<u32>)>| {
    if rows.is_empty() {
        return;
    }
    let rows: Vec<Vec<SqlValue>> = rows
        .into_iter()
        .map(|(a, b)| vec![SqlValue::Int(a), b.map_or(SqlValue::Null, |b| SqlValue::UInt(b.into()))])
        .collect();

    let buffer = bind(2, &rows).expect("integer columns always bind");
    let width = buffer.params()[0].int_width().expect("integer column");
    for r in 0..buffer.row_count() {
        let row = buffer.row(r).expect("bound row");
        assert_eq!(row[0].len(), width.bytes());
    }
    let _ = buffer.bulk_payloads(1, 1 << 16);
});
