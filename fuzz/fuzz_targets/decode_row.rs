#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use mariadb_protocol::{BinaryRow, CharsetId, ColumnFlags, FieldDescriptor, FieldType};
use mariadb_types::{DecodeOptions, decode_row};

/// Arbitrary column metadata for fuzzing.
#[derive(Debug, Arbitrary)]
struct FuzzField {
    type_id: u8,
    flags: u16,
    charset: u16,
}

/// Fuzz input combining column metadata with a raw row packet.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    fields: Vec<FuzzField>,
    max_field_length: Option<u16>,
    packet: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let fields: Vec<FieldDescriptor> = input
        .fields
        .iter()
        .take(64)
        .filter_map(|f| {
            let field_type = FieldType::from_u8(f.type_id).ok()?;
            Some(
                FieldDescriptor::new("c", field_type)
                    .with_flags(ColumnFlags::from_bits_truncate(f.flags))
                    .with_charset(CharsetId(f.charset)),
            )
        })
        .collect();

    let options =
        DecodeOptions::default().with_max_field_length(input.max_field_length.map(usize::from));

    // Must never panic, whatever the bytes claim
    if let Ok(row) = BinaryRow::parse(Bytes::from(input.packet), fields.len()) {
        let _ = decode_row(&row, &fields, &options);
    }
});
