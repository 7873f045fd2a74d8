//! Benchmarks for parameter inference, value encoding and row decoding.

#![allow(clippy::unwrap_used, missing_docs)]

use bytes::BytesMut;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use mariadb_protocol::codec::put_lenenc_bytes;
use mariadb_protocol::{BinaryRow, ColumnFlags, FieldDescriptor, FieldType};
use mariadb_types::{DecodeOptions, SqlTime, SqlValue, decode_row, encode_value, infer_column};
use std::hint::black_box;

/// Benchmark inference of a wide bulk integer column.
fn bench_infer_column(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_column");
    let ints: Vec<SqlValue> = (0..10_000).map(|i| SqlValue::Int(i * 7)).collect();
    group.throughput(Throughput::Elements(ints.len() as u64));
    group.bench_function("int_10k", |b| {
        b.iter(|| black_box(infer_column(0, black_box(&ints)).unwrap()))
    });

    let mixed: Vec<SqlValue> = (0..10_000)
        .map(|i| {
            if i % 3 == 0 {
                SqlValue::Null
            } else {
                SqlValue::Double(f64::from(i) * 0.5)
            }
        })
        .collect();
    group.bench_function("double_with_nulls_10k", |b| {
        b.iter(|| black_box(infer_column(0, black_box(&mixed)).unwrap()))
    });
    group.finish();
}

/// Benchmark encoding values at their inferred type.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_value");

    let int = [SqlValue::Int(70_000)];
    let int_ty = infer_column(0, &int).unwrap();
    group.bench_function("int", |b| {
        b.iter(|| black_box(encode_value(black_box(&int[0]), &int_ty).unwrap()))
    });

    let text = [SqlValue::Text("This is a typical database column value".into())];
    let text_ty = infer_column(0, &text).unwrap();
    group.bench_function("text", |b| {
        b.iter(|| black_box(encode_value(black_box(&text[0]), &text_ty).unwrap()))
    });

    let datetime = [SqlValue::DateTime(SqlTime::datetime(2024, 6, 1, 12, 30, 45, 123_456))];
    let datetime_ty = infer_column(0, &datetime).unwrap();
    group.bench_function("datetime", |b| {
        b.iter(|| black_box(encode_value(black_box(&datetime[0]), &datetime_ty).unwrap()))
    });
    group.finish();
}

/// Benchmark decoding a typical binary row.
fn bench_decode_row(c: &mut Criterion) {
    let fields = [
        FieldDescriptor::new("id", FieldType::LongLong).with_flags(ColumnFlags::UNSIGNED),
        FieldDescriptor::new("name", FieldType::VarString),
        FieldDescriptor::new("score", FieldType::Double),
        FieldDescriptor::new("created", FieldType::DateTime),
        FieldDescriptor::new("note", FieldType::Blob),
    ];
    let mut values = BytesMut::new();
    values.extend_from_slice(&42u64.to_le_bytes());
    put_lenenc_bytes(&mut values, b"a reasonably sized name");
    values.extend_from_slice(&3.25f64.to_le_bytes());
    values.extend_from_slice(&[7, 0xE8, 0x07, 6, 1, 12, 30, 45]);
    let packet = BinaryRow::encode(&[false, false, false, false, true], &values);
    let options = DecodeOptions::default();

    let mut group = c.benchmark_group("decode_row");
    group.throughput(Throughput::Bytes(packet.len() as u64));
    group.bench_function("five_columns", |b| {
        b.iter(|| {
            let row = BinaryRow::parse(packet.clone(), fields.len()).unwrap();
            black_box(decode_row(&row, &fields, &options).unwrap())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_infer_column, bench_encode, bench_decode_row);
criterion_main!(benches);
