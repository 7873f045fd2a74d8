//! Cursor flows against an in-memory transport.
//!
//! Covers:
//! - execute and bulk execute payloads
//! - packet splitting at max_allowed_packet and long data
//! - result fetching and decode failures
//! - prepared statement caching
//! - cursor lifecycle

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use bytes::{BufMut, BytesMut};
use common::{MockResult, MockTransport};
use mariadb_client::{
    Config, Connection, Error, ErrorKind, ExecuteOutcome, Indicator, SqlValue,
};
use mariadb_protocol::codec::put_lenenc_bytes;
use mariadb_protocol::{BinaryRow, FieldDescriptor, FieldType};
use mariadb_types::TypeError;

const INSERT: &str = "INSERT INTO t VALUES (?, ?, ?)";
const INSERT_ONE: &str = "INSERT INTO t (id) VALUES (?)";
const SELECT: &str = "SELECT id, name FROM t";

fn select_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("id", FieldType::Long),
        FieldDescriptor::new("name", FieldType::VarString),
    ]
}

fn transport() -> MockTransport {
    MockTransport::new()
        .with_statement(INSERT, 3, Vec::new())
        .with_statement(INSERT_ONE, 1, Vec::new())
        .with_statement(SELECT, 0, select_fields())
}

fn select_row(id: i32, name: Option<&str>) -> bytes::Bytes {
    let mut values = BytesMut::new();
    values.put_i32_le(id);
    if let Some(name) = name {
        put_lenenc_bytes(&mut values, name.as_bytes());
    }
    BinaryRow::encode(&[false, name.is_none()], &values)
}

// ============================================================================
// Execute Payloads
// ============================================================================

mod execute {
    use super::*;

    #[test]
    fn single_row_layout() {
        let mut conn = Connection::new(transport(), Config::default());
        let mut cursor = conn.cursor();
        cursor
            .execute(
                INSERT,
                &[SqlValue::Int(42), SqlValue::from("hello"), SqlValue::Null],
            )
            .unwrap();
        assert_eq!(cursor.rowcount(), 1);
        drop(cursor);

        let expected: &[u8] = &[
            0x17, 1, 0, 0, 0, 0, 1, 0, 0, 0, // header
            0b0000_0100, // null bitmap
            0x01, // types follow
            0x01, 0x00, 0xFD, 0x00, 0x06, 0x00, // TINY, VAR_STRING, NULL
            42, 5, b'h', b'e', b'l', b'l', b'o',
        ];
        assert_eq!(&conn.transport_mut().executed[0][..], expected);
    }

    #[test]
    fn parameter_count_mismatch_sends_nothing() {
        let mut conn = Connection::new(transport(), Config::default());
        let mut cursor = conn.cursor();
        let err = cursor.execute(INSERT, &[SqlValue::Int(1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Programming);
        drop(cursor);
        assert!(conn.transport_mut().executed.is_empty());
    }

    #[test]
    fn bulk_only_indicator_rejected_on_single_execute() {
        let mut conn = Connection::new(transport(), Config::default());
        let mut cursor = conn.cursor();
        let err = cursor
            .execute(INSERT_ONE, &[SqlValue::Indicator(Indicator::Default)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Programming);
    }

    #[test]
    fn last_insert_id_is_reported() {
        let mut transport = transport();
        transport.push_result(MockResult {
            outcome: ExecuteOutcome {
                affected_rows: 1,
                last_insert_id: 77,
                has_result_set: false,
            },
            rows: Vec::new(),
        });
        let mut conn = Connection::new(transport, Config::default());
        let mut cursor = conn.cursor();
        assert_eq!(cursor.lastrowid(), None);
        cursor.execute(INSERT_ONE, &[SqlValue::Int(5)]).unwrap();
        assert_eq!(cursor.lastrowid(), Some(77));
    }

    #[test]
    fn oversized_binary_is_sent_as_long_data() {
        let config = Config::new().max_allowed_packet(64);
        let mut conn = Connection::new(transport(), config);
        let mut cursor = conn.cursor();
        let blob = vec![0x5A; 1000];
        cursor
            .execute(INSERT_ONE, &[SqlValue::from(blob.clone())])
            .unwrap();
        drop(cursor);

        let transport = conn.transport_mut();
        assert_eq!(transport.long_data.len(), 18);
        assert!(transport.long_data.iter().all(|p| p.len() <= 64));
        assert!(transport.long_data.iter().all(|p| p[..7] == [0x18, 1, 0, 0, 0, 0, 0]));
        let sent: Vec<u8> = transport
            .long_data
            .iter()
            .flat_map(|p| p[7..].to_vec())
            .collect();
        assert_eq!(sent, blob);

        // BLOB announced, not NULL, no value in the execute itself
        assert_eq!(transport.executed.len(), 1);
        assert_eq!(
            &transport.executed[0][..],
            &[0x17, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0x00, 0x01, 0xFC, 0x00]
        );
    }

    #[test]
    fn oversized_fixed_size_parameters_are_rejected() {
        let config = Config::new().max_allowed_packet(32);
        let mut conn = Connection::new(transport(), config);
        let mut cursor = conn.cursor();
        let row = vec![SqlValue::Int(i64::MAX); 3];
        let err = cursor.execute(INSERT, &row).unwrap_err();
        assert!(matches!(err, Error::PacketTooLarge { size: 42, max: 32 }));
        assert_eq!(err.kind(), ErrorKind::Operational);
        drop(cursor);
        assert!(conn.transport_mut().executed.is_empty());
        assert!(conn.transport_mut().long_data.is_empty());
    }

    #[test]
    fn unknown_statement_passes_transport_error_through() {
        let mut conn = Connection::new(transport(), Config::default());
        let mut cursor = conn.cursor();
        let err = cursor.execute("SELEC 1", &[]).unwrap_err();
        assert!(matches!(err, Error::Transport(ref e) if e.code == 1064));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}

// ============================================================================
// Bulk Execution
// ============================================================================

mod executemany {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Vec<SqlValue>> {
        values.iter().map(|v| vec![SqlValue::Int(*v)]).collect()
    }

    #[test]
    fn common_width_bulk_payload() {
        let mut conn = Connection::new(transport(), Config::default());
        let mut cursor = conn.cursor();
        cursor.executemany(INSERT_ONE, &ints(&[1, 300, 70000])).unwrap();
        drop(cursor);

        let executed = &conn.transport_mut().executed;
        assert_eq!(executed.len(), 1);
        let expected: &[u8] = &[
            0xFA, 1, 0, 0, 0, 0x80, 0x00, // header
            0x03, 0x00, // LONG
            0x00, 1, 0, 0, 0, //
            0x00, 0x2C, 0x01, 0, 0, //
            0x00, 0x70, 0x11, 0x01, 0, //
        ];
        assert_eq!(&executed[0][..], expected);
    }

    #[test]
    fn splits_at_max_allowed_packet() {
        let mut transport = transport();
        for affected in [2, 1] {
            transport.push_result(MockResult {
                outcome: ExecuteOutcome {
                    affected_rows: affected,
                    ..ExecuteOutcome::default()
                },
                rows: Vec::new(),
            });
        }
        // header is 9 bytes and each row 5, so two rows fit in 20
        let config = Config::new().max_allowed_packet(20);
        let mut conn = Connection::new(transport, config);
        let mut cursor = conn.cursor();
        cursor.executemany(INSERT_ONE, &ints(&[1, 300, 70000])).unwrap();
        assert_eq!(cursor.rowcount(), 3);
        drop(cursor);

        let executed = &conn.transport_mut().executed;
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[0].len(), 19);
        assert_eq!(executed[1].len(), 14);
        assert!(executed.iter().all(|p| p[0] == 0xFA));
    }

    #[test]
    fn oversized_row_is_operational_error() {
        let config = Config::new().max_allowed_packet(16);
        let mut conn = Connection::new(transport(), config);
        let mut cursor = conn.cursor();
        let rows = vec![vec![SqlValue::from("far too long for sixteen bytes")]];
        let err = cursor.executemany(INSERT_ONE, &rows).unwrap_err();
        assert!(matches!(err, Error::PacketTooLarge { max: 16, .. }));
        assert_eq!(err.kind(), ErrorKind::Operational);
        drop(cursor);
        assert!(conn.transport_mut().executed.is_empty());
    }

    #[test]
    fn without_bulk_each_row_is_an_execute() {
        let config = Config::new().bulk(false);
        let mut conn = Connection::new(transport(), config);
        let mut cursor = conn.cursor();
        cursor.executemany(INSERT_ONE, &ints(&[1, 300, 70000])).unwrap();
        assert_eq!(cursor.rowcount(), 3);
        drop(cursor);

        let executed = &conn.transport_mut().executed;
        assert_eq!(executed.len(), 3);
        for payload in executed {
            assert_eq!(payload[0], 0x17);
            // every row carries the batch's common LONG type
            assert_eq!(&payload[12..14], &[0x03, 0x00]);
        }
    }

    #[test]
    fn without_bulk_oversized_row_uses_long_data() {
        let config = Config::new().bulk(false).max_allowed_packet(32);
        let mut conn = Connection::new(transport(), config);
        let mut cursor = conn.cursor();
        let rows = vec![
            vec![SqlValue::from("x".repeat(100))],
            vec![SqlValue::from("a")],
        ];
        cursor.executemany(INSERT_ONE, &rows).unwrap();
        drop(cursor);

        let transport = conn.transport_mut();
        assert_eq!(transport.long_data.len(), 4);
        assert_eq!(transport.executed.len(), 2);
        assert_eq!(transport.executed[0].len(), 14);
        assert_eq!(&transport.executed[1][14..], &[1, b'a']);
    }

    #[test]
    fn statement_without_parameters_runs_once_per_row() {
        const DELETE: &str = "DELETE FROM t";
        for bulk in [true, false] {
            let transport = transport().with_statement(DELETE, 0, Vec::new());
            let mut conn = Connection::new(transport, Config::new().bulk(bulk));
            let mut cursor = conn.cursor();
            cursor
                .executemany(DELETE, &[vec![], vec![], vec![]])
                .unwrap();
            assert_eq!(cursor.rowcount(), 3);
            drop(cursor);

            let executed = &conn.transport_mut().executed;
            assert_eq!(executed.len(), 3);
            assert!(executed.iter().all(|p| p[..] == [0x17, 1, 0, 0, 0, 0, 1, 0, 0, 0]));
        }
    }

    #[test]
    fn mixed_column_is_programming_error() {
        let mut conn = Connection::new(transport(), Config::default());
        let mut cursor = conn.cursor();
        let rows = vec![vec![SqlValue::Int(1)], vec![SqlValue::from("two")]];
        let err = cursor.executemany(INSERT_ONE, &rows).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Programming);
        assert!(matches!(
            err,
            Error::Type(TypeError::IncompatibleColumn { column: 0, row: 1, .. })
        ));
    }

    #[test]
    fn empty_batch_sends_nothing() {
        let mut conn = Connection::new(transport(), Config::default());
        let mut cursor = conn.cursor();
        cursor.executemany(INSERT_ONE, &[]).unwrap();
        assert_eq!(cursor.rowcount(), 0);
        drop(cursor);
        assert!(conn.transport_mut().prepared.is_empty());
    }
}

// ============================================================================
// Fetching
// ============================================================================

mod fetch {
    use super::*;

    #[test]
    fn fetch_rows() {
        let mut transport = transport();
        transport.push_rows(vec![
            select_row(1, Some("one")),
            select_row(2, None),
            select_row(3, Some("three")),
        ]);
        let mut conn = Connection::new(transport, Config::default());
        let mut cursor = conn.cursor();
        cursor.execute(SELECT, &[]).unwrap();

        let names: Vec<_> = cursor
            .description()
            .unwrap()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, ["id", "name"]);

        let first = cursor.fetchone().unwrap().unwrap();
        assert_eq!(first.get::<i32>(0).unwrap(), 1);
        assert_eq!(first.get_by_name::<String>("name").unwrap(), "one");

        let rest = cursor.fetchmany(Some(5)).unwrap();
        assert_eq!(rest.len(), 2);
        assert!(rest[0].is_null(1));
        assert_eq!(rest[1].values()[1], SqlValue::Text("three".into()));

        assert!(cursor.fetchone().unwrap().is_none());
        assert_eq!(cursor.rowcount(), 3);
    }

    #[test]
    fn fetch_without_result_set() {
        let mut conn = Connection::new(transport(), Config::default());
        let mut cursor = conn.cursor();
        cursor.execute(INSERT_ONE, &[SqlValue::Int(1)]).unwrap();
        assert!(cursor.description().is_none());
        assert_eq!(cursor.fetchone().unwrap_err().kind(), ErrorKind::Programming);
    }

    #[test]
    fn reexecute_discards_unread_rows() {
        let mut transport = transport();
        transport.push_rows(vec![select_row(1, Some("a")), select_row(2, Some("b"))]);
        let mut conn = Connection::new(transport, Config::default());
        let mut cursor = conn.cursor();
        cursor.execute(SELECT, &[]).unwrap();
        cursor.fetchone().unwrap();

        cursor.execute(INSERT_ONE, &[SqlValue::Int(1)]).unwrap();
        drop(cursor);
        assert_eq!(conn.transport_mut().unread_rows(), 0);
    }

    #[test]
    fn decode_failure_is_interface_error() {
        let mut transport = transport();
        // name declares 20 bytes but only 1 follows
        let bad = BinaryRow::encode(&[false, false], &[1, 0, 0, 0, 20, b'a']);
        transport.push_rows(vec![bad, select_row(2, Some("b"))]);
        let mut conn = Connection::new(transport, Config::default());
        let mut cursor = conn.cursor();
        cursor.execute(SELECT, &[]).unwrap();

        let err = cursor.fetchone().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Interface);
        assert!(err.is_desync());
        assert!(matches!(
            err,
            Error::Decode(TypeError::BufferTooSmall { needed: 20, available: 1 })
        ));
        // the result set is gone
        assert_eq!(cursor.fetchone().unwrap_err().kind(), ErrorKind::Programming);
    }

    #[test]
    fn truncated_value_is_flagged() {
        common::init_tracing();
        let mut transport = transport();
        transport.push_rows(vec![select_row(1, Some("a long name"))]);
        let config = Config::new().max_field_length(Some(4));
        let mut conn = Connection::new(transport, config);
        let mut cursor = conn.cursor();
        cursor.execute(SELECT, &[]).unwrap();

        let row = cursor.fetchone().unwrap().unwrap();
        assert_eq!(row.values()[1], SqlValue::Indicator(Indicator::Truncated));
        assert!(matches!(
            row.get::<String>(1),
            Err(TypeError::Truncation(_))
        ));
    }

    #[test]
    fn fetchall_and_arraysize() {
        let mut transport = transport();
        transport.push_rows((1..=4).map(|i| select_row(i, Some("x"))).collect());
        let mut conn = Connection::new(transport, Config::default());
        let mut cursor = conn.cursor();
        cursor.execute(SELECT, &[]).unwrap();

        cursor.set_arraysize(3);
        assert_eq!(cursor.fetchmany(None).unwrap().len(), 3);
        assert_eq!(cursor.fetchall().unwrap().len(), 1);
        assert!(cursor.fetchall().unwrap().is_empty());
    }
}

// ============================================================================
// Statement Cache
// ============================================================================

mod statement_cache {
    use super::*;

    #[test]
    fn repeated_statement_is_prepared_once() {
        let mut conn = Connection::new(transport(), Config::default());
        let mut cursor = conn.cursor();
        cursor.execute(INSERT_ONE, &[SqlValue::Int(1)]).unwrap();
        cursor.execute(INSERT_ONE, &[SqlValue::Int(2)]).unwrap();
        drop(cursor);

        assert_eq!(conn.transport_mut().prepared.len(), 1);
        assert_eq!(conn.statement_cache().hits(), 1);
        assert!(conn.transport_mut().closed.is_empty());
    }

    #[test]
    fn eviction_closes_statement() {
        let config = Config::new().prep_stmt_cache_size(1);
        let mut conn = Connection::new(transport(), config);
        let mut cursor = conn.cursor();
        cursor.execute(INSERT_ONE, &[SqlValue::Int(1)]).unwrap();
        cursor.execute(SELECT, &[]).unwrap();
        drop(cursor);

        assert_eq!(conn.transport_mut().closed, [1]);
        let transport = conn.close().unwrap();
        assert_eq!(transport.closed, [1, 2]);
    }

    #[test]
    fn disabled_cache_closes_after_use() {
        let mut transport = transport();
        transport.push_result(MockResult::default());
        transport.push_rows(vec![select_row(1, Some("a"))]);
        let config = Config::new().prep_stmt_cache_size(0);
        let mut conn = Connection::new(transport, config);
        let mut cursor = conn.cursor();

        cursor.execute(INSERT_ONE, &[SqlValue::Int(1)]).unwrap();
        cursor.execute(SELECT, &[]).unwrap();
        assert_eq!(cursor.fetchall().unwrap().len(), 1);
        drop(cursor);

        assert_eq!(conn.transport_mut().closed, [1, 2]);
        assert!(conn.statement_cache().is_empty());
    }
}

// ============================================================================
// Cursor Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn closed_cursor_rejects_calls() {
        let mut transport = transport();
        transport.push_rows(vec![select_row(1, Some("a"))]);
        let mut conn = Connection::new(transport, Config::default());
        let mut cursor = conn.cursor();
        cursor.execute(SELECT, &[]).unwrap();
        cursor.close().unwrap();
        cursor.close().unwrap();
        assert!(cursor.is_closed());

        for err in [
            cursor.fetchone().unwrap_err(),
            cursor.execute(SELECT, &[]).unwrap_err(),
            cursor.executemany(INSERT_ONE, &[]).unwrap_err(),
        ] {
            assert!(matches!(err, Error::CursorClosed));
            assert_eq!(err.kind(), ErrorKind::Programming);
        }
        drop(cursor);
        assert_eq!(conn.transport_mut().unread_rows(), 0);
    }
}
