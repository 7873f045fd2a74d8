//! In-memory transport for cursor and connection tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use mariadb_client::{ExecuteOutcome, PreparedMeta, Transport, TransportError, TransportErrorKind};
use mariadb_protocol::FieldDescriptor;

/// Scripted response to one execute command.
#[derive(Debug, Clone, Default)]
pub struct MockResult {
    pub outcome: ExecuteOutcome,
    pub rows: Vec<Bytes>,
}

/// A transport that records every command and replays scripted results.
#[derive(Debug, Default)]
pub struct MockTransport {
    statements: HashMap<String, (usize, Vec<FieldDescriptor>)>,
    next_id: u32,
    results: VecDeque<MockResult>,
    pending_rows: VecDeque<Bytes>,
    pub prepared: Vec<String>,
    pub executed: Vec<Bytes>,
    pub long_data: Vec<Bytes>,
    pub queries: Vec<String>,
    pub closed: Vec<u32>,
    /// Fail every query containing this text.
    pub fail_query_containing: Option<String>,
}

/// Route log output of the code under test to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a statement the mock server can prepare.
    pub fn with_statement(
        mut self,
        sql: &str,
        param_count: usize,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        self.statements
            .insert(sql.to_string(), (param_count, fields));
        self
    }

    /// Queue the response of the next execute.
    pub fn push_result(&mut self, result: MockResult) {
        self.results.push_back(result);
    }

    /// Queue a result set for the next execute.
    pub fn push_rows(&mut self, rows: Vec<Bytes>) {
        self.push_result(MockResult {
            outcome: ExecuteOutcome {
                has_result_set: true,
                ..ExecuteOutcome::default()
            },
            rows,
        });
    }

    /// Rows not yet read by the client.
    pub fn unread_rows(&self) -> usize {
        self.pending_rows.len()
    }
}

impl Transport for MockTransport {
    fn prepare(&mut self, sql: &str) -> Result<PreparedMeta, TransportError> {
        let (param_count, fields) = self.statements.get(sql).cloned().ok_or_else(|| {
            TransportError::new(
                TransportErrorKind::Internal,
                1064,
                format!("You have an error in your SQL syntax near '{sql}'"),
            )
        })?;
        self.next_id += 1;
        self.prepared.push(sql.to_string());
        Ok(PreparedMeta {
            statement_id: self.next_id,
            param_count,
            fields,
        })
    }

    fn execute(&mut self, payload: Bytes) -> Result<ExecuteOutcome, TransportError> {
        self.executed.push(payload);
        let result = self.results.pop_front().unwrap_or(MockResult {
            outcome: ExecuteOutcome {
                affected_rows: 1,
                ..ExecuteOutcome::default()
            },
            rows: Vec::new(),
        });
        self.pending_rows = result.rows.into();
        Ok(result.outcome)
    }

    fn send_long_data(&mut self, payload: Bytes) -> Result<(), TransportError> {
        self.long_data.push(payload);
        Ok(())
    }

    fn fetch_row(&mut self) -> Result<Option<Bytes>, TransportError> {
        Ok(self.pending_rows.pop_front())
    }

    fn query(&mut self, sql: &str) -> Result<u64, TransportError> {
        if let Some(needle) = &self.fail_query_containing {
            if sql.contains(needle.as_str()) {
                return Err(TransportError::new(
                    TransportErrorKind::Operational,
                    2013,
                    "Lost connection to server during query",
                ));
            }
        }
        self.queries.push(sql.to_string());
        Ok(0)
    }

    fn close_statement(&mut self, statement_id: u32) -> Result<(), TransportError> {
        self.closed.push(statement_id);
        Ok(())
    }
}
