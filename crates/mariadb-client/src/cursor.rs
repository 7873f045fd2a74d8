//! Statement execution and result fetching.
//!
//! A [`Cursor`] runs every statement through the binary protocol:
//!
//! 1. the SQL is prepared (or taken from the statement cache),
//! 2. the parameters are bound into a [`BindBuffer`](crate::bind::BindBuffer),
//! 3. the buffer is encoded as `COM_STMT_EXECUTE`, or as one or more
//!    `COM_STMT_BULK_EXECUTE` payloads for `executemany`,
//! 4. result rows are read from the transport and decoded on fetch.
//!
//! A row that fails to decode ends the result set: the error is returned,
//! the remaining rows are discarded and the connection is out of sync.

use std::sync::Arc;

use mariadb_protocol::{BinaryRow, FieldDescriptor};
use mariadb_types::{DecodeOptions, Indicator, SqlValue, TypeError, decode_row};

use crate::bind::{ExecuteRequest, StatementBindings};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::row::{ColMetaData, Row};
use crate::transport::{ExecuteOutcome, Transport};

/// Default number of rows returned by [`Cursor::fetchmany`].
pub const DEFAULT_ARRAY_SIZE: usize = 1;

/// The open result set of a cursor.
#[derive(Debug)]
struct ResultSet {
    metadata: Arc<ColMetaData>,
    options: DecodeOptions,
    exhausted: bool,
}

/// A cursor over a [`Connection`].
pub struct Cursor<'c, T: Transport> {
    conn: &'c mut Connection<T>,
    bindings: StatementBindings,
    result: Option<ResultSet>,
    /// Uncached statement to close once its result set is consumed.
    owned_statement: Option<u32>,
    rowcount: i64,
    lastrowid: Option<u64>,
    arraysize: usize,
    closed: bool,
}

impl<'c, T: Transport> Cursor<'c, T> {
    pub(crate) fn new(conn: &'c mut Connection<T>) -> Self {
        Self {
            conn,
            bindings: StatementBindings::new(),
            result: None,
            owned_statement: None,
            rowcount: -1,
            lastrowid: None,
            arraysize: DEFAULT_ARRAY_SIZE,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::CursorClosed);
        }
        Ok(())
    }

    /// Execute `sql` once with one row of parameters.
    pub fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<()> {
        self.ensure_open()?;
        self.finish_result()?;

        let checkout = self.conn.checkout(sql)?;
        let meta = checkout.stmt.meta();
        let statement_id = meta.statement_id;
        if checkout.owned {
            self.owned_statement = Some(statement_id);
        }

        let buffer = self.bindings.rebind_single(meta.param_count, params)?;
        let request =
            buffer.execute_request(statement_id, 0, self.conn.config().max_allowed_packet)?;
        let outcome = send(self.conn.transport(), statement_id, request)?;

        self.record(outcome);
        if outcome.has_result_set {
            self.result = Some(ResultSet {
                metadata: Arc::new(ColMetaData::new(meta.fields.clone())),
                options: self.conn.config().decode_options(),
                exhausted: false,
            });
            self.rowcount = 0;
        } else {
            self.close_owned_statement()?;
        }
        Ok(())
    }

    /// Execute `sql` once per row of `rows`.
    ///
    /// With bulk execution enabled the rows are sent as
    /// `COM_STMT_BULK_EXECUTE` payloads split at `max_allowed_packet`;
    /// otherwise, and always for statements without placeholders, each row
    /// is its own `COM_STMT_EXECUTE`. Result sets are discarded.
    pub fn executemany(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<()> {
        self.ensure_open()?;
        self.finish_result()?;
        if rows.is_empty() {
            self.rowcount = 0;
            return Ok(());
        }

        let checkout = self.conn.checkout(sql)?;
        let statement_id = checkout.stmt.statement_id();
        if checkout.owned {
            self.owned_statement = Some(statement_id);
        }

        let param_count = checkout.stmt.meta().param_count;
        let max_packet = self.conn.config().max_allowed_packet;
        // a bulk row without parameters is empty, so the server would never see it
        let bulk = self.conn.config().bulk && param_count > 0;
        let buffer = self.bindings.rebind(param_count, rows)?;
        let requests = if bulk {
            buffer
                .bulk_payloads(statement_id, max_packet)?
                .into_iter()
                .map(ExecuteRequest::new)
                .collect::<Vec<_>>()
        } else {
            (0..buffer.row_count())
                .map(|row| buffer.execute_request(statement_id, row, max_packet))
                .collect::<Result<Vec<_>>>()?
        };
        tracing::debug!(
            id = statement_id,
            rows = buffer.row_count(),
            packets = requests.len(),
            bulk,
            "executing batch"
        );

        let mut total = ExecuteOutcome::default();
        for request in requests {
            let outcome = send(self.conn.transport(), statement_id, request)?;
            if outcome.has_result_set {
                drain(self.conn.transport())?;
            }
            total.affected_rows += outcome.affected_rows;
            if outcome.last_insert_id != 0 {
                total.last_insert_id = outcome.last_insert_id;
            }
        }

        self.record(total);
        self.close_owned_statement()
    }

    fn record(&mut self, outcome: ExecuteOutcome) {
        self.rowcount = i64::try_from(outcome.affected_rows).unwrap_or(i64::MAX);
        self.lastrowid = (outcome.last_insert_id != 0).then_some(outcome.last_insert_id);
    }

    /// Fetch the next row, or `None` at the end of the result set.
    pub fn fetchone(&mut self) -> Result<Option<Row>> {
        self.ensure_open()?;
        let Some(result) = self.result.as_mut() else {
            return Err(Error::programming("no result set to fetch from"));
        };
        if result.exhausted {
            return Ok(None);
        }

        let Some(packet) = self.conn.transport().fetch_row()? else {
            result.exhausted = true;
            self.close_owned_statement()?;
            return Ok(None);
        };

        match decode_packet(packet, &result.metadata, &result.options) {
            Ok(values) => {
                self.rowcount += 1;
                Ok(Some(Row::new(values, Arc::clone(&result.metadata))))
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to decode result row");
                self.result = None;
                Err(Error::Decode(err))
            }
        }
    }

    /// Fetch up to `size` rows, or [`arraysize`](Self::arraysize) rows when
    /// `size` is `None`.
    pub fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        let size = size.unwrap_or(self.arraysize);
        let mut rows = Vec::with_capacity(size);
        while rows.len() < size {
            match self.fetchone()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Fetch all remaining rows.
    pub fn fetchall(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetchone()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Columns of the current result set.
    #[must_use]
    pub fn description(&self) -> Option<&[FieldDescriptor]> {
        self.result.as_ref().map(|r| r.metadata.fields())
    }

    /// Rows affected by the last execution, or rows fetched so far for a
    /// result set. -1 before the first execution.
    #[must_use]
    pub fn rowcount(&self) -> i64 {
        self.rowcount
    }

    /// `AUTO_INCREMENT` value generated by the last execution.
    #[must_use]
    pub fn lastrowid(&self) -> Option<u64> {
        self.lastrowid
    }

    /// Default batch size of [`fetchmany`](Self::fetchmany).
    #[must_use]
    pub fn arraysize(&self) -> usize {
        self.arraysize
    }

    /// Set the default batch size of [`fetchmany`](Self::fetchmany).
    pub fn set_arraysize(&mut self, size: usize) {
        self.arraysize = size.max(1);
    }

    /// Whether the cursor was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the cursor, discarding any unread rows.
    ///
    /// Closing an already closed cursor does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.finish_result()?;
        self.bindings.clear();
        self.closed = true;
        Ok(())
    }

    /// Discard unread rows of the current result set.
    fn finish_result(&mut self) -> Result<()> {
        if let Some(result) = self.result.take() {
            if !result.exhausted {
                drain(self.conn.transport())?;
            }
        }
        self.close_owned_statement()
    }

    fn close_owned_statement(&mut self) -> Result<()> {
        if let Some(id) = self.owned_statement.take() {
            self.conn.transport().close_statement(id)?;
        }
        Ok(())
    }
}

impl<T: Transport> std::fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("result", &self.result)
            .field("rowcount", &self.rowcount)
            .field("lastrowid", &self.lastrowid)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn decode_packet(
    packet: bytes::Bytes,
    metadata: &ColMetaData,
    options: &DecodeOptions,
) -> std::result::Result<Vec<SqlValue>, TypeError> {
    let row = BinaryRow::parse(packet, metadata.len())?;
    let values = decode_row(&row, metadata.fields(), options)?;
    for (field, value) in metadata.fields().iter().zip(&values) {
        if matches!(value, SqlValue::Indicator(Indicator::Truncated)) {
            tracing::warn!(
                column = %field.name,
                limit = ?options.max_field_length,
                "value exceeds max_field_length and was truncated"
            );
        }
    }
    Ok(values)
}

/// Send the long data of `request`, then the execute itself.
fn send<T: Transport>(
    transport: &mut T,
    statement_id: u32,
    request: ExecuteRequest,
) -> Result<ExecuteOutcome> {
    for payload in request.long_data {
        tracing::trace!(id = statement_id, bytes = payload.len(), "sending long data");
        transport.send_long_data(payload)?;
    }
    tracing::trace!(id = statement_id, bytes = request.execute.len(), "sending execute");
    Ok(transport.execute(request.execute)?)
}

fn drain<T: Transport>(transport: &mut T) -> Result<()> {
    let mut discarded = 0usize;
    while transport.fetch_row()?.is_some() {
        discarded += 1;
    }
    if discarded > 0 {
        tracing::trace!(rows = discarded, "discarded unread rows");
    }
    Ok(())
}
