//! Parameter buffer construction.
//!
//! A [`BindBuffer`] holds the encoded parameters of one execution: the
//! inferred type of every placeholder and, per row, either an encoded value
//! or an indicator. It is built in one pass and never modified; rebinding a
//! statement builds a new buffer and swaps it in only once it is complete,
//! so a failed bind leaves the previous one usable.
//!
//! Single-row executions go out as `COM_STMT_EXECUTE`, which only knows
//! NULL; multi-row executions go out as `COM_STMT_BULK_EXECUTE`, which also
//! carries `DEFAULT` and `IGNORE` indicators.

use bytes::Bytes;
use mariadb_protocol::{
    BulkExecute, BulkRow, BulkValue, ExecuteParam, IndicatorCode, ProtocolError, SendLongData,
    StmtExecute, WireType,
};
use mariadb_types::{
    ColumnType, Indicator, IntWidth, ParamData, SqlTime, SqlValue, TypeError, ValueKind,
    classify, encode_value, infer_column,
};

use crate::error::{Error, Result};

/// Inferred type of one placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    index: usize,
    column: ColumnType,
}

impl ParameterInfo {
    /// Zero-based placeholder index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Wire type sent in the parameter type block.
    #[must_use]
    pub fn wire_type(&self) -> WireType {
        self.column.wire_type
    }

    /// Integer width, for integer columns.
    #[must_use]
    pub fn int_width(&self) -> Option<IntWidth> {
        self.column.int_width
    }

    /// Host type of the column.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.column.kind
    }

    /// Whether any row holds a negative value.
    #[must_use]
    pub fn negative(&self) -> bool {
        self.column.negative
    }

    /// Whether any row carries an indicator in this column.
    #[must_use]
    pub fn has_indicator(&self) -> bool {
        self.column.has_indicator
    }
}

/// One bound slot: an encoded value or an indicator, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterValue {
    indicator: Indicator,
    data: Option<ParamData>,
    time: Option<SqlTime>,
}

impl ParameterValue {
    fn encode(value: &SqlValue, column: &ColumnType) -> std::result::Result<Self, TypeError> {
        let indicator = classify(value);
        let data = encode_value(value, column)?;
        debug_assert_eq!(indicator.is_special(), data.is_none());
        Ok(Self {
            indicator,
            data,
            time: value.as_sql_time().copied(),
        })
    }

    /// Indicator of the slot, [`Indicator::None`] when a value is present.
    #[must_use]
    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    /// Encoded value body.
    #[must_use]
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_ref().map(ParamData::as_slice)
    }

    /// Encoded length, 0 for indicator slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, ParamData::len)
    }

    /// Whether the slot carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decomposed temporal value, for date and time parameters.
    #[must_use]
    pub fn time(&self) -> Option<&SqlTime> {
        self.time.as_ref()
    }

    fn bulk_value(&self) -> BulkValue<'_> {
        match (self.indicator.wire_code(), self.data()) {
            (Some(IndicatorCode::None), Some(body)) => BulkValue::Data(body),
            (Some(IndicatorCode::Default), _) => BulkValue::Default,
            (Some(IndicatorCode::Ignore), _) => BulkValue::Ignore,
            _ => BulkValue::Null,
        }
    }
}

/// Encoded parameters of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindBuffer {
    params: Vec<ParameterInfo>,
    rows: Vec<Vec<ParameterValue>>,
}

impl BindBuffer {
    /// Number of placeholders.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Number of bound rows, including skipped ones.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Per-placeholder type information.
    #[must_use]
    pub fn params(&self) -> &[ParameterInfo] {
        &self.params
    }

    /// The slots of one row.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[ParameterValue]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// Whether a slot is NULL.
    #[must_use]
    pub fn is_null(&self, row: usize, column: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .is_some_and(|v| v.indicator == Indicator::Null)
    }

    /// Wire types in placeholder order.
    #[must_use]
    pub fn wire_types(&self) -> Vec<WireType> {
        self.params.iter().map(ParameterInfo::wire_type).collect()
    }

    /// Whether a row is skipped by the bulk writer.
    fn is_skipped(row: &[ParameterValue]) -> bool {
        row.iter().any(|v| v.indicator == Indicator::IgnoreRow)
    }

    /// Number of rows that are sent to the server.
    #[must_use]
    pub fn sent_row_count(&self) -> usize {
        self.rows.iter().filter(|r| !Self::is_skipped(r)).count()
    }

    /// Encode row `row` as a `COM_STMT_EXECUTE` payload.
    ///
    /// Fails with a programming error if the row carries an indicator other
    /// than NULL.
    pub fn execute_payload(&self, statement_id: u32, row: usize) -> Result<Bytes> {
        let params = self.execute_params(row)?;
        Ok(StmtExecute::new(statement_id, &params).encode_to_bytes())
    }

    /// Encode row `row` as a `COM_STMT_EXECUTE` of at most `max_packet`
    /// bytes.
    ///
    /// If the payload would be larger, every character and binary value of
    /// the row is moved into `COM_STMT_SEND_LONG_DATA` payloads, themselves
    /// split at `max_packet`. Fails with [`Error::PacketTooLarge`] if the
    /// remaining execute payload still does not fit.
    pub fn execute_request(
        &self,
        statement_id: u32,
        row: usize,
        max_packet: usize,
    ) -> Result<ExecuteRequest> {
        let mut params = self.execute_params(row)?;
        let size = StmtExecute::new(statement_id, &params).encoded_len();
        if size <= max_packet {
            return Ok(ExecuteRequest::new(
                StmtExecute::new(statement_id, &params).encode_to_bytes(),
            ));
        }

        let mut long_data = Vec::new();
        for (param, info) in params.iter_mut().zip(&self.params) {
            let Some(body) = param.value else { continue };
            if !matches!(info.kind(), ValueKind::Text | ValueKind::Binary) {
                continue;
            }
            let index = u16::try_from(info.index).map_err(|_| {
                Error::programming(format!("parameter index {} out of range", info.index))
            })?;
            long_data.extend(
                SendLongData::split(statement_id, index, body, max_packet)
                    .map_err(packet_error)?,
            );
            *param = ExecuteParam::long_data(info.wire_type());
        }

        let request = StmtExecute::new(statement_id, &params);
        if request.encoded_len() > max_packet {
            return Err(Error::PacketTooLarge {
                size: request.encoded_len(),
                max: max_packet,
            });
        }
        tracing::debug!(
            id = statement_id,
            size,
            long_data_packets = long_data.len(),
            "sending oversized parameters as long data"
        );
        Ok(ExecuteRequest {
            long_data,
            execute: request.encode_to_bytes(),
        })
    }

    fn execute_params(&self, row: usize) -> Result<Vec<ExecuteParam<'_>>> {
        let slots = self
            .row(row)
            .ok_or_else(|| Error::programming(format!("no bound row {row}")))?;
        slots
            .iter()
            .zip(&self.params)
            .map(|(slot, info)| match (slot.indicator, slot.data()) {
                (Indicator::None, Some(body)) => Ok(ExecuteParam::value(info.wire_type(), body)),
                (Indicator::Null, _) => Ok(ExecuteParam::null()),
                (other, _) => Err(Error::programming(format!(
                    "indicator {} of parameter {} requires a bulk execution",
                    other.name(),
                    info.index
                ))),
            })
            .collect()
    }

    /// Encode all rows as `COM_STMT_BULK_EXECUTE` payloads of at most
    /// `max_packet` bytes each.
    ///
    /// Rows marked `IgnoreRow` are left out; a `Restart` slot starts a new
    /// payload.
    pub fn bulk_payloads(&self, statement_id: u32, max_packet: usize) -> Result<Vec<Bytes>> {
        let types = self.wire_types();
        let rows = self
            .rows
            .iter()
            .filter(|row| !Self::is_skipped(row))
            .map(|row| BulkRow {
                values: row.iter().map(ParameterValue::bulk_value).collect(),
                restart: row.iter().any(|v| v.indicator == Indicator::Restart),
            });
        BulkExecute::new(statement_id, &types)
            .encode(rows, max_packet)
            .map_err(packet_error)
    }
}

fn packet_error(err: ProtocolError) -> Error {
    match err {
        ProtocolError::PacketTooLarge { size, max } => Error::PacketTooLarge { size, max },
        other => Error::Protocol(other),
    }
}

/// Payloads of one `COM_STMT_EXECUTE`, in sending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    /// `COM_STMT_SEND_LONG_DATA` payloads sent ahead of the execute.
    pub long_data: Vec<Bytes>,
    /// The `COM_STMT_EXECUTE` or `COM_STMT_BULK_EXECUTE` payload.
    pub execute: Bytes,
}

impl ExecuteRequest {
    /// A request without long data.
    #[must_use]
    pub fn new(execute: Bytes) -> Self {
        Self {
            long_data: Vec::new(),
            execute,
        }
    }
}

fn check_row_len(param_count: usize, row: usize, len: usize) -> Result<()> {
    if len != param_count {
        return Err(Error::programming(format!(
            "row {row} has {len} values, statement expects {param_count}"
        )));
    }
    Ok(())
}

/// Bind one or more rows of parameters.
///
/// Every column's type is inferred across all rows; integer columns use the
/// narrowest width that holds every row.
pub fn bind(param_count: usize, rows: &[Vec<SqlValue>]) -> Result<BindBuffer> {
    for (i, row) in rows.iter().enumerate() {
        check_row_len(param_count, i, row.len())?;
    }

    let params = (0..param_count)
        .map(|index| {
            let column = infer_column(index, rows.iter().map(|row| &row[index]))?;
            Ok(ParameterInfo { index, column })
        })
        .collect::<Result<Vec<_>>>()?;

    let rows = rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .zip(&params)
                .map(|(value, info)| {
                    ParameterValue::encode(value, &info.column).map_err(|e| e.at(info.index, r))
                })
                .collect::<std::result::Result<Vec<_>, TypeError>>()
        })
        .collect::<std::result::Result<Vec<_>, TypeError>>()?;

    tracing::debug!(
        params = param_count,
        rows = rows.len(),
        "bound statement parameters"
    );
    Ok(BindBuffer { params, rows })
}

/// Bind a single row for `COM_STMT_EXECUTE`.
///
/// Indicators other than NULL are rejected, since a single execution has no
/// way to send them.
pub fn bind_single(param_count: usize, row: &[SqlValue]) -> Result<BindBuffer> {
    if let Some((index, tag)) = row
        .iter()
        .map(classify)
        .enumerate()
        .find(|(_, tag)| !matches!(tag, Indicator::None | Indicator::Null | Indicator::Truncated))
    {
        return Err(Error::programming(format!(
            "indicator {} of parameter {index} is only valid in a bulk execution",
            tag.name()
        )));
    }
    bind(param_count, std::slice::from_ref(&row.to_vec()))
}

/// The current parameter buffer of a prepared statement.
#[derive(Debug, Default)]
pub struct StatementBindings {
    buffer: Option<BindBuffer>,
}

impl StatementBindings {
    /// Create an empty binding slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer with one built from `rows`.
    ///
    /// The previous buffer is kept if building fails.
    pub fn rebind(&mut self, param_count: usize, rows: &[Vec<SqlValue>]) -> Result<&BindBuffer> {
        let buffer = bind(param_count, rows)?;
        Ok(self.buffer.insert(buffer))
    }

    /// Replace the buffer with a single-row one.
    ///
    /// The previous buffer is kept if building fails.
    pub fn rebind_single(&mut self, param_count: usize, row: &[SqlValue]) -> Result<&BindBuffer> {
        let buffer = bind_single(param_count, row)?;
        Ok(self.buffer.insert(buffer))
    }

    /// The current buffer, if any.
    #[must_use]
    pub fn current(&self) -> Option<&BindBuffer> {
        self.buffer.as_ref()
    }

    /// Drop the current buffer.
    pub fn clear(&mut self) {
        self.buffer = None;
    }
}
