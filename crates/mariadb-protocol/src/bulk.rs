//! `COM_STMT_BULK_EXECUTE` payload encoding.
//!
//! A bulk request sends the parameter types once, followed by any number of
//! rows. Every value is preceded by an indicator byte; only
//! [`IndicatorCode::None`] is followed by value bytes.
//!
//! Rows are packed into as few payloads as `max_allowed_packet` permits. A new
//! payload is started when the next row would not fit, or when a row asks for
//! a restart.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::execute::put_param_value;
use crate::types::{IndicatorCode, WireType};

/// Command byte of `COM_STMT_BULK_EXECUTE`.
pub const COM_STMT_BULK_EXECUTE: u8 = 0xFA;

/// Bulk flag: parameter types are sent with the request.
pub const SEND_TYPES_TO_SERVER: u16 = 0x0080;

/// One value slot of a bulk row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkValue<'a> {
    /// Encoded value body.
    Data(&'a [u8]),
    /// NULL.
    Null,
    /// Column default.
    Default,
    /// Column left untouched.
    Ignore,
}

impl BulkValue<'_> {
    /// Indicator byte written before the slot.
    #[must_use]
    pub const fn indicator(&self) -> IndicatorCode {
        match self {
            Self::Data(_) => IndicatorCode::None,
            Self::Null => IndicatorCode::Null,
            Self::Default => IndicatorCode::Default,
            Self::Ignore => IndicatorCode::Ignore,
        }
    }
}

/// One row of a bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRow<'a> {
    /// Values in placeholder order.
    pub values: Vec<BulkValue<'a>>,
    /// Start a new payload before this row.
    pub restart: bool,
}

impl<'a> BulkRow<'a> {
    /// A row that continues the current payload.
    #[must_use]
    pub fn new(values: Vec<BulkValue<'a>>) -> Self {
        Self {
            values,
            restart: false,
        }
    }
}

/// A `COM_STMT_BULK_EXECUTE` request.
#[derive(Debug, Clone)]
pub struct BulkExecute<'a> {
    /// Statement id from the prepare response.
    pub statement_id: u32,
    /// Parameter types, one per placeholder.
    pub types: &'a [WireType],
}

impl<'a> BulkExecute<'a> {
    /// Create a bulk request.
    #[must_use]
    pub const fn new(statement_id: u32, types: &'a [WireType]) -> Self {
        Self {
            statement_id,
            types,
        }
    }

    fn header_len(&self) -> usize {
        1 + 4 + 2 + self.types.len() * 2
    }

    fn put_header(&self, dst: &mut BytesMut) {
        dst.put_u8(COM_STMT_BULK_EXECUTE);
        dst.put_u32_le(self.statement_id);
        dst.put_u16_le(SEND_TYPES_TO_SERVER);
        for wire_type in self.types {
            dst.put_slice(&wire_type.to_bytes());
        }
    }

    fn encode_row(&self, row: &BulkRow<'_>, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        if row.values.len() != self.types.len() {
            return Err(ProtocolError::ParameterCount {
                expected: self.types.len(),
                actual: row.values.len(),
            });
        }
        for (value, wire_type) in row.values.iter().zip(self.types) {
            dst.put_u8(value.indicator() as u8);
            if let BulkValue::Data(body) = value {
                put_param_value(dst, *wire_type, body);
            }
        }
        Ok(())
    }

    /// Encode rows into one or more request payloads.
    ///
    /// Returns an empty list when `rows` is empty. Fails if a single row
    /// cannot fit into `max_packet` bytes together with the header.
    pub fn encode<I>(&self, rows: I, max_packet: usize) -> Result<Vec<Bytes>, ProtocolError>
    where
        I: IntoIterator<Item = BulkRow<'a>>,
    {
        let header_len = self.header_len();
        let mut packets = Vec::new();
        let mut current = BytesMut::new();
        let mut row_buf = BytesMut::new();

        for row in rows {
            row_buf.clear();
            self.encode_row(&row, &mut row_buf)?;

            if header_len + row_buf.len() > max_packet {
                return Err(ProtocolError::PacketTooLarge {
                    size: header_len + row_buf.len(),
                    max: max_packet,
                });
            }

            let has_rows = current.len() > header_len;
            if has_rows && (row.restart || current.len() + row_buf.len() > max_packet) {
                packets.push(current.split().freeze());
            }
            if current.is_empty() {
                current.reserve(header_len + row_buf.len());
                self.put_header(&mut current);
            }
            current.extend_from_slice(&row_buf);
        }

        if current.len() > header_len {
            packets.push(current.freeze());
        }
        Ok(packets)
    }
}
