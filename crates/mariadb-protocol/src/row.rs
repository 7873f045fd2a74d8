//! Binary result row framing.
//!
//! ```text
//! 0x00 | null_bitmap[(n + 9) / 8] | values of non-NULL columns
//! ```
//!
//! The NULL bitmap of a binary row is offset by two bits: column `i` is NULL
//! when bit `i + 2` is set.

use bytes::{Buf, Bytes};

use crate::error::ProtocolError;

/// Header byte of a binary result row.
pub const BINARY_ROW_HEADER: u8 = 0x00;

/// Bit offset of the first column in the NULL bitmap.
const NULL_BITMAP_OFFSET: usize = 2;

/// A framed binary result row.
///
/// The value area is kept undecoded; field decoding needs the column
/// metadata and lives with the value model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRow {
    columns: usize,
    null_bitmap: Bytes,
    values: Bytes,
}

impl BinaryRow {
    /// Length of the NULL bitmap for `columns` columns.
    #[must_use]
    pub const fn null_bitmap_len(columns: usize) -> usize {
        (columns + 7 + NULL_BITMAP_OFFSET) / 8
    }

    /// Split a row packet into NULL bitmap and value area.
    pub fn parse(mut payload: Bytes, columns: usize) -> Result<Self, ProtocolError> {
        if !payload.has_remaining() {
            return Err(ProtocolError::UnexpectedEof {
                needed: 1,
                available: 0,
            });
        }
        let header = payload.get_u8();
        if header != BINARY_ROW_HEADER {
            return Err(ProtocolError::UnexpectedHeader {
                expected: BINARY_ROW_HEADER,
                actual: header,
            });
        }

        let bitmap_len = Self::null_bitmap_len(columns);
        if payload.len() < bitmap_len {
            return Err(ProtocolError::UnexpectedEof {
                needed: bitmap_len,
                available: payload.len(),
            });
        }
        let null_bitmap = payload.split_to(bitmap_len);

        Ok(Self {
            columns,
            null_bitmap,
            values: payload,
        })
    }

    /// Number of columns in the row.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Whether column `index` is NULL.
    ///
    /// Out-of-range indexes report `false`.
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        if index >= self.columns {
            return false;
        }
        let bit = index + NULL_BITMAP_OFFSET;
        self.null_bitmap
            .get(bit / 8)
            .is_some_and(|byte| byte & (1 << (bit % 8)) != 0)
    }

    /// Value area holding the non-NULL columns back to back.
    #[must_use]
    pub fn values(&self) -> Bytes {
        self.values.clone()
    }

    /// Build a row packet from a NULL mask and pre-encoded value area.
    ///
    /// Used by servers, test doubles and benchmarks.
    #[must_use]
    pub fn encode(nulls: &[bool], values: &[u8]) -> Bytes {
        let mut out = Vec::with_capacity(1 + Self::null_bitmap_len(nulls.len()) + values.len());
        out.push(BINARY_ROW_HEADER);
        let start = out.len();
        out.resize(start + Self::null_bitmap_len(nulls.len()), 0);
        for (i, is_null) in nulls.iter().enumerate() {
            if *is_null {
                let bit = i + NULL_BITMAP_OFFSET;
                out[start + bit / 8] |= 1 << (bit % 8);
            }
        }
        out.extend_from_slice(values);
        Bytes::from(out)
    }
}
