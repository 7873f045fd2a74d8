//! `COM_STMT_EXECUTE` payload encoding.
//!
//! ## Layout
//!
//! ```text
//! 0x17 | statement_id u32 | flags u8 | iteration_count u32 (=1)
//!      | null_bitmap[(n + 7) / 8] | new_params_bound u8 (=1)
//!      | types[n] (type u8, flag u8) | values of non-NULL params
//! ```
//!
//! Values of fixed-size types are written as-is; every other type is
//! prefixed by its length-encoded size. Parameters sent beforehand with
//! `COM_STMT_SEND_LONG_DATA` keep their type entry but have no value.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{lenenc_int_len, put_lenenc_bytes};
use crate::types::WireType;

/// Command byte of `COM_STMT_EXECUTE`.
pub const COM_STMT_EXECUTE: u8 = 0x17;

/// Cursor flag requesting no server-side cursor.
pub const CURSOR_TYPE_NO_CURSOR: u8 = 0x00;

/// One encoded parameter of an execute request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteParam<'a> {
    /// Wire type announced in the type block.
    pub wire_type: WireType,
    /// Encoded value body, `None` for NULL and long data parameters.
    pub value: Option<&'a [u8]>,
    /// The value was sent with `COM_STMT_SEND_LONG_DATA`.
    pub long_data: bool,
}

impl<'a> ExecuteParam<'a> {
    /// A non-NULL parameter.
    #[must_use]
    pub const fn value(wire_type: WireType, value: &'a [u8]) -> Self {
        Self {
            wire_type,
            value: Some(value),
            long_data: false,
        }
    }

    /// A NULL parameter.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            wire_type: WireType::NULL,
            value: None,
            long_data: false,
        }
    }

    /// A parameter whose value was already sent as long data.
    #[must_use]
    pub const fn long_data(wire_type: WireType) -> Self {
        Self {
            wire_type,
            value: None,
            long_data: true,
        }
    }

    /// Whether the parameter is flagged in the NULL bitmap.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.value.is_none() && !self.long_data
    }

    fn encoded_len(&self) -> usize {
        match self.value {
            None => 0,
            Some(body) if self.wire_type.field_type.is_length_encoded() => {
                lenenc_int_len(body.len() as u64) + body.len()
            }
            Some(body) => body.len(),
        }
    }
}

/// Write one value body, adding the length prefix where the type needs one.
pub fn put_param_value(dst: &mut impl BufMut, wire_type: WireType, body: &[u8]) {
    if wire_type.field_type.is_length_encoded() {
        put_lenenc_bytes(dst, body);
    } else {
        dst.put_slice(body);
    }
}

/// A `COM_STMT_EXECUTE` request.
#[derive(Debug, Clone)]
pub struct StmtExecute<'a> {
    /// Statement id from the prepare response.
    pub statement_id: u32,
    /// Parameters in placeholder order.
    pub params: &'a [ExecuteParam<'a>],
}

impl<'a> StmtExecute<'a> {
    /// Create a new execute request.
    #[must_use]
    pub const fn new(statement_id: u32, params: &'a [ExecuteParam<'a>]) -> Self {
        Self {
            statement_id,
            params,
        }
    }

    /// Size of the encoded payload.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let header = 1 + 4 + 1 + 4;
        if self.params.is_empty() {
            return header;
        }
        header
            + self.params.len().div_ceil(8)
            + 1
            + self.params.len() * 2
            + self.params.iter().map(ExecuteParam::encoded_len).sum::<usize>()
    }

    /// Encode the request payload.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8(COM_STMT_EXECUTE);
        dst.put_u32_le(self.statement_id);
        dst.put_u8(CURSOR_TYPE_NO_CURSOR);
        dst.put_u32_le(1);

        if self.params.is_empty() {
            return;
        }

        let mut null_bitmap = vec![0u8; self.params.len().div_ceil(8)];
        for (i, param) in self.params.iter().enumerate() {
            if param.is_null() {
                null_bitmap[i / 8] |= 1 << (i % 8);
            }
        }
        dst.put_slice(&null_bitmap);

        // new-params-bound: types follow
        dst.put_u8(0x01);
        for param in self.params {
            dst.put_slice(&param.wire_type.to_bytes());
        }

        for param in self.params {
            if let Some(body) = param.value {
                put_param_value(dst, param.wire_type, body);
            }
        }
    }

    /// Encode the request into a new buffer.
    #[must_use]
    pub fn encode_to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }
}
