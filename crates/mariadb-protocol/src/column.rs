//! Column definitions and the `COM_STMT_PREPARE` response.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::{get_lenenc_bytes, get_lenenc_int, get_uint, put_lenenc_bytes, put_lenenc_int, put_uint};
use crate::error::ProtocolError;
use crate::types::{CharsetId, ColumnFlags, FieldType};

/// Length of the fixed-size block at the end of a column definition.
const FIXED_FIELDS_LEN: u64 = 0x0C;

/// Server-supplied metadata describing one result column.
///
/// Immutable for the lifetime of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Column alias as seen by the client.
    pub name: String,
    /// Table alias, empty for computed columns.
    pub table: String,
    /// Wire type tag.
    pub field_type: FieldType,
    /// Character set of the column.
    pub charset: CharsetId,
    /// Declared maximum length in bytes.
    pub length: u32,
    /// Number of decimals (or fractional second digits).
    pub decimals: u8,
    /// Column flags.
    pub flags: ColumnFlags,
}

impl FieldDescriptor {
    /// Create a descriptor with default attributes.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            table: String::new(),
            field_type,
            charset: CharsetId::default(),
            length: 0,
            decimals: 0,
            flags: ColumnFlags::empty(),
        }
    }

    /// Set the column flags.
    #[must_use]
    pub fn with_flags(mut self, flags: ColumnFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the charset.
    #[must_use]
    pub fn with_charset(mut self, charset: CharsetId) -> Self {
        self.charset = charset;
        self
    }

    /// Set the declared length.
    #[must_use]
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Set the decimal count.
    #[must_use]
    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    /// Whether integer values of this column are unsigned.
    #[must_use]
    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED)
    }

    /// Whether values must be returned as raw bytes.
    ///
    /// `CHAR BINARY` and `VARCHAR BINARY` carry the `BINARY` flag but use a
    /// text charset, so the charset decides.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.charset.is_binary()
    }

    /// Whether the column may hold NULL.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        !self.flags.contains(ColumnFlags::NOT_NULL)
    }

    /// Parse a column definition packet (protocol 4.1 layout).
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        let _catalog = read_lenenc_string(src)?;
        let _schema = read_lenenc_string(src)?;
        let table = read_lenenc_string(src)?;
        let _org_table = read_lenenc_string(src)?;
        let name = read_lenenc_string(src)?;
        let _org_name = read_lenenc_string(src)?;

        let fixed_len = get_lenenc_int(src)?.ok_or(ProtocolError::UnexpectedNull)?;
        if fixed_len < FIXED_FIELDS_LEN {
            return Err(ProtocolError::MalformedColumn("fixed field block too short"));
        }

        let charset = CharsetId(get_uint(src, 2)? as u16);
        let length = get_uint(src, 4)? as u32;
        let field_type = FieldType::from_u8(get_uint(src, 1)? as u8)?;
        let flags = ColumnFlags::from_bits_retain(get_uint(src, 2)? as u16);
        let decimals = get_uint(src, 1)? as u8;
        // filler
        get_uint(src, 2)?;

        Ok(Self {
            name,
            table,
            field_type,
            charset,
            length,
            decimals,
            flags,
        })
    }

    /// Encode this descriptor as a column definition packet.
    pub fn encode(&self, dst: &mut impl BufMut) {
        put_lenenc_bytes(dst, b"def");
        put_lenenc_bytes(dst, b"");
        put_lenenc_bytes(dst, self.table.as_bytes());
        put_lenenc_bytes(dst, self.table.as_bytes());
        put_lenenc_bytes(dst, self.name.as_bytes());
        put_lenenc_bytes(dst, self.name.as_bytes());
        put_lenenc_int(dst, FIXED_FIELDS_LEN);
        put_uint(dst, u64::from(self.charset.0), 2);
        put_uint(dst, u64::from(self.length), 4);
        dst.put_u8(self.field_type as u8);
        put_uint(dst, u64::from(self.flags.bits()), 2);
        dst.put_u8(self.decimals);
        dst.put_u16_le(0);
    }

    /// Encode this descriptor to a new buffer.
    #[must_use]
    pub fn encode_to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(32 + self.name.len() * 2 + self.table.len() * 2);
        self.encode(&mut buf);
        buf.freeze()
    }
}

fn read_lenenc_string(src: &mut impl Buf) -> Result<String, ProtocolError> {
    let bytes = get_lenenc_bytes(src)?.ok_or(ProtocolError::UnexpectedNull)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| ProtocolError::MalformedColumn("identifier is not valid UTF-8"))
}

/// Header byte of a successful `COM_STMT_PREPARE` response.
pub const PREPARE_OK_HEADER: u8 = 0x00;

/// First packet of a successful `COM_STMT_PREPARE` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOk {
    /// Server-assigned statement id.
    pub statement_id: u32,
    /// Number of result columns.
    pub num_columns: u16,
    /// Number of `?` placeholders.
    pub num_params: u16,
    /// Warning count.
    pub warnings: u16,
}

impl PrepareOk {
    /// Parse a prepare-OK packet.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        let header = get_uint(src, 1)? as u8;
        if header != PREPARE_OK_HEADER {
            return Err(ProtocolError::UnexpectedHeader {
                expected: PREPARE_OK_HEADER,
                actual: header,
            });
        }
        let statement_id = get_uint(src, 4)? as u32;
        let num_columns = get_uint(src, 2)? as u16;
        let num_params = get_uint(src, 2)? as u16;
        // reserved
        get_uint(src, 1)?;
        let warnings = if src.remaining() >= 2 {
            get_uint(src, 2)? as u16
        } else {
            0
        };
        Ok(Self {
            statement_id,
            num_columns,
            num_params,
            warnings,
        })
    }

    /// Encode a prepare-OK packet.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8(PREPARE_OK_HEADER);
        dst.put_u32_le(self.statement_id);
        dst.put_u16_le(self.num_columns);
        dst.put_u16_le(self.num_params);
        dst.put_u8(0);
        dst.put_u16_le(self.warnings);
    }
}
