//! Field type tags and column attributes as they appear on the wire.

use bitflags::bitflags;

use crate::error::ProtocolError;

/// Field type identifiers.
///
/// These are the type bytes sent in column definitions and in the parameter
/// type block of `COM_STMT_EXECUTE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldType {
    /// Pre-5.0 packed decimal.
    Decimal = 0x00,
    /// 1-byte integer.
    Tiny = 0x01,
    /// 2-byte integer.
    Short = 0x02,
    /// 4-byte integer.
    Long = 0x03,
    /// 4-byte IEEE float.
    Float = 0x04,
    /// 8-byte IEEE double.
    Double = 0x05,
    /// NULL column.
    Null = 0x06,
    /// Timestamp.
    Timestamp = 0x07,
    /// 8-byte integer.
    LongLong = 0x08,
    /// 3-byte integer (sent as 4 bytes in the binary protocol).
    Int24 = 0x09,
    /// Date.
    Date = 0x0A,
    /// Time of day or duration.
    Time = 0x0B,
    /// Date and time.
    DateTime = 0x0C,
    /// Year (sent as 2 bytes).
    Year = 0x0D,
    /// Internal date type.
    NewDate = 0x0E,
    /// Variable-length character string.
    VarChar = 0x0F,
    /// Bit field.
    Bit = 0x10,
    /// JSON document.
    Json = 0xF5,
    /// Exact decimal, sent as a digit string.
    NewDecimal = 0xF6,
    /// Enumeration.
    Enum = 0xF7,
    /// Set.
    Set = 0xF8,
    /// Tiny blob.
    TinyBlob = 0xF9,
    /// Medium blob.
    MediumBlob = 0xFA,
    /// Long blob.
    LongBlob = 0xFB,
    /// Blob.
    Blob = 0xFC,
    /// Variable-length string.
    VarString = 0xFD,
    /// Fixed-length string.
    String = 0xFE,
    /// Geometry.
    Geometry = 0xFF,
}

impl FieldType {
    /// Create a field type from a raw byte.
    pub fn from_u8(value: u8) -> Result<Self, ProtocolError> {
        Ok(match value {
            0x00 => Self::Decimal,
            0x01 => Self::Tiny,
            0x02 => Self::Short,
            0x03 => Self::Long,
            0x04 => Self::Float,
            0x05 => Self::Double,
            0x06 => Self::Null,
            0x07 => Self::Timestamp,
            0x08 => Self::LongLong,
            0x09 => Self::Int24,
            0x0A => Self::Date,
            0x0B => Self::Time,
            0x0C => Self::DateTime,
            0x0D => Self::Year,
            0x0E => Self::NewDate,
            0x0F => Self::VarChar,
            0x10 => Self::Bit,
            0xF5 => Self::Json,
            0xF6 => Self::NewDecimal,
            0xF7 => Self::Enum,
            0xF8 => Self::Set,
            0xF9 => Self::TinyBlob,
            0xFA => Self::MediumBlob,
            0xFB => Self::LongBlob,
            0xFC => Self::Blob,
            0xFD => Self::VarString,
            0xFE => Self::String,
            0xFF => Self::Geometry,
            other => return Err(ProtocolError::UnknownFieldType(other)),
        })
    }

    /// Size of the value in the binary protocol, for fixed-size types.
    #[must_use]
    pub const fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::Null => Some(0),
            Self::Tiny => Some(1),
            Self::Short | Self::Year => Some(2),
            Self::Long | Self::Int24 | Self::Float => Some(4),
            Self::LongLong | Self::Double => Some(8),
            _ => None,
        }
    }

    /// Whether values of this type carry a length prefix in the binary protocol.
    ///
    /// This includes the temporal types, whose length byte tells which
    /// components follow.
    #[must_use]
    pub const fn is_length_encoded(&self) -> bool {
        self.fixed_size().is_none()
    }

    /// Whether this is an integer type.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Tiny | Self::Short | Self::Long | Self::LongLong | Self::Int24 | Self::Year
        )
    }

    /// Whether this is a date/time type.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Timestamp | Self::Date | Self::Time | Self::DateTime | Self::NewDate
        )
    }

    /// Whether this is a blob-family type.
    #[must_use]
    pub const fn is_blob(&self) -> bool {
        matches!(
            self,
            Self::TinyBlob | Self::MediumBlob | Self::LongBlob | Self::Blob | Self::Geometry
        )
    }

    /// SQL name of the type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Decimal | Self::NewDecimal => "DECIMAL",
            Self::Tiny => "TINYINT",
            Self::Short => "SMALLINT",
            Self::Long => "INT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Null => "NULL",
            Self::Timestamp => "TIMESTAMP",
            Self::LongLong => "BIGINT",
            Self::Int24 => "MEDIUMINT",
            Self::Date | Self::NewDate => "DATE",
            Self::Time => "TIME",
            Self::DateTime => "DATETIME",
            Self::Year => "YEAR",
            Self::VarChar | Self::VarString => "VARCHAR",
            Self::Bit => "BIT",
            Self::Json => "JSON",
            Self::Enum => "ENUM",
            Self::Set => "SET",
            Self::TinyBlob => "TINYBLOB",
            Self::MediumBlob => "MEDIUMBLOB",
            Self::LongBlob => "LONGBLOB",
            Self::Blob => "BLOB",
            Self::String => "CHAR",
            Self::Geometry => "GEOMETRY",
        }
    }
}

bitflags! {
    /// Column definition flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColumnFlags: u16 {
        /// Column cannot be NULL.
        const NOT_NULL = 0x0001;
        /// Column is part of the primary key.
        const PRIMARY_KEY = 0x0002;
        /// Column is part of a unique key.
        const UNIQUE_KEY = 0x0004;
        /// Column is part of a non-unique key.
        const MULTIPLE_KEY = 0x0008;
        /// Column is a blob.
        const BLOB = 0x0010;
        /// Numeric column is unsigned.
        const UNSIGNED = 0x0020;
        /// Numeric column is zero filled.
        const ZEROFILL = 0x0040;
        /// Column uses binary collation.
        const BINARY = 0x0080;
        /// Column is an ENUM.
        const ENUM = 0x0100;
        /// Column is auto-increment.
        const AUTO_INCREMENT = 0x0200;
        /// Column is a TIMESTAMP.
        const TIMESTAMP = 0x0400;
        /// Column is a SET.
        const SET = 0x0800;
        /// Column has no default value.
        const NO_DEFAULT_VALUE = 0x1000;
        /// Column is updated to NOW() on UPDATE.
        const ON_UPDATE_NOW = 0x2000;
        /// Column is numeric.
        const NUM = 0x8000;
    }
}

/// Collation/charset identifier as sent in column definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharsetId(pub u16);

impl CharsetId {
    /// `latin1_swedish_ci`.
    pub const LATIN1: Self = Self(8);
    /// `utf8mb3_general_ci`.
    pub const UTF8: Self = Self(33);
    /// `utf8mb4_general_ci`.
    pub const UTF8MB4: Self = Self(45);
    /// `binary` pseudo-charset used by BLOB and BINARY columns.
    pub const BINARY: Self = Self(63);

    /// Whether this is the binary pseudo-charset.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        self.0 == Self::BINARY.0
    }
}

impl Default for CharsetId {
    fn default() -> Self {
        Self::UTF8MB4
    }
}

/// Unsigned flag in the second byte of a parameter type.
pub const PARAM_UNSIGNED_FLAG: u8 = 0x80;

/// Wire type of a bound parameter: field type tag plus signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireType {
    /// Field type tag.
    pub field_type: FieldType,
    /// Whether integer values are unsigned.
    pub unsigned: bool,
}

impl WireType {
    /// Create a signed (or non-integer) wire type.
    #[must_use]
    pub const fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            unsigned: false,
        }
    }

    /// Create an unsigned wire type.
    #[must_use]
    pub const fn unsigned(field_type: FieldType) -> Self {
        Self {
            field_type,
            unsigned: true,
        }
    }

    /// The NULL wire type.
    pub const NULL: Self = Self::new(FieldType::Null);

    /// Two-byte representation used in the parameter type block.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 2] {
        [
            self.field_type as u8,
            if self.unsigned { PARAM_UNSIGNED_FLAG } else { 0 },
        ]
    }

    /// Size of values of this type, for fixed-size types.
    #[must_use]
    pub const fn fixed_size(&self) -> Option<usize> {
        self.field_type.fixed_size()
    }
}

/// Per-value indicator byte of `COM_STMT_BULK_EXECUTE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IndicatorCode {
    /// A value follows.
    None = 0,
    /// The value is NULL.
    Null = 1,
    /// Use the column default.
    Default = 2,
    /// Leave the column untouched (default on INSERT).
    Ignore = 3,
}
