//! Byte-order codec for the binary protocol.
//!
//! All multi-byte integers and floats travel little-endian on the wire,
//! whatever the host byte order. [`ByteOrder`] is the single interface for
//! turning values into byte sequences and back; [`ByteOrder::WIRE`] is the
//! order every protocol writer uses and [`ByteOrder::NATIVE`] is the host
//! order chosen at compile time.
//!
//! Integers of any width from 1 to 8 bytes are supported, which covers the
//! odd 3, 5 and 6 byte widths used by length-encoded integers and packed
//! temporal fields. Floats are moved as raw bit patterns.

use bytes::{Buf, BufMut, Bytes};
use smallvec::SmallVec;

use crate::error::ProtocolError;

/// Inline byte buffer large enough for any scalar encoding.
pub type ScalarBytes = SmallVec<[u8; 8]>;

/// Marker byte for a NULL length-encoded value.
pub const LENENC_NULL: u8 = 0xFB;

/// Prefix for a length-encoded integer stored in 2 bytes.
pub const LENENC_2: u8 = 0xFC;

/// Prefix for a length-encoded integer stored in 3 bytes.
pub const LENENC_3: u8 = 0xFD;

/// Prefix for a length-encoded integer stored in 8 bytes.
pub const LENENC_8: u8 = 0xFE;

/// Byte order used when converting values to and from byte sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl ByteOrder {
    /// Byte order of the MariaDB wire protocol.
    pub const WIRE: Self = Self::Little;

    /// Byte order of the host.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;

    /// Byte order of the host.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;

    /// Whether values in this order must be byte-swapped relative to host memory.
    #[must_use]
    pub const fn needs_swap(self) -> bool {
        !matches!(
            (self, Self::NATIVE),
            (Self::Little, Self::Little) | (Self::Big, Self::Big)
        )
    }

    /// Encode the low `width` bytes of an unsigned value.
    ///
    /// `width` must be in `1..=8`.
    #[must_use]
    pub fn encode_uint(self, value: u64, width: usize) -> ScalarBytes {
        debug_assert!((1..=8).contains(&width), "integer width {width} out of range");
        let width = width.clamp(1, 8);
        let le = value.to_le_bytes();
        let mut out = ScalarBytes::from_slice(&le[..width]);
        if self == Self::Big {
            out.reverse();
        }
        out
    }

    /// Decode an unsigned value from up to 8 bytes.
    ///
    /// The width is the length of `src`; bytes beyond the eighth are ignored.
    #[must_use]
    pub fn decode_uint(self, src: &[u8]) -> u64 {
        let width = src.len().min(8);
        let mut le = [0u8; 8];
        match self {
            Self::Little => le[..width].copy_from_slice(&src[..width]),
            Self::Big => {
                for (dst, byte) in le.iter_mut().zip(src[..width].iter().rev()) {
                    *dst = *byte;
                }
            }
        }
        u64::from_le_bytes(le)
    }

    /// Encode a signed value as `width` bytes of two's complement.
    #[must_use]
    pub fn encode_int(self, value: i64, width: usize) -> ScalarBytes {
        self.encode_uint(value as u64, width)
    }

    /// Decode a signed value, sign-extending from the top byte of `src`.
    #[must_use]
    pub fn decode_int(self, src: &[u8]) -> i64 {
        let width = src.len().clamp(1, 8);
        let shift = 64 - (width as u32) * 8;
        ((self.decode_uint(src) << shift) as i64) >> shift
    }

    /// Encode a 4-byte IEEE float by bit pattern.
    #[must_use]
    pub fn encode_f32(self, value: f32) -> [u8; 4] {
        match self {
            Self::Little => value.to_bits().to_le_bytes(),
            Self::Big => value.to_bits().to_be_bytes(),
        }
    }

    /// Decode a 4-byte IEEE float by bit pattern.
    #[must_use]
    pub fn decode_f32(self, src: [u8; 4]) -> f32 {
        match self {
            Self::Little => f32::from_bits(u32::from_le_bytes(src)),
            Self::Big => f32::from_bits(u32::from_be_bytes(src)),
        }
    }

    /// Encode an 8-byte IEEE double by bit pattern.
    #[must_use]
    pub fn encode_f64(self, value: f64) -> [u8; 8] {
        match self {
            Self::Little => value.to_bits().to_le_bytes(),
            Self::Big => value.to_bits().to_be_bytes(),
        }
    }

    /// Decode an 8-byte IEEE double by bit pattern.
    #[must_use]
    pub fn decode_f64(self, src: [u8; 8]) -> f64 {
        match self {
            Self::Little => f64::from_bits(u64::from_le_bytes(src)),
            Self::Big => f64::from_bits(u64::from_be_bytes(src)),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::WIRE
    }
}

fn ensure(src: &impl Buf, needed: usize) -> Result<(), ProtocolError> {
    if src.remaining() < needed {
        return Err(ProtocolError::UnexpectedEof {
            needed,
            available: src.remaining(),
        });
    }
    Ok(())
}

/// Write an unsigned integer of `width` bytes in wire order.
pub fn put_uint(dst: &mut impl BufMut, value: u64, width: usize) {
    dst.put_slice(&ByteOrder::WIRE.encode_uint(value, width));
}

/// Read an unsigned integer of `width` bytes in wire order.
pub fn get_uint(src: &mut impl Buf, width: usize) -> Result<u64, ProtocolError> {
    ensure(src, width)?;
    let mut raw = [0u8; 8];
    let width = width.min(8);
    src.copy_to_slice(&mut raw[..width]);
    Ok(ByteOrder::WIRE.decode_uint(&raw[..width]))
}

/// Read a signed integer of `width` bytes in wire order.
pub fn get_int(src: &mut impl Buf, width: usize) -> Result<i64, ProtocolError> {
    ensure(src, width)?;
    let mut raw = [0u8; 8];
    let width = width.min(8);
    src.copy_to_slice(&mut raw[..width]);
    Ok(ByteOrder::WIRE.decode_int(&raw[..width]))
}

/// Read a 4-byte float in wire order.
pub fn get_f32(src: &mut impl Buf) -> Result<f32, ProtocolError> {
    ensure(src, 4)?;
    let mut raw = [0u8; 4];
    src.copy_to_slice(&mut raw);
    Ok(ByteOrder::WIRE.decode_f32(raw))
}

/// Read an 8-byte double in wire order.
pub fn get_f64(src: &mut impl Buf) -> Result<f64, ProtocolError> {
    ensure(src, 8)?;
    let mut raw = [0u8; 8];
    src.copy_to_slice(&mut raw);
    Ok(ByteOrder::WIRE.decode_f64(raw))
}

/// Number of bytes a length-encoded integer occupies.
#[must_use]
pub const fn lenenc_int_len(value: u64) -> usize {
    if value < LENENC_NULL as u64 {
        1
    } else if value <= 0xFFFF {
        3
    } else if value <= 0xFF_FFFF {
        4
    } else {
        9
    }
}

/// Write a length-encoded integer.
pub fn put_lenenc_int(dst: &mut impl BufMut, value: u64) {
    if value < LENENC_NULL as u64 {
        dst.put_u8(value as u8);
    } else if value <= 0xFFFF {
        dst.put_u8(LENENC_2);
        put_uint(dst, value, 2);
    } else if value <= 0xFF_FFFF {
        dst.put_u8(LENENC_3);
        put_uint(dst, value, 3);
    } else {
        dst.put_u8(LENENC_8);
        put_uint(dst, value, 8);
    }
}

/// Read a length-encoded integer.
///
/// Returns `None` for the NULL marker (`0xFB`).
pub fn get_lenenc_int(src: &mut impl Buf) -> Result<Option<u64>, ProtocolError> {
    ensure(src, 1)?;
    match src.get_u8() {
        prefix if prefix < LENENC_NULL => Ok(Some(u64::from(prefix))),
        LENENC_NULL => Ok(None),
        LENENC_2 => get_uint(src, 2).map(Some),
        LENENC_3 => get_uint(src, 3).map(Some),
        LENENC_8 => get_uint(src, 8).map(Some),
        other => Err(ProtocolError::InvalidLengthPrefix(other)),
    }
}

/// Write a length-prefixed byte string.
pub fn put_lenenc_bytes(dst: &mut impl BufMut, bytes: &[u8]) {
    put_lenenc_int(dst, bytes.len() as u64);
    dst.put_slice(bytes);
}

/// Read a length-prefixed byte string.
///
/// Returns `None` for the NULL marker. Fails without consuming the payload
/// when the declared length exceeds the remaining buffer.
pub fn get_lenenc_bytes(src: &mut impl Buf) -> Result<Option<Bytes>, ProtocolError> {
    let Some(len) = get_lenenc_int(src)? else {
        return Ok(None);
    };
    let len = usize::try_from(len).map_err(|_| ProtocolError::UnexpectedEof {
        needed: usize::MAX,
        available: src.remaining(),
    })?;
    ensure(src, len)?;
    Ok(Some(src.copy_to_bytes(len)))
}
