//! `COM_STMT_SEND_LONG_DATA` payload encoding.
//!
//! ## Layout
//!
//! ```text
//! 0x18 | statement_id u32 | param_index u16 | data
//! ```
//!
//! The server appends the data of every long data packet to the parameter
//! and sends no response. A parameter sent this way is announced in the
//! type block of the following `COM_STMT_EXECUTE` but its value is left out.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;

/// Command byte of `COM_STMT_SEND_LONG_DATA`.
pub const COM_STMT_SEND_LONG_DATA: u8 = 0x18;

/// Size of the fixed part of the payload.
pub const LONG_DATA_HEADER_LEN: usize = 1 + 4 + 2;

/// A `COM_STMT_SEND_LONG_DATA` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendLongData<'a> {
    /// Statement id from the prepare response.
    pub statement_id: u32,
    /// Zero-based placeholder index.
    pub param_index: u16,
    /// Chunk of the parameter value.
    pub data: &'a [u8],
}

impl<'a> SendLongData<'a> {
    /// Create a new long data request.
    #[must_use]
    pub const fn new(statement_id: u32, param_index: u16, data: &'a [u8]) -> Self {
        Self {
            statement_id,
            param_index,
            data,
        }
    }

    /// Size of the encoded payload.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        LONG_DATA_HEADER_LEN + self.data.len()
    }

    /// Encode the request payload.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8(COM_STMT_SEND_LONG_DATA);
        dst.put_u32_le(self.statement_id);
        dst.put_u16_le(self.param_index);
        dst.put_slice(self.data);
    }

    /// Encode the request into a new buffer.
    #[must_use]
    pub fn encode_to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Encode `data` as long data payloads of at most `max_packet` bytes.
    ///
    /// An empty value still produces one payload so the server marks the
    /// parameter as sent.
    pub fn split(
        statement_id: u32,
        param_index: u16,
        data: &[u8],
        max_packet: usize,
    ) -> Result<Vec<Bytes>, ProtocolError> {
        let chunk_len = max_packet.saturating_sub(LONG_DATA_HEADER_LEN);
        if chunk_len == 0 {
            return Err(ProtocolError::PacketTooLarge {
                size: LONG_DATA_HEADER_LEN + data.len().min(1),
                max: max_packet,
            });
        }
        if data.is_empty() {
            return Ok(vec![
                SendLongData::new(statement_id, param_index, data).encode_to_bytes(),
            ]);
        }
        Ok(data
            .chunks(chunk_len)
            .map(|chunk| SendLongData::new(statement_id, param_index, chunk).encode_to_bytes())
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_long_data_layout() {
        let bytes = SendLongData::new(7, 2, b"abc").encode_to_bytes();
        assert_eq!(&bytes[..], &[0x18, 7, 0, 0, 0, 2, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn test_split_at_max_packet() {
        let data = [0xAB; 20];
        let packets = SendLongData::split(1, 0, &data, 15).unwrap();
        let sizes: Vec<_> = packets.iter().map(Bytes::len).collect();
        assert_eq!(sizes, [15, 15, 11]);
        assert!(packets.iter().all(|p| p[0] == COM_STMT_SEND_LONG_DATA));
        let body: Vec<u8> = packets.iter().flat_map(|p| p[7..].to_vec()).collect();
        assert_eq!(body, data);
    }

    #[test]
    fn test_split_empty_value() {
        let packets = SendLongData::split(1, 3, &[], 64).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(&packets[0][..], &[0x18, 1, 0, 0, 0, 3, 0]);
    }

    #[test]
    fn test_split_header_does_not_fit() {
        assert!(matches!(
            SendLongData::split(1, 0, b"x", 7),
            Err(ProtocolError::PacketTooLarge { max: 7, .. })
        ));
    }
}
