//! Length-prefixed frame codec.
//!
//! A frame on the wire is a 4-byte little-endian unsigned length
//! followed by exactly that many bytes of UTF-8 JSON. This module
//! only understands that envelope — it hands back the raw body bytes
//! and leaves JSON parsing to [`crate::parser`]. Non-blocking peek
//! semantics (VALID/EMPTY/NOMORE) live one layer up, against the raw
//! pipe fd; this codec only ever sees bytes that are already in a
//! buffer.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use cardbridge_core::constants::MAX_PRACTICAL_FRAME_LEN;
use cardbridge_core::Error;
use tokio_util::codec::{Decoder, Encoder};

const LENGTH_PREFIX_BYTES: usize = 4;

/// Decodes/encodes the length-prefixed envelope against an in-memory
/// buffer. Holds no state beyond what `tokio_util::codec::Framed`
/// would otherwise track for us, plus the practical frame-size cap.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_len: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            max_len: MAX_PRACTICAL_FRAME_LEN,
        }
    }

    /// Build a codec with a caller-supplied frame-size cap, e.g. from
    /// an operator override of the default practical limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, Error> {
        if src.len() < LENGTH_PREFIX_BYTES {
            return Ok(None);
        }

        let length = u32::from_le_bytes(src[..LENGTH_PREFIX_BYTES].try_into().unwrap());

        if length == 0 || length == u32::MAX {
            return Err(Error::InvalidFrameLength { length });
        }
        if length as usize > self.max_len {
            return Err(Error::InvalidFrameLength { length });
        }

        let total = LENGTH_PREFIX_BYTES + length as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_BYTES);
        Ok(Some(src.split_to(length as usize).freeze()))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Error> {
        if item.len() as u64 >= u32::MAX as u64 {
            return Err(Error::InvalidFrameLength {
                length: u32::MAX,
            });
        }
        dst.reserve(LENGTH_PREFIX_BYTES + item.len());
        dst.put_u32_le(item.len() as u32);
        dst.extend_from_slice(&item);
        Ok(())
    }
}
