//! Shared types, error taxonomy and wire constants for the cardbridge
//! helper. Every other crate in the workspace depends on this one and
//! nothing in here depends back on them.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    decode_hex, encode_hex, CommandCode, CorrelationId, EventCode, Protocol, ReaderIndex,
    ShareMode,
};
