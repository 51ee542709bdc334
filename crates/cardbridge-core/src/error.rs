//! Error taxonomy shared by every `cardbridge` crate.
//!
//! The variants mirror the error kinds spec'd for the bridge: framing,
//! parse, validation, transport (PC/SC) and resource failures. Each
//! downstream crate wraps its own lower-level error into one of these
//! via `#[from]` or an explicit constructor, so the dispatcher only
//! ever has to match on this one enum to decide whether a failure
//! terminates the loop or just flags a response `incomplete`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Framing errors — always fatal, terminate the event loop.
    #[error("frame length {length} is out of the allowed range")]
    InvalidFrameLength { length: u32 },

    #[error("pipe closed or broken mid-frame")]
    PipeBroken,

    // Parse errors — the current frame is discarded, the loop continues.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("invalid UTF-8 in JSON text: {0}")]
    InvalidUtf8(String),

    #[error("number literal overflowed the parser's scratch buffer")]
    NumberTooLong,

    #[error("JSON nesting exceeded the maximum depth of {max}")]
    NestingTooDeep { max: usize },

    // Validation errors — produce a response with `incomplete: true`.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} has the wrong type")]
    WrongFieldType { field: &'static str },

    #[error("reader index {0} is out of range")]
    ReaderOutOfRange(usize),

    #[error("connection at reader index {0} is not open")]
    ConnectionNotOpen(usize),

    #[error("hex string is malformed: {0}")]
    InvalidHex(String),

    // Transport errors — PC/SC returned a non-success code.
    #[error("PC/SC call failed: {0}")]
    Pcsc(String),

    // Resource errors.
    #[error("allocation failed while building the response")]
    Allocation,
}

// Required by `tokio_util::codec::{Decoder, Encoder}`, which bound
// their associated `Error` type on `From<std::io::Error>`. The frame
// codec never actually surfaces an I/O error through this path (see
// `cardbridge_host::stdio`, which reads the raw fd itself), so any
// I/O error is mapped onto the existing "pipe broken" variant.
impl From<std::io::Error> for Error {
    fn from(_: std::io::Error) -> Self {
        Error::PipeBroken
    }
}

pub type Result<T> = std::result::Result<T, Error>;
