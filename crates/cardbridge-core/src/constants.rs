//! Wire-level constants for the cardbridge native messaging protocol.
//!
//! # Frame shape
//!
//! ```text
//! <u32-le length><length bytes of UTF-8 JSON>
//! ```
//!
//! There is no STX/ETX byte framing and no inline checksum — the
//! length prefix is the only framing primitive, and the host is
//! trusted to write exactly one complete frame per message.

/// Lower bound on a valid frame length (exclusive).
pub const MIN_FRAME_LEN: u32 = 0;

/// Upper bound on a valid frame length (exclusive) — `2^32 - 1`.
pub const MAX_FRAME_LEN: u32 = u32::MAX;

/// Practical hard cap on a single frame, independent of the wire limit
/// above. Frames larger than this are treated as a framing violation
/// rather than exhausting memory on a malicious or buggy host.
pub const MAX_PRACTICAL_FRAME_LEN: usize = 1024 * 1024;

/// Maximum nesting depth the JSON parser will recurse through before
/// failing the parse. Unbounded recursion on attacker-controlled input
/// would let a crafted frame exhaust the native call stack.
pub const MAX_JSON_DEPTH: usize = 64;

/// Upper bound on the textual length of a single JSON number literal.
pub const MAX_NUMBER_LEN: usize = 64;

/// Maximum APDU response capacity requested from the reader, per the
/// wire's `MAX_APDU_SIZE`.
pub const MAX_APDU_SIZE: usize = 0x7FFF;

/// Maximum ATR length in bytes (ISO 7816-3).
pub const MAX_ATR_LEN: usize = 36;

/// Version string reported by `GET_VERSION`.
pub const VERSION: &str = "0.3.1";

/// `61 xx` — "more data available", the ISO 7816 continuation status.
pub const SW1_MORE_DATA: u8 = 0x61;

/// GET RESPONSE APDU class/instruction/params, missing only the Le byte.
pub const GET_RESPONSE_HEADER: [u8; 4] = [0x00, 0xC0, 0x00, 0x00];

/// Tick interval for the reader-enumeration ("list") phase of the
/// reconciler, in milliseconds.
pub const DEFAULT_LIST_TICK_MS: u64 = 1000;

/// Idle sleep bounds applied when a loop iteration finds no inbound
/// frame and no status change — keeps the loop from busy-spinning
/// while staying well under the ~100ms event-latency budget.
pub const IDLE_SLEEP_MIN_MS: u64 = 5;
pub const IDLE_SLEEP_MAX_MS: u64 = 20;
