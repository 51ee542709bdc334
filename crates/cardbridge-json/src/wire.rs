//! Mapping between the JSON value tree and the domain-level request,
//! response and event shapes the dispatcher actually works with.
//!
//! Field names (`i`, `c`, `r`, `p`, `a`, `d`, `e`) are the wire's —
//! short because every byte crosses a pipe, not because Rust naming
//! conventions changed.

use crate::value::{JsonValue, ObjectBuilder};
use cardbridge_core::{CommandCode, Error, EventCode, Result, ShareMode};

/// A parsed inbound request.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: String,
    pub command: CommandCode,
    pub reader: Option<usize>,
    pub share_mode: Option<ShareMode>,
    pub apdu: Option<String>,
}

pub fn parse_request(value: &JsonValue) -> Result<Request> {
    let id = value
        .get("i")
        .and_then(JsonValue::as_str)
        .ok_or(Error::MissingField("i"))?
        .to_owned();

    let command_num = value
        .get("c")
        .and_then(JsonValue::as_f32)
        .ok_or(Error::MissingField("c"))?;
    let command = CommandCode::from_f32(command_num);

    let reader = match value.get("r") {
        Some(v) => Some(
            v.as_f32()
                .ok_or(Error::WrongFieldType { field: "r" })? as usize,
        ),
        None => None,
    };

    let share_mode = match value.get("p") {
        Some(v) => {
            let n = v.as_f32().ok_or(Error::WrongFieldType { field: "p" })?;
            Some(ShareMode::from_u8(n.round() as u8)?)
        }
        None => None,
    };

    let apdu = value
        .get("a")
        .and_then(JsonValue::as_str)
        .map(str::to_owned);

    Ok(Request {
        id,
        command,
        reader,
        share_mode,
        apdu,
    })
}

/// Build a response that echoes the request's correlation id.
/// `body` supplies the command-specific fields; pass an empty slice
/// for commands with no payload (DISCONNECT, unknown command).
pub fn response(id: &str, body: &[(&str, JsonValue)]) -> JsonValue {
    let mut b = ObjectBuilder::new().field("i", id);
    for (key, value) in body {
        b = b.field(key, value.clone());
    }
    b.build()
}

/// Build a failed response: `i` plus `incomplete: true`, per the
/// wire's contract that every request still gets exactly one
/// response frame even when the handler failed.
pub fn incomplete_response(id: &str) -> JsonValue {
    ObjectBuilder::new()
        .field("i", id)
        .field("incomplete", true)
        .build()
}

/// Build an unsolicited reader/card event frame. Events never carry
/// an `i` field, so they can never be mistaken for a response.
pub fn event(code: EventCode, reader: Option<usize>, atr_hex: Option<&str>) -> JsonValue {
    let mut b = ObjectBuilder::new().field("e", code.to_f32());
    if let Some(r) = reader {
        b = b.field("r", r as f32);
    }
    if let Some(atr) = atr_hex {
        b = b.field("d", atr);
    }
    b.build()
}
