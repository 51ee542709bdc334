//! Command dispatch: turns a parsed [`Request`] into the response body
//! fields the wire protocol defines for that command.
//!
//! Every request gets exactly one response frame. A command that
//! fails validation or hits a transport error still produces a
//! response — `incomplete_response` — rather than silently dropping
//! the frame, so the extension side is never left waiting on a
//! correlation id that will never resolve.

use cardbridge_core::constants::VERSION;
use cardbridge_core::{encode_hex, CommandCode, Error, ShareMode};
use cardbridge_json::{incomplete_response, response, JsonValue, ObjectBuilder, Request};
use cardbridge_pcsc::{PcscTransport, Reconciler};
use tracing::warn;

/// Handle one parsed request against the reconciler, returning the
/// full response frame (already carrying the request's `i`).
pub fn dispatch<T: PcscTransport>(
    reconciler: &mut Reconciler<T>,
    request: &Request,
) -> JsonValue {
    match handle(reconciler, request) {
        Ok(body) => response(&request.id, &body),
        Err(err) => {
            warn!(id = %request.id, command = ?request.command, error = %err, "request failed");
            incomplete_response(&request.id)
        }
    }
}

fn handle<T: PcscTransport>(
    reconciler: &mut Reconciler<T>,
    request: &Request,
) -> Result<Vec<(&'static str, JsonValue)>, Error> {
    match request.command {
        CommandCode::GetVersion => Ok(vec![("verNat", JsonValue::from(VERSION))]),

        CommandCode::ListReaders => {
            let readers: Vec<JsonValue> = reconciler
                .registry()
                .name_atr_pairs()
                .into_iter()
                .map(|(name, atr)| {
                    ObjectBuilder::new()
                        .field("n", name)
                        .field("a", encode_hex(atr))
                        .build()
                })
                .collect();
            Ok(vec![("d", JsonValue::Array(readers))])
        }

        CommandCode::Connect => {
            let index = request.reader.ok_or(Error::MissingField("r"))?;
            let share_mode = request.share_mode.unwrap_or(ShareMode::DEFAULT);
            let atr_hex = reconciler.connect_reader(index, share_mode)?;
            Ok(vec![("d", JsonValue::from(atr_hex))])
        }

        CommandCode::Disconnect => {
            let index = request.reader.ok_or(Error::MissingField("r"))?;
            reconciler.disconnect_reader(index)?;
            Ok(Vec::new())
        }

        CommandCode::Transceive => {
            let index = request.reader.ok_or(Error::MissingField("r"))?;
            let apdu_hex = request
                .apdu
                .as_deref()
                .ok_or(Error::MissingField("a"))?;
            let response_hex = reconciler.transceive(index, apdu_hex)?;
            Ok(vec![("d", JsonValue::from(response_hex))])
        }

        // An unrecognized command code still gets a clean success
        // response carrying no payload, matching the wire's leniency
        // toward forward-compatible clients.
        CommandCode::None => Ok(Vec::new()),
    }
}
