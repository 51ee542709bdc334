//! The cooperative single-threaded run loop: tick-gated reader
//! enumeration, per-iteration card status polling, and opportunistic
//! inbound-frame draining, in that order every pass.
//!
//! There is no internal locking and no worker thread — PC/SC calls are
//! either zero-timeout (status polling) or bounded by one APDU
//! round-trip (transceive), so a plain loop paced by the OS calls
//! themselves is enough to keep latency low without burning CPU.

use std::thread::sleep;
use std::time::{Duration, Instant};

use bytes::Bytes;
use cardbridge_core::constants::{IDLE_SLEEP_MAX_MS, IDLE_SLEEP_MIN_MS};
use cardbridge_json::{parse, parse_request, to_string};
use cardbridge_pcsc::{PcscTransport, Reconciler};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::dispatcher::dispatch;
use crate::stdio::{ReadOutcome, StdioFramer};

/// Drive the loop until stdin is closed or produces a fatal framing
/// error. Returns the process exit code: `0` on a clean shutdown.
pub fn run<T: PcscTransport>(mut reconciler: Reconciler<T>, config: Config) -> i32 {
    let mut framer = match StdioFramer::new(config.max_frame_bytes) {
        Ok(f) => f,
        Err(err) => {
            error!(error = %err, "failed to set up stdio framing");
            return 1;
        }
    };

    let mut next_list_tick = Instant::now();
    let mut idle_sleep_ms = IDLE_SLEEP_MIN_MS;

    loop {
        let mut had_activity = false;

        if Instant::now() >= next_list_tick {
            next_list_tick = Instant::now() + config.list_tick;
            let events = list_phase(&mut reconciler);
            had_activity |= !events.is_empty();
            emit_events(&mut framer, events);
        }

        let events = status_phase(&mut reconciler);
        had_activity |= !events.is_empty();
        emit_events(&mut framer, events);

        match framer.try_read_one() {
            ReadOutcome::Valid(body) => {
                had_activity = true;
                if !handle_frame(&mut reconciler, &mut framer, &body) {
                    return 1;
                }
            }
            ReadOutcome::Empty => {
                if had_activity {
                    idle_sleep_ms = IDLE_SLEEP_MIN_MS;
                } else {
                    sleep(Duration::from_millis(idle_sleep_ms));
                    idle_sleep_ms = (idle_sleep_ms + 1).min(IDLE_SLEEP_MAX_MS);
                }
            }
            ReadOutcome::NoMore => {
                info!("stdin closed, shutting down");
                return 0;
            }
        }
    }
}

fn list_phase<T: PcscTransport>(reconciler: &mut Reconciler<T>) -> Vec<cardbridge_json::JsonValue> {
    match reconciler.list_phase() {
        Ok(events) => events,
        Err(err) => {
            debug!(error = %err, "list phase failed, will retry next tick");
            Vec::new()
        }
    }
}

fn status_phase<T: PcscTransport>(reconciler: &mut Reconciler<T>) -> Vec<cardbridge_json::JsonValue> {
    match reconciler.status_phase() {
        Ok(events) => events,
        Err(err) => {
            debug!(error = %err, "status phase failed, will retry next iteration");
            Vec::new()
        }
    }
}

fn emit_events(framer: &mut StdioFramer, events: Vec<cardbridge_json::JsonValue>) {
    for event in events {
        let body = Bytes::from(to_string(&event).into_bytes());
        if let Err(err) = framer.write_frame(body) {
            error!(error = %err, "failed to write event frame");
        }
    }
}

/// Parse and dispatch one inbound frame, writing its response.
/// Returns `false` if the pipe is no longer usable.
fn handle_frame<T: PcscTransport>(
    reconciler: &mut Reconciler<T>,
    framer: &mut StdioFramer,
    body: &[u8],
) -> bool {
    let value = match parse(body) {
        Ok(v) => v,
        Err(err) => {
            debug!(error = %err, "dropping unparseable frame");
            return true;
        }
    };

    let request = match parse_request(&value) {
        Ok(r) => r,
        Err(err) => {
            debug!(error = %err, "dropping request with invalid shape");
            return true;
        }
    };

    let response = dispatch(reconciler, &request);
    let out = Bytes::from(to_string(&response).into_bytes());
    if let Err(err) = framer.write_frame(out) {
        error!(error = %err, "failed to write response frame");
        return false;
    }
    true
}
