//! In-memory PC/SC transport for tests.
//!
//! Lets a test drive reader plug/unplug and card insert/remove events
//! without a physical reader, the way [`MockRfid`](crate) drove
//! card-presented events for its device trait — except this simulator
//! backs the real [`PcscTransport`] seam, so the registry and
//! reconciler under test are the exact production code.

use std::collections::HashMap;

use crate::error::PcscError;
use crate::transport::PcscTransport;
use crate::types::{CardPresence, ConnHandle, ListOutcome, StatusSlot, StatusUpdate};
use cardbridge_core::{Protocol, ShareMode};

#[derive(Debug, Clone)]
struct SimulatedReader {
    presence: CardPresence,
    atr: Vec<u8>,
}

/// A scriptable stand-in for a PC/SC resource manager.
#[derive(Debug, Default)]
pub struct Simulator {
    readers: HashMap<String, SimulatedReader>,
    service_stopped: bool,
    next_handle: u64,
    open: HashMap<u64, (String, Protocol)>,
    /// Queued transmit responses, consumed in order per reader.
    scripted_responses: HashMap<String, Vec<Vec<u8>>>,
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            ..Default::default()
        }
    }

    pub fn plug_reader(&mut self, name: &str) {
        self.readers.entry(name.to_owned()).or_insert(SimulatedReader {
            presence: CardPresence::Empty,
            atr: Vec::new(),
        });
    }

    pub fn unplug_reader(&mut self, name: &str) {
        self.readers.remove(name);
    }

    pub fn insert_card(&mut self, name: &str, atr: Vec<u8>) {
        if let Some(reader) = self.readers.get_mut(name) {
            reader.presence = CardPresence::Present;
            reader.atr = atr;
        }
    }

    pub fn remove_card(&mut self, name: &str) {
        if let Some(reader) = self.readers.get_mut(name) {
            reader.presence = CardPresence::Empty;
            reader.atr.clear();
        }
    }

    pub fn set_service_stopped(&mut self, stopped: bool) {
        self.service_stopped = stopped;
    }

    /// Queue a response `transmit` will return the next time it's
    /// called against a connection open to `name`. Calls drain this
    /// queue front-to-back; once empty, transmit echoes back `9000`.
    pub fn script_response(&mut self, name: &str, response: Vec<u8>) {
        self.scripted_responses
            .entry(name.to_owned())
            .or_default()
            .push(response);
    }
}

impl PcscTransport for Simulator {
    fn list_readers(&mut self) -> Result<ListOutcome, PcscError> {
        if self.service_stopped {
            return Ok(ListOutcome::ServiceStopped);
        }
        if self.readers.is_empty() {
            return Ok(ListOutcome::NoReaders);
        }
        let mut names: Vec<String> = self.readers.keys().cloned().collect();
        names.sort();
        Ok(ListOutcome::Readers(names))
    }

    fn get_status_change(&mut self, slots: &[StatusSlot]) -> Result<Vec<StatusUpdate>, PcscError> {
        Ok(slots
            .iter()
            .map(|slot| match self.readers.get(&slot.reader_name) {
                Some(reader) => StatusUpdate {
                    changed: reader.presence != slot.known_presence,
                    presence: reader.presence,
                    atr: reader.atr.clone(),
                },
                None => StatusUpdate {
                    changed: false,
                    presence: slot.known_presence,
                    atr: Vec::new(),
                },
            })
            .collect())
    }

    fn connect(&mut self, reader_name: &str, share_mode: ShareMode) -> Result<(ConnHandle, Protocol), PcscError> {
        let reader = self
            .readers
            .get(reader_name)
            .ok_or_else(|| PcscError::Connect(format!("unknown reader {reader_name}")))?;
        if reader.presence != CardPresence::Present {
            return Err(PcscError::Connect("no card present".into()));
        }
        let protocol = if share_mode.is_direct() {
            Protocol::Undefined
        } else {
            Protocol::T1
        };
        let handle = self.next_handle;
        self.next_handle += 1;
        self.open.insert(handle, (reader_name.to_owned(), protocol));
        Ok((ConnHandle(handle), protocol))
    }

    fn disconnect(&mut self, handle: ConnHandle) {
        self.open.remove(&handle.0);
    }

    fn transmit(&mut self, handle: ConnHandle, _protocol: Protocol, _apdu: &[u8]) -> Result<Vec<u8>, PcscError> {
        let (name, _) = self
            .open
            .get(&handle.0)
            .ok_or_else(|| PcscError::Transmit("connection handle not found".into()))?;
        let queue = self.scripted_responses.entry(name.clone()).or_default();
        if queue.is_empty() {
            Ok(vec![0x90, 0x00])
        } else {
            Ok(queue.remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_readers_reports_no_readers_when_empty() {
        let mut sim = Simulator::new();
        assert!(matches!(sim.list_readers().unwrap(), ListOutcome::NoReaders));
    }

    #[test]
    fn list_readers_reports_service_stopped() {
        let mut sim = Simulator::new();
        sim.set_service_stopped(true);
        assert!(matches!(
            sim.list_readers().unwrap(),
            ListOutcome::ServiceStopped
        ));
    }

    #[test]
    fn status_change_detects_insertion() {
        let mut sim = Simulator::new();
        sim.plug_reader("Reader 1");
        sim.insert_card("Reader 1", vec![0x3B, 0x00]);
        let slots = vec![StatusSlot {
            reader_name: "Reader 1".into(),
            known_presence: CardPresence::Empty,
        }];
        let updates = sim.get_status_change(&slots).unwrap();
        assert!(updates[0].changed);
        assert_eq!(updates[0].presence, CardPresence::Present);
        assert_eq!(updates[0].atr, vec![0x3B, 0x00]);
    }

    #[test]
    fn connect_requires_card_present() {
        let mut sim = Simulator::new();
        sim.plug_reader("Reader 1");
        assert!(sim.connect("Reader 1", ShareMode::Shared).is_err());
        sim.insert_card("Reader 1", vec![0x3B, 0x00]);
        assert!(sim.connect("Reader 1", ShareMode::Shared).is_ok());
    }

    #[test]
    fn scripted_transmit_responses_drain_in_order() {
        let mut sim = Simulator::new();
        sim.plug_reader("Reader 1");
        sim.insert_card("Reader 1", vec![0x3B, 0x00]);
        let (handle, protocol) = sim.connect("Reader 1", ShareMode::Shared).unwrap();
        sim.script_response("Reader 1", vec![0x61, 0x10]);
        sim.script_response("Reader 1", vec![0x90, 0x00]);
        assert_eq!(
            sim.transmit(handle, protocol, &[0x00]).unwrap(),
            vec![0x61, 0x10]
        );
        assert_eq!(
            sim.transmit(handle, protocol, &[0x00]).unwrap(),
            vec![0x90, 0x00]
        );
    }
}
