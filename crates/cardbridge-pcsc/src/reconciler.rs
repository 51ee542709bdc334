//! Reader/card state reconciler: the list phase and status phase
//! described in the component design, plus the command-facing
//! operations (`connect`/`disconnect`/`transceive`) that act on the
//! registry through the same transport.

use crate::registry::Registry;
use crate::transport::PcscTransport;
use crate::types::CardPresence;
use cardbridge_core::constants::MAX_ATR_LEN;
use cardbridge_core::{decode_hex, encode_hex, Error, EventCode, Protocol, Result, ShareMode};
use cardbridge_json::{event, JsonValue};

pub struct Reconciler<T: PcscTransport> {
    transport: T,
    registry: Registry,
}

impl<T: PcscTransport> Reconciler<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            registry: Registry::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs once per tick: re-enumerate readers, rebuild the registry
    /// on any name-set change, and emit one event per reader added or
    /// removed.
    pub fn list_phase(&mut self) -> Result<Vec<JsonValue>> {
        let outcome = self.transport.list_readers().map_err(Error::from)?;
        let names = outcome.into_names();
        let diff = self.registry.rebuild(names);

        for handle in &diff.closed_handles {
            self.transport.disconnect(*handle);
        }

        let mut events = Vec::with_capacity(diff.added.len() + diff.removed.len());
        events.extend(diff.added.iter().map(|_| event(EventCode::ReadersMore, None, None)));
        events.extend(diff.removed.iter().map(|_| event(EventCode::ReadersLess, None, None)));
        Ok(events)
    }

    /// Runs every loop iteration: zero-timeout status poll over all
    /// known readers, translating `EMPTY -> PRESENT` and
    /// `PRESENT -> EMPTY` transitions into events.
    pub fn status_phase(&mut self) -> Result<Vec<JsonValue>> {
        let slots = self.registry.status_slots();
        if slots.is_empty() {
            return Ok(Vec::new());
        }
        let updates = self.transport.get_status_change(&slots).map_err(Error::from)?;

        let mut events = Vec::new();
        for (index, update) in updates.into_iter().enumerate() {
            if !update.changed {
                continue;
            }
            let entry = match self.registry.get_mut(index) {
                Some(entry) => entry,
                None => continue,
            };

            let mut atr = update.atr;
            atr.truncate(MAX_ATR_LEN);

            if entry.connection.suppression_counter > 0 {
                entry.connection.suppression_counter -= 1;
                entry.presence = update.presence;
                entry.atr = atr;
                continue;
            }

            match (entry.presence, update.presence) {
                (CardPresence::Empty, CardPresence::Present) => {
                    entry.atr = atr.clone();
                    events.push(event(
                        EventCode::CardInsertion,
                        Some(index),
                        Some(&encode_hex(&atr)),
                    ));
                }
                (CardPresence::Present, CardPresence::Empty) => {
                    if let Some(handle) = entry.connection.handle.take() {
                        self.transport.disconnect(handle);
                    }
                    entry.connection.protocol = Protocol::Undefined;
                    events.push(event(EventCode::CardRemoval, Some(index), None));
                }
                _ => {}
            }
            entry.presence = update.presence;
        }
        Ok(events)
    }

    /// CONNECT command: opens a session on `index` with `share_mode`
    /// and returns the card's ATR as hex.
    ///
    /// Bumps the event-suppression counter on success — PC/SC raises
    /// a state-changed notification right after a successful connect
    /// that would otherwise be misread as a fresh card insertion.
    pub fn connect_reader(&mut self, index: usize, share_mode: ShareMode) -> Result<String> {
        let entry = self
            .registry
            .get(index)
            .ok_or(Error::ReaderOutOfRange(index))?;
        let name = entry.name.clone();
        let atr = entry.atr.clone();

        let (handle, protocol) = self
            .transport
            .connect(&name, share_mode)
            .map_err(Error::from)?;

        let entry = self.registry.get_mut(index).expect("index checked above");
        entry.connection.handle = Some(handle);
        entry.connection.protocol = protocol;
        entry.connection.suppression_counter += 1;

        Ok(encode_hex(&atr))
    }

    /// DISCONNECT command. Succeeds even if the reader's connection
    /// was already closed.
    pub fn disconnect_reader(&mut self, index: usize) -> Result<()> {
        let entry = self
            .registry
            .get_mut(index)
            .ok_or(Error::ReaderOutOfRange(index))?;
        if let Some(handle) = entry.connection.handle.take() {
            self.transport.disconnect(handle);
        }
        entry.connection.protocol = Protocol::Undefined;
        Ok(())
    }

    /// TRANSCEIVE command: decodes the APDU hex, runs the chained
    /// transmit, and re-encodes the concatenated result.
    pub fn transceive(&mut self, index: usize, apdu_hex: &str) -> Result<String> {
        let entry = self
            .registry
            .get(index)
            .ok_or(Error::ReaderOutOfRange(index))?;
        let handle = entry
            .connection
            .handle
            .ok_or(Error::ConnectionNotOpen(index))?;
        let protocol = entry.connection.protocol;
        let apdu = decode_hex(apdu_hex)?;
        crate::apdu::chained_transmit(&mut self.transport, handle, protocol, &apdu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::Simulator;

    fn reconciler_with_one_reader() -> Reconciler<Simulator> {
        let mut sim = Simulator::new();
        sim.plug_reader("Reader 1");
        let mut r = Reconciler::new(sim);
        r.list_phase().unwrap();
        r
    }

    #[test]
    fn list_phase_emits_readers_more_on_addition() {
        let mut sim = Simulator::new();
        sim.plug_reader("Reader 1");
        let mut r = Reconciler::new(sim);
        let events = r.list_phase().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].get("e").unwrap().as_f32(), Some(EventCode::ReadersMore.to_f32()));
    }

    #[test]
    fn list_phase_is_quiet_when_unchanged() {
        let mut r = reconciler_with_one_reader();
        let events = r.list_phase().unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn status_phase_emits_card_insertion() {
        let mut sim = Simulator::new();
        sim.plug_reader("Reader 1");
        sim.insert_card("Reader 1", vec![0x3B, 0x00]);
        let mut r = Reconciler::new(sim);
        r.list_phase().unwrap();

        let events = r.status_phase().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].get("e").unwrap().as_f32(),
            Some(EventCode::CardInsertion.to_f32())
        );
        assert_eq!(events[0].get("d").unwrap().as_str(), Some("3B00"));
    }

    #[test]
    fn connect_out_of_range_is_an_error() {
        let mut r = reconciler_with_one_reader();
        assert!(r.connect_reader(5, ShareMode::Shared).is_err());
    }

    #[test]
    fn disconnect_on_closed_reader_succeeds() {
        let mut r = reconciler_with_one_reader();
        assert!(r.disconnect_reader(0).is_ok());
    }

    #[test]
    fn transceive_without_open_connection_is_an_error() {
        let mut r = reconciler_with_one_reader();
        assert!(r.transceive(0, "00A40400").is_err());
    }

    #[test]
    fn status_phase_truncates_oversized_atr() {
        let mut sim = Simulator::new();
        sim.plug_reader("Reader 1");
        sim.insert_card("Reader 1", vec![0xAA; 64]);
        let mut r = Reconciler::new(sim);
        r.list_phase().unwrap();

        let events = r.status_phase().unwrap();
        assert_eq!(r.registry().get(0).unwrap().atr.len(), MAX_ATR_LEN);
        assert_eq!(
            events[0].get("d").unwrap().as_str().unwrap().len(),
            MAX_ATR_LEN * 2
        );
    }

    #[test]
    fn connect_bumps_suppression_counter() {
        let mut sim = Simulator::new();
        sim.plug_reader("Reader 1");
        sim.insert_card("Reader 1", vec![0x3B, 0x00]);
        let mut r = Reconciler::new(sim);
        r.list_phase().unwrap();
        r.connect_reader(0, ShareMode::Shared).unwrap();
        assert_eq!(r.registry().get(0).unwrap().connection.suppression_counter, 1);
    }
}
