//! Real PC/SC transport, backed by the platform resource manager via
//! the `pcsc` crate.

use std::ffi::CString;
use std::time::Duration;

use pcsc::{Context, Disposition, Protocols, ReaderState, Scope, State};

use crate::error::PcscError;
use crate::types::{CardPresence, ConnHandle, ListOutcome, StatusSlot, StatusUpdate};
use cardbridge_core::constants::MAX_APDU_SIZE;
use cardbridge_core::{Protocol, ShareMode};

use crate::transport::PcscTransport;

/// Live connection handles are just their `pcsc::Card`, keyed by an
/// opaque counter so the registry can hand the rest of the crate a
/// plain `u64` instead of threading a lifetime through everything.
pub struct RealTransport {
    context: Context,
    next_handle: u64,
    cards: std::collections::HashMap<u64, pcsc::Card>,
}

impl RealTransport {
    pub fn establish() -> Result<Self, PcscError> {
        let context = Context::establish(Scope::User)
            .map_err(|e| PcscError::Context(e.to_string()))?;
        Ok(Self {
            context,
            next_handle: 1,
            cards: std::collections::HashMap::new(),
        })
    }
}

impl PcscTransport for RealTransport {
    fn list_readers(&mut self) -> Result<ListOutcome, PcscError> {
        let len = match self.context.list_readers_len() {
            Ok(len) => len,
            Err(pcsc::Error::NoReadersAvailable) => return Ok(ListOutcome::NoReaders),
            Err(pcsc::Error::ServiceStopped) | Err(pcsc::Error::NoService) => {
                return Ok(ListOutcome::ServiceStopped)
            }
            Err(e) => return Err(PcscError::from(e)),
        };
        let mut buf = vec![0u8; len];
        let names = match self.context.list_readers(&mut buf) {
            Ok(names) => names,
            Err(pcsc::Error::NoReadersAvailable) => return Ok(ListOutcome::NoReaders),
            Err(pcsc::Error::ServiceStopped) | Err(pcsc::Error::NoService) => {
                return Ok(ListOutcome::ServiceStopped)
            }
            Err(e) => return Err(PcscError::from(e)),
        };
        let readers = names
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        Ok(ListOutcome::Readers(readers))
    }

    fn get_status_change(&mut self, slots: &[StatusSlot]) -> Result<Vec<StatusUpdate>, PcscError> {
        if slots.is_empty() {
            return Ok(Vec::new());
        }
        let mut states: Vec<ReaderState> = slots
            .iter()
            .map(|slot| {
                let name = CString::new(slot.reader_name.as_bytes()).unwrap_or_default();
                let known = match slot.known_presence {
                    CardPresence::Empty => State::EMPTY,
                    CardPresence::Present => State::PRESENT,
                };
                ReaderState::new(name, known)
            })
            .collect();

        self.context
            .get_status_change(Duration::from_millis(0), &mut states)
            .map_err(|e| PcscError::Status(e.to_string()))?;

        Ok(states
            .iter()
            .map(|state| {
                let event = state.event_state();
                let changed = event.contains(State::CHANGED);
                let presence = if event.contains(State::PRESENT) {
                    CardPresence::Present
                } else {
                    CardPresence::Empty
                };
                StatusUpdate {
                    changed,
                    presence,
                    atr: state.atr().to_vec(),
                }
            })
            .collect())
    }

    fn connect(&mut self, reader_name: &str, share_mode: ShareMode) -> Result<(ConnHandle, Protocol), PcscError> {
        let name = CString::new(reader_name).map_err(|e| PcscError::Connect(e.to_string()))?;
        let mode = match share_mode {
            ShareMode::Exclusive => pcsc::ShareMode::Exclusive,
            ShareMode::Shared => pcsc::ShareMode::Shared,
            ShareMode::Direct => pcsc::ShareMode::Direct,
        };
        let protocols = if share_mode.is_direct() {
            Protocols::UNDEFINED
        } else {
            Protocols::ANY
        };
        let card = self
            .context
            .connect(&name, mode, protocols)
            .map_err(|e| PcscError::Connect(e.to_string()))?;

        let active = card
            .status2_owned()
            .ok()
            .map(|status| status.protocol2())
            .map(protocol_from_pcsc)
            .unwrap_or(Protocol::Undefined);

        let handle = self.next_handle;
        self.next_handle += 1;
        self.cards.insert(handle, card);
        Ok((ConnHandle(handle), active))
    }

    fn disconnect(&mut self, handle: ConnHandle) {
        if let Some(card) = self.cards.remove(&handle.0) {
            let _ = card.disconnect(Disposition::LeaveCard);
        }
    }

    fn transmit(&mut self, handle: ConnHandle, protocol: Protocol, apdu: &[u8]) -> Result<Vec<u8>, PcscError> {
        let card = self
            .cards
            .get(&handle.0)
            .ok_or_else(|| PcscError::Transmit("connection handle not found".into()))?;
        let _ = protocol; // the active protocol is already bound to the card by pcsc
        let mut recv_buf = vec![0u8; MAX_APDU_SIZE];
        let response = card
            .transmit(apdu, &mut recv_buf)
            .map_err(|e| PcscError::Transmit(e.to_string()))?;
        Ok(response.to_vec())
    }
}

fn protocol_from_pcsc(proto: Option<pcsc::Protocol>) -> Protocol {
    match proto {
        Some(pcsc::Protocol::T0) => Protocol::T0,
        Some(pcsc::Protocol::T1) => Protocol::T1,
        _ => Protocol::Undefined,
    }
}
