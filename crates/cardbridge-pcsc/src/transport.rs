//! The PC/SC façade the rest of the crate depends on.
//!
//! Everything above this trait — the registry, the reconciler, the
//! transceiver — is written against [`PcscTransport`] rather than the
//! `pcsc` crate directly, so a test can swap in [`crate::simulator`]
//! without touching a real reader. This mirrors the boundary the
//! wire profile itself draws in its PC/SC adapter contract: establish
//! context, list readers, get status change, connect, disconnect,
//! transmit, nothing else.

use crate::error::PcscError;
use crate::types::{ConnHandle, ListOutcome, StatusSlot, StatusUpdate};
use cardbridge_core::{Protocol, ShareMode};

pub trait PcscTransport {
    /// Enumerate reader names. Three-way result per the resource
    /// manager's documented failure shapes.
    fn list_readers(&mut self) -> Result<ListOutcome, PcscError>;

    /// Zero-timeout status poll against the given slots, returned in
    /// the same order they were supplied.
    fn get_status_change(&mut self, slots: &[StatusSlot]) -> Result<Vec<StatusUpdate>, PcscError>;

    /// Open a connection to `reader_name` with the given share mode.
    /// Requested protocols are `T0|T1` unless `share_mode` is
    /// `Direct`, in which case no protocol is requested.
    fn connect(&mut self, reader_name: &str, share_mode: ShareMode) -> Result<(ConnHandle, Protocol), PcscError>;

    /// Close a connection, leaving the card in the reader.
    fn disconnect(&mut self, handle: ConnHandle);

    /// Transmit a single APDU and return the reader's response bytes
    /// (SW1/SW2 included).
    fn transmit(&mut self, handle: ConnHandle, protocol: Protocol, apdu: &[u8]) -> Result<Vec<u8>, PcscError>;
}
