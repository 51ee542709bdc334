//! PC/SC adapter, reader registry, reconciler and APDU transceiver.
//!
//! Everything in this crate is written against the [`PcscTransport`]
//! seam rather than the `pcsc` crate directly, so [`Reconciler`] can
//! be driven against either [`RealTransport`] or [`Simulator`].

pub mod apdu;
pub mod error;
pub mod reconciler;
pub mod real;
pub mod registry;
pub mod simulator;
pub mod transport;
pub mod types;

pub use error::PcscError;
pub use real::RealTransport;
pub use reconciler::Reconciler;
pub use registry::{RebuildDiff, Registry};
pub use simulator::Simulator;
pub use transport::PcscTransport;
pub use types::{CardPresence, ConnHandle, ListOutcome, StatusSlot, StatusUpdate};
