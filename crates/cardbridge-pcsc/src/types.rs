//! Small value types shared between the transport trait and its
//! implementations.

/// Whether a reader currently reports a card in the field. Deliberately
/// coarser than PC/SC's full `dwCurrentState` bitmask — the reconciler
/// only ever needs to know EMPTY/PRESENT and whether the slot changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPresence {
    Empty,
    Present,
}

/// A PC/SC connection handle. Wrapping it in `Option` at the call
/// site (rather than using a zero sentinel, as the underlying C API
/// does) makes "closed" a type-level fact instead of a magic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnHandle(pub(crate) u64);

/// What the reconciler currently believes about one reader, fed back
/// into `get_status_change` so the transport can report only what
/// changed since the last poll.
#[derive(Debug, Clone)]
pub struct StatusSlot {
    pub reader_name: String,
    pub known_presence: CardPresence,
}

/// One reader's status after a poll.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub changed: bool,
    pub presence: CardPresence,
    pub atr: Vec<u8>,
}

/// Outcome of a `list_readers` call, preserving the PC/SC-specific
/// distinction the reconciler needs for its three-way handling.
#[derive(Debug, Clone)]
pub enum ListOutcome {
    Readers(Vec<String>),
    NoReaders,
    ServiceStopped,
}

impl ListOutcome {
    /// Collapse to a plain name list — both `NoReaders` and
    /// `ServiceStopped` behave as an empty reader set.
    pub fn into_names(self) -> Vec<String> {
        match self {
            ListOutcome::Readers(names) => names,
            ListOutcome::NoReaders | ListOutcome::ServiceStopped => Vec::new(),
        }
    }
}
