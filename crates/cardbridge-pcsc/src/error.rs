//! PC/SC-specific error taxonomy.
//!
//! Kept separate from [`cardbridge_core::Error`] because the resource
//! manager distinguishes failure shapes (`no readers`, `service
//! stopped`, everything else) that the core error type has no reason
//! to know about — only the reconciler cares, and it maps them down
//! to `Pcsc` before anything downstream sees them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PcscError {
    #[error("no smart card readers are currently available")]
    NoReaders,

    #[error("the smart card resource manager service is not running")]
    ServiceStopped,

    #[error("PC/SC context error: {0}")]
    Context(String),

    #[error("PC/SC connect failed: {0}")]
    Connect(String),

    #[error("PC/SC status query failed: {0}")]
    Status(String),

    #[error("PC/SC transmit failed: {0}")]
    Transmit(String),
}

impl From<PcscError> for cardbridge_core::Error {
    fn from(err: PcscError) -> Self {
        cardbridge_core::Error::Pcsc(err.to_string())
    }
}

impl From<pcsc::Error> for PcscError {
    fn from(err: pcsc::Error) -> Self {
        match err {
            pcsc::Error::NoReadersAvailable => PcscError::NoReaders,
            pcsc::Error::ServiceStopped | pcsc::Error::NoService => PcscError::ServiceStopped,
            other => PcscError::Context(other.to_string()),
        }
    }
}
