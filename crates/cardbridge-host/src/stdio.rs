//! Non-blocking framing over the process's stdin/stdout pipes.
//!
//! Tokio's `Stdin`/`Stdout` wrap blocking file descriptors behind an
//! internal thread pool, which makes a true non-blocking peek
//! impossible to express cleanly. The event loop needs exactly that —
//! "is there a complete frame yet, or not" without ever parking a
//! thread — so this module talks to the raw file descriptors directly
//! via `libc`, the same way a native-messaging host written against
//! Chrome's protocol would.

use std::io::{ErrorKind, Write};
use std::os::unix::io::RawFd;

use bytes::{Bytes, BytesMut};
use cardbridge_core::Error;
use cardbridge_json::frame::FrameCodec;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

const STDIN_FD: RawFd = 0;
const STDOUT_FD: RawFd = 1;
const READ_CHUNK: usize = 8192;

/// Result of one non-blocking read attempt against stdin.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete frame body is ready.
    Valid(Bytes),
    /// The pipe is open but has no bytes yet.
    Empty,
    /// The pipe is broken, closed, or produced a framing violation.
    NoMore,
}

/// Verify that the given fd is a pipe, not a terminal or regular
/// file, per the process contract. Called once at startup for both
/// stdin and stdout.
pub fn require_pipe(fd: RawFd) -> Result<(), Error> {
    // SAFETY: fstat on a valid, always-open standard fd.
    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::fstat(fd, &mut stat) };
    if rc != 0 {
        return Err(Error::PipeBroken);
    }
    let is_fifo = (stat.st_mode & libc::S_IFMT) == libc::S_IFIFO;
    let is_socket = (stat.st_mode & libc::S_IFMT) == libc::S_IFSOCK;
    if !is_fifo && !is_socket {
        return Err(Error::PipeBroken);
    }
    Ok(())
}

fn set_nonblocking(fd: RawFd) -> Result<(), Error> {
    // SAFETY: fd is one of our own standard descriptors.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 {
            return Err(Error::PipeBroken);
        }
        if libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
            return Err(Error::PipeBroken);
        }
    }
    Ok(())
}

/// Owns the inbound byte buffer and frame codec; stdin is read
/// directly by fd, stdout is written through the standard blocking
/// handle since outbound writes are never polled.
pub struct StdioFramer {
    buf: BytesMut,
    codec: FrameCodec,
}

impl StdioFramer {
    pub fn new(max_frame_bytes: usize) -> Result<Self, Error> {
        require_pipe(STDIN_FD)?;
        require_pipe(STDOUT_FD)?;
        set_nonblocking(STDIN_FD)?;
        Ok(Self {
            buf: BytesMut::with_capacity(READ_CHUNK),
            codec: FrameCodec::with_max_len(max_frame_bytes),
        })
    }

    /// One non-blocking read attempt, yielding at most one frame.
    /// Call again (e.g. on the next loop tick) to drain any
    /// additional frames already sitting in the buffer.
    pub fn try_read_one(&mut self) -> ReadOutcome {
        if let Some(frame) = self.decode_buffered() {
            return frame;
        }

        let mut chunk = [0u8; READ_CHUNK];
        // SAFETY: reading into a fully-owned stack buffer from a
        // validated, non-blocking fd.
        let n = unsafe {
            libc::read(
                STDIN_FD,
                chunk.as_mut_ptr() as *mut libc::c_void,
                chunk.len(),
            )
        };

        if n > 0 {
            self.buf.extend_from_slice(&chunk[..n as usize]);
            return self.decode_buffered().unwrap_or(ReadOutcome::Empty);
        }
        if n == 0 {
            return ReadOutcome::NoMore;
        }

        let err = std::io::Error::last_os_error();
        match err.kind() {
            ErrorKind::WouldBlock => ReadOutcome::Empty,
            ErrorKind::Interrupted => ReadOutcome::Empty,
            _ => {
                warn!(error = %err, "stdin read failed, treating pipe as closed");
                ReadOutcome::NoMore
            }
        }
    }

    fn decode_buffered(&mut self) -> Option<ReadOutcome> {
        match self.codec.decode(&mut self.buf) {
            Ok(Some(frame)) => Some(ReadOutcome::Valid(frame)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "framing violation on stdin, closing");
                Some(ReadOutcome::NoMore)
            }
        }
    }

    /// Serialize `body` into a frame and write it to stdout. Blocks
    /// for the duration of the write, same as any pipe write.
    pub fn write_frame(&mut self, body: Bytes) -> Result<(), Error> {
        trace!(len = body.len(), "writing frame");
        let mut out = BytesMut::new();
        self.codec
            .encode(body, &mut out)
            .map_err(|_| Error::PipeBroken)?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&out).map_err(|_| Error::PipeBroken)?;
        stdout.flush().map_err(|_| Error::PipeBroken)
    }
}
