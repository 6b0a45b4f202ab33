//! Outbound message queues.
//!
//! [`OutboundQueue`] is the one structure shared between a control thread and
//! the loop thread: callers push framed messages, the loop takes them in
//! order. [`PendingWrites`] is loop-thread only and tracks how much of the
//! front frame has reached the socket.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Write};

/// A thread-safe FIFO of framed messages awaiting a writable socket.
#[derive(Debug, Default)]
pub(crate) struct OutboundQueue {
    messages: Mutex<VecDeque<String>>,
}

impl OutboundQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, message: String) {
        self.messages.lock().push_back(message);
    }

    /// Moves every queued message out under a single lock, preserving order.
    pub(crate) fn take_all(&self) -> VecDeque<String> {
        std::mem::take(&mut *self.messages.lock())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.lock().len()
    }
}

/// Frames accepted for sending on one connection, front first.
#[derive(Debug, Default)]
pub(crate) struct PendingWrites {
    frames: VecDeque<Vec<u8>>,
    cursor: usize,
}

impl PendingWrites {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, frame: impl Into<Vec<u8>>) {
        let frame = frame.into();
        if !frame.is_empty() {
            self.frames.push_back(frame);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    /// Writes frames in order until drained or the sink would block.
    ///
    /// Returns `true` once everything was written. A partially written frame
    /// stays at the front and resumes from where it stopped.
    pub(crate) fn flush_to<W: Write>(&mut self, mut sink: W) -> io::Result<bool> {
        loop {
            let Some(front) = self.frames.front() else {
                return Ok(true);
            };

            match sink.write(&front[self.cursor..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "write returned zero bytes",
                    ));
                }
                Ok(n) => {
                    self.cursor += n;
                    if self.cursor == front.len() {
                        self.frames.pop_front();
                        self.cursor = 0;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}
