//! Time-advance boundary with an optional external co-simulation coordinator.
//!
//! The engine asks for permission to advance past every tick. Standalone
//! runs grant immediately; coordinated runs exchange messages over channels
//! and can time out or be halted.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::error::SimError;

/// Grants simulated-time advances to the engine.
pub trait TimeSync {
    /// Requests permission to advance to `requested_s` after finishing `tick`.
    ///
    /// Returns the granted time. Calling again with the same `tick` after a
    /// retryable error waits on the same outstanding request.
    ///
    /// # Errors
    ///
    /// [`SimError::StalledSynchronization`] on timeout (retryable),
    /// [`SimError::SyncCancelled`] when the coordinator halts or disconnects.
    fn request_next_time(&mut self, tick: usize, requested_s: f64) -> Result<f64, SimError>;
}

/// No coordinator: every request is granted as asked.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standalone;

impl TimeSync for Standalone {
    fn request_next_time(&mut self, _tick: usize, requested_s: f64) -> Result<f64, SimError> {
        Ok(requested_s)
    }
}

/// Engine-to-coordinator message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRequest {
    pub tick: usize,
    pub requested_s: f64,
}

/// Coordinator-to-engine message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncReply {
    Granted(f64),
    Halt,
}

/// Engine side of a channel pair created by [`coordinator_channel`].
#[derive(Debug)]
pub struct ChannelSync {
    requests: Sender<TimeRequest>,
    replies: Receiver<SyncReply>,
    timeout: Duration,
    outstanding: Option<usize>,
}

impl TimeSync for ChannelSync {
    fn request_next_time(&mut self, tick: usize, requested_s: f64) -> Result<f64, SimError> {
        if self.outstanding != Some(tick) {
            self.requests
                .send(TimeRequest { tick, requested_s })
                .map_err(|_| SimError::SyncCancelled { tick })?;
            self.outstanding = Some(tick);
        }

        match self.replies.recv_timeout(self.timeout) {
            Ok(SyncReply::Granted(t)) => {
                self.outstanding = None;
                Ok(t)
            }
            Ok(SyncReply::Halt) | Err(RecvTimeoutError::Disconnected) => {
                self.outstanding = None;
                Err(SimError::SyncCancelled { tick })
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "no time grant for tick {tick} after {} ms",
                    self.timeout.as_millis()
                );
                Err(SimError::StalledSynchronization {
                    tick,
                    waited: self.timeout,
                })
            }
        }
    }
}

/// Coordinator side: receives requests and answers them.
#[derive(Debug)]
pub struct CoordinatorHandle {
    requests: Receiver<TimeRequest>,
    replies: Sender<SyncReply>,
}

impl CoordinatorHandle {
    /// Blocks until the engine sends its next request, or `None` once the
    /// engine side is dropped.
    pub fn next_request(&self) -> Option<TimeRequest> {
        self.requests.recv().ok()
    }

    /// Like [`Self::next_request`] but gives up after `timeout`.
    pub fn next_request_timeout(&self, timeout: Duration) -> Option<TimeRequest> {
        self.requests.recv_timeout(timeout).ok()
    }

    /// Grants `time_s`. Returns `false` if the engine is gone.
    pub fn grant(&self, time_s: f64) -> bool {
        self.replies.send(SyncReply::Granted(time_s)).is_ok()
    }

    /// Stops the run at the engine's outstanding request.
    pub fn halt(&self) -> bool {
        self.replies.send(SyncReply::Halt).is_ok()
    }
}

/// Creates a connected engine/coordinator pair. The engine waits at most
/// `timeout` per attempt for each grant.
pub fn coordinator_channel(timeout: Duration) -> (ChannelSync, CoordinatorHandle) {
    let (req_tx, req_rx) = mpsc::channel();
    let (rep_tx, rep_rx) = mpsc::channel();
    (
        ChannelSync {
            requests: req_tx,
            replies: rep_rx,
            timeout,
            outstanding: None,
        },
        CoordinatorHandle {
            requests: req_rx,
            replies: rep_tx,
        },
    )
}
