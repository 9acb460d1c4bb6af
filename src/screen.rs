//! Per-screen lifecycle primitives shared by the controllers.
//!
//! - `ScreenScope`: teardown signal; calls racing a teardown are dropped
//! - `RequestSequence`: monotonic tickets so only the newest response lands

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Lifetime of one screen instance.
#[derive(Debug, Clone, Default)]
pub struct ScreenScope {
    token: CancellationToken,
}

impl ScreenScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the screen as gone. Idempotent.
    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the screen is torn down first.
    ///
    /// Returns `None` when teardown wins; the future is dropped and its
    /// output never reaches controller state.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

/// Sequence number handed out per issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// Issues tickets and tells whether a ticket is still the latest one.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}
