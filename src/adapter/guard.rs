//! Request generations for a single flow.
//!
//! Every request a flow sends gets a [`Ticket`] from an increasing counter.
//! When a response comes back, it is applied only if its ticket is still
//! the newest one issued. A slow response to an old request (e.g. the user
//! switched commodity in the meantime) is dropped instead of overwriting
//! the newer result.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestGuard {
    latest: u64,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket newer than every ticket issued before it.
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    /// Whether a response for `ticket` may still be applied.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}
