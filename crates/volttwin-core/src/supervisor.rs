//! Per-connection liveness state machine.
//!
//! Each subscriber carries a [`Liveness`] value driven by two inputs: a
//! recurring probe timer and pong acknowledgments from the transport.
//! When the probe timer fires on a connection that is still waiting for
//! the previous acknowledgment, the connection is declared dead and torn
//! down -- detection latency is bounded by one probe interval, and
//! resources are never held for a half-open connection indefinitely.
//!
//! Liveness probes are transport pings, distinct from the application
//! heartbeat payloads, which play no part in liveness determination.

/// Transport liveness of one subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// The last probe was acknowledged (or no probe has been sent yet).
    Alive,
    /// A probe is outstanding and has not been acknowledged.
    Probing,
}

/// What the connection task must do after its probe timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeDecision {
    /// Send a ping and await the acknowledgment.
    SendPing,
    /// No acknowledgment arrived for a full interval: the connection is
    /// dead and must be released.
    Expired,
}

impl Liveness {
    /// Advance the machine on a probe timer tick.
    pub const fn on_probe(&mut self) -> ProbeDecision {
        match self {
            Self::Alive => {
                *self = Self::Probing;
                ProbeDecision::SendPing
            }
            Self::Probing => ProbeDecision::Expired,
        }
    }

    /// Record a pong acknowledgment from the transport.
    pub const fn on_ack(&mut self) {
        *self = Self::Alive;
    }
}
