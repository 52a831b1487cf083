//! Tracks a single outstanding ACK expectation for `RadioCore::send_data`.
//!
//! Ported from `virtual154Radio.c: processAckFrame`/`processAckTimeout` and
//! the arming done inline in `sendData`. Only one ACK can be outstanding at
//! a time — arming while already armed discards the previous expectation
//! (last write wins), matching the source, which has a single
//! `_ackTracker` struct rather than a table keyed by sequence number.

use std::time::{Duration, Instant};

/// Outcome delivered to `RadioCore`'s registered ACK callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    /// A matching ACK arrived before the timeout.
    Received,
    /// No matching ACK arrived before the timeout elapsed.
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    sequence_number: u8,
    deadline: Instant,
}

/// Default ACK timeout. See DESIGN.md "ACK timeout unit" for why this is
/// 100 microseconds rather than a millisecond value — it is far below any
/// real over-the-air turnaround and exists mainly for loopback-speed tests;
/// production callers should set `AckTracker::timeout` explicitly.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_micros(100);

/// Single-slot outstanding-ACK tracker.
pub struct AckTracker {
    pub timeout: Duration,
    armed: Option<Armed>,
}

impl AckTracker {
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            armed: None,
        }
    }

    /// Arm the tracker to expect an ACK for `sequence_number`, starting
    /// the timeout clock at `now`. Replaces any previously armed
    /// expectation without reporting it as timed out — the caller who
    /// re-arms is implicitly abandoning the old expectation.
    pub fn arm(&mut self, sequence_number: u8, now: Instant) {
        self.armed = Some(Armed {
            sequence_number,
            deadline: now + self.timeout,
        });
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Feed an incoming ACK's sequence number. Returns `Some(Received)` and
    /// disarms the tracker if it matches the outstanding expectation;
    /// returns `None` (and leaves the tracker untouched) for any other
    /// sequence number, including when nothing is armed.
    pub fn on_frame(&mut self, sequence_number: u8) -> Option<AckStatus> {
        match self.armed {
            Some(armed) if armed.sequence_number == sequence_number => {
                self.armed = None;
                Some(AckStatus::Received)
            }
            _ => None,
        }
    }

    /// Check the outstanding expectation, if any, against `now`. Returns
    /// `Some(TimedOut)` and disarms exactly once when the deadline has
    /// passed; returns `None` otherwise (including when nothing is armed,
    /// or the deadline hasn't arrived yet).
    pub fn on_tick(&mut self, now: Instant) -> Option<AckStatus> {
        match self.armed {
            Some(armed) if now >= armed.deadline => {
                self.armed = None;
                Some(AckStatus::TimedOut)
            }
            _ => None,
        }
    }
}
