//! Error types for `virtual154`.
//!
//! Protocol outcomes (TX/RX/ACK status) are *not* errors — spec-wise they are
//! delivered through callbacks (see `radio::TxStatus`, `RxStatus`, `AckStatus`)
//! even on failure. `RadioError` covers configuration and programming faults:
//! malformed address strings, out-of-range fields, and socket setup failures.

use std::fmt;
use std::net::AddrParseError;

/// Failures that can occur configuring or driving the emulated radio.
///
/// Socket setup failures (`Io`) are fatal in the original source (an `assert`
/// that aborts the process). Here they're propagated as `Result` so the
/// caller decides whether to unwrap-and-panic or retry; see DESIGN.md.
#[derive(thiserror::Error, Debug)]
pub enum RadioError {
    /// A `MediumConfig` address/port string did not fully parse.
    #[error("malformed socket address: {0}")]
    AddressParse(#[from] AddrParseError),

    /// The medium's required format is `ipv4:port`, and no colon was found.
    #[error("expected `ip:port`, got {0:?}")]
    AddressFormat(String),

    /// Socket creation, option setup, bind, or multicast join failed.
    #[error("medium socket setup failed: {0}")]
    Io(#[from] std::io::Error),

    /// `send_blocking` wrote fewer bytes than requested.
    #[error("short write: sent {sent} of {expected} bytes")]
    ShortWrite { sent: usize, expected: usize },

    /// An MPDU was larger than `frame::MAX_MPDU_SIZE`.
    #[error("mpdu size {0} exceeds maximum of {max}", max = crate::frame::MAX_MPDU_SIZE)]
    PayloadTooLarge(usize),

    /// `frame_length` fell in one of the PHR's reserved ranges (`0..=4`, `6..=7`).
    #[error("frame_length {0} is a reserved PHR value")]
    ReservedFrameLength(u8),

    /// `RadioCore::set_channel` was given a value outside `11..=26`.
    #[error("channel {0} out of range 11..=26")]
    ChannelOutOfRange(u8),

    /// An operation was attempted before `MediumEndpoint::init` or
    /// `RadioCore` construction completed.
    #[error("not initialized")]
    NotInitialized,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RadioError>;

/// A destination-field decode outcome from a [`crate::mac_frame::FrameCodec`],
/// distinct from `RadioError` since a missing field is a filtering signal,
/// not a fault — see `filter.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// The frame carries no such field (e.g. no destination PAN-ID present).
    Absent,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "field absent from frame"),
        }
    }
}
