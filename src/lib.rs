//! `virtual154`: an emulated IEEE 802.15.4 LR-WPAN radio PHY and partial MAC,
//! carried over UDP multicast so firmware written against a radio driver API
//! can run on a workstation and talk to other emulated nodes on the same
//! host or LAN.
//!
//! See `DESIGN.md` for the module-by-module grounding ledger and the
//! decisions behind each Open Question in the original source.

pub mod ack;
pub mod address;
pub mod driver;
pub mod error;
pub mod filter;
pub mod frame;
pub mod mac_frame;
pub mod medium;
pub mod radio;

pub use address::{MediumConfig, SocketAddress};
pub use error::{RadioError, Result};
pub use mac_frame::{Address, FrameCodec, FrameType, MacFrame};
pub use radio::{AckCallbackStatus, RadioCore, RadioMetaConfig, RadioState, RxStatus, TxStatus};
