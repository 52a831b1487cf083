//! Link-layer admission filters: channel, PAN-ID, and destination address.
//!
//! Ported from `virtual154Radio.c: channelFilter`/`panIdFilter`/
//! `addressFilter`/`lmacFrameFilter`. A frame that is filtered out is
//! silently dropped, not reported as an error — these predicates answer
//! "is this frame meant for me", not "is this frame well-formed".

use crate::mac_frame::{Address, FrameCodec};

/// PAN-ID `0xFFFF` is the broadcast/"don't care" PAN, matched against any
/// frame regardless of its own PAN-ID.
pub const BROADCAST_PAN_ID: u16 = 0xFFFF;
/// Short address `0xFFFF` is the broadcast short address.
pub const BROADCAST_SHORT_ADDR: u16 = 0xFFFF;

/// A receiving radio's current channel/PAN/address/promiscuity, checked
/// against every incoming frame before it's handed to `RadioCore`.
#[derive(Debug, Clone, Copy)]
pub struct Filter {
    pub channel: u8,
    pub pan_id: u16,
    pub short_addr: u16,
    pub extended_addr: u64,
    /// When true, every address/PAN check is bypassed — only the channel
    /// still has to match, matching sniffer/promiscuous-mode radios.
    pub promiscuous: bool,
}

impl Filter {
    pub const fn new(channel: u8, pan_id: u16, short_addr: u16, extended_addr: u64) -> Self {
        Self {
            channel,
            pan_id,
            short_addr,
            extended_addr,
            promiscuous: false,
        }
    }

    /// A frame arriving on `frame_channel` passes the channel filter only
    /// if it matches this radio's tuned channel exactly — there's no
    /// broadcast channel.
    pub fn channel_matches(&self, frame_channel: u8) -> bool {
        self.channel == frame_channel
    }

    fn pan_id_matches(&self, frame_pan_id: u16) -> bool {
        frame_pan_id == BROADCAST_PAN_ID || frame_pan_id == self.pan_id
    }

    fn address_matches(&self, addr: Address) -> bool {
        match addr {
            Address::Short(short) => short == BROADCAST_SHORT_ADDR || short == self.short_addr,
            // Extended addresses have no broadcast value; only an exact
            // match is accepted.
            Address::Extended(ext) => ext == self.extended_addr,
        }
    }

    /// Full admission check for a frame already known to be on the right
    /// channel: PAN-ID and destination address, both bypassed in
    /// promiscuous mode.
    pub fn accepts(&self, frame: &impl FrameCodec) -> bool {
        if self.promiscuous {
            return true;
        }

        let pan_ok = match frame.dest_pan_id() {
            Ok(pan_id) => self.pan_id_matches(pan_id),
            // No destination PAN-ID field on the frame: reject.
            Err(_) => false,
        };
        if !pan_ok {
            return false;
        }

        match frame.dest_address() {
            Ok(addr) => self.address_matches(addr),
            // No destination address field on the frame: reject.
            Err(_) => false,
        }
    }
}
