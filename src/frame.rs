//! On-wire "RF frame" envelope: a leading channel byte, an optional PHY
//! synchronization header (SHR) and PHY header (PHR), and the MPDU.
//!
//! Ported from `virtual154Radio.c: assemblyRfFrame`/`processRfFrame` and
//! the `fillShr`/`fillPhr`/`fillPsdu` helpers. Two wire shapes are
//! supported, selected by `FrameBuilder::skip_shr_phr`: the full
//! `channel | SHR | PHR | PSDU` layout for a faithful PHY emulation, and a
//! bare `channel | PSDU` layout for callers that only care about the MAC
//! layer and want to skip re-deriving the PHY envelope on every
//! send/receive.

use crate::error::{RadioError, Result};

/// IEEE 802.15.4 preamble: four zero octets.
pub const PREAMBLE: [u8; 4] = [0x00, 0x00, 0x00, 0x00];
/// Start-of-frame delimiter for a non-beacon-enabled PHY.
pub const SFD: u8 = 0xA7;
/// `PREAMBLE` + `SFD`.
pub const SHR_LEN: usize = PREAMBLE.len() + 1;
/// The PHR is one octet: a reserved top bit and a 7-bit frame length.
pub const PHR_LEN: usize = 1;
/// The leading envelope byte carrying the channel.
pub const CHANNEL_LEN: usize = 1;

/// `MAX_PHY_PACKET_SIZE` in the original source — the buffer/assertion
/// bound on MPDU size, independent of whether the PHR's 7-bit length field
/// can represent it (see `PHR_MAX_FRAME_LENGTH`).
pub const MAX_MPDU_SIZE: usize = 256;

/// The PHR's frame-length field is 7 bits wide, so only `0..=127` is
/// representable on the wire when `skip_shr_phr` is false.
pub const PHR_MAX_FRAME_LENGTH: usize = 0x7F;

fn is_reserved_frame_length(len: u8) -> bool {
    matches!(len, 0..=4 | 6 | 7)
}

/// Assembles and parses RF frame envelopes for one radio.
#[derive(Debug, Clone, Copy)]
pub struct FrameBuilder {
    /// When true, `encode`/`decode` omit the SHR/PHR and carry only
    /// `channel | PSDU`.
    pub skip_shr_phr: bool,
}

impl FrameBuilder {
    pub const fn new(skip_shr_phr: bool) -> Self {
        Self { skip_shr_phr }
    }

    /// Assemble a `channel | [SHR | PHR] | MPDU` envelope, writing into
    /// `out`. Returns the number of bytes written.
    pub fn encode(&self, channel: u8, mpdu: &[u8], out: &mut [u8]) -> Result<usize> {
        if mpdu.len() > MAX_MPDU_SIZE {
            return Err(RadioError::PayloadTooLarge(mpdu.len()));
        }

        out[0] = channel;

        if self.skip_shr_phr {
            out[CHANNEL_LEN..CHANNEL_LEN + mpdu.len()].copy_from_slice(mpdu);
            return Ok(CHANNEL_LEN + mpdu.len());
        }

        if mpdu.len() > PHR_MAX_FRAME_LENGTH {
            return Err(RadioError::PayloadTooLarge(mpdu.len()));
        }
        if is_reserved_frame_length(mpdu.len() as u8) {
            return Err(RadioError::ReservedFrameLength(mpdu.len() as u8));
        }

        let shr_start = CHANNEL_LEN;
        let phr_start = shr_start + SHR_LEN;
        let psdu_start = phr_start + PHR_LEN;
        let total = psdu_start + mpdu.len();

        out[shr_start..shr_start + PREAMBLE.len()].copy_from_slice(&PREAMBLE);
        out[shr_start + PREAMBLE.len()] = SFD;
        // Reserved bit cleared; frame length occupies the low 7 bits.
        out[phr_start] = mpdu.len() as u8 & 0x7F;
        out[psdu_start..total].copy_from_slice(mpdu);
        Ok(total)
    }

    /// Parse an envelope down to its `(channel, mpdu)` pair.
    ///
    /// When `skip_shr_phr` is false, the preamble and SFD are validated
    /// but not returned; a mismatch there is treated as noise on the
    /// medium rather than a fault, per `processRfFrame`'s drop-on-bad-SFD
    /// behavior, so it surfaces as `None` rather than an `Err`.
    pub fn decode<'a>(&self, envelope: &'a [u8]) -> Result<Option<(u8, &'a [u8])>> {
        if envelope.is_empty() {
            return Ok(None);
        }
        let channel = envelope[0];
        let rest = &envelope[CHANNEL_LEN..];

        if self.skip_shr_phr {
            return Ok(Some((channel, rest)));
        }

        if rest.len() < SHR_LEN + PHR_LEN {
            return Ok(None);
        }
        if rest[..PREAMBLE.len()] != PREAMBLE || rest[PREAMBLE.len()] != SFD {
            return Ok(None);
        }

        let phr = rest[SHR_LEN];
        let frame_length = phr & 0x7F;
        if is_reserved_frame_length(frame_length) {
            return Err(RadioError::ReservedFrameLength(frame_length));
        }

        let start = SHR_LEN + PHR_LEN;
        let end = start + frame_length as usize;
        if end > rest.len() {
            return Ok(None);
        }
        Ok(Some((channel, &rest[start..end])))
    }
}
