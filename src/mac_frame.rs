//! `FrameCodec`: the seam `filter.rs` and `ack.rs` read MAC fields through,
//! plus one minimal conforming implementation.
//!
//! A MAC frame's exact layout (security header, frame-version negotiation,
//! information elements...) is explicitly out of scope — callers are
//! expected to bring their own codec matching the frame format their
//! firmware actually speaks. `MacFrame` below is *a* codec, not *the*
//! codec: standard addressing fields, no security, no frame-version
//! negotiation, grounded on Tock's `ieee802154::device` trait shape and
//! the plain Frame Control Field layout.

use crate::error::FieldError;

/// The Frame Control Field's frame-type subfield, per 802.15.4's known
/// values; anything else (reserved encodings) folds into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Beacon = 0b000,
    Data = 0b001,
    Ack = 0b010,
    Cmd = 0b011,
    Other = 0b111,
}

impl FrameType {
    fn from_fcf_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::Beacon,
            0b001 => Self::Data,
            0b010 => Self::Ack,
            0b011 => Self::Cmd,
            _ => Self::Other,
        }
    }
}

/// A short (16-bit) or extended (64-bit) IEEE 802.15.4 device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    Short(u16),
    Extended(u64),
}

/// Read access to the MAC fields `filter.rs`/`ack.rs` need, independent of
/// how a concrete frame format lays them out in bytes.
pub trait FrameCodec {
    fn frame_type(&self) -> FrameType;
    fn sequence_number(&self) -> u8;
    fn ack_requested(&self) -> bool;
    fn dest_pan_id(&self) -> Result<u16, FieldError>;
    fn dest_address(&self) -> Result<Address, FieldError>;
}

/// Frame Control Field bit layout (IEEE 802.15.4-2015 §7.2.2), the subset
/// this codec uses.
mod fcf {
    pub const DEST_ADDR_MODE_SHIFT: u8 = 10;
    pub const DEST_ADDR_MODE_MASK: u16 = 0b11;
    pub const ACK_REQUEST_BIT: u16 = 1 << 5;
    pub const PAN_ID_COMPRESSION_BIT: u16 = 1 << 6;
}

const ADDR_MODE_NONE: u16 = 0b00;
const ADDR_MODE_SHORT: u16 = 0b10;
const ADDR_MODE_EXTENDED: u16 = 0b11;

/// A minimal 802.15.4 MAC frame: FCF + sequence number + destination
/// PAN-ID + destination address + payload. No source addressing, no
/// security header, no information elements — enough to drive
/// `filter.rs` and `ack.rs`, nothing more.
#[derive(Debug, Clone)]
pub struct MacFrame {
    bytes: Vec<u8>,
}

impl MacFrame {
    /// Build a data or ACK frame addressed to `dest_addr` (or broadcast,
    /// via a short address of `0xFFFF`, if `dest_addr` is `None`).
    pub fn build_data(
        sequence_number: u8,
        dest_pan_id: u16,
        dest_addr: Option<Address>,
        ack_requested: bool,
        intra_pan: bool,
        payload: &[u8],
    ) -> Self {
        Self::build(FrameType::Data, sequence_number, dest_pan_id, dest_addr, ack_requested, intra_pan, payload)
    }

    /// Build a bare ACK frame: no addressing, no payload, matching a
    /// standard immediate acknowledgment. 5 bytes total — FCF(2) + sequence
    /// number(1) + a 2-byte FCS placeholder, left unset (zero) per spec.md
    /// §9's note that real FCS computation is an extension point this crate
    /// doesn't implement.
    pub fn build_ack(sequence_number: u8) -> Self {
        let fcf: u16 = FrameType::Ack as u16;
        let mut bytes = Vec::with_capacity(5);
        bytes.extend_from_slice(&fcf.to_le_bytes());
        bytes.push(sequence_number);
        bytes.extend_from_slice(&[0u8, 0u8]); // FCS placeholder
        Self { bytes }
    }

    fn build(
        frame_type: FrameType,
        sequence_number: u8,
        dest_pan_id: u16,
        dest_addr: Option<Address>,
        ack_requested: bool,
        intra_pan: bool,
        payload: &[u8],
    ) -> Self {
        let addr_mode = match dest_addr {
            None => ADDR_MODE_NONE,
            Some(Address::Short(_)) => ADDR_MODE_SHORT,
            Some(Address::Extended(_)) => ADDR_MODE_EXTENDED,
        };

        let mut fcf: u16 = frame_type as u16;
        if ack_requested {
            fcf |= fcf::ACK_REQUEST_BIT;
        }
        if intra_pan {
            fcf |= fcf::PAN_ID_COMPRESSION_BIT;
        }
        fcf |= addr_mode << fcf::DEST_ADDR_MODE_SHIFT;

        let mut bytes = Vec::with_capacity(9 + payload.len());
        bytes.extend_from_slice(&fcf.to_le_bytes());
        bytes.push(sequence_number);

        if addr_mode != ADDR_MODE_NONE {
            bytes.extend_from_slice(&dest_pan_id.to_le_bytes());
            match dest_addr {
                Some(Address::Short(short)) => bytes.extend_from_slice(&short.to_le_bytes()),
                Some(Address::Extended(ext)) => bytes.extend_from_slice(&ext.to_le_bytes()),
                None => unreachable!("addr_mode != NONE implies dest_addr is Some"),
            }
        }

        bytes.extend_from_slice(payload);
        Self { bytes }
    }

    /// Parse a frame from wire bytes. No validation beyond length
    /// bounds — a truncated frame yields `None`, matching `decode`'s
    /// noise-not-error treatment in `frame.rs`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 3 {
            return None;
        }
        Some(Self { bytes: bytes.to_vec() })
    }

    pub fn payload(&self) -> &[u8] {
        let addr_mode = self.dest_addr_mode();
        let header_len = match addr_mode {
            ADDR_MODE_NONE => 3,
            ADDR_MODE_SHORT => 3 + 2 + 2,
            ADDR_MODE_EXTENDED => 3 + 2 + 8,
            _ => 3,
        };
        if self.bytes.len() <= header_len {
            &[]
        } else {
            &self.bytes[header_len..]
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn fcf(&self) -> u16 {
        u16::from_le_bytes([self.bytes[0], self.bytes[1]])
    }

    fn dest_addr_mode(&self) -> u16 {
        (self.fcf() >> fcf::DEST_ADDR_MODE_SHIFT) & fcf::DEST_ADDR_MODE_MASK
    }
}

impl FrameCodec for MacFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::from_fcf_bits(self.fcf() as u8)
    }

    fn sequence_number(&self) -> u8 {
        self.bytes[2]
    }

    fn ack_requested(&self) -> bool {
        self.fcf() & fcf::ACK_REQUEST_BIT != 0
    }

    fn dest_pan_id(&self) -> Result<u16, FieldError> {
        if self.dest_addr_mode() == ADDR_MODE_NONE {
            return Err(FieldError::Absent);
        }
        Ok(u16::from_le_bytes([self.bytes[3], self.bytes[4]]))
    }

    fn dest_address(&self) -> Result<Address, FieldError> {
        match self.dest_addr_mode() {
            ADDR_MODE_NONE => Err(FieldError::Absent),
            ADDR_MODE_SHORT => Ok(Address::Short(u16::from_le_bytes([
                self.bytes[5],
                self.bytes[6],
            ]))),
            ADDR_MODE_EXTENDED => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&self.bytes[5..13]);
                Ok(Address::Extended(u64::from_le_bytes(buf)))
            }
            _ => Err(FieldError::Absent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_parses_short_addressed_data_frame() {
        let frame = MacFrame::build_data(7, 0x2137, Some(Address::Short(0x1234)), true, true, b"hi");
        assert_eq!(frame.frame_type(), FrameType::Data);
        assert_eq!(frame.sequence_number(), 7);
        assert!(frame.ack_requested());
        assert_eq!(frame.dest_pan_id().unwrap(), 0x2137);
        assert_eq!(frame.dest_address().unwrap(), Address::Short(0x1234));
        assert_eq!(frame.payload(), b"hi");
    }

    #[test]
    fn broadcast_short_address_round_trips() {
        let frame = MacFrame::build_data(1, 0x2137, Some(Address::Short(0xFFFF)), false, true, b"x");
        assert_eq!(frame.dest_address().unwrap(), Address::Short(0xFFFF));
    }

    #[test]
    fn extended_address_round_trips() {
        let frame = MacFrame::build_data(1, 0x2137, Some(Address::Extended(0x0011223344556677)), false, false, &[]);
        assert_eq!(
            frame.dest_address().unwrap(),
            Address::Extended(0x0011223344556677)
        );
    }

    #[test]
    fn ack_frame_has_no_addressing() {
        let frame = MacFrame::build_ack(42);
        assert_eq!(frame.frame_type(), FrameType::Ack);
        assert_eq!(frame.sequence_number(), 42);
        assert!(matches!(frame.dest_pan_id(), Err(FieldError::Absent)));
    }

    #[test]
    fn parse_rejects_truncated_bytes() {
        assert!(MacFrame::parse(&[0x01]).is_none());
    }

    #[test]
    fn parse_round_trips_through_as_bytes() {
        let built = MacFrame::build_data(3, 0x2137, Some(Address::Short(0x0420)), true, true, b"payload");
        let parsed = MacFrame::parse(built.as_bytes()).unwrap();
        assert_eq!(parsed.dest_address().unwrap(), Address::Short(0x0420));
        assert_eq!(parsed.payload(), b"payload");
    }
}
