//! `RadioCore`: the 802.15.4 state machine, configuration, TX path, RX
//! dispatch, and ACK-response generator.
//!
//! Ported from `virtual154Radio.c` in full. Orchestrates [`crate::frame`],
//! [`crate::filter`], and [`crate::ack`] over a [`crate::medium::MediumEndpoint`]
//! it owns outright — the source borrows a pointer to the medium from
//! `RadioMetaConfig`; here the medium moves into `RadioCore` by value
//! instead (see DESIGN.md "Ownership").

use std::time::Instant;

use crate::ack::{AckStatus as AckOutcome, AckTracker, DEFAULT_ACK_TIMEOUT};
use crate::error::{RadioError, Result};
use crate::filter::Filter;
use crate::frame::{FrameBuilder, MAX_MPDU_SIZE};
use crate::mac_frame::{FrameCodec, FrameType, MacFrame};
use crate::medium::MediumEndpoint;

/// `{ rx_sensitivity_dbm, eui64, skip_shr_phr }` from spec.md §3 —
/// everything in `RadioMetaConfig` except the medium handle, which
/// `RadioCore` now owns directly.
#[derive(Debug, Clone, Copy)]
pub struct RadioMetaConfig {
    pub rx_sensitivity_dbm: i8,
    pub eui64: [u8; 8],
    pub skip_shr_phr: bool,
}

/// `{ INVALID=-1, DISABLED=0, SLEEP=1, RX=2, TX=3 }` from spec.md §3.
/// `Invalid` exists only as a construction-time placeholder; `init()`
/// always leaves the radio in `Disabled`, so it's never observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum RadioState {
    Invalid = -1,
    Disabled = 0,
    Sleep = 1,
    Rx = 2,
    Tx = 3,
}

/// Outcome delivered to a registered `tx_done` callback. Only `Ok` is ever
/// emitted by this implementation — no CSMA/CA or abort path exists — but
/// the full enum is kept so callers pattern-match exhaustively against the
/// real protocol surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum TxStatus {
    Ok = 0,
    CsmaFailed = -1,
    TxAborted = -2,
    GenericError = -3,
}

/// Outcome delivered to a registered `rx_done` callback. Only `Ok` is ever
/// emitted — there is no allocation path that can fail — but `NoMemory` is
/// kept for the same reason as `TxStatus`'s dormant variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum RxStatus {
    Ok = 0,
    NoMemory = -1,
}

/// Outcome delivered to a registered `ack_done` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum AckCallbackStatus {
    Ok = 0,
    Timeout = -1,
}

const ACK_MPDU_LEN: usize = 5;
const DEFAULT_PAN_ID: u16 = 0x4321;
const DEFAULT_EXT_ADDR: u64 = 0xACDE_4800_0000_0002;
const DEFAULT_CHANNEL: u8 = 11;
const CHANNEL_RANGE: std::ops::RangeInclusive<u8> = 11..=26;

type TxDoneCallback = Box<dyn FnMut(TxStatus) + Send>;
type RxDoneCallback = Box<dyn FnMut(RxStatus, &[u8]) + Send>;
type AckDoneCallback = Box<dyn FnMut(AckCallbackStatus, Option<&[u8]>) + Send>;

#[derive(Default)]
struct Callbacks {
    tx_done: Option<TxDoneCallback>,
    rx_done: Option<RxDoneCallback>,
    ack_done: Option<AckDoneCallback>,
}

/// The radio: configuration fields, the `{Disabled,Sleep,Rx,Tx}` state
/// machine, the TX path, and RX dispatch.
pub struct RadioCore {
    meta: RadioMetaConfig,
    medium: MediumEndpoint,
    frame: FrameBuilder,

    pub pan_id: u16,
    pub short_addr: u16,
    pub ext_addr: u64,
    pub tx_power_dbm: i8,
    pub cca_ed_threshold_dbm: i8,
    pub lna_gain_dbm: i8,
    pub promiscuous: bool,
    channel: u8,

    state: RadioState,
    ack: AckTracker,
    sequence_number: u8,

    callbacks: Callbacks,
}

impl RadioCore {
    /// `init()`. Sets every field to the defaults in spec.md §3 and
    /// leaves the radio `Disabled`.
    pub fn init(meta: RadioMetaConfig, medium: MediumEndpoint) -> Self {
        Self {
            frame: FrameBuilder::new(meta.skip_shr_phr),
            meta,
            medium,
            pan_id: DEFAULT_PAN_ID,
            short_addr: 0x0000,
            ext_addr: DEFAULT_EXT_ADDR,
            tx_power_dbm: 0,
            cca_ed_threshold_dbm: -71,
            lna_gain_dbm: 0,
            promiscuous: false,
            channel: DEFAULT_CHANNEL,
            state: RadioState::Disabled,
            ack: AckTracker::new(DEFAULT_ACK_TIMEOUT),
            sequence_number: 0,
            callbacks: Callbacks::default(),
        }
    }

    pub fn state(&self) -> RadioState {
        self.state
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Sets the RF-wire channel. Out-of-range values (outside `11..=26`)
    /// are a programming fault per spec.md §3, reported via `Result`
    /// rather than a hard panic, since range validation at this single
    /// call site is cheap to make recoverable without weakening the
    /// "caller bug" semantics of the other fatal conditions.
    pub fn set_channel(&mut self, channel: u8) -> Result<()> {
        if !CHANNEL_RANGE.contains(&channel) {
            return Err(RadioError::ChannelOutOfRange(channel));
        }
        self.channel = channel;
        Ok(())
    }

    pub fn ack_timeout_mut(&mut self) -> &mut std::time::Duration {
        &mut self.ack.timeout
    }

    pub fn on_tx_done(&mut self, callback: impl FnMut(TxStatus) + Send + 'static) {
        self.callbacks.tx_done = Some(Box::new(callback));
    }

    pub fn on_rx_done(&mut self, callback: impl FnMut(RxStatus, &[u8]) + Send + 'static) {
        self.callbacks.rx_done = Some(Box::new(callback));
    }

    pub fn on_ack_done(&mut self, callback: impl FnMut(AckCallbackStatus, Option<&[u8]>) + Send + 'static) {
        self.callbacks.ack_done = Some(Box::new(callback));
    }

    /// If currently `Disabled`, transition to `Sleep`. Otherwise a no-op.
    pub fn enable(&mut self) {
        if self.state == RadioState::Disabled {
            self.state = RadioState::Sleep;
        }
    }

    /// Transition to `Disabled` unconditionally, from any state. The
    /// source has a documented bug here (sets `Sleep`); see DESIGN.md.
    pub fn disable(&mut self) {
        self.state = RadioState::Disabled;
    }

    /// If `state ∈ {Sleep, Rx}`, transition to `Sleep` and return true.
    /// Otherwise return false without changing state.
    pub fn sleep(&mut self) -> bool {
        match self.state {
            RadioState::Sleep | RadioState::Rx => {
                self.state = RadioState::Sleep;
                true
            }
            _ => false,
        }
    }

    /// If `state != Disabled`, transition to `Rx` and return true.
    /// Otherwise return false.
    pub fn receive(&mut self) -> bool {
        if self.state == RadioState::Disabled {
            return false;
        }
        self.state = RadioState::Rx;
        true
    }

    /// TX path. Precondition: `state == Rx`; returns `false` without any
    /// state change otherwise. On success: arms the ACK tracker if
    /// requested, assembles and sends the RF envelope, fires `tx_done`,
    /// and returns to `Rx` (the brief `Tx` phase is internal to this
    /// call and never externally observable).
    pub fn send_data(&mut self, mpdu: &[u8]) -> Result<bool> {
        if self.state != RadioState::Rx {
            return Ok(false);
        }
        self.state = RadioState::Tx;

        let sent = self.transmit_mpdu(mpdu, true);
        self.state = RadioState::Rx;
        sent.map(|()| true)
    }

    /// Shared by `send_data` and the ACK-response path in `process_data`;
    /// `arm_ack` is false for ACK responses, which never themselves
    /// expect an ACK.
    fn transmit_mpdu(&mut self, mpdu: &[u8], arm_ack: bool) -> Result<()> {
        if arm_ack {
            if let Some(frame) = MacFrame::parse(mpdu) {
                if frame.ack_requested() {
                    self.ack.arm(frame.sequence_number(), Instant::now());
                }
            }
        }

        let mut envelope = [0u8; MAX_MPDU_SIZE + 16];
        let len = self.frame.encode(self.channel, mpdu, &mut envelope)?;
        self.medium.send_blocking(&envelope[..len])?;

        if let Some(tx_done) = self.callbacks.tx_done.as_mut() {
            tx_done(TxStatus::Ok);
        }
        Ok(())
    }

    /// Allocate and bump the next outgoing sequence number.
    pub fn next_sequence_number(&mut self) -> u8 {
        let seq = self.sequence_number;
        self.sequence_number = self.sequence_number.wrapping_add(1);
        seq
    }

    /// RX path entry point: decode the envelope, apply the channel
    /// filter, and dispatch by frame type.
    pub fn process_rf_frame(&mut self, datagram: &[u8]) -> Result<()> {
        if datagram.is_empty() {
            return Ok(());
        }

        let Some((frame_channel, mpdu)) = self.frame.decode(datagram)? else {
            return Ok(());
        };

        let filter = Filter {
            channel: self.channel,
            pan_id: self.pan_id,
            short_addr: self.short_addr,
            extended_addr: self.ext_addr,
            promiscuous: self.promiscuous,
        };
        if !filter.channel_matches(frame_channel) {
            return Ok(());
        }

        let Some(parsed) = MacFrame::parse(mpdu) else {
            return Ok(());
        };

        match parsed.frame_type() {
            FrameType::Beacon | FrameType::Cmd | FrameType::Other => {
                log::debug!("process_rf_frame: discarding unsupported frame type");
                Ok(())
            }
            FrameType::Data => self.process_data(&filter, &parsed, mpdu),
            FrameType::Ack => {
                if self.ack.is_armed() {
                    if let Some(outcome) = self.ack.on_frame(parsed.sequence_number()) {
                        self.fire_ack_callback(outcome, Some(mpdu));
                    }
                }
                Ok(())
            }
        }
    }

    /// `process_data(mpdu, size)`: filter (unless promiscuous), answer
    /// with an ACK if requested, then deliver to `rx_done`.
    fn process_data(&mut self, filter: &Filter, parsed: &MacFrame, mpdu: &[u8]) -> Result<()> {
        if !self.promiscuous && !filter.accepts(parsed) {
            return Ok(());
        }

        if parsed.ack_requested() {
            let ack = MacFrame::build_ack(parsed.sequence_number());
            debug_assert_eq!(ack.as_bytes().len(), ACK_MPDU_LEN);
            // ACK responses aren't themselves ACK-tracked, and don't
            // perturb the state machine beyond the transient Tx phase
            // already entered by the caller's own send_data, if any.
            self.transmit_mpdu(ack.as_bytes(), false)?;
        }

        if let Some(rx_done) = self.callbacks.rx_done.as_mut() {
            rx_done(RxStatus::Ok, mpdu);
        }
        Ok(())
    }

    fn fire_ack_callback(&mut self, outcome: AckOutcome, mpdu: Option<&[u8]>) {
        if let Some(ack_done) = self.callbacks.ack_done.as_mut() {
            match outcome {
                AckOutcome::Received => ack_done(AckCallbackStatus::Ok, mpdu),
                AckOutcome::TimedOut => ack_done(AckCallbackStatus::Timeout, None),
            }
        }
    }

    /// Checked by the driver on every tick: expire the outstanding ACK
    /// expectation, if any, and fire its callback.
    pub fn check_ack_timeout(&mut self) {
        if let Some(outcome) = self.ack.on_tick(Instant::now()) {
            self.fire_ack_callback(outcome, None);
        }
    }

    /// Non-blocking receive-and-dispatch: used by
    /// [`crate::driver::processing_loop`] and, under a lock taken only for
    /// this call, by [`crate::driver::LockedRadioCore::run_processing_thread`].
    pub fn poll_once(&mut self, scratch: &mut [u8]) -> Result<()> {
        if self.state != RadioState::Rx {
            return Ok(());
        }
        let received = self
            .medium
            .receive_blocking(scratch, crate::medium::DONT_WAIT)?;
        if received.len > 0 {
            self.process_rf_frame(&scratch[..received.len])?;
        }
        Ok(())
    }

    /// Blocking receive-and-dispatch, for a direct, lock-free single-owner
    /// port where the caller spawns its own thread and guarantees no other
    /// thread touches this `RadioCore` while it's parked here (spec.md §5's
    /// "single-owner in spirit" posture). `LockedRadioCore` does not use
    /// this — see its `run_processing_thread` doc comment for why holding
    /// the mutex across a `WAIT_FOREVER` receive would be a liveness bug.
    pub fn poll_forever(&mut self, scratch: &mut [u8]) -> Result<()> {
        if self.state != RadioState::Rx {
            return Ok(());
        }
        let received = self
            .medium
            .receive_blocking(scratch, crate::medium::WAIT_FOREVER)?;
        if received.len > 0 {
            self.process_rf_frame(&scratch[..received.len])?;
        }
        Ok(())
    }

    pub fn meta(&self) -> &RadioMetaConfig {
        &self.meta
    }
}
