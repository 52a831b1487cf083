//! Periodic processing for a [`RadioCore`]: the cooperative tick and the
//! worker-thread mode from spec.md §4.F.
//!
//! Ported from `virtual154Radio.c: processingThread` and the
//! `virtual154Radio_Meta_processingLoop`/`runProcessingThread` entry points.
//! Both modes do the same two things on every iteration — expire the
//! outstanding ACK, then (if the radio is in `Rx`) read one frame off the
//! medium and dispatch it — the only difference is whether the read blocks.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::Result;
use crate::radio::{RadioCore, RadioState};

/// How long the worker thread sleeps between non-blocking polls once it's
/// confirmed nothing is pending. Short enough that ACK timeouts (100 µs by
/// default) and incoming frames are still noticed promptly, long enough
/// that the loop doesn't needlessly pin a core in the idle case.
const POLL_INTERVAL: Duration = Duration::from_micros(50);

/// One cooperative-tick step. Call this repeatedly from the host's main
/// loop: it never blocks, matching `virtual154Radio_Meta_processingLoop`.
///
/// `scratch` is reused across calls by the caller to avoid a per-tick
/// allocation; its contents outside `0..len` of the last receive are
/// meaningless.
pub fn processing_loop(radio: &mut RadioCore, scratch: &mut [u8]) -> Result<()> {
    radio.check_ack_timeout();
    if radio.state() != RadioState::Rx {
        return Ok(());
    }
    radio.poll_once(scratch)
}

/// `RadioCore` guarded by a mutex, so one worker thread can own the polling
/// loop while the host thread still calls `send_data` and the config
/// setters in between the worker's polls. Spec.md §5/§9 call this out as
/// the systems-language answer to "should add a mutex" rather than a
/// lock-free direct port; see DESIGN.md's "Concurrency model" Open
/// Question.
#[derive(Clone)]
pub struct LockedRadioCore(Arc<Mutex<RadioCore>>);

impl LockedRadioCore {
    pub fn new(radio: RadioCore) -> Self {
        Self(Arc::new(Mutex::new(radio)))
    }

    /// Run a closure with exclusive access to the underlying `RadioCore`,
    /// e.g. to call `send_data` or a config setter from the host thread
    /// between the worker thread's (if spawned) short-lived polls.
    pub fn with<R>(&self, f: impl FnOnce(&mut RadioCore) -> R) -> R {
        let mut guard = self.0.lock().expect("RadioCore mutex poisoned");
        f(&mut guard)
    }

    /// Spawn one worker thread that loops forever: expire the ACK timeout,
    /// then — whenever the radio is in `Rx` — do a non-blocking read off the
    /// medium and dispatch whatever arrived. Never joined; process teardown
    /// kills it, matching the source's detached `pthread_create`.
    ///
    /// This deliberately does *not* use `RadioCore::poll_forever`'s
    /// `WAIT_FOREVER` receive: that would mean parking inside
    /// `MediumEndpoint::receive_blocking` while still holding the mutex,
    /// locking the host thread out of `send_data`/the config setters for
    /// as long as no datagram arrives — exactly the liveness hazard this
    /// wrapper exists to avoid. Instead each iteration takes the lock only
    /// for a quick non-blocking `poll_once`, releases it, and sleeps a short
    /// interval before the next attempt.
    pub fn run_processing_thread(&self, rx_buffer_capacity: usize) -> JoinHandle<()> {
        let locked = self.clone();
        thread::spawn(move || {
            let mut scratch = vec![0u8; rx_buffer_capacity];
            loop {
                locked.with(|radio| radio.check_ack_timeout());

                let in_rx = locked.with(|radio| radio.state() == RadioState::Rx);
                if !in_rx {
                    thread::sleep(POLL_INTERVAL);
                    continue;
                }

                let result = locked.with(|radio| radio.poll_once(&mut scratch));
                if let Err(e) = result {
                    log::error!("radio processing thread: {e}");
                    break;
                }
                thread::sleep(POLL_INTERVAL);
            }
        })
    }
}
