//! Process-wide state behind the client stack's argument-less hooks.
//!
//! IoTivity-lite keeps the `oc_handler_t` it is initialised with for as long as it runs and calls
//! its hooks without arguments. The hooks are therefore fixed trampolines, and what they act on
//! (identity, event-loop signal, requests entry) lives in the slots here, claimed for one running
//! stack at a time.
#![cfg_attr(not(feature = "iotivity-lite"), allow(dead_code))]

use std::ffi::CString;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// `oc_clock_time_t` on the Linux port.
pub type OcClockTime = u64;

/// Clock ticks per second on the Linux port (`CLOCKS_PER_SEC`).
pub const OC_CLOCK_SECOND: OcClockTime = 1_000_000;

/// Failure bringing the client stack up.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("stack initialisation failed ({0})")]
    InitFailed(i32),
    #[error("stack already running in this process")]
    AlreadyRunning,
    #[error("identity string contains NUL: {0}")]
    InvalidIdentity(#[from] std::ffi::NulError),
}

/// Platform and device identity announced by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackIdentity {
    pub(crate) platform_name: CString,
    pub(crate) device_name: CString,
    pub(crate) device_type: CString,
}

impl StackIdentity {
    pub fn new(platform_name: &str, device_name: &str, device_type: &str) -> Result<Self, FrameworkError> {
        Ok(Self {
            platform_name: CString::new(platform_name)?,
            device_name: CString::new(device_name)?,
            device_type: CString::new(device_type)?,
        })
    }
}

type SignalFn = Box<dyn Fn() + Send + Sync>;
type RequestsEntry = unsafe extern "C" fn();

struct Slots {
    running: bool,
    identity: Option<StackIdentity>,
    signal: Option<SignalFn>,
    requests_entry: Option<RequestsEntry>,
}

static SLOTS: Mutex<Slots> = Mutex::new(Slots {
    running: false,
    identity: None,
    signal: None,
    requests_entry: None,
});

fn slots() -> std::sync::MutexGuard<'static, Slots> {
    SLOTS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fill the slots for a stack about to start. Fails if another stack holds them.
pub(crate) fn claim(
    identity: StackIdentity,
    signal: SignalFn,
    requests_entry: Option<RequestsEntry>,
) -> Result<(), FrameworkError> {
    let mut s = slots();
    if s.running {
        return Err(FrameworkError::AlreadyRunning);
    }
    *s = Slots {
        running: true,
        identity: Some(identity),
        signal: Some(signal),
        requests_entry,
    };
    Ok(())
}

/// Empty every slot; after this a new stack may claim them.
pub(crate) fn release() {
    *slots() = Slots {
        running: false,
        identity: None,
        signal: None,
        requests_entry: None,
    };
}

#[cfg(test)]
pub(crate) fn is_claimed() -> bool {
    slots().running
}

/// Copy of the claimed identity; the stack's `init` hook reads it without holding the slots.
pub(crate) fn current_identity() -> Option<StackIdentity> {
    slots().identity.clone()
}

/// `signal_event_loop` hook: runs the signal of the stack holding the slots.
pub(crate) unsafe extern "C" fn signal_event_loop() {
    if let Some(signal) = slots().signal.as_ref() {
        signal();
    }
}

/// `requests_entry` hook: runs the entry the stack was started with, if any.
pub(crate) unsafe extern "C" fn requests_entry() {
    // Copied out so the entry can start discovery without holding the slots.
    let entry = slots().requests_entry;
    if let Some(entry) = entry {
        entry();
    }
}

/// Delay from `now` until the timer due at `next`. `next == 0` means nothing is scheduled.
pub fn ticks_until(next: OcClockTime, now: OcClockTime) -> Option<Duration> {
    if next == 0 {
        return None;
    }
    let ticks = next.saturating_sub(now);
    let secs = ticks / OC_CLOCK_SECOND;
    let rem = ticks % OC_CLOCK_SECOND;
    Some(Duration::from_secs(secs) + Duration::from_nanos(rem * 1_000_000_000 / OC_CLOCK_SECOND))
}
