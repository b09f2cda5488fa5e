//! C ABI for linking oc-bridge-core as a static library from C, Crystal or other FFI hosts.
//! The host creates a registration handle, fills its slots, then issues requests through it or
//! activates it for the framework's argument-less `requests_entry` hook.

use std::ffi::c_void;
use std::os::raw::{c_char, c_int};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::context::{Registration, ShimContext};
use crate::framework::{DeviceFramework, DeviceHandle};
use crate::handler::{DiscoveryAllHandler, DiscoveryHandler};
use crate::mmem::{string_to_plain_text, OcString};

/// Version of this C ABI.
pub const BRIDGE_ABI_VERSION: u32 = 1;

/// Context served by the argument-less `issue_requests` hook.
static ACTIVE: Mutex<Option<ShimContext>> = Mutex::new(None);

/// Returns the C ABI version. Used so the staticlib exports a C symbol and is linkable.
#[no_mangle]
pub extern "C" fn oc_bridge_version() -> u32 {
    BRIDGE_ABI_VERSION
}

/// Create an empty registration. Returns opaque handle.
#[no_mangle]
pub extern "C" fn oc_bridge_context_create() -> *mut c_void {
    Box::into_raw(Box::new(Registration::new())) as *mut c_void
}

/// Destroy a registration. No-op if h is null. Does not touch the active context.
#[no_mangle]
pub extern "C" fn oc_bridge_context_destroy(h: *mut c_void) {
    if h.is_null() {
        return;
    }
    let _ = unsafe { Box::from_raw(h as *mut Registration) };
}

/// Assign the device handle. Returns 0 on success, -1 if h or device is null.
#[no_mangle]
pub extern "C" fn oc_bridge_set_device(h: *mut c_void, device: *mut c_void) -> c_int {
    if h.is_null() {
        return -1;
    }
    let Some(device) = DeviceHandle::from_raw(device) else {
        return -1;
    };
    let reg = unsafe { &mut *(h as *mut Registration) };
    reg.set_device(device);
    0
}

/// Assign the typed discovery callback. Returns 0 on success, -1 if h or handler is null.
#[no_mangle]
pub extern "C" fn oc_bridge_set_discovery_handler(h: *mut c_void, handler: Option<DiscoveryHandler>) -> c_int {
    let Some(handler) = handler else {
        return -1;
    };
    if h.is_null() {
        return -1;
    }
    let reg = unsafe { &mut *(h as *mut Registration) };
    reg.set_discovery_handler(handler);
    0
}

/// Assign the discover-all callback. Returns 0 on success, -1 if h or handler is null.
#[no_mangle]
pub extern "C" fn oc_bridge_set_discovery_all_handler(
    h: *mut c_void,
    handler: Option<DiscoveryAllHandler>,
) -> c_int {
    let Some(handler) = handler else {
        return -1;
    };
    if h.is_null() {
        return -1;
    }
    let reg = unsafe { &mut *(h as *mut Registration) };
    reg.set_discovery_all_handler(handler);
    0
}

/// Returns 1 if device and discover-all callback are assigned, 0 if not, -1 if h is null.
#[no_mangle]
pub extern "C" fn oc_bridge_is_ready(h: *const c_void) -> c_int {
    if h.is_null() {
        return -1;
    }
    let reg = unsafe { &*(h as *const Registration) };
    reg.is_ready() as c_int
}

/// Make h's current slots the context `issue_requests` serves. Later changes to h are not seen
/// until it is activated again. Returns 0 on success, -1 if h is null or not ready.
#[no_mangle]
pub extern "C" fn oc_bridge_activate(h: *const c_void) -> c_int {
    if h.is_null() {
        return -1;
    }
    let reg = unsafe { &*(h as *const Registration) };
    match reg.ready() {
        Ok(ctx) => {
            *ACTIVE.lock().unwrap_or_else(PoisonError::into_inner) = Some(ctx);
            0
        }
        Err(e) => {
            warn!(error = %e, "cannot activate registration");
            -1
        }
    }
}

/// Clear the active context.
#[no_mangle]
pub extern "C" fn oc_bridge_deactivate() {
    *ACTIVE.lock().unwrap_or_else(PoisonError::into_inner) = None;
}

/// Plain NUL-terminated text of a managed string, pointing into the string's own storage.
/// Valid only while the managed string is alive and unmodified. Null for an unallocated string.
#[no_mangle]
pub extern "C" fn oc_bridge_string_to_plain_text(string: OcString) -> *const c_char {
    string_to_plain_text(&string)
}

/// Same as [`oc_bridge_string_to_plain_text`], under the name existing integration layers bind.
#[no_mangle]
pub extern "C" fn mmem_to_cstring(string: OcString) -> *const c_char {
    string_to_plain_text(&string)
}

/// Issue a discover-all request from h. Returns 0 on success, -1 if h is null or not ready.
#[cfg(feature = "iotivity-lite")]
#[no_mangle]
pub extern "C" fn oc_bridge_issue_requests(h: *const c_void) -> c_int {
    if h.is_null() {
        return -1;
    }
    let reg = unsafe { &*(h as *const Registration) };
    issue_with(reg, &crate::iotivity::Linked)
}

/// `requests_entry` hook: issue a discover-all request from the active context.
/// Logs and does nothing if no context is active.
#[cfg(feature = "iotivity-lite")]
#[no_mangle]
pub extern "C" fn issue_requests() {
    issue_active(&crate::iotivity::Linked);
}

#[cfg_attr(not(feature = "iotivity-lite"), allow(dead_code))]
fn issue_with<F: DeviceFramework + ?Sized>(reg: &Registration, framework: &F) -> c_int {
    match reg.issue_requests(framework) {
        Ok(()) => 0,
        Err(e) => {
            warn!(error = %e, "issue_requests refused");
            -1
        }
    }
}

#[cfg_attr(not(feature = "iotivity-lite"), allow(dead_code))]
fn issue_active<F: DeviceFramework + ?Sized>(framework: &F) -> c_int {
    let active = *ACTIVE.lock().unwrap_or_else(PoisonError::into_inner);
    match active {
        Some(ctx) => {
            ctx.issue_requests(framework);
            0
        }
        None => {
            warn!("issue_requests called with no active context");
            -1
        }
    }
}
