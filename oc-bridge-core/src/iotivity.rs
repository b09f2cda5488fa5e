//! IoTivity-lite backend: the C entry points the shim forwards to, and the client stack
//! lifecycle (init, poll, shutdown) a Rust host needs around them.
//!
//! The stack's handler hooks take no arguments, so the identity, the event-loop signal and the
//! requests entry live in the process-wide slots of [`crate::hooks`]. One stack per process.

use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::framework::{DeviceFramework, DeviceHandle};
use crate::handler::{DiscoveryAllHandler, DiscoveryHandler};
use crate::hooks::{self, OcClockTime};
use crate::hooks::{FrameworkError, StackIdentity};

const DEVICE_URI: &[u8] = b"/oic/d\0";
const SPEC_VERSION: &[u8] = b"ocf.1.0.0\0";
const DATA_MODEL_VERSION: &[u8] = b"ocf.res.1.0.0\0";

/// `oc_handler_t` for a library built with both OC_SERVER and OC_CLIENT.
#[repr(C)]
struct OcHandler {
    init: Option<unsafe extern "C" fn() -> c_int>,
    signal_event_loop: Option<unsafe extern "C" fn()>,
    register_resources: Option<unsafe extern "C" fn()>,
    requests_entry: Option<unsafe extern "C" fn()>,
}

type InitCallback = Option<unsafe extern "C" fn(data: *mut c_void)>;

extern "C" {
    fn oc_do_ip_discovery_all(handler: DiscoveryAllHandler, user_data: *mut c_void) -> bool;
    fn oc_do_ip_discovery(rt: *const c_char, handler: DiscoveryHandler, user_data: *mut c_void) -> bool;
    fn oc_main_init(handler: *const OcHandler) -> c_int;
    fn oc_main_poll() -> OcClockTime;
    fn oc_main_shutdown();
    fn oc_clock_time() -> OcClockTime;
    fn oc_init_platform(mfg_name: *const c_char, init_platform_cb: InitCallback, data: *mut c_void) -> c_int;
    fn oc_add_device(
        uri: *const c_char,
        rt: *const c_char,
        name: *const c_char,
        spec_version: *const c_char,
        data_model_version: *const c_char,
        add_device_cb: InitCallback,
        data: *mut c_void,
    ) -> c_int;
}

/// Handler the stack is initialised with. The stack keeps this pointer until shutdown, so it
/// must be static; the hooks it names reach the running stack through [`hooks`].
static HANDLER: OcHandler = OcHandler {
    init: Some(app_init),
    signal_event_loop: Some(hooks::signal_event_loop),
    register_resources: None,
    requests_entry: Some(hooks::requests_entry),
};

unsafe extern "C" fn app_init() -> c_int {
    let Some(id) = hooks::current_identity() else {
        return -1;
    };
    let ret = oc_init_platform(id.platform_name.as_ptr(), None, ptr::null_mut());
    if ret != 0 {
        error!(ret, "oc_init_platform failed");
        return ret;
    }
    oc_add_device(
        DEVICE_URI.as_ptr().cast(),
        id.device_type.as_ptr(),
        id.device_name.as_ptr(),
        SPEC_VERSION.as_ptr().cast(),
        DATA_MODEL_VERSION.as_ptr().cast(),
        None,
        ptr::null_mut(),
    )
}

/// The running IoTivity-lite client stack. Dropping it shuts the stack down.
#[derive(Debug)]
pub struct IotivityLite {
    _private: (),
}

impl IotivityLite {
    /// Bring the stack up. `signal` runs whenever the stack wants its loop polled again;
    /// `requests_entry` (e.g. [`crate::ffi::issue_requests`]) runs once the client is ready.
    pub fn start(
        identity: StackIdentity,
        signal: impl Fn() + Send + Sync + 'static,
        requests_entry: Option<unsafe extern "C" fn()>,
    ) -> Result<Self, FrameworkError> {
        hooks::claim(identity, Box::new(signal), requests_entry)?;
        let ret = unsafe { oc_main_init(&HANDLER) };
        if ret < 0 {
            hooks::release();
            return Err(FrameworkError::InitFailed(ret));
        }
        info!("IoTivity-lite client stack started");
        Ok(Self { _private: () })
    }

    /// Run due work. Returns the delay until the next timer, or `None` if nothing is scheduled.
    pub fn poll(&self) -> Option<Duration> {
        let next = unsafe { oc_main_poll() };
        if next == 0 {
            return None;
        }
        hooks::ticks_until(next, unsafe { oc_clock_time() })
    }
}

impl Drop for IotivityLite {
    fn drop(&mut self) {
        unsafe { oc_main_shutdown() };
        hooks::release();
        info!("IoTivity-lite client stack stopped");
    }
}

impl DeviceFramework for IotivityLite {
    fn discover_all_ip(&self, handler: DiscoveryAllHandler, device: DeviceHandle) -> bool {
        Linked.discover_all_ip(handler, device)
    }

    fn discover_ip(&self, resource_type: &CStr, handler: DiscoveryHandler, device: DeviceHandle) -> bool {
        Linked.discover_ip(resource_type, handler, device)
    }
}

/// Direct calls into the linked library, for hosts that run the stack themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linked;

impl DeviceFramework for Linked {
    fn discover_all_ip(&self, handler: DiscoveryAllHandler, device: DeviceHandle) -> bool {
        let ok = unsafe { oc_do_ip_discovery_all(handler, device.as_ptr()) };
        debug!(ok, "oc_do_ip_discovery_all");
        ok
    }

    fn discover_ip(&self, resource_type: &CStr, handler: DiscoveryHandler, device: DeviceHandle) -> bool {
        let ok = unsafe { oc_do_ip_discovery(resource_type.as_ptr(), handler, device.as_ptr()) };
        if !ok {
            warn!(?resource_type, "oc_do_ip_discovery failed");
        }
        ok
    }
}
