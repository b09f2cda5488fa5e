//! The seam to the external device framework: the handle it owns and the discovery calls the shim forwards.

use std::ffi::{c_void, CStr};
use std::ptr::NonNull;

use crate::handler::{DiscoveryAllHandler, DiscoveryHandler};

/// Non-owning reference to a framework device context. Handed back to the framework as the
/// discovery `user_data`; the shim never dereferences or frees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(NonNull<c_void>);

// Only the address crosses threads; the shim never reads through it.
unsafe impl Send for DeviceHandle {}
unsafe impl Sync for DeviceHandle {}

impl DeviceHandle {
    /// `None` if `ptr` is null.
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Handle to a Rust value the callbacks will read back through `user_data`.
    pub fn from_ref<T>(value: &T) -> Self {
        Self(NonNull::from(value).cast())
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Discovery entry points of the framework.
pub trait DeviceFramework {
    /// Discover every resource reachable over IP (`oc_do_ip_discovery_all`).
    /// Returns whether the framework accepted the request.
    fn discover_all_ip(&self, handler: DiscoveryAllHandler, device: DeviceHandle) -> bool;

    /// Discover resources of one type over IP (`oc_do_ip_discovery`).
    fn discover_ip(&self, resource_type: &CStr, handler: DiscoveryHandler, device: DeviceHandle) -> bool;
}
