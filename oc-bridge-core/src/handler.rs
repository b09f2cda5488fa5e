//! Discovery callback signatures and the value types they carry, laid out as oc_client_state.h declares them.

use std::ffi::c_void;
use std::os::raw::{c_char, c_int};

use bitflags::bitflags;

use crate::mmem::OcStringArray;

/// Opaque `oc_endpoint_t`. Only handled behind a pointer.
#[repr(C)]
pub struct OcEndpoint {
    _private: [u8; 0],
}

/// `oc_discovery_flags_t`: what a handler tells the framework after each result.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryFlags(c_int);

impl DiscoveryFlags {
    pub const STOP: Self = Self(0);
    pub const CONTINUE: Self = Self(1);

    pub fn is_continue(self) -> bool {
        self.0 != 0
    }
}

bitflags! {
    /// `oc_interface_mask_t`.
    #[repr(transparent)]
    pub struct InterfaceMask: u32 {
        const BASELINE = 1 << 1;
        const LL = 1 << 2;
        const B = 1 << 3;
        const R = 1 << 4;
        const RW = 1 << 5;
        const A = 1 << 6;
        const S = 1 << 7;
        const CREATE = 1 << 8;
    }
}

bitflags! {
    /// `oc_resource_properties_t`.
    #[repr(transparent)]
    pub struct ResourceProperties: u32 {
        const DISCOVERABLE = 1 << 0;
        const OBSERVABLE = 1 << 1;
        const SECURE = 1 << 4;
        const PERIODIC = 1 << 6;
    }
}

/// `oc_discovery_handler_t`: one call per resource found by a typed discovery.
pub type DiscoveryHandler = unsafe extern "C" fn(
    anchor: *const c_char,
    uri: *const c_char,
    types: OcStringArray,
    iface_mask: InterfaceMask,
    endpoint: *const OcEndpoint,
    bm: ResourceProperties,
    user_data: *mut c_void,
) -> DiscoveryFlags;

/// `oc_discovery_all_handler_t`: like [`DiscoveryHandler`], with `more` set while further
/// results of the same response are still to come.
pub type DiscoveryAllHandler = unsafe extern "C" fn(
    anchor: *const c_char,
    uri: *const c_char,
    types: OcStringArray,
    iface_mask: InterfaceMask,
    endpoint: *const OcEndpoint,
    bm: ResourceProperties,
    more: bool,
    user_data: *mut c_void,
) -> DiscoveryFlags;
