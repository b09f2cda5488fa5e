//! Resource catalog: what discovery has found so far, filled from the framework's callbacks.
//! A catalog doubles as the device handle: its address is the `user_data` the trampolines read back.

use std::collections::BTreeMap;
use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::framework::DeviceHandle;
use crate::handler::{DiscoveryFlags, InterfaceMask, OcEndpoint, ResourceProperties};
use crate::mmem::OcStringArray;

/// One resource as reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredResource {
    /// Device anchor, e.g. `ocf://<device id>`.
    pub anchor: String,
    pub uri: String,
    pub types: Vec<String>,
    pub interfaces: InterfaceMask,
    pub properties: ResourceProperties,
    /// Whether the framework supplied an endpoint to reach the resource.
    pub has_endpoint: bool,
}

impl DiscoveredResource {
    pub fn is_secure(&self) -> bool {
        self.properties.contains(ResourceProperties::SECURE)
    }
}

/// Discovered resources keyed by (anchor, uri).
#[derive(Debug, Default)]
pub struct ResourceCatalog {
    resources: Mutex<BTreeMap<(String, String), DiscoveredResource>>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for the shim context; the catalog must outlive every discovery it is passed to.
    pub fn handle(&self) -> DeviceHandle {
        DeviceHandle::from_ref(self)
    }

    /// Insert or refresh a resource. Returns true if it was not known before.
    pub fn record(&self, resource: DiscoveredResource) -> bool {
        let key = (resource.anchor.clone(), resource.uri.clone());
        let mut resources = self.resources.lock().unwrap_or_else(PoisonError::into_inner);
        resources.insert(key, resource).is_none()
    }

    pub fn contains(&self, anchor: &str, uri: &str) -> bool {
        let resources = self.resources.lock().unwrap_or_else(PoisonError::into_inner);
        resources.contains_key(&(anchor.to_string(), uri.to_string()))
    }

    pub fn len(&self) -> usize {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all entries ordered by anchor, then uri.
    pub fn snapshot(&self) -> Vec<DiscoveredResource> {
        let resources = self.resources.lock().unwrap_or_else(PoisonError::into_inner);
        resources.values().cloned().collect()
    }

    pub fn clear(&self) {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

fn lossy(text: *const c_char) -> String {
    if text.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
}

unsafe fn record_raw(
    anchor: *const c_char,
    uri: *const c_char,
    types: OcStringArray,
    iface_mask: InterfaceMask,
    endpoint: *const OcEndpoint,
    bm: ResourceProperties,
    user_data: *mut c_void,
) -> DiscoveryFlags {
    let Some(catalog) = (user_data as *const ResourceCatalog).as_ref() else {
        return DiscoveryFlags::STOP;
    };
    let resource = DiscoveredResource {
        anchor: lossy(anchor),
        uri: lossy(uri),
        types: types.iter().map(|t| t.to_string_lossy().into_owned()).collect(),
        interfaces: iface_mask,
        properties: bm,
        has_endpoint: !endpoint.is_null(),
    };
    let (anchor, uri) = (resource.anchor.clone(), resource.uri.clone());
    if catalog.record(resource) {
        info!(%anchor, %uri, "discovered resource");
    } else {
        debug!(%anchor, %uri, "resource seen again");
    }
    DiscoveryFlags::CONTINUE
}

/// Discovery callback that records into the [`ResourceCatalog`] behind `user_data`.
///
/// # Safety
/// `user_data` must be null or point at a live `ResourceCatalog`; `anchor` and `uri` must be null
/// or NUL-terminated; `types` must satisfy [`OcStringArray::from_mmem`].
pub unsafe extern "C" fn catalog_discovery_handler(
    anchor: *const c_char,
    uri: *const c_char,
    types: OcStringArray,
    iface_mask: InterfaceMask,
    endpoint: *const OcEndpoint,
    bm: ResourceProperties,
    user_data: *mut c_void,
) -> DiscoveryFlags {
    record_raw(anchor, uri, types, iface_mask, endpoint, bm, user_data)
}

/// Discover-all callback that records into the [`ResourceCatalog`] behind `user_data`.
///
/// # Safety
/// Same contract as [`catalog_discovery_handler`].
pub unsafe extern "C" fn catalog_discovery_all_handler(
    anchor: *const c_char,
    uri: *const c_char,
    types: OcStringArray,
    iface_mask: InterfaceMask,
    endpoint: *const OcEndpoint,
    bm: ResourceProperties,
    _more: bool,
    user_data: *mut c_void,
) -> DiscoveryFlags {
    record_raw(anchor, uri, types, iface_mask, endpoint, bm, user_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmem::string_array_buffer;
    use std::ffi::CString;
    use std::ptr;

    fn sample(uri: &str) -> DiscoveredResource {
        DiscoveredResource {
            anchor: "ocf://dev-1".to_string(),
            uri: uri.to_string(),
            types: vec!["oic.r.switch.binary".to_string()],
            interfaces: InterfaceMask::BASELINE | InterfaceMask::A,
            properties: ResourceProperties::DISCOVERABLE,
            has_endpoint: true,
        }
    }

    #[test]
    fn record_reports_new_entries_once() {
        let catalog = ResourceCatalog::new();
        assert!(catalog.record(sample("/switch")));
        assert!(!catalog.record(sample("/switch")));
        assert!(catalog.record(sample("/light")));
        assert_eq!(catalog.len(), 2);
        let uris: Vec<String> = catalog.snapshot().into_iter().map(|r| r.uri).collect();
        assert_eq!(uris, vec!["/light", "/switch"]);
        catalog.clear();
        assert!(catalog.is_empty());
    }

    #[test]
    fn trampoline_records_through_user_data() {
        let catalog = ResourceCatalog::new();
        let anchor = CString::new("ocf://dev-2").unwrap();
        let uri = CString::new("/a/light").unwrap();
        let buf = string_array_buffer(&["oic.r.light.brightness", "oic.r.switch.binary"]);
        let types = unsafe { OcStringArray::from_raw_parts(buf.as_ptr(), buf.len()) };
        let flags = unsafe {
            catalog_discovery_all_handler(
                anchor.as_ptr(),
                uri.as_ptr(),
                types,
                InterfaceMask::BASELINE | InterfaceMask::RW,
                ptr::null(),
                ResourceProperties::DISCOVERABLE | ResourceProperties::SECURE,
                false,
                catalog.handle().as_ptr(),
            )
        };
        assert_eq!(flags, DiscoveryFlags::CONTINUE);
        assert!(catalog.contains("ocf://dev-2", "/a/light"));
        let r = &catalog.snapshot()[0];
        assert_eq!(r.types, vec!["oic.r.light.brightness", "oic.r.switch.binary"]);
        assert!(r.is_secure());
        assert!(!r.has_endpoint);
    }

    #[test]
    fn typed_trampoline_records_too() {
        let catalog = ResourceCatalog::new();
        let uri = CString::new("/oic/p").unwrap();
        let flags = unsafe {
            catalog_discovery_handler(
                ptr::null(),
                uri.as_ptr(),
                OcStringArray::empty(),
                InterfaceMask::R,
                ptr::null(),
                ResourceProperties::empty(),
                catalog.handle().as_ptr(),
            )
        };
        assert_eq!(flags, DiscoveryFlags::CONTINUE);
        assert!(catalog.contains("", "/oic/p"));
        assert!(catalog.snapshot()[0].types.is_empty());
    }

    #[test]
    fn null_user_data_stops_discovery() {
        let flags = unsafe {
            catalog_discovery_handler(
                ptr::null(),
                ptr::null(),
                OcStringArray::empty(),
                InterfaceMask::empty(),
                ptr::null(),
                ResourceProperties::empty(),
                ptr::null_mut(),
            )
        };
        assert_eq!(flags, DiscoveryFlags::STOP);
    }
}
