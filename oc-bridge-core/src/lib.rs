//! Integration shim over the IoTivity-lite OCF client stack.
//! Host-driven: the host registers a device handle and discovery callbacks, then asks the shim to
//! issue requests; results reach the host through its own callbacks.

pub mod catalog;
pub mod context;
pub mod ffi;
pub mod framework;
pub mod handler;
pub mod hooks;
#[cfg(feature = "iotivity-lite")]
pub mod iotivity;
pub mod mmem;

pub use catalog::{catalog_discovery_all_handler, catalog_discovery_handler, DiscoveredResource, ResourceCatalog};
pub use context::{Registration, ShimContext, ShimContextBuilder, ShimError, Slot};
pub use framework::{DeviceFramework, DeviceHandle};
pub use handler::{DiscoveryAllHandler, DiscoveryFlags, DiscoveryHandler, InterfaceMask, OcEndpoint, ResourceProperties};
pub use hooks::{FrameworkError, StackIdentity};
#[cfg(feature = "iotivity-lite")]
pub use iotivity::{IotivityLite, Linked};
pub use mmem::{string_to_plain_text, OcMmem, OcString, OcStringArray, STRING_ARRAY_ITEM_MAX_LEN};
