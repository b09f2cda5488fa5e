//! Shim context: the device handle and discovery callbacks a host registers, and the
//! requests issued from them.
//!
//! [`Registration`] is the checked, slot-by-slot form the C ABI fills in. [`ShimContext`] is the
//! ready form: it can only be built once the device and the discover-all callback are present.

use std::ffi::CStr;
use std::fmt;

use tracing::{debug, warn};

use crate::framework::{DeviceFramework, DeviceHandle};
use crate::handler::{DiscoveryAllHandler, DiscoveryHandler};

/// A registration slot a host must fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Device,
    DiscoveryHandler,
    DiscoveryAllHandler,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Slot::Device => "device handle",
            Slot::DiscoveryHandler => "discovery callback",
            Slot::DiscoveryAllHandler => "discovery-all callback",
        })
    }
}

/// Registration-order error: a request was made before its slots were assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShimError {
    #[error("{0} not assigned before issuing requests")]
    NotReady(Slot),
}

/// Slots as the host fills them, in any order.
#[derive(Debug, Default, Clone, Copy)]
pub struct Registration {
    device: Option<DeviceHandle>,
    on_discovery: Option<DiscoveryHandler>,
    on_discovery_all: Option<DiscoveryAllHandler>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_device(&mut self, device: DeviceHandle) {
        self.device = Some(device);
    }

    pub fn set_discovery_handler(&mut self, handler: DiscoveryHandler) {
        self.on_discovery = Some(handler);
    }

    pub fn set_discovery_all_handler(&mut self, handler: DiscoveryAllHandler) {
        self.on_discovery_all = Some(handler);
    }

    /// First slot `issue_requests` still needs, if any.
    pub fn missing(&self) -> Option<Slot> {
        if self.device.is_none() {
            Some(Slot::Device)
        } else if self.on_discovery_all.is_none() {
            Some(Slot::DiscoveryAllHandler)
        } else {
            None
        }
    }

    pub fn is_ready(&self) -> bool {
        self.missing().is_none()
    }

    /// Freeze into a ready context.
    pub fn ready(&self) -> Result<ShimContext, ShimError> {
        match (self.device, self.on_discovery_all) {
            (Some(device), Some(on_discovery_all)) => Ok(ShimContext {
                device,
                on_discovery: self.on_discovery,
                on_discovery_all,
            }),
            (None, _) => Err(ShimError::NotReady(Slot::Device)),
            (_, None) => Err(ShimError::NotReady(Slot::DiscoveryAllHandler)),
        }
    }

    /// Checked form of [`ShimContext::issue_requests`].
    pub fn issue_requests<F: DeviceFramework + ?Sized>(&self, framework: &F) -> Result<(), ShimError> {
        self.ready()?.issue_requests(framework);
        Ok(())
    }
}

/// Builder for [`ShimContext`].
#[derive(Debug, Default)]
pub struct ShimContextBuilder {
    registration: Registration,
}

impl ShimContextBuilder {
    pub fn device(mut self, device: DeviceHandle) -> Self {
        self.registration.set_device(device);
        self
    }

    pub fn on_discovery(mut self, handler: DiscoveryHandler) -> Self {
        self.registration.set_discovery_handler(handler);
        self
    }

    pub fn on_discovery_all(mut self, handler: DiscoveryAllHandler) -> Self {
        self.registration.set_discovery_all_handler(handler);
        self
    }

    pub fn build(self) -> Result<ShimContext, ShimError> {
        self.registration.ready()
    }
}

/// A ready shim: device handle and discover-all callback are always present.
#[derive(Debug, Clone, Copy)]
pub struct ShimContext {
    device: DeviceHandle,
    on_discovery: Option<DiscoveryHandler>,
    on_discovery_all: DiscoveryAllHandler,
}

impl ShimContext {
    pub fn builder() -> ShimContextBuilder {
        ShimContextBuilder::default()
    }

    pub fn device(&self) -> DeviceHandle {
        self.device
    }

    pub fn on_discovery(&self) -> Option<DiscoveryHandler> {
        self.on_discovery
    }

    pub fn on_discovery_all(&self) -> DiscoveryAllHandler {
        self.on_discovery_all
    }

    /// Ask the framework to discover every device over IP, once, with the stored callback and
    /// device. Results arrive later through the callback. A rejected request is logged only.
    pub fn issue_requests<F: DeviceFramework + ?Sized>(&self, framework: &F) {
        debug!(device = ?self.device, "issuing discover-all request");
        if !framework.discover_all_ip(self.on_discovery_all, self.device) {
            warn!("framework rejected discover-all request");
        }
    }

    /// Typed discovery for `resource_type` through the discovery callback.
    pub fn issue_typed_requests<F: DeviceFramework + ?Sized>(
        &self,
        framework: &F,
        resource_type: &CStr,
    ) -> Result<(), ShimError> {
        let handler = self
            .on_discovery
            .ok_or(ShimError::NotReady(Slot::DiscoveryHandler))?;
        debug!(device = ?self.device, ?resource_type, "issuing typed discovery request");
        if !framework.discover_ip(resource_type, handler, self.device) {
            warn!(?resource_type, "framework rejected discovery request");
        }
        Ok(())
    }
}
