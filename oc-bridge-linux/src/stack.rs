//! Stack backends for the event loop. With `iotivity-lite` the host runs the linked client stack;
//! without it there is no backend and startup fails.

use std::sync::Arc;

use oc_bridge_core::{
    catalog_discovery_all_handler, catalog_discovery_handler, ResourceCatalog, ShimContext, ShimError,
};
use tokio::sync::Notify;

use crate::config::Config;
use crate::runner::StackRuntime;

/// Shim context whose callbacks record into `catalog`.
#[cfg_attr(not(feature = "iotivity-lite"), allow(dead_code))]
pub fn catalog_context(catalog: &ResourceCatalog) -> Result<ShimContext, ShimError> {
    ShimContext::builder()
        .device(catalog.handle())
        .on_discovery(catalog_discovery_handler)
        .on_discovery_all(catalog_discovery_all_handler)
        .build()
}

#[cfg(feature = "iotivity-lite")]
pub fn start(cfg: &Config, catalog: Arc<ResourceCatalog>, wake: Arc<Notify>) -> anyhow::Result<Box<dyn StackRuntime>> {
    Ok(Box::new(iotivity::IotivityStack::start(cfg, catalog, wake)?))
}

#[cfg(not(feature = "iotivity-lite"))]
pub fn start(_cfg: &Config, _catalog: Arc<ResourceCatalog>, _wake: Arc<Notify>) -> anyhow::Result<Box<dyn StackRuntime>> {
    anyhow::bail!("built without the iotivity-lite feature: no device framework to run")
}

#[cfg(feature = "iotivity-lite")]
mod iotivity {
    use std::ffi::CString;
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Context;
    use oc_bridge_core::{IotivityLite, ResourceCatalog, ShimContext, StackIdentity};
    use tokio::sync::Notify;
    use tracing::{info, warn};

    use super::catalog_context;
    use crate::config::Config;
    use crate::runner::StackRuntime;

    pub struct IotivityStack {
        stack: Option<IotivityLite>,
        context: ShimContext,
        resource_type: Option<CString>,
        // Keeps the device handle behind `context` alive.
        catalog: Arc<ResourceCatalog>,
    }

    impl IotivityStack {
        pub fn start(cfg: &Config, catalog: Arc<ResourceCatalog>, wake: Arc<Notify>) -> anyhow::Result<Self> {
            let context = catalog_context(&catalog)?;
            let resource_type = cfg
                .resource_type
                .as_deref()
                .map(CString::new)
                .transpose()
                .context("resource_type contains NUL")?;
            let identity = StackIdentity::new(&cfg.platform_name, &cfg.device_name, &cfg.device_type)?;
            let stack = IotivityLite::start(identity, move || wake.notify_one(), None)?;
            info!(device = %cfg.device_name, "client stack up");
            Ok(Self {
                stack: Some(stack),
                context,
                resource_type,
                catalog,
            })
        }
    }

    impl StackRuntime for IotivityStack {
        fn poll(&mut self) -> Option<Duration> {
            self.stack.as_ref().and_then(IotivityLite::poll)
        }

        fn discover(&mut self) {
            let Some(stack) = self.stack.as_ref() else {
                return;
            };
            match &self.resource_type {
                Some(rt) => {
                    if let Err(e) = self.context.issue_typed_requests(stack, rt) {
                        warn!(error = %e, "typed discovery not issued");
                    }
                }
                None => self.context.issue_requests(stack),
            }
        }

        fn shutdown(&mut self) {
            if let Some(stack) = self.stack.take() {
                drop(stack);
                info!(resources = self.catalog.len(), "client stack down");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_context_uses_catalog_as_device() {
        let catalog = ResourceCatalog::new();
        let ctx = catalog_context(&catalog).unwrap();
        assert_eq!(ctx.device(), catalog.handle());
        assert!(ctx.on_discovery().is_some());
    }

    #[cfg(not(feature = "iotivity-lite"))]
    #[test]
    fn start_without_backend_fails() {
        let err = start(&Config::default(), Arc::new(ResourceCatalog::new()), Arc::new(Notify::new()))
            .err()
            .unwrap();
        assert!(err.to_string().contains("iotivity-lite"));
    }

    #[cfg(not(feature = "iotivity-lite"))]
    #[test]
    fn start_without_backend_leaves_catalog_untouched() {
        let catalog = Arc::new(ResourceCatalog::new());
        assert!(start(&Config::default(), catalog.clone(), Arc::new(Notify::new())).is_err());
        assert_eq!(Arc::strong_count(&catalog), 1);
        assert!(catalog.is_empty());
    }
}
