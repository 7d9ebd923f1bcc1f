// Aggregator facade
//
// Ties the plugin client to the inventory and credential collaborators.
// Resource flows live in `device.rs` and `manager.rs` as inherent methods.

use std::sync::Arc;

use redfly_api::{ContactRequest, HealthCheck, Plugin, PluginClient, Transport};
use reqwest::Method;

use crate::error::CoreError;
use crate::inventory::{Inventory, PasswordDecryptor};

/// Entry point for every plugin-backed resource flow.
pub struct Aggregator<T, H> {
    plugins: PluginClient<T, H>,
    inventory: Arc<dyn Inventory>,
    decryptor: Arc<dyn PasswordDecryptor>,
    root_service_uuid: Option<String>,
}

impl<T: Transport, H: HealthCheck> Aggregator<T, H> {
    pub fn new(
        plugins: PluginClient<T, H>,
        inventory: Arc<dyn Inventory>,
        decryptor: Arc<dyn PasswordDecryptor>,
    ) -> Self {
        Self {
            plugins,
            inventory,
            decryptor,
            root_service_uuid: None,
        }
    }

    /// UUID of the aggregator's own manager, which has no plugin behind it.
    #[must_use]
    pub fn with_root_service_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.root_service_uuid = Some(uuid.into());
        self
    }

    pub(crate) fn is_root_manager(&self, manager_id: &str) -> bool {
        self.root_service_uuid.as_deref() == Some(manager_id)
    }

    pub fn plugins(&self) -> &PluginClient<T, H> {
        &self.plugins
    }

    pub fn inventory(&self) -> &dyn Inventory {
        self.inventory.as_ref()
    }

    pub(crate) fn decryptor(&self) -> &dyn PasswordDecryptor {
        self.decryptor.as_ref()
    }

    /// Build an authenticated request for `resource` on `plugin`.
    pub(crate) async fn authorized_request(
        &self,
        plugin: Plugin,
        method: Method,
        resource: String,
    ) -> Result<ContactRequest, CoreError> {
        let request = ContactRequest::new(plugin, method, resource);
        Ok(self.plugins.authorize(request).await?)
    }
}
