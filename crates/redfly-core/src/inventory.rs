// ── Inventory and credential collaborators ──
//
// Where targets, plugins, and stored resources come from. Stored resources
// are keyed by table name and aggregator URL; manager records live in the
// `Managers` table. The production store lives outside this crate;
// `MemoryInventory` backs the CLI and tests.

use dashmap::DashMap;
use redfly_api::Plugin;
use serde_json::Value;

use crate::error::CoreError;

/// Table holding one record per manager.
pub const MANAGERS_TABLE: &str = "Managers";

/// A managed device reachable through a plugin.
#[derive(Debug, Clone)]
pub struct Target {
    pub device_uuid: String,
    pub plugin_id: String,
    pub manager_address: String,
    pub username: String,
    /// Stored (encrypted) device password.
    pub password: Vec<u8>,
}

/// Lookup of the records a resource flow needs.
pub trait Inventory: Send + Sync {
    fn target(&self, device_uuid: &str) -> Result<Target, CoreError>;

    fn plugin(&self, plugin_id: &str) -> Result<Plugin, CoreError>;

    /// The resource stored in `table` under `url`.
    fn resource(&self, table: &str, url: &str) -> Result<Value, CoreError>;

    /// Store (or replace) the resource in `table` under `url`.
    fn store_resource(&self, table: &str, url: &str, record: Value) -> Result<(), CoreError>;

    /// The stored manager resource at `url` (e.g. `/redfish/v1/Managers/{id}`).
    fn manager_by_url(&self, url: &str) -> Result<Value, CoreError> {
        self.resource(MANAGERS_TABLE, url)
    }
}

/// Turns a stored device password into plaintext.
pub trait PasswordDecryptor: Send + Sync {
    fn decrypt(&self, stored: &[u8]) -> Result<Vec<u8>, CoreError>;
}

/// [`PasswordDecryptor`] for stores that keep passwords in the clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextPasswords;

impl PasswordDecryptor for PlaintextPasswords {
    fn decrypt(&self, stored: &[u8]) -> Result<Vec<u8>, CoreError> {
        Ok(stored.to_vec())
    }
}

/// In-memory [`Inventory`].
#[derive(Debug, Default)]
pub struct MemoryInventory {
    targets: DashMap<String, Target>,
    plugins: DashMap<String, Plugin>,
    resources: DashMap<(String, String), Value>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_target(&self, target: Target) {
        self.targets.insert(target.device_uuid.clone(), target);
    }

    pub fn insert_plugin(&self, plugin: Plugin) {
        self.plugins.insert(plugin.id.clone(), plugin);
    }

    pub fn insert_resource(&self, table: impl Into<String>, url: impl Into<String>, record: Value) {
        self.resources.insert((table.into(), url.into()), record);
    }

    pub fn insert_manager(&self, url: impl Into<String>, record: Value) {
        self.insert_resource(MANAGERS_TABLE, url, record);
    }

    pub fn plugin_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.plugins.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl Inventory for MemoryInventory {
    fn target(&self, device_uuid: &str) -> Result<Target, CoreError> {
        self.targets
            .get(device_uuid)
            .map(|t| t.clone())
            .ok_or_else(|| CoreError::not_found("Target", device_uuid))
    }

    fn plugin(&self, plugin_id: &str) -> Result<Plugin, CoreError> {
        self.plugins
            .get(plugin_id)
            .map(|p| p.clone())
            .ok_or_else(|| CoreError::not_found("Plugin", plugin_id))
    }

    fn resource(&self, table: &str, url: &str) -> Result<Value, CoreError> {
        self.resources
            .get(&(table.to_owned(), url.to_owned()))
            .map(|r| r.clone())
            .ok_or_else(|| CoreError::not_found(table, url))
    }

    fn store_resource(&self, table: &str, url: &str, record: Value) -> Result<(), CoreError> {
        self.insert_resource(table, url, record);
        Ok(())
    }
}
