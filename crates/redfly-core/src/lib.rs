//! Resource flows between the aggregator's north-bound API and its plugins.
//!
//! - **[`Aggregator`]**: Facade over a [`redfly_api::PluginClient`] plus the
//!   inventory and credential collaborators. Each flow resolves which plugin
//!   serves a resource, authenticates the way that plugin expects, contacts
//!   it with the 401 re-authentication retry, and rewrites the answer into
//!   the aggregator's namespace.
//!
//! - **Manager flows**: [`Aggregator::get_managers_resource`] routes a read
//!   to the store, the plugin, or the device; virtual media actions and the
//!   BMC remote account service go to the device with their own URL
//!   remapping on top of [`Aggregator::device_request`].
//!
//! - **[`Inventory`]**: Lookup of device targets, plugins, and stored
//!   resources. [`MemoryInventory`] is the `DashMap`-backed version.
//!
//! - **[`PasswordDecryptor`]**: Turns stored device credentials into
//!   plaintext for the south-bound request body.

pub mod aggregator;
pub mod device;
pub mod error;
pub mod inventory;
pub mod manager;
pub mod remote_account;
pub mod virtual_media;

pub use aggregator::Aggregator;
pub use device::{DeviceRequest, DeviceResponse};
pub use error::CoreError;
pub use inventory::{
    Inventory, MANAGERS_TABLE, MemoryInventory, PasswordDecryptor, PlaintextPasswords, Target,
};
pub use virtual_media::VIRTUAL_MEDIA_TABLE;
