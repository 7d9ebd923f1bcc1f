// Virtual media actions
//
// `VirtualMedia.InsertMedia` and `VirtualMedia.EjectMedia` are posted to the
// device; after a successful action the media resource is read back and
// stored so later reads see the new state without a device round trip.

use redfly_api::{HealthCheck, Transport};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::aggregator::Aggregator;
use crate::device::{DeviceRequest, DeviceResponse};
use crate::error::CoreError;
use crate::manager::split_manager_id;

pub const INSERT_MEDIA_ACTION: &str = "VirtualMedia.InsertMedia";
pub const EJECT_MEDIA_ACTION: &str = "VirtualMedia.EjectMedia";

/// Table stored virtual media resources live in.
pub const VIRTUAL_MEDIA_TABLE: &str = "VirtualMedia";

/// `InsertMedia` payload. `Inserted` and `WriteProtected` default to true.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct InsertMedia {
    image: String,
    #[serde(default = "enabled")]
    inserted: bool,
    #[serde(default = "enabled")]
    write_protected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transfer_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transfer_protocol_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
}

fn enabled() -> bool {
    true
}

/// Validate an `InsertMedia` body and fill in its defaults.
fn insert_media_body(body: Option<Value>) -> Result<Value, CoreError> {
    let body = body.ok_or_else(|| CoreError::InvalidRequest("Image field is missing".into()))?;
    let insert: InsertMedia =
        serde_json::from_value(body).map_err(|e| CoreError::InvalidRequest(e.to_string()))?;
    serde_json::to_value(insert).map_err(|e| CoreError::Internal(e.to_string()))
}

/// The media resource an action URL belongs to.
fn media_url(action_url: &str) -> String {
    let trimmed = action_url.trim_end_matches('/');
    for action in [INSERT_MEDIA_ACTION, EJECT_MEDIA_ACTION] {
        if let Some(base) = trimmed.strip_suffix(&format!("/Actions/{action}")) {
            return base.to_owned();
        }
    }
    trimmed.to_owned()
}

impl<T: Transport, H: HealthCheck> Aggregator<T, H> {
    /// Post a virtual media action to the device behind `manager_id`.
    pub async fn virtual_media_action(
        &self,
        manager_id: &str,
        url: &str,
        body: Option<Value>,
    ) -> Result<DeviceResponse, CoreError> {
        let body = if url.contains(INSERT_MEDIA_ACTION) {
            Some(insert_media_body(body)?)
        } else {
            body
        };
        let (device_uuid, _) = split_manager_id(manager_id)?;

        let mut request = DeviceRequest::get(device_uuid, url).with_method(Method::POST);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        let response = self.device_request(&request).await?;

        if response.status == 200 {
            self.refresh_media(device_uuid, &media_url(url)).await;
        }
        Ok(response)
    }

    /// Re-read a media resource from the device and store it. Failures are
    /// logged; the action itself already succeeded.
    async fn refresh_media(&self, device_uuid: &str, media_url: &str) {
        let record = match self.get_resource_info_from_device(media_url, device_uuid).await {
            Ok(text) => serde_json::from_str::<Value>(&text)
                .map_err(|e| CoreError::Internal(format!("virtual media details: {e}"))),
            Err(e) => Err(e),
        };
        let stored = record.and_then(|record| {
            self.inventory()
                .store_resource(VIRTUAL_MEDIA_TABLE, media_url, record)
        });
        match stored {
            Ok(()) => debug!(%media_url, "virtual media state refreshed"),
            Err(e) => warn!(%media_url, error = %e, "unable to refresh virtual media state"),
        }
    }
}
