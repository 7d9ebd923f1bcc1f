// ── Device resource flow ──
//
// Reads (and pass-through writes) of device-scoped resources. The plugin
// receives the device's management address and decrypted credentials in
// the request body; the response comes back with every Systems, Managers
// and Chassis link qualified by the device UUID.

use redfly_api::remap::{qualify_device_links, strip_composite, to_device_path};
use redfly_api::{HealthCheck, Transport};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;

use crate::aggregator::Aggregator;
use crate::error::CoreError;
use crate::inventory::Target;

/// A request for a resource on a device behind a plugin.
#[derive(Debug, Clone)]
pub struct DeviceRequest {
    pub device_uuid: String,
    /// Aggregator-form URL, e.g. `/redfish/v1/Systems/{uuid}:1/Bios`.
    pub url: String,
    pub method: Method,
    /// Forwarded to the plugin as `PostBody`.
    pub body: Option<Value>,
}

impl DeviceRequest {
    pub fn get(device_uuid: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            device_uuid: device_uuid.into(),
            url: url.into(),
            method: Method::GET,
            body: None,
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A successful device answer: the plugin's status and the qualified body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceResponse {
    pub status: u16,
    pub body: String,
}

impl DeviceResponse {
    pub fn json(&self) -> Result<Value, CoreError> {
        serde_json::from_str(&self.body).map_err(|e| {
            CoreError::Internal(format!("device response is not valid JSON: {e}"))
        })
    }
}

/// What the aggregator was doing when a device call failed.
fn operation(method: &Method) -> &'static str {
    match *method {
        Method::GET => "getting the details",
        Method::POST => "posting to",
        Method::PATCH => "patching",
        Method::PUT => "replacing",
        Method::DELETE => "deleting",
        _ => "contacting",
    }
}

impl<T: Transport, H: HealthCheck> Aggregator<T, H> {
    /// GET `url` from the device `device_uuid` through its plugin.
    pub async fn get_resource_info_from_device(
        &self,
        url: &str,
        device_uuid: &str,
    ) -> Result<String, CoreError> {
        let response = self
            .device_request(&DeviceRequest::get(device_uuid, url))
            .await?;
        Ok(response.body)
    }

    /// Issue `request` against its device and return the response with
    /// device links qualified.
    pub async fn device_request(&self, request: &DeviceRequest) -> Result<DeviceResponse, CoreError> {
        let target = self.inventory().target(&request.device_uuid)?;
        let plugin = self.inventory().plugin(&target.plugin_id)?;

        let resource = strip_composite(&request.url, &request.device_uuid);
        let contact = self
            .authorized_request(plugin, request.method.clone(), resource)
            .await?;

        let password = self.device_password(&target)?;
        let contact = contact.with_body(device_info(&target, password, request.body.clone()));

        debug!(
            device_uuid = %request.device_uuid,
            plugin_id = %target.plugin_id,
            method = %request.method,
            plugin_path = %to_device_path(&request.url, &request.device_uuid, self.plugins().translation()),
            "contacting plugin for device resource"
        );

        let prefix = format!(
            "error while {} {}: ",
            operation(&request.method),
            request.url
        );
        let outcome = self.plugins().contact_with_retry(&contact, &prefix).await?;

        Ok(DeviceResponse {
            status: outcome.status.code,
            body: qualify_device_links(&outcome.text(), &request.device_uuid),
        })
    }

    fn device_password(&self, target: &Target) -> Result<String, CoreError> {
        let plain = self
            .decryptor()
            .decrypt(&target.password)
            .map_err(|e| CoreError::Decryption(e.to_string()))?;
        String::from_utf8(plain).map_err(|e| CoreError::Decryption(e.to_string()))
    }
}

/// The device-info body every device-scoped plugin call carries.
fn device_info(target: &Target, password: String, post_body: Option<Value>) -> Value {
    let mut info = Map::new();
    info.insert(
        "ManagerAddress".into(),
        Value::String(target.manager_address.clone()),
    );
    info.insert("UserName".into(), Value::String(target.username.clone()));
    info.insert("Password".into(), Value::String(password));
    if let Some(body) = post_body {
        info.insert("PostBody".into(), body);
    }
    Value::Object(info)
}
