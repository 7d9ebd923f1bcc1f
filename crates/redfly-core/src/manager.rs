// Manager resource flows
//
// Three kinds of manager live under `/redfish/v1/Managers/{id}`:
//
// - the aggregator's own manager (`id` is the root service UUID), served
//   only from the store;
// - plugin managers (`id` is a plain id), whose record `Name` is the plugin
//   id and whose live resource is read from the plugin itself;
// - device managers (`id` is `{device_uuid}:{local_id}`), served from the
//   store and fetched from the device on a miss.

use chrono::{DateTime, SecondsFormat, Utc};
use redfly_api::remap::COMPOSITE_SEPARATOR;
use redfly_api::{HealthCheck, Transport};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::aggregator::Aggregator;
use crate::error::CoreError;

/// Table holding a collection under a manager, keyed by its last segment.
fn collection_table(collection: &str) -> Option<&'static str> {
    match collection {
        "EthernetInterfaces" => Some("EthernetInterfacesCollection"),
        "HostInterfaces" => Some("HostInterfacesCollection"),
        "LogServices" => Some("LogServicesCollection"),
        "NetworkProtocol" => Some("NetworkProtocol"),
        "SerialInterfaces" => Some("SerialInterfacesCollection"),
        "VirtualMedia" => Some("VirtualMediaCollection"),
        _ => None,
    }
}

/// `@odata.type` stamped on device resources read from a table.
fn odata_type(table: &str) -> Option<&'static str> {
    match table {
        "EthernetInterfaces" => Some("#EthernetInterface.v1_6_0.EthernetInterface"),
        "HostInterfaces" => Some("#HostInterface.v1_3_0.HostInterface"),
        "LogServices" => Some("#LogService.v1_1_3.LogService"),
        "NetworkProtocol" => Some("#ManagerNetworkProtocol.v1_5_0.ManagerNetworkProtocol"),
        "SerialInterfaces" => Some("#SerialInterface.v1_1_7.SerialInterface"),
        "VirtualMedia" => Some("#VirtualMedia.v1_3_0.VirtualMedia"),
        _ => None,
    }
}

/// Table a manager sub-resource is stored in.
///
/// A collection (`resource_id` is `None`) is named after its last segment;
/// a member is stored in the table named by its parent collection.
pub(crate) fn resource_table(url: &str, resource_id: Option<&str>) -> String {
    let segments: Vec<&str> = url.trim_end_matches('/').split('/').collect();
    let last = segments.last().copied().unwrap_or_default();
    match resource_id {
        None => collection_table(last).unwrap_or(last).to_owned(),
        Some(_) => segments.iter().rev().nth(1).copied().unwrap_or(last).to_owned(),
    }
}

/// Split a device manager id into its device UUID and local id.
pub(crate) fn split_manager_id(manager_id: &str) -> Result<(&str, &str), CoreError> {
    manager_id
        .split_once(COMPOSITE_SEPARATOR)
        .ok_or_else(|| CoreError::not_found("Managers", manager_id))
}

impl<T: Transport, H: HealthCheck> Aggregator<T, H> {
    /// Read `url`, a resource under manager `manager_id`.
    ///
    /// `resource_id` is the member id when `url` names a collection member.
    pub async fn get_managers_resource(
        &self,
        manager_id: &str,
        resource_id: Option<&str>,
        url: &str,
    ) -> Result<Value, CoreError> {
        let table = resource_table(url, resource_id);

        let Some((device_uuid, _)) = manager_id.split_once(COMPOSITE_SEPARATOR) else {
            return match self.inventory().resource(&table, url) {
                Ok(record) => Ok(record),
                Err(err) if self.is_root_manager(manager_id) => Err(CoreError::Internal(
                    format!("unable to get aggregator manager details: {err}"),
                )),
                Err(CoreError::NotFound { .. }) => {
                    self.get_plugin_manager_resource(manager_id, url).await
                }
                Err(err) => Err(err),
            };
        };

        let mut record = match self.inventory().resource(&table, url) {
            Ok(record) => record,
            Err(CoreError::NotFound { .. }) => {
                let text = self
                    .get_resource_info_from_device(url, device_uuid)
                    .await
                    .map_err(|e| {
                        warn!(%manager_id, %url, error = %e, "unable to get resource details from device");
                        CoreError::not_found(&table, manager_id)
                    })?;
                serde_json::from_str(&text).map_err(|e| {
                    CoreError::Internal(format!("device resource {url} is not valid JSON: {e}"))
                })?
            }
            Err(err) => return Err(err),
        };

        if let (Some(odata_type), Value::Object(fields)) = (odata_type(&table), &mut record) {
            fields.insert("@odata.type".into(), Value::String(odata_type.into()));
        }
        Ok(record)
    }

    /// Fetch `request_uri` from the plugin behind manager `manager_id`.
    pub async fn get_plugin_manager_resource(
        &self,
        manager_id: &str,
        request_uri: &str,
    ) -> Result<Value, CoreError> {
        let record_url = format!("/redfish/v1/Managers/{manager_id}");
        let record = self.inventory().manager_by_url(&record_url)?;
        let plugin_id = record
            .get("Name")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::not_found("Plugin", manager_id))?;
        let plugin = self.inventory().plugin(plugin_id)?;

        debug!(%manager_id, %plugin_id, %request_uri, "reading plugin manager resource");

        let request = self
            .authorized_request(plugin, Method::GET, request_uri.to_owned())
            .await?;
        let prefix = format!("error while getting the details {request_uri}: ");
        let outcome = self.plugins().contact_with_retry(&request, &prefix).await?;

        let body: Value = outcome
            .json()
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        fill_response(body, &record, Utc::now())
    }
}

/// Merge aggregator-owned fields into a plugin manager response.
pub(crate) fn fill_response(
    body: Value,
    record: &Value,
    now: DateTime<Utc>,
) -> Result<Value, CoreError> {
    let Value::Object(mut fields) = body else {
        return Err(CoreError::Internal(
            "plugin manager response is not a JSON object".into(),
        ));
    };

    fields.insert(
        "DateTime".into(),
        Value::String(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    fields.insert("DateTimeLocalOffset".into(), Value::String("+00:00".into()));
    fields
        .entry("SerialConsole")
        .or_insert_with(|| Value::Object(Map::new()));
    fields.insert(
        "Links".into(),
        record.get("Links").cloned().unwrap_or(Value::Null),
    );

    Ok(Value::Object(fields))
}
