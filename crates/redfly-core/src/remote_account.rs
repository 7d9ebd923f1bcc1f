// BMC remote account service
//
// A device manager exposes its BMC's account service as
// `/redfish/v1/Managers/{uuid}:{id}/RemoteAccountService`. The device itself
// serves it as `/redfish/v1/AccountService`, so requests are remapped
// south on the way in and every `v1/AccountService` path in the answer is
// remapped back under the manager.

use redfly_api::remap::rewrite_path_runs;
use redfly_api::{HealthCheck, SegmentTable, Transport};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::aggregator::Aggregator;
use crate::device::{DeviceRequest, DeviceResponse};
use crate::error::CoreError;
use crate::manager::split_manager_id;

const REMOTE_ACCOUNT_SERVICE: &str = "RemoteAccountService";

/// Aggregator path under the manager to the device's account service path.
fn to_account_service(url: &str, manager_id: &str) -> String {
    SegmentTable::from_pairs([(
        format!("Managers/{manager_id}/{REMOTE_ACCOUNT_SERVICE}"),
        "AccountService".to_owned(),
    )])
    .apply(url)
}

/// Every device account service path in `body`, moved under the manager.
fn to_remote_account_service(body: &str, manager_id: &str) -> String {
    let table = SegmentTable::from_pairs([(
        "v1/AccountService".to_owned(),
        format!("v1/Managers/{manager_id}/{REMOTE_ACCOUNT_SERVICE}"),
    )]);
    rewrite_path_runs(body, |run| table.rewrite(run)).unwrap_or_else(|| body.to_owned())
}

/// Not-found error naming the account or role `url` points at, or the
/// manager itself.
fn remote_account_not_found(url: &str, manager_id: &str) -> CoreError {
    let segments: Vec<&str> = url.trim_end_matches('/').split('/').collect();
    let member = segments
        .iter()
        .position(|s| *s == REMOTE_ACCOUNT_SERVICE)
        .and_then(|i| segments.get(i + 1..));
    match member {
        Some([kind @ ("Accounts" | "Roles"), id]) => CoreError::not_found(kind, *id),
        _ => CoreError::not_found("Managers", manager_id),
    }
}

/// Body of an account creation.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct CreateAccount {
    user_name: String,
    password: String,
    role_id: String,
}

/// Body of an account update; absent fields are left alone.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct UpdateAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role_id: Option<String>,
}

fn validated<B>(body: Value) -> Result<Value, CoreError>
where
    B: for<'de> Deserialize<'de> + Serialize,
{
    let parsed: B =
        serde_json::from_value(body).map_err(|e| CoreError::InvalidRequest(e.to_string()))?;
    serde_json::to_value(parsed).map_err(|e| CoreError::Internal(e.to_string()))
}

impl<T: Transport, H: HealthCheck> Aggregator<T, H> {
    /// Read the remote account service, or one of its accounts or roles.
    pub async fn get_remote_account_service(
        &self,
        manager_id: &str,
        url: &str,
    ) -> Result<Value, CoreError> {
        let (device_uuid, _) = split_manager_id(manager_id)?;
        let device_url = to_account_service(url, manager_id);

        let text = self
            .get_resource_info_from_device(&device_url, device_uuid)
            .await
            .map_err(|e| {
                warn!(%manager_id, %url, error = %e, "unable to get resource details from device");
                remote_account_not_found(url, manager_id)
            })?;
        parse_body(&to_remote_account_service(&text, manager_id))
    }

    /// Create a BMC account. Answers 201 with the new account.
    pub async fn create_remote_account(
        &self,
        manager_id: &str,
        url: &str,
        body: Value,
    ) -> Result<DeviceResponse, CoreError> {
        let body = validated::<CreateAccount>(body)?;
        let (device_uuid, _) = split_manager_id(manager_id)?;

        let request = DeviceRequest::get(device_uuid, to_account_service(url, manager_id))
            .with_method(Method::POST)
            .with_body(body);
        let response = self.device_request(&request).await?;

        Ok(DeviceResponse {
            status: 201,
            body: to_remote_account_service(&response.body, manager_id),
        })
    }

    /// Update a BMC account and answer with its state read back from the
    /// device.
    pub async fn update_remote_account(
        &self,
        manager_id: &str,
        url: &str,
        body: Value,
    ) -> Result<DeviceResponse, CoreError> {
        let body = validated::<UpdateAccount>(body)?;
        let (device_uuid, _) = split_manager_id(manager_id)?;
        let device_url = to_account_service(url, manager_id);

        let request = DeviceRequest::get(device_uuid, device_url.clone())
            .with_method(Method::PATCH)
            .with_body(body);
        let response = self.device_request(&request).await?;
        if response.status != 200 {
            return Ok(DeviceResponse {
                status: response.status,
                body: to_remote_account_service(&response.body, manager_id),
            });
        }

        let text = self
            .get_resource_info_from_device(&device_url, device_uuid)
            .await
            .map_err(|e| {
                warn!(%manager_id, %url, error = %e, "unable to read back updated account");
                remote_account_not_found(url, manager_id)
            })?;
        Ok(DeviceResponse {
            status: 200,
            body: to_remote_account_service(&text, manager_id),
        })
    }

    /// Delete a BMC account. A plain 200 from the device becomes 204.
    pub async fn delete_remote_account(
        &self,
        manager_id: &str,
        url: &str,
    ) -> Result<DeviceResponse, CoreError> {
        let (device_uuid, _) = split_manager_id(manager_id)?;
        let request = DeviceRequest::get(device_uuid, to_account_service(url, manager_id))
            .with_method(Method::DELETE);
        let response = self.device_request(&request).await?;

        if response.status == 200 {
            return Ok(DeviceResponse {
                status: 204,
                body: String::new(),
            });
        }
        Ok(response)
    }
}

fn parse_body(text: &str) -> Result<Value, CoreError> {
    serde_json::from_str(text)
        .map_err(|e| CoreError::Internal(format!("remote account response is not valid JSON: {e}")))
}
