// Device management facade
//
// Small helpers over Client for the common device workflows: listing
// managed instances, factory reset through the device proxy, and
// removal from the management plane.

use serde_json::{Value, json};
use tracing::debug;

use crate::client::Client;
use crate::error::Error;

/// Path listing the device instances in the default space.
pub const INSTANCES_PATH: &str = "/api/v1/spaces/default/instances";

/// List the devices managed by Central Manager.
///
/// `GET /api/v1/spaces/default/instances`, unwrapping the
/// `_embedded.devices` collection.
pub async fn list_devices(client: &Client) -> Result<Vec<Value>, Error> {
    let response = client.load(INSTANCES_PATH).await?;

    let devices = response
        .pointer("/_embedded/devices")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Deserialization {
            message: "response has no _embedded.devices collection".into(),
            body: response.to_string(),
        })?;

    Ok(devices.clone())
}

/// Factory-reset a device through the Central Manager proxy.
///
/// `PUT /api/device/v1/proxy/{id}?path=/actions/factory-reset`
pub async fn factory_reset_device(client: &Client, id: &str) -> Result<Value, Error> {
    debug!(id, "factory-resetting device");
    client
        .update(
            &format!("/api/device/v1/proxy/{id}?path=/actions/factory-reset"),
            &json!({ "verify": true }),
        )
        .await
}

/// Remove a device from Central Manager without keeping a backup.
///
/// `DELETE /api/v1/spaces/default/instances/{id}`
pub async fn delete_device(client: &Client, id: &str) -> Result<Value, Error> {
    debug!(id, "deleting device");
    client
        .delete(
            &format!("/api/v1/spaces/default/instances/{id}"),
            Some(&json!({ "save_backup": false })),
        )
        .await
}
