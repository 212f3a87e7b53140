//! Device group endpoints for the KBRemote API.
//!
//! Device groups bind a set of devices to a profile. Creating a group can
//! also mint a registration key, which new devices use to enroll into the
//! group.
//!
//! - [`list_device_groups`] — GET `devicegroup`.
//! - [`get_device_group`] — GET `devicegroup/{id}`.
//! - [`create_device_group`] — POST `devicegroup`.
//! - [`list_registration_keys`] — GET `registrationkey`.

use serde::Serialize;

use crate::client::KbClient;
use crate::error::Result;
use crate::normalize::Value;

/// Request body for the POST `devicegroup` endpoint. Field names are the
/// all-lowercase spellings the service expects.
#[derive(Debug, Serialize)]
struct CreateDeviceGroup<'a> {
    name: &'a str,
    #[serde(rename = "profileid")]
    profile_id: i64,
    #[serde(rename = "createregistrationkey")]
    create_registration_key: bool,
}

/// Retrieves all device groups.
pub async fn list_device_groups(client: &KbClient) -> Result<Value> {
    client.get("devicegroup").await
}

/// Retrieves a single device group by its numeric ID.
pub async fn get_device_group(client: &KbClient, id: i64) -> Result<Value> {
    client.get(&format!("devicegroup/{id}")).await
}

/// Creates a device group bound to a profile.
///
/// When `create_registration_key` is set, the response carries a fresh
/// `registrationkey` alongside `created` and `id`:
///
/// ```json
/// { "created": true, "id": 7620, "registrationkey": "5e8c1430-..." }
/// ```
///
/// Note: `created` here is the service's success flag, not a timestamp, so
/// the normalizer's timestamp rule does not fire (the value is a boolean).
pub async fn create_device_group(
    client: &KbClient,
    name: &str,
    profile_id: i64,
    create_registration_key: bool,
) -> Result<Value> {
    let body = CreateDeviceGroup {
        name,
        profile_id,
        create_registration_key,
    };
    client.post("devicegroup", &body).await
}

/// Retrieves all registration keys known to the account.
pub async fn list_registration_keys(client: &KbClient) -> Result<Value> {
    client.get("registrationkey").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_serializes_wire_field_names() {
        let body = CreateDeviceGroup {
            name: "Lobby",
            profile_id: 44,
            create_registration_key: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["name"], "Lobby");
        assert_eq!(json["profileid"], 44);
        assert_eq!(json["createregistrationkey"], true);
    }
}
