//! Profile endpoints for the KBRemote API.
//!
//! A profile holds the kiosk configuration shared by the devices in a group;
//! the one property this client updates is the kiosk URL.
//!
//! - [`list_profiles`] — GET `profile`.
//! - [`get_profile`] — GET `profile/{id}`.
//! - [`update_profile`] — PATCH `profile/{id}` with a new kiosk URL.

use serde::Serialize;

use crate::client::KbClient;
use crate::error::Result;
use crate::normalize::Value;

#[derive(Debug, Serialize)]
struct ProfileUpdate<'a> {
    #[serde(rename = "kioskurl")]
    kiosk_url: &'a str,
}

/// Retrieves all profiles.
pub async fn list_profiles(client: &KbClient) -> Result<Value> {
    client.get("profile").await
}

/// Retrieves a single profile by its numeric ID.
pub async fn get_profile(client: &KbClient, id: i64) -> Result<Value> {
    client.get(&format!("profile/{id}")).await
}

/// Points a profile at a new kiosk URL.
pub async fn update_profile(client: &KbClient, id: i64, kiosk_url: &str) -> Result<Value> {
    let body = ProfileUpdate { kiosk_url };
    client.patch(&format!("profile/{id}"), &body).await
}
