//! Device endpoints for the KBRemote API.
//!
//! This module covers the "device" endpoint family:
//!
//! - [`list_devices`] — GET `device`, all devices visible to the account.
//! - [`get_device`] — GET `device/{id}`, a single device.
//! - [`update_device`] — PATCH `device/{id}`, partial property update.
//! - [`push`] — GET `push/{id}/{code}`, fire a push action at a device.
//!
//! Responses are returned as normalized [`Value`]s; the service's device
//! schema varies by device model and firmware, so no rigid struct is imposed
//! here. Keys arrive canonicalized (`deviceID`, `name`, `lastContacted` as a
//! parsed timestamp, ...).

use serde::Serialize;

use crate::client::KbClient;
use crate::error::{KbError, Result};
use crate::normalize::Value;

/// A push action accepted by the `push/{deviceId}/{actionCode}` endpoint.
///
/// This is the closed set of action codes the service documents as
/// implemented. The remaining documented codes are not exposed: 2 (update
/// device info), 6 (open WiFi settings), 7 (identify device), 8 (force
/// download profile), 9 (download profile if changed), 12 (open Kiosk
/// Browser settings), 13 (open TeamViewer), 14 (exit Kiosk Browser),
/// 16–18 (clear cookies/forms variants), 19–20 (upload reporting data),
/// 21 (clear HTML5 web storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAction {
    /// Ask the device to report its current status.
    RequestStatus,
    /// Restart the kiosk app on the device.
    RestartApp,
    /// Take a screenshot (Knox-activated devices; the response carries
    /// `data` and `imageURL` when available).
    TakeScreenshot,
    /// Reload the kiosk URL.
    ReloadUrl,
    /// Turn the screen off.
    ScreenOff,
    /// Turn the screen on.
    ScreenOn,
    /// Clear the WebView cache and reload the kiosk URL.
    ClearCacheReloadUrl,
    /// Bring the kiosk app back to the foreground.
    RegainFocus,
}

impl PushAction {
    /// The numeric action code sent on the wire.
    pub fn code(self) -> u8 {
        match self {
            PushAction::RequestStatus => 1,
            PushAction::RestartApp => 3,
            PushAction::TakeScreenshot => 4,
            PushAction::ReloadUrl => 5,
            PushAction::ScreenOff => 10,
            PushAction::ScreenOn => 11,
            PushAction::ClearCacheReloadUrl => 15,
            PushAction::RegainFocus => 23,
        }
    }
}

impl std::str::FromStr for PushAction {
    type Err = KbError;

    /// Parses the snake_case action name. Unknown names are a caller error,
    /// mirroring the closed action-code table.
    fn from_str(name: &str) -> Result<Self> {
        match name {
            "request_status" => Ok(PushAction::RequestStatus),
            "restart_app" => Ok(PushAction::RestartApp),
            "take_screenshot" => Ok(PushAction::TakeScreenshot),
            "reload_url" => Ok(PushAction::ReloadUrl),
            "screen_off" => Ok(PushAction::ScreenOff),
            "screen_on" => Ok(PushAction::ScreenOn),
            "clear_cache_reload_url" => Ok(PushAction::ClearCacheReloadUrl),
            "regain_focus" => Ok(PushAction::RegainFocus),
            other => Err(KbError::Caller(format!("{other}: no such push action"))),
        }
    }
}

/// Partial update for the PATCH `device/{id}` endpoint.
///
/// Each field is optional; `None` fields are omitted from the request body
/// so the service leaves those properties unchanged. Field names are
/// renamed to the all-lowercase spellings the service expects.
#[derive(Debug, Default, Serialize)]
pub struct DeviceUpdate {
    /// New display name for the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Move the device into another device group.
    #[serde(rename = "devicegroupid", skip_serializing_if = "Option::is_none")]
    pub device_group_id: Option<i64>,

    /// Whether the per-device override URL is active.
    #[serde(rename = "updateoverrideurl", skip_serializing_if = "Option::is_none")]
    pub update_override_url: Option<bool>,

    /// The per-device override URL itself.
    #[serde(rename = "overrideurl", skip_serializing_if = "Option::is_none")]
    pub override_url: Option<String>,
}

impl DeviceUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.device_group_id.is_none()
            && self.update_override_url.is_none()
            && self.override_url.is_none()
    }
}

/// Retrieves all devices visible to the account.
///
/// # Errors
///
/// - [`KbError::Forbidden`] — the credentials lack access.
/// - [`KbError::Service`] / [`KbError::Transport`] / [`KbError::Normalization`]
///   — per the pipeline contract.
pub async fn list_devices(client: &KbClient) -> Result<Value> {
    client.get("device").await
}

/// Retrieves a single device by its numeric ID.
///
/// # Errors
///
/// [`KbError::NotFound`] when no device has that ID; otherwise per the
/// pipeline contract.
pub async fn get_device(client: &KbClient, id: i64) -> Result<Value> {
    client.get(&format!("device/{id}")).await
}

/// Applies a partial update to a device.
///
/// # Errors
///
/// [`KbError::Caller`] when `update` has no fields set — an empty PATCH is
/// a contract violation, not a no-op; otherwise per the pipeline contract.
pub async fn update_device(client: &KbClient, id: i64, update: &DeviceUpdate) -> Result<Value> {
    if update.is_empty() {
        return Err(KbError::Caller(
            "need at least one of name, devicegroupid, updateoverrideurl, overrideurl".to_string(),
        ));
    }
    client.patch(&format!("device/{id}"), update).await
}

/// Fires a push action at a device.
///
/// The action code is part of the path: GET `push/{id}/{code}`.
pub async fn push(client: &KbClient, id: i64, action: PushAction) -> Result<Value> {
    client.get(&format!("push/{id}/{}", action.code())).await
}
