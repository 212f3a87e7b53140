//! Async Rust client library for the KBRemote kiosk device-management API.
//!
//! Provides HMAC-SHA256 request signing, an authenticated HTTP client with
//! transparent rate-limit (429) retry, lossless response normalization into
//! a canonical [`normalize::Value`], and thin resource facades for devices,
//! device groups, profiles, and file groups.
//!
//! # Modules
//!
//! - [`auth`] — Per-request HMAC signature and signed header pair.
//! - [`client`] — Authenticated HTTP executor with 429 retry and uploads.
//! - [`device_groups`] — Device group listing, lookup, and creation.
//! - [`devices`] — Device lookup, partial updates, and push actions.
//! - [`error`] — Typed error hierarchy (`KbError`) for all operations.
//! - [`file_groups`] — File group domain types, file upload and deletion.
//! - [`normalize`] — Canonical response value type and key normalization.
//! - [`profiles`] — Profile listing, lookup, and kiosk URL updates.
//!
//! # Quick Start
//!
//! ```ignore
//! use kbremote::client::KbClient;
//! use kbremote::devices::{self, PushAction};
//!
//! let client = KbClient::new("api-key", "api-secret")?;
//! let all = devices::list_devices(&client).await?;
//! devices::push(&client, 42, PushAction::ReloadUrl).await?;
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod device_groups;
pub mod devices;
pub mod error;
pub mod file_groups;
pub mod normalize;
pub mod profiles;
