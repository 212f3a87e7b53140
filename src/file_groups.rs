//! File group endpoints for the KBRemote API.
//!
//! A file group is a named set of files deployed to devices as local
//! content. The service splits the data across two endpoint families:
//! `filegroup` for the group entity and `filegroupfile` for the file
//! listing, per-file deletion, and multipart upload.
//!
//! - [`list_file_groups`] — GET `filegroup`.
//! - [`get_file_group`] — GET `filegroup/{id}` merged with the file listing
//!   from GET `filegroupfile/{id}`.
//! - [`create_file_group`] — POST `filegroup`.
//! - [`update_file_group`] / [`deploy_changes`] — PATCH `filegroup/{id}`.
//! - [`delete_file`] — DELETE `filegroupfile/{id}` with the path in the body.
//! - [`upload_file`] — POST `filegroupfile` as multipart/form-data.
//! - [`upload_dir`] — recursive sequential upload built atop [`upload_file`].
//!
//! Uploads are not retried on 429 (the multipart form is consumed on send);
//! see the client docs for the full rate-limit contract.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::client::KbClient;
use crate::error::{KbError, Result};
use crate::normalize::{parse_local_timestamp, NormalizeError, Value};

/// Remote root directory that uploads and deletions default to.
pub const DEFAULT_REMOTE_ROOT: &str = "localcontent";

/// A file group entity.
///
/// `files` is populated by [`get_file_group`] (which merges the separate
/// file-listing endpoint) and is empty for groups coming from
/// [`list_file_groups`] or [`create_file_group`]. When present, files are
/// sorted by [`FileEntry::path`].
#[derive(Debug, Clone, PartialEq)]
pub struct FileGroup {
    /// Numeric group ID (`fileGroupID` on the wire).
    pub id: i64,
    /// Display name of the group.
    pub name: String,
    /// Whether uploaded changes are waiting to be deployed to devices.
    pub awaiting_deployment: bool,
    /// Files in the group, sorted by path.
    pub files: Vec<FileEntry>,
}

/// A single file (or folder marker) within a file group.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    /// Bare file name (`fileName` on the wire).
    pub name: String,
    /// Full remote path (`filePath` on the wire).
    pub path: String,
    /// Display label shown in the portal.
    pub display: Option<String>,
    /// Whether this entry is a folder (`isFolder` on the wire).
    pub is_dir: bool,
    /// Size in bytes; zero for folders.
    pub size: i64,
    /// Last modification time (`lastModified` on the wire), when reported.
    pub mtime: Option<DateTime<FixedOffset>>,
}

/// Partial update for the PATCH `filegroup/{id}` endpoint.
#[derive(Debug, Default, Serialize)]
pub struct FileGroupUpdate {
    /// New display name for the group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Set to `true` to deploy pending changes to devices.
    #[serde(rename = "deploychanges", skip_serializing_if = "Option::is_none")]
    pub deploy_changes: Option<bool>,
}

#[derive(Debug, Serialize)]
struct DeleteFile<'a> {
    path: &'a str,
}

fn shape(message: impl Into<String>) -> KbError {
    KbError::Normalization(NormalizeError::Shape(message.into()))
}

impl FileGroup {
    /// Builds a `FileGroup` from a normalized group object. The file listing
    /// is left empty; [`get_file_group`] fills it from the separate endpoint.
    fn from_value(value: &Value) -> Result<FileGroup> {
        let id = value
            .get("fileGroupID")
            .and_then(Value::as_i64)
            .ok_or_else(|| shape("file group response missing `fileGroupID`"))?;
        Ok(FileGroup {
            id,
            name: value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            awaiting_deployment: value
                .get("awaitingDeployment")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            files: Vec::new(),
        })
    }
}

impl FileEntry {
    fn from_value(value: &Value) -> Result<FileEntry> {
        let name = value
            .get("fileName")
            .and_then(Value::as_str)
            .ok_or_else(|| shape("file listing entry missing `fileName`"))?
            .to_string();
        let path = value
            .get("filePath")
            .and_then(Value::as_str)
            .ok_or_else(|| shape("file listing entry missing `filePath`"))?
            .to_string();
        let mtime = match value.get("lastModified").and_then(Value::as_str) {
            Some(raw) => Some(parse_mtime(raw)?),
            None => None,
        };
        Ok(FileEntry {
            name,
            path,
            display: value
                .get("display")
                .and_then(Value::as_str)
                .map(str::to_string),
            is_dir: value
                .get("isFolder")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            size: value.get("size").and_then(Value::as_i64).unwrap_or(0),
            mtime,
        })
    }
}

/// Parses the `lastModified` string the file listing reports.
///
/// The service has been observed emitting both RFC 3339 and the same
/// zone-less local format used by `created`/`lastContacted`.
fn parse_mtime(raw: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts);
    }
    Ok(parse_local_timestamp("lastModified", raw)?)
}

/// Retrieves all file groups, without their file listings.
pub async fn list_file_groups(client: &KbClient) -> Result<Vec<FileGroup>> {
    let response = client.get("filegroup").await?;
    let groups = response
        .as_array()
        .ok_or_else(|| shape("file group listing is not an array"))?;
    groups.iter().map(FileGroup::from_value).collect()
}

/// Retrieves a file group together with its file listing.
///
/// Issues GET `filegroup/{id}` for the entity and GET `filegroupfile/{id}`
/// for the files, then merges them; the resulting `files` are sorted by
/// path.
pub async fn get_file_group(client: &KbClient, id: i64) -> Result<FileGroup> {
    let mut group = FileGroup::from_value(&client.get(&format!("filegroup/{id}")).await?)?;

    let listing = client.get(&format!("filegroupfile/{id}")).await?;
    if let Some(files) = listing.get("files").and_then(Value::as_array) {
        group.files = files
            .iter()
            .map(FileEntry::from_value)
            .collect::<Result<Vec<_>>>()?;
        group.files.sort_by(|a, b| a.path.cmp(&b.path));
    }
    Ok(group)
}

/// Creates a file group. The service nests the new entity under the
/// response's `filegroup` key.
pub async fn create_file_group(client: &KbClient, name: &str) -> Result<FileGroup> {
    #[derive(Serialize)]
    struct CreateFileGroup<'a> {
        name: &'a str,
    }
    let response = client.post("filegroup", &CreateFileGroup { name }).await?;
    let group = response
        .get("filegroup")
        .ok_or_else(|| shape("create response missing `filegroup`"))?;
    FileGroup::from_value(group)
}

/// Applies a partial update to a file group. Returns the service's
/// `updated` flag.
///
/// # Errors
///
/// [`KbError::Caller`] when `update` has no fields set.
pub async fn update_file_group(
    client: &KbClient,
    id: i64,
    update: &FileGroupUpdate,
) -> Result<bool> {
    if update.name.is_none() && update.deploy_changes.is_none() {
        return Err(KbError::Caller(
            "need at least one of name, deploychanges".to_string(),
        ));
    }
    let response = client.patch(&format!("filegroup/{id}"), update).await?;
    Ok(response.get("updated").and_then(Value::as_bool).unwrap_or(false))
}

/// Deploys pending changes to the devices using this group.
pub async fn deploy_changes(client: &KbClient, id: i64) -> Result<bool> {
    let update = FileGroupUpdate {
        deploy_changes: Some(true),
        ..Default::default()
    };
    update_file_group(client, id, &update).await
}

/// Deletes a file from a group. `path` is relative to `remote_root`
/// (default [`DEFAULT_REMOTE_ROOT`]). Returns the service's `deleted` flag.
pub async fn delete_file(
    client: &KbClient,
    id: i64,
    path: &str,
    remote_root: Option<&str>,
) -> Result<bool> {
    let root = remote_root.unwrap_or(DEFAULT_REMOTE_ROOT);
    let remote_path = format!("{root}/{path}");
    let response = client
        .delete(&format!("filegroupfile/{id}"), Some(&DeleteFile { path: &remote_path }))
        .await?;
    Ok(response.get("deleted").and_then(Value::as_bool).unwrap_or(false))
}

/// Uploads a single local file into a group.
///
/// The remote path is `<root>/[<remote_directory>/]<file name>` with the
/// root defaulting to [`DEFAULT_REMOTE_ROOT`]. Returns the service's
/// `uploaded` flag.
///
/// # Errors
///
/// - [`KbError::Caller`] — `local` has no file name component.
/// - [`KbError::Io`] — the local file could not be read.
/// - [`KbError::Service`] — non-success status, including 429 (uploads are
///   not retried; rebuild and resend to retry).
pub async fn upload_file(
    client: &KbClient,
    id: i64,
    local: &Path,
    remote_directory: Option<&str>,
    remote_root: Option<&str>,
) -> Result<bool> {
    let file_name = local
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| KbError::Caller(format!("{}: not a file path", local.display())))?
        .to_string();

    let root = remote_root.unwrap_or(DEFAULT_REMOTE_ROOT);
    let remote_path = match remote_directory {
        Some(dir) => format!("{root}/{dir}/{file_name}"),
        None => format!("{root}/{file_name}"),
    };

    tracing::debug!(local = %local.display(), remote = %remote_path, "uploading file");

    let bytes = tokio::fs::read(local).await?;
    let form = reqwest::multipart::Form::new()
        .text("filegroupid", id.to_string())
        .text("path", remote_path)
        .part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(file_name),
        );

    let response = client.upload("filegroupfile", form).await?;
    Ok(response.get("uploaded").and_then(Value::as_bool).unwrap_or(false))
}

/// Uploads a directory tree into a group, sequentially, one file at a time.
///
/// The directory's own name becomes the remote directory under
/// `remote_root` (default [`DEFAULT_REMOTE_ROOT`]), and subdirectories
/// recurse with the root extended accordingly, so the remote layout mirrors
/// the local one. Entries are visited in name order for deterministic
/// upload sequences.
///
/// # Errors
///
/// [`KbError::UploadRejected`] as soon as the service declines a file; the
/// remaining entries are not attempted.
pub async fn upload_dir(
    client: &KbClient,
    id: i64,
    dir: &Path,
    remote_root: Option<&str>,
) -> Result<()> {
    let root = remote_root.unwrap_or(DEFAULT_REMOTE_ROOT).to_string();
    let remote_dir = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| KbError::Caller(format!("{}: not a directory path", dir.display())))?
        .to_string();

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_file() {
            let ok = upload_file(client, id, &path, Some(&remote_dir), Some(&root)).await?;
            if !ok {
                return Err(KbError::UploadRejected {
                    path: path.display().to_string(),
                });
            }
        } else if file_type.is_dir() {
            let nested_root = format!("{root}/{remote_dir}");
            Box::pin(upload_dir(client, id, &path, Some(&nested_root))).await?;
        }
    }
    Ok(())
}
