//! Response normalization for the KBRemote API.
//!
//! The service is inconsistent about response key casing: the same field can
//! arrive as `FileGroupID`, `Name`, or `ID` depending on the endpoint. This
//! module rewrites parsed JSON into a canonical [`Value`] so facades and
//! callers only ever see one spelling:
//!
//! - Keys with no lowercase letters are lowercased whole (`ID` → `id`, the
//!   abbreviation rule); every other key has its first character lowercased
//!   and the rest left alone (`FileGroupID` → `fileGroupID`).
//! - String values under the keys `lastContacted` and `created` are emitted
//!   by the service as local time with no zone suffix; they are interpreted
//!   in the process-local zone and parsed into [`Value::Timestamp`]. A
//!   malformed timestamp is an error, never silently passed through.
//!
//! Normalization is a pure function over well-formed JSON — no I/O, and
//! running it over already-canonical input is a no-op.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};

/// Format the service uses for zone-less timestamp strings.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Response keys whose string values are zone-less local timestamps.
const TIMESTAMP_KEYS: [&str; 2] = ["lastContacted", "created"];

/// A failure while normalizing a response body.
///
/// Distinct from the transport/status errors in [`crate::error::KbError`]:
/// the HTTP round trip succeeded but the body could not be brought into
/// canonical form.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// A string under a timestamp key could not be parsed as a local time.
    #[error("invalid timestamp {value:?} under key `{key}`")]
    Timestamp {
        /// The canonical key the value was found under.
        key: String,
        /// The raw string that failed to parse.
        value: String,
        /// The underlying chrono parse error, absent when the wall-clock
        /// time does not exist in the local zone (DST gap).
        #[source]
        source: Option<chrono::ParseError>,
    },

    /// The response body was not well-formed JSON.
    #[error("response body is not well-formed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A normalized response was missing a key or type the caller requires.
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

/// A normalized response value.
///
/// Mirrors the JSON data model with two differences: mapping keys are
/// canonical (see module docs) and timestamp strings under known keys are
/// parsed into [`DateTime<FixedOffset>`]. Key order in objects carries no
/// meaning, so a sorted map is used.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number, kept lossless via [`serde_json::Number`].
    Number(serde_json::Number),
    /// JSON string (not under a timestamp key).
    String(String),
    /// A parsed timestamp from a `lastContacted`/`created` field.
    Timestamp(DateTime<FixedOffset>),
    /// JSON array, element order preserved.
    Array(Vec<Value>),
    /// JSON object with canonical keys.
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Looks up a key in an object; `None` for non-objects and missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Returns the string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value if this is a number representable as `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Returns the boolean if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the parsed timestamp if this is a timestamp.
    pub fn as_timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Returns the elements if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the key/value map if this is an object.
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// `true` only for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Rewrites a parsed JSON response into canonical form.
///
/// # Errors
///
/// [`NormalizeError::Timestamp`] when a string under `lastContacted` or
/// `created` is not a valid `YYYY-MM-DD HH:MM:SS` local time.
pub fn normalize(raw: serde_json::Value) -> Result<Value, NormalizeError> {
    normalize_value(raw, None)
}

fn normalize_value(
    raw: serde_json::Value,
    parent_key: Option<&str>,
) -> Result<Value, NormalizeError> {
    match raw {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => Ok(Value::Number(n)),
        serde_json::Value::String(s) => match parent_key {
            Some(key) if TIMESTAMP_KEYS.contains(&key) => {
                parse_local_timestamp(key, &s).map(Value::Timestamp)
            }
            _ => Ok(Value::String(s)),
        },
        // parent_key is deliberately not propagated into elements: the
        // timestamp rule keys off the enclosing mapping key only.
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| normalize_value(item, None))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_json::Value::Object(map) => {
            let mut out = BTreeMap::new();
            for (key, value) in map {
                let key = canonical_key(&key);
                let value = normalize_value(value, Some(&key))?;
                out.insert(key, value);
            }
            Ok(Value::Object(out))
        }
    }
}

/// Derives the canonical spelling of a response key.
///
/// Keys with no lowercase letters (abbreviations like `ID`) are lowercased
/// whole; everything else has only its first character lowercased.
/// Idempotent: canonical keys pass through unchanged.
fn canonical_key(raw: &str) -> String {
    if !raw.chars().any(|c| c.is_lowercase()) {
        return raw.to_lowercase();
    }
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parses a zone-less `YYYY-MM-DD HH:MM:SS` string as process-local time.
///
/// The service emits local wall-clock time with no offset, so the offset is
/// reconstructed from the executing process's zone. During a DST transition
/// where the wall-clock time is ambiguous, the earlier interpretation wins.
pub(crate) fn parse_local_timestamp(
    key: &str,
    raw: &str,
) -> Result<DateTime<FixedOffset>, NormalizeError> {
    let naive =
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|source| {
            NormalizeError::Timestamp {
                key: key.to_string(),
                value: raw.to_string(),
                source: Some(source),
            }
        })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| NormalizeError::Timestamp {
            key: key.to_string(),
            value: raw.to_string(),
            source: None,
        })
}
