//! Snapshot request, region and server identity types

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{Error, Result};

/// Current on-disk snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 2;

/// Kind of snapshot being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotType {
    /// Table is disabled; no live region servers are involved
    #[default]
    Disabled,
    /// Online snapshot that flushes memstores first
    Flush,
    /// Online snapshot that skips the flush
    SkipFlush,
}

impl fmt::Display for SnapshotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotType::Disabled => write!(f, "DISABLED"),
            SnapshotType::Flush => write!(f, "FLUSH"),
            SnapshotType::SkipFlush => write!(f, "SKIPFLUSH"),
        }
    }
}

/// Immutable description of one snapshot request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDescription {
    /// Snapshot name, unique among committed snapshots
    pub name: String,
    /// Table the snapshot is taken of
    pub table: String,
    /// Creation time in milliseconds since the epoch
    pub creation_time: i64,
    /// Snapshot type
    #[serde(rename = "type")]
    pub snapshot_type: SnapshotType,
    /// Format version
    pub version: u32,
    /// Per-request deadline override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl SnapshotDescription {
    /// Create a disabled-table snapshot request stamped with the current time
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        SnapshotDescription {
            name: name.into(),
            table: table.into(),
            creation_time: chrono::Utc::now().timestamp_millis(),
            snapshot_type: SnapshotType::Disabled,
            version: SNAPSHOT_FORMAT_VERSION,
            timeout_ms: None,
        }
    }

    /// Set the snapshot type
    pub fn with_type(mut self, snapshot_type: SnapshotType) -> Self {
        self.snapshot_type = snapshot_type;
        self
    }

    /// Set a per-request deadline
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the creation time
    pub fn with_creation_time(mut self, creation_time: i64) -> Self {
        self.creation_time = creation_time;
        self
    }

    /// Render for log and failure messages: `{ ss=S1 table=T type=DISABLED }`
    pub fn describe(&self) -> String {
        format!(
            "{{ ss={} table={} type={} }}",
            self.name, self.table, self.snapshot_type
        )
    }

    /// Check that the request names are usable as directory names
    pub fn validate(&self) -> Result<()> {
        validate_name("snapshot", &self.name)?;
        validate_name("table", &self.table)?;
        if self.creation_time < 0 {
            return Err(Error::invalid_request(format!(
                "creation time {} is before the epoch",
                self.creation_time
            )));
        }
        Ok(())
    }
}

fn validate_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_request(format!("{} name is empty", what)));
    }
    if name.starts_with('.') {
        return Err(Error::invalid_request(format!(
            "{} name '{}' must not start with '.'",
            what, name
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(Error::invalid_request(format!(
            "{} name '{}' contains illegal character {:?}",
            what, name, c
        )));
    }
    Ok(())
}

/// One key-range partition of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionInfo {
    /// Owning table
    pub table: String,
    /// Inclusive start key (empty = table start)
    pub start_key: Vec<u8>,
    /// Exclusive end key (empty = table end)
    pub end_key: Vec<u8>,
    /// Region id, usually the creation timestamp
    pub region_id: u64,
}

impl RegionInfo {
    /// Create a region descriptor
    pub fn new(
        table: impl Into<String>,
        start_key: Vec<u8>,
        end_key: Vec<u8>,
        region_id: u64,
    ) -> Self {
        RegionInfo {
            table: table.into(),
            start_key,
            end_key,
            region_id,
        }
    }

    /// Full region name: `table,startkey,regionid`
    pub fn region_name(&self) -> String {
        format!(
            "{},{},{}",
            self.table,
            String::from_utf8_lossy(&self.start_key),
            self.region_id
        )
    }

    /// Hex digest of the region name, used as the region's directory name
    pub fn encoded_name(&self) -> String {
        format!("{:016x}", xxh3_64(self.region_name().as_bytes()))
    }
}

impl fmt::Display for RegionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.region_name(), self.encoded_name())
    }
}

/// Last-known host of a region
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerName {
    /// Host name
    pub host: String,
    /// Port
    pub port: u16,
    /// Process start code, distinguishes restarts on the same host:port
    pub start_code: u64,
}

impl ServerName {
    /// Create a server identity
    pub fn new(host: impl Into<String>, port: u16, start_code: u64) -> Self {
        ServerName {
            host: host.into(),
            port,
            start_code,
        }
    }

    /// Parse `host,port,startcode`
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 || parts[0].is_empty() {
            return Err(Error::invalid_request(format!(
                "server name '{}' is not host,port,startcode",
                s
            )));
        }
        let port = parts[1]
            .parse::<u16>()
            .map_err(|e| Error::invalid_request(format!("bad port in '{}': {}", s, e)))?;
        let start_code = parts[2]
            .parse::<u64>()
            .map_err(|e| Error::invalid_request(format!("bad start code in '{}': {}", s, e)))?;
        Ok(ServerName::new(parts[0], port, start_code))
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.host, self.port, self.start_code)
    }
}

/// A region paired with its last-known server
pub type RegionLocation = (RegionInfo, ServerName);
