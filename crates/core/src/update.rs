//! Platforms, protocol versions and update lineages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target platform of an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Every supported platform, in publish order.
    pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(crate::Error::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// Update protocol version negotiated with the client.
///
/// Clients send a non-negative integer. Versions other than 0 and 1 are
/// carried through unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(u32);

impl ProtocolVersion {
    pub const V0: ProtocolVersion = ProtocolVersion(0);
    pub const V1: ProtocolVersion = ProtocolVersion(1);

    pub fn new(version: u32) -> Self {
        Self(version)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Parse the protocol version header value. An absent header means version 0.
    pub fn parse(value: Option<&str>) -> crate::Result<Self> {
        match value.map(str::trim) {
            None => Ok(ProtocolVersion::V0),
            Some(raw) => raw
                .parse::<u32>()
                .map(ProtocolVersion)
                .map_err(|_| crate::Error::UnsupportedProtocolVersion(raw.to_string())),
        }
    }

    /// Whether a no-update directive can be sent. Only version 0 lacks it.
    pub fn supports_directives(&self) -> bool {
        *self != ProtocolVersion::V0
    }

    /// Whether a client already on the latest update is told so.
    /// Only version 1 reports it; other versions are served the manifest again.
    pub fn reports_current_update(&self) -> bool {
        *self == ProtocolVersion::V1
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partition key of the update lineage for a platform and runtime version.
pub fn partition_key(platform: Platform, runtime_version: &str) -> String {
    format!("{}-{}", platform.as_str(), runtime_version)
}

/// Storage prefix of one publish: `<runtime version>/<ota update version>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPath {
    pub runtime_version: String,
    pub ota_update_version: String,
}

impl UploadPath {
    pub fn new(runtime_version: impl Into<String>, ota_update_version: impl Into<String>) -> Self {
        Self {
            runtime_version: runtime_version.into(),
            ota_update_version: ota_update_version.into(),
        }
    }

    /// Parse `<runtime version>/<ota update version>`.
    ///
    /// The version label is the last path segment.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let (runtime_version, version) = s
            .trim_matches('/')
            .rsplit_once('/')
            .ok_or_else(|| crate::Error::InvalidUploadPath(s.to_string()))?;
        if runtime_version.is_empty() || version.is_empty() {
            return Err(crate::Error::InvalidUploadPath(s.to_string()));
        }
        Ok(Self::new(runtime_version, version))
    }
}

impl fmt::Display for UploadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.runtime_version, self.ota_update_version)
    }
}

/// Instruction sent to a client instead of a manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Directive {
    /// The client already runs the newest update, or none exists.
    NoUpdateAvailable,
}
