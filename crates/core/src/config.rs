//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Include the underlying failure message in 404 bodies (default: true).
    /// Disable to return a generic message instead.
    #[serde(default = "default_expose_error_details")]
    pub expose_error_details: bool,
    /// Headers clients must send when fetching each asset.
    /// Advertised in the `extensions` part for every asset key.
    #[serde(default)]
    pub asset_request_headers: BTreeMap<String, String>,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_expose_error_details() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
            expose_error_details: default_expose_error_details(),
            asset_request_headers: BTreeMap::new(),
        }
    }
}

/// Object storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
    /// S3-compatible storage.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for MinIO, etc.).
        endpoint: Option<String>,
        /// AWS region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// AWS access key ID. Falls back to AWS_ACCESS_KEY_ID env var if not set.
        access_key_id: Option<String>,
        /// AWS secret access key. Falls back to AWS_SECRET_ACCESS_KEY env var if not set.
        secret_access_key: Option<String>,
        /// Force path-style URLs. Required for MinIO and some S3-compatible services.
        #[serde(default)]
        force_path_style: bool,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/updates"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::S3 {
                bucket,
                access_key_id,
                secret_access_key,
                ..
            } => {
                if bucket.is_empty() {
                    return Err("s3 config requires a non-empty bucket".to_string());
                }
                match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                    (Some(_), Some(_)) | (None, None) => Ok(()),
                    _ => Err(
                        "s3 config requires both access_key_id and secret_access_key when either is set"
                            .to_string(),
                    ),
                }
            }
            StorageConfig::Filesystem { .. } => Ok(()),
        }
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database.
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Advisory query timeout in seconds. Slow queries are logged, not cancelled.
        #[serde(default = "default_sqlite_query_timeout_secs")]
        query_timeout_secs: Option<u64>,
    },
}

fn default_sqlite_query_timeout_secs() -> Option<u64> {
    Some(30)
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/metadata.db"),
            query_timeout_secs: default_sqlite_query_timeout_secs(),
        }
    }
}

/// Settings used when generating manifests for a publish.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Public base URL under which uploaded assets are served.
    pub assets_base_url: String,
    /// Mark generated updates as mandatory.
    #[serde(default)]
    pub mandatory: bool,
}

impl PublishConfig {
    /// Parse the `MANDATORY` flag convention: only `y` or `Y` enable it.
    pub fn parse_mandatory_flag(value: Option<&str>) -> bool {
        matches!(value, Some("y") | Some("Y"))
    }
}

/// Complete server configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses filesystem storage and SQLite metadata.
    pub fn for_testing() -> Self {
        Self::default()
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), String> {
        self.storage.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config: ServerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.bind, "0.0.0.0:3000");
        assert!(config.metrics_enabled);
        assert!(config.expose_error_details);
        assert!(config.asset_request_headers.is_empty());
    }

    #[test]
    fn test_asset_request_headers_deserialize() {
        let json = r#"{"asset_request_headers": {"test-header": "test-header-value"}}"#;
        let config: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.asset_request_headers.get("test-header").map(String::as_str),
            Some("test-header-value")
        );
    }

    #[test]
    fn test_storage_config_s3_validate_partial_credentials() {
        let invalid = StorageConfig::S3 {
            bucket: "bucket".to_string(),
            endpoint: None,
            region: None,
            prefix: None,
            access_key_id: Some("access-key".to_string()),
            secret_access_key: None,
            force_path_style: false,
        };
        assert!(invalid.validate().is_err());

        let valid = StorageConfig::S3 {
            bucket: "bucket".to_string(),
            endpoint: None,
            region: None,
            prefix: None,
            access_key_id: Some("access-key".to_string()),
            secret_access_key: Some("secret-key".to_string()),
            force_path_style: false,
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_storage_config_s3_rejects_empty_bucket() {
        let json = r#"{"type":"s3","bucket":""}"#;
        let config: StorageConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_config_s3_force_path_style_defaults_to_false() {
        let json = r#"{"type":"s3","bucket":"test","endpoint":"https://s3.amazonaws.com"}"#;
        let config: StorageConfig = serde_json::from_str(json).unwrap();
        match config {
            StorageConfig::S3 {
                force_path_style, ..
            } => assert!(!force_path_style),
            _ => panic!("expected S3 config"),
        }
    }

    #[test]
    fn test_metadata_config_sqlite_default_timeout() {
        let json = r#"{"type":"sqlite","path":"/tmp/ota.db"}"#;
        let config: MetadataConfig = serde_json::from_str(json).unwrap();
        let MetadataConfig::Sqlite {
            query_timeout_secs, ..
        } = config;
        assert_eq!(query_timeout_secs, Some(30));
    }

    #[test]
    fn test_mandatory_flag_parsing() {
        assert!(PublishConfig::parse_mandatory_flag(Some("y")));
        assert!(PublishConfig::parse_mandatory_flag(Some("Y")));
        assert!(!PublishConfig::parse_mandatory_flag(Some("yes")));
        assert!(!PublishConfig::parse_mandatory_flag(Some("n")));
        assert!(!PublishConfig::parse_mandatory_flag(None));
    }
}
