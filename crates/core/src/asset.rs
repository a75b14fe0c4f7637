//! Asset descriptions as they appear in a manifest.

use crate::hash::{AssetKey, ContentHash};
use crate::{FALLBACK_CONTENT_TYPE, LAUNCH_ASSET_CONTENT_TYPE, LAUNCH_ASSET_EXTENSION};
use serde::{Deserialize, Serialize};

/// Metadata a client needs to fetch and verify one asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    /// Unpadded base64url SHA-256 of the content.
    pub hash: String,
    /// Lowercase hex MD5 of the content.
    pub key: String,
    /// Extension with a leading dot.
    pub file_extension: String,
    pub content_type: String,
    pub url: String,
}

impl AssetMetadata {
    /// Describe asset content.
    ///
    /// The launch asset always reports `.bundle` and `application/javascript`;
    /// other assets derive both from their declared extension.
    pub fn describe(bytes: &[u8], ext: Option<&str>, is_launch_asset: bool, url: String) -> Self {
        let (file_extension, content_type) = if is_launch_asset {
            (
                format!(".{LAUNCH_ASSET_EXTENSION}"),
                LAUNCH_ASSET_CONTENT_TYPE.to_string(),
            )
        } else {
            let ext = ext.unwrap_or_default().trim_start_matches('.');
            (format!(".{ext}"), content_type_for_extension(ext))
        };

        Self {
            hash: ContentHash::compute(bytes).to_base64url(),
            key: AssetKey::compute(bytes).to_hex(),
            file_extension,
            content_type,
            url,
        }
    }
}

/// Content type for a file extension, falling back to `application/octet-stream`.
pub fn content_type_for_extension(ext: &str) -> String {
    mime_guess::from_ext(ext)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

/// Where a publish's assets are served from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetLocation {
    base_url: String,
    upload_path: String,
}

impl AssetLocation {
    pub fn new(base_url: &str, upload_path: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_path: upload_path.trim_matches('/').to_string(),
        }
    }

    /// Public URL of an asset given its path relative to the export directory.
    pub fn url_for(&self, relative_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.upload_path,
            relative_path.trim_start_matches('/')
        )
    }
}
