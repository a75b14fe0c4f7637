//! Core domain types and shared logic for OTA update distribution.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Content hashes and asset keys
//! - Asset metadata and manifest structure
//! - Manifest generation from an exported bundle
//! - Platforms, protocol versions and lineage partition keys
//! - The multipart wire codec used for update responses

pub mod asset;
pub mod config;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod multipart;
pub mod update;

pub use asset::{AssetLocation, AssetMetadata};
pub use error::{Error, Result};
pub use hash::{AssetKey, ContentHash, uuid_from_hash};
pub use manifest::{AssetSource, BundleMetadata, Manifest, ManifestBuilder, ManifestInputs};
pub use update::{Directive, Platform, ProtocolVersion, UploadPath, partition_key};

/// Content type of the launch bundle.
pub const LAUNCH_ASSET_CONTENT_TYPE: &str = "application/javascript";

/// File extension reported for the launch bundle.
pub const LAUNCH_ASSET_EXTENSION: &str = "bundle";

/// Content type used when an asset extension has no known mapping.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
