//! Multipart encoding of resolver responses.

use crate::error::ApiError;
use crate::resolver::UpdateResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ota_core::multipart::{JSON, JSON_UTF8, MultipartBuilder};
use ota_core::{Directive, Manifest, ProtocolVersion};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

pub const PROTOCOL_VERSION_HEADER: &str = "expo-protocol-version";
pub const SFV_VERSION_HEADER: &str = "expo-sfv-version";
const CACHE_CONTROL: &str = "private, max-age=0";

/// Encode a resolver response as a `multipart/mixed` body.
pub fn encode_update(
    response: &UpdateResponse,
    protocol: ProtocolVersion,
    asset_request_headers: &BTreeMap<String, String>,
) -> Result<Response, ApiError> {
    match response {
        UpdateResponse::Manifest(manifest) => {
            encode_manifest(manifest, protocol, asset_request_headers)
        }
        UpdateResponse::Directive(directive) => encode_directive(directive),
    }
}

fn encode_manifest(
    manifest: &Manifest,
    protocol: ProtocolVersion,
    asset_request_headers: &BTreeMap<String, String>,
) -> Result<Response, ApiError> {
    let headers: Map<String, Value> = asset_request_headers
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();
    let per_asset: Map<String, Value> = manifest
        .asset_keys()
        .map(|key| (key.to_string(), Value::Object(headers.clone())))
        .collect();
    let extensions = json!({ "assetRequestHeaders": per_asset });

    let builder = MultipartBuilder::new()
        .part("manifest", Some(JSON_UTF8), &manifest.to_json()?)
        .part("extensions", Some(JSON), extensions.to_string().as_bytes());
    Ok(multipart_response(builder, protocol))
}

fn encode_directive(directive: &Directive) -> Result<Response, ApiError> {
    let body = serde_json::to_vec(directive)
        .map_err(|e| ApiError::Internal(format!("failed to encode directive: {e}")))?;
    let builder = MultipartBuilder::new().part("directive", Some(JSON_UTF8), &body);
    // Directives only exist in protocol 1.
    Ok(multipart_response(builder, ProtocolVersion::V1))
}

fn multipart_response(builder: MultipartBuilder, protocol: ProtocolVersion) -> Response {
    let content_type = builder.content_type();
    let body = builder.finish();
    (
        StatusCode::OK,
        [
            (PROTOCOL_VERSION_HEADER, protocol.to_string()),
            (SFV_VERSION_HEADER, "0".to_string()),
            ("cache-control", CACHE_CONTROL.to_string()),
            ("content-type", content_type),
        ],
        body,
    )
        .into_response()
}
