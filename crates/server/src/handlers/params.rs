//! Request parameters read from headers with a query-string fallback.

use crate::error::ApiError;
use axum::http::HeaderMap;
use serde::Deserialize;

pub const PLATFORM_HEADER: &str = "expo-platform";
pub const RUNTIME_VERSION_HEADER: &str = "expo-runtime-version";
pub const CURRENT_UPDATE_ID_HEADER: &str = "expo-current-update-id";
pub const OTA_UPDATE_VERSION_HEADER: &str = "expo-ota-update-version";

/// Query-string fallbacks. Headers take precedence when present.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateQuery {
    pub platform: Option<String>,
    #[serde(rename = "runtime-version")]
    pub runtime_version: Option<String>,
    #[serde(rename = "ota-update-version")]
    pub ota_update_version: Option<String>,
}

/// Value of a header, or the query fallback when the header is absent.
///
/// A header that is present but not visible ASCII reads as empty.
pub fn header_or_query<'a>(
    headers: &'a HeaderMap,
    name: &str,
    fallback: Option<&'a str>,
) -> Option<&'a str> {
    match headers.get(name) {
        Some(value) => Some(value.to_str().unwrap_or_default()),
        None => fallback,
    }
}

/// Runtime version, required and non-empty.
pub fn runtime_version<'a>(
    headers: &'a HeaderMap,
    query: &'a UpdateQuery,
) -> Result<&'a str, ApiError> {
    header_or_query(headers, RUNTIME_VERSION_HEADER, query.runtime_version.as_deref())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No runtimeVersion provided.".to_string()))
}
