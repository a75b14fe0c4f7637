//! Manifest endpoint: the request-time update resolver.

use super::params::{
    CURRENT_UPDATE_ID_HEADER, PLATFORM_HEADER, UpdateQuery, header_or_query, runtime_version,
};
use crate::error::{ApiError, ApiResult};
use crate::metrics::{RESOLVE_DURATION, record_manifest_outcome};
use crate::resolver::{UpdateRequest, UpdateResponse, gate, resolve};
use crate::response::{PROTOCOL_VERSION_HEADER, encode_update};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use ota_core::{Error as CoreError, Platform, ProtocolVersion};

/// GET /api/manifest
pub async fn get_manifest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UpdateQuery>,
) -> ApiResult<Response> {
    let request = parse_update_request(&headers, &query).inspect_err(|_| {
        record_manifest_outcome("bad_request");
    })?;

    let _timer = RESOLVE_DURATION.start_timer();
    let server = &state.config.server;
    let result = async {
        let decision = resolve(state.metadata.as_ref(), &request).await?;
        let response = gate(decision, request.protocol)?;
        let encoded = encode_update(&response, request.protocol, &server.asset_request_headers)?;
        Ok::<_, ApiError>((response, encoded))
    }
    .await;

    match result {
        Ok((UpdateResponse::Manifest(_), encoded)) => {
            record_manifest_outcome("update");
            Ok(encoded)
        }
        Ok((UpdateResponse::Directive(_), encoded)) => {
            record_manifest_outcome("no_update");
            Ok(encoded)
        }
        Err(e) => {
            record_manifest_outcome("not_found");
            Err(e.into_not_found(server.expose_error_details))
        }
    }
}

/// Validate the request in order: protocol version, platform, runtime version.
pub fn parse_update_request(headers: &HeaderMap, query: &UpdateQuery) -> ApiResult<UpdateRequest> {
    let protocol = protocol_version(headers)?;

    let platform = header_or_query(headers, PLATFORM_HEADER, query.platform.as_deref())
        .unwrap_or_default()
        .parse::<Platform>()
        .map_err(bad_request)?;

    let runtime_version = runtime_version(headers, query)?.to_string();

    let current_update_id = headers
        .get(CURRENT_UPDATE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    Ok(UpdateRequest {
        protocol,
        platform,
        runtime_version,
        current_update_id,
    })
}

/// The protocol version header must carry at most one value.
fn protocol_version(headers: &HeaderMap) -> ApiResult<ProtocolVersion> {
    let mut values = headers.get_all(PROTOCOL_VERSION_HEADER).iter();
    match (values.next(), values.next()) {
        (None, _) => Ok(ProtocolVersion::V0),
        (Some(value), None) => {
            let value = value.to_str().unwrap_or_default();
            ProtocolVersion::parse(Some(value)).map_err(bad_request)
        }
        (Some(_), Some(_)) => Err(bad_request(CoreError::UnsupportedProtocolVersion(
            "multiple values".to_string(),
        ))),
    }
}

fn bad_request(err: CoreError) -> ApiError {
    ApiError::BadRequest(err.to_string())
}
