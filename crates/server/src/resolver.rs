//! Update resolution: which manifest, if any, a client should receive.

use crate::error::ApiError;
use ota_core::{Directive, Manifest, Platform, ProtocolVersion};
use ota_metadata::{UpdateRepo, UpdateRow, latest_update};
use tracing::debug;

/// A validated manifest request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateRequest {
    pub protocol: ProtocolVersion,
    pub platform: Platform,
    pub runtime_version: String,
    pub current_update_id: Option<String>,
}

/// Outcome of looking up the latest update for a client.
#[derive(Debug)]
pub enum UpdateDecision {
    Serve {
        record: Box<UpdateRow>,
        manifest: Box<Manifest>,
    },
    /// The lineage has no records.
    NotFound,
    /// The client already runs the latest update.
    AlreadyCurrent,
}

/// What to send back to the client.
#[derive(Debug, PartialEq)]
pub enum UpdateResponse {
    Manifest(Box<Manifest>),
    Directive(Directive),
}

/// Look up the latest update of the request's lineage.
///
/// `AlreadyCurrent` is only reported to protocol 1 clients; any other
/// client with a matching id is served the same manifest again.
pub async fn resolve<R: UpdateRepo + ?Sized>(
    repo: &R,
    request: &UpdateRequest,
) -> Result<UpdateDecision, ApiError> {
    let Some(record) = latest_update(repo, request.platform, &request.runtime_version).await?
    else {
        return Ok(UpdateDecision::NotFound);
    };

    let manifest = record.manifest()?;
    let is_current = request.current_update_id.as_deref() == Some(manifest.id.as_str());
    if is_current && request.protocol.reports_current_update() {
        return Ok(UpdateDecision::AlreadyCurrent);
    }

    Ok(UpdateDecision::Serve {
        record: Box::new(record),
        manifest: Box::new(manifest),
    })
}

/// Map a decision to a response the client's protocol version can carry.
pub fn gate(decision: UpdateDecision, protocol: ProtocolVersion) -> Result<UpdateResponse, ApiError> {
    match (decision, protocol) {
        (UpdateDecision::Serve { record, manifest }, _) => {
            debug!(
                id = %manifest.id,
                partition_key = %record.partition_key,
                sort_key = record.sort_key,
                "serving update"
            );
            Ok(UpdateResponse::Manifest(manifest))
        }
        (UpdateDecision::NotFound | UpdateDecision::AlreadyCurrent, ProtocolVersion::V0) => {
            Err(ApiError::NotFound(
                "NoUpdateAvailable directive not available in protocol version 0".to_string(),
            ))
        }
        (UpdateDecision::NotFound | UpdateDecision::AlreadyCurrent, _) => {
            debug!(%protocol, "no update available");
            Ok(UpdateResponse::Directive(Directive::NoUpdateAvailable))
        }
    }
}
