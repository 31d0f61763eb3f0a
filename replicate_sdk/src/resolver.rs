use tracing::{debug, warn};

use crate::dto::{ModelReference, ModelVersion, ModelVersionList, PredictionError, ResolvedModel};
use crate::helpers;
use crate::transport::{RequestEvent, Transport, TransportRequest};

/// Fetch the version list for `reference.path` and pick the version to use.
///
/// See [`select_version`] for the selection rule. Transport failures and
/// undecodable payloads are returned unchanged; an empty list is a
/// [`PredictionError::Resolution`].
pub async fn resolve_model(
    transport: &dyn Transport,
    token: Option<&str>,
    reference: &ModelReference,
) -> Result<ResolvedModel, PredictionError> {
    let request = TransportRequest::new(
        helpers::versions_path(&reference.path),
        RequestEvent::GetModel,
        token.map(str::to_string),
    );
    let payload = transport.get(request).await?;
    let listing: ModelVersionList = helpers::decode(payload)?;
    debug!(model = %reference.path, versions = listing.results.len(), "fetched model versions");

    let version = select_version(&reference.path, reference.version.as_deref(), listing.results)?;

    Ok(ResolvedModel {
        path: reference.path.clone(),
        version,
    })
}

/// Pick `requested` when it is listed, otherwise the first (most recent)
/// version.
///
/// Asking for a version that is not listed is not an error: the most recent
/// version is used and a warning is logged.
pub fn select_version(
    path: &str,
    requested: Option<&str>,
    versions: Vec<ModelVersion>,
) -> Result<ModelVersion, PredictionError> {
    let mut versions = versions.into_iter();
    let most_recent = versions
        .next()
        .ok_or_else(|| PredictionError::Resolution(format!("model {path} has no versions")))?;

    let Some(requested) = requested else {
        return Ok(most_recent);
    };

    if most_recent.id == requested {
        return Ok(most_recent);
    }

    match versions.find(|version| version.id == requested) {
        Some(version) => Ok(version),
        None => {
            warn!(
                model = %path,
                requested = %requested,
                fallback = %most_recent.id,
                "model version not found, defaulting to most recent"
            );
            Ok(most_recent)
        }
    }
}
