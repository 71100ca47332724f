//! Metadata extraction pipeline.
//!
//! Per image: locate or produce a local cache of the image's embedded
//! metadata directory. The pipeline is a short state machine: a cache hit
//! finishes immediately; otherwise an ephemeral container is started, the
//! metadata directory copied out under the retry policy, the container torn
//! down exactly once, and the copied file parsed and verified. Every failure
//! resolves to an [`ExtractError`] that the correlation engine turns into an
//! absent-metadata outcome for that one service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::Engine;
use crate::metadata::{self, Metadata};
use crate::retry::{RetryOptions, retry};

use super::ExtractError;

/// Path of the metadata directory inside a service image.
const METADATA_SOURCE: &str = "/etc/minipaas";

/// Directory the copy materializes under the image's cache directory.
const METADATA_DIR: &str = "minipaas";

/// Candidate metadata file names; presence of any one marks a completed,
/// valid extraction.
const METADATA_FILES: [&str; 3] = ["service.json", "service.jsonld", "service.ttl"];

/// The target directory inside a freshly started container may not exist for
/// a brief window, so the copy is retried on a fixed schedule.
const COPY_RETRY: RetryOptions = RetryOptions {
    attempts: 8,
    delay: Duration::from_millis(2000),
};

/// Bound on the copy-and-teardown sequence. Must exceed the worst-case retry
/// schedule so a slow engine is not mistaken for a hang.
const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Returns the first existing candidate metadata file under the image's
/// cache directory.
///
/// This is the idempotence check: once a previous run has extracted a file,
/// later runs never touch the engine for this image id again.
pub(super) fn quick_verify(container_path: &Path) -> Option<PathBuf> {
    METADATA_FILES
        .iter()
        .map(|name| container_path.join(METADATA_DIR).join(name))
        .find(|path| path.exists())
}

/// Runs the extraction pipeline for one image.
///
/// The ephemeral container is stopped and removed exactly once, whether the
/// copy succeeds, exhausts its retries, or times out; teardown is awaited so
/// no container leaks.
pub(super) async fn extract<E: Engine>(
    engine: &E,
    container_path: &Path,
    image_id: &str,
) -> Result<Metadata, ExtractError> {
    if let Some(file) = quick_verify(container_path) {
        log::debug!("using cached metadata for `{image_id}`");
        return Ok(metadata::parse(image_id, &file)?);
    }

    let container_id = engine
        .start_for_extraction(image_id)
        .await
        .map_err(ExtractError::Start)?;

    let copy = retry(
        || engine.cp(&container_id, METADATA_SOURCE, container_path),
        COPY_RETRY,
    );
    let outcome = tokio::time::timeout(EXTRACTION_TIMEOUT, copy).await;

    if let Err(err) = engine.stop(&container_id).await {
        log::warn!("failed to stop extraction container `{container_id}`: {err}");
    }

    match outcome {
        Err(_elapsed) => Err(ExtractError::Timeout),
        Ok(Err(err)) => Err(ExtractError::Copy(err)),
        Ok(Ok(())) => {
            let file = quick_verify(container_path)
                .ok_or_else(|| ExtractError::Missing(container_path.to_path_buf()))?;
            Ok(metadata::parse(image_id, &file)?)
        }
    }
}
