use std::path::PathBuf;

use crate::{cache, engine, metadata};

/// Batch-level failures: these propagate to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Engine(#[from] engine::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Per-service extraction failures.
///
/// These never propagate past the [`Service`](super::Service) boundary: the
/// correlation engine converts them to an absent-metadata outcome with a
/// diagnostic message, and the service stays listed.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported minipaas_version `{0}`")]
    UnsupportedVersion(String),
    #[error(transparent)]
    Cache(#[from] cache::Error),
    #[error("failed to start extraction container: {0}")]
    Start(#[source] engine::Error),
    #[error("failed to copy metadata out of container: {0}")]
    Copy(#[source] engine::Error),
    #[error("timed out extracting metadata")]
    Timeout,
    #[error("no metadata found in `{0}`")]
    Missing(PathBuf),
    #[error(transparent)]
    Parse(#[from] metadata::Error),
}
