//! Service inventory: the unit of output and the correlation engine that
//! builds it.
//!
//! A [`Service`] merges one image, its declared environment, and the matched
//! running container (a weak association looked up by image id, never owned).
//! Services are constructed fresh on every inventory pass; extraction results
//! are memoized only through the on-disk cache.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{TimeDelta, Utc};

mod error;
mod extract;
mod manager;

pub use error::{Error, ExtractError, Result};
pub use manager::ServiceManager;

use crate::engine::{ContainerRecord, ImageRecord, InspectedImage};
use crate::metadata::Metadata;

/// Environment variable a managed service image must declare.
pub const VERSION_MARKER: &str = "minipaas_version";

/// Marker value of a supported managed service.
pub const SUPPORTED_VERSION: &str = "1";

/// One service image with its correlated runtime and metadata state.
#[derive(Debug)]
pub struct Service {
    pub image: ImageRecord,
    /// Environment declared by the image.
    pub env: HashMap<String, String>,
    /// The running container matched by image id, if any.
    pub container: Option<ContainerRecord>,
    /// Local metadata cache directory, once resolved.
    pub container_path: Option<PathBuf>,
    /// Extracted metadata; `None` for unmanaged services and for failed
    /// extractions.
    pub metadata: Option<Metadata>,
    /// Human-readable reason metadata is absent despite the version marker.
    pub diagnostic: Option<String>,
}

/// Display status of a service, computed on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    /// Metadata retrieval failed.
    Error,
    /// A matched container reports running state.
    Running { since: Option<TimeDelta> },
    Stopped,
}

impl Service {
    pub(crate) fn new(inspected: InspectedImage) -> Self {
        Self {
            image: inspected.image,
            env: inspected.env,
            container: inspected.container,
            container_path: None,
            metadata: None,
            diagnostic: None,
        }
    }

    /// The image's declared `minipaas_version`, if any. Absence means the
    /// image is not a managed service.
    pub fn minipaas_version(&self) -> Option<&str> {
        self.env.get(VERSION_MARKER).map(String::as_str)
    }

    pub fn status(&self) -> ServiceStatus {
        if self.diagnostic.is_some() {
            return ServiceStatus::Error;
        }
        match self.container {
            Some(ref container) if container.running => ServiceStatus::Running {
                since: container
                    .started_at
                    .map(|started_at| Utc::now() - started_at),
            },
            _ => ServiceStatus::Stopped,
        }
    }
}
