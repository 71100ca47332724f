//! Service correlation engine.
//!
//! Merges the runtime container table with the image table into one
//! [`Service`] per selected image, drives metadata extraction for managed
//! services, and exposes the batch start/stop/pull operations. Extraction
//! pipelines fan out concurrently; one service's failure or slowness never
//! blocks another's.

use futures::future::join_all;

use crate::cache::CacheDir;
use crate::engine::Engine;
use crate::metadata::Metadata;

use super::extract;
use super::{ExtractError, Result, SUPPORTED_VERSION, Service};

pub struct ServiceManager<E> {
    engine: E,
    cache: CacheDir,
}

impl<E: Engine> ServiceManager<E> {
    pub fn new(engine: E, cache: CacheDir) -> Self {
        Self { engine, cache }
    }

    /// Builds the unified inventory for the given `repository[:tag]` filters
    /// (all images when empty).
    ///
    /// Extraction runs only for services whose environment declares the
    /// supported `minipaas_version`; every other service is returned
    /// immediately with absent metadata and never touches the engine again.
    ///
    /// # Errors
    ///
    /// Fails only on batch-level engine errors; per-service extraction
    /// failures surface as [`Service::diagnostic`] instead.
    pub async fn services(&self, repo_tags: &[String]) -> Result<Vec<Service>> {
        let inspected = self.engine.inspect(repo_tags).await?;
        let mut services: Vec<Service> = inspected.into_iter().map(Service::new).collect();

        join_all(
            services
                .iter_mut()
                .map(|service| self.annotate(service)),
        )
        .await;

        Ok(services)
    }

    /// Pulls each tag, then re-lists. The fresh listing is authoritative; the
    /// pull output itself is not trusted.
    pub async fn pull(&self, repo_tags: &[String]) -> Result<Vec<Service>> {
        self.engine.pull(repo_tags).await?;
        self.services(repo_tags).await
    }

    /// Starts a detached container for each tag, then re-lists.
    pub async fn start(&self, repo_tags: &[String]) -> Result<Vec<Service>> {
        let results = join_all(
            repo_tags
                .iter()
                .map(|repo_tag| self.engine.start_detached(repo_tag)),
        )
        .await;
        for result in results {
            result?;
        }
        self.services(repo_tags).await
    }

    /// Stops the running container behind each matched service, then
    /// re-lists.
    ///
    /// Services without an associated running container are silently excluded
    /// from the stop set; that is expected state, not an error. Containers
    /// already stopped when a later stop fails are not restarted.
    pub async fn stop(&self, repo_tags: &[String]) -> Result<Vec<Service>> {
        let services = self.services(repo_tags).await?;
        let container_ids: Vec<String> = services
            .iter()
            .filter_map(|service| service.container.as_ref())
            .filter(|container| container.running)
            .map(|container| container.id.clone())
            .collect();

        let results = join_all(container_ids.iter().map(|id| self.engine.stop(id))).await;
        for result in results {
            result?;
        }

        self.services(repo_tags).await
    }

    async fn annotate(&self, service: &mut Service) {
        let Some(version) = service.minipaas_version().map(str::to_owned) else {
            // not a managed service
            return;
        };
        if version != SUPPORTED_VERSION {
            service.diagnostic = Some(ExtractError::UnsupportedVersion(version).to_string());
            return;
        }

        match self.extract_for(service).await {
            Ok(info) => service.metadata = Some(info),
            Err(err) => {
                log::warn!(
                    "unable to extract metadata for {} ({err})",
                    service.image.repo_tag
                );
                service.diagnostic = Some(err.to_string());
            }
        }
    }

    async fn extract_for(
        &self,
        service: &mut Service,
    ) -> std::result::Result<Metadata, ExtractError> {
        let path = self.cache.container_path(&service.image.id)?;
        service.container_path = Some(path.clone());
        extract::extract(&self.engine, &path, &service.image.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ContainerRecord, ImageRecord, InspectedImage};
    use crate::inventory::ServiceStatus;
    use crate::inventory::mock::MockEngine;
    use std::collections::HashMap;

    fn inspected(
        repo_tag: &str,
        image_id: &str,
        version: Option<&str>,
        container: Option<(&str, bool)>,
    ) -> InspectedImage {
        let (repository, tag) = repo_tag.split_once(':').unwrap();
        let mut env = HashMap::new();
        if let Some(version) = version {
            env.insert("minipaas_version".to_owned(), version.to_owned());
        }
        InspectedImage {
            image: ImageRecord {
                repository: repository.to_owned(),
                tag: tag.to_owned(),
                repo_tag: repo_tag.to_owned(),
                id: image_id.to_owned(),
            },
            env,
            container: container.map(|(id, running)| ContainerRecord {
                id: id.to_owned(),
                image_id: image_id.to_owned(),
                running,
                started_at: Some(chrono::Utc::now()),
            }),
        }
    }

    fn manager(engine: MockEngine, tmp: &tempfile::TempDir) -> ServiceManager<MockEngine> {
        ServiceManager::new(engine, CacheDir::new(tmp.path()))
    }

    #[tokio::test]
    async fn test_version_gate() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(
            MockEngine::with_inspected(vec![
                inspected("plain/image:latest", "img-plain", None, None),
                inspected("future/image:latest", "img-future", Some("2"), None),
                inspected("managed/image:latest", "img-managed", Some("1"), None),
            ]),
            &tmp,
        );

        let services = manager.services(&[]).await.unwrap();
        assert_eq!(services.len(), 3);

        let plain = &services[0];
        assert!(plain.metadata.is_none());
        assert!(plain.diagnostic.is_none());
        assert_eq!(plain.status(), ServiceStatus::Stopped);

        let future = &services[1];
        assert!(future.metadata.is_none());
        assert!(future.diagnostic.as_deref().unwrap().contains("2"));
        assert_eq!(future.status(), ServiceStatus::Error);

        let managed = &services[2];
        assert_eq!(
            managed.metadata.as_ref().unwrap().title().as_deref(),
            Some("Minipaas: Hello, World!")
        );
        assert!(managed.diagnostic.is_none());

        // only the managed service ever reached the engine's lifecycle ops
        let engine = &manager.engine;
        assert_eq!(engine.starts(), 1);
        assert_eq!(engine.stops(), 1);
    }

    #[tokio::test]
    async fn test_stop_excludes_services_without_running_container() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(
            MockEngine::with_inspected(vec![
                inspected("a/svc:latest", "img-a", None, Some(("container-a", true))),
                inspected("b/svc:latest", "img-b", None, None),
                inspected("c/svc:latest", "img-c", None, Some(("container-c", true))),
                inspected("d/svc:latest", "img-d", None, Some(("container-d", false))),
            ]),
            &tmp,
        );

        let services = manager.stop(&[]).await.unwrap();
        assert_eq!(services.len(), 4);

        let engine = &manager.engine;
        assert_eq!(engine.stops(), 2);
        let mut stopped = engine.stopped_ids();
        stopped.sort();
        assert_eq!(stopped, vec!["container-a", "container-c"]);
    }

    #[tokio::test]
    async fn test_pull_re_lists() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(
            MockEngine::with_inspected(vec![inspected("a/svc:latest", "img-a", None, None)]),
            &tmp,
        );

        let services = manager.pull(&["a/svc:latest".to_owned()]).await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(manager.engine.pulls(), 1);
    }

    #[tokio::test]
    async fn test_start_starts_one_container_per_tag() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(MockEngine::with_inspected(Vec::new()), &tmp);

        manager
            .start(&["a/svc:latest".to_owned(), "b/svc:latest".to_owned()])
            .await
            .unwrap();
        assert_eq!(manager.engine.detached_starts(), 2);
    }

    #[tokio::test]
    async fn test_running_status_reports_elapsed_time() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(
            MockEngine::with_inspected(vec![inspected(
                "a/svc:latest",
                "img-a",
                None,
                Some(("container-a", true)),
            )]),
            &tmp,
        );

        let services = manager.services(&[]).await.unwrap();
        match services[0].status() {
            ServiceStatus::Running { since: Some(since) } => {
                assert!(since >= chrono::TimeDelta::zero());
            }
            other => panic!("expected running status, got {other:?}"),
        }
    }
}
