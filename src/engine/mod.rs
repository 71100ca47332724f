//! Engine client: translates a small operation vocabulary into container
//! runtime invocations.
//!
//! The [`Docker`] implementation shells out to the `docker` command line.
//! Eventually this could speak to the engine API directly, but the command
//! line keeps the boundary observable and easy to substitute in tests via the
//! [`Engine`] trait.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use futures::future::join_all;

mod error;
mod record;

pub use error::{Error, Result};
pub use record::{
    ContainerRecord, ImageRecord, InspectedImage, filter_images, join_containers, key_by_image,
    normalize_repo_tags, parse_env, parse_images,
};

use record::InspectEntry;

/// Delay before removing a stopped container on the fire-and-forget path.
/// Removing immediately after `stop` can hit "device or resource busy".
const REMOVE_GRACE: Duration = Duration::from_secs(1);

/// Lifecycle operations against the container runtime.
///
/// The two start variants for inspection differ only in the teardown contract
/// of the `stop` call they are paired with: extraction awaits removal so no
/// ephemeral container can leak, the interactive shell defers removal so the
/// session stays responsive.
pub trait Engine {
    /// Launches a detached container from the image, default entrypoint.
    fn start_detached(&self, image: &str) -> impl Future<Output = Result<String>> + Send;

    /// Launches a detached container with the entrypoint overridden to a
    /// login shell, so the image filesystem is inspectable. Pair with
    /// [`Engine::stop`].
    fn start_for_extraction(&self, image_id: &str) -> impl Future<Output = Result<String>> + Send;

    /// Launches the same login-shell container for interactive use. Pair with
    /// [`Engine::stop_detached`].
    fn start_interactive_shell(
        &self,
        image_id: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Stops the container, then removes it. Removal is awaited; its failure
    /// is logged, not propagated.
    fn stop(&self, container_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Stops the container; removal happens in the background after a grace
    /// delay and is not awaited.
    fn stop_detached(&self, container_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Copies a path out of the container's filesystem to the local disk.
    fn cp(
        &self,
        container_id: &str,
        src_path: &str,
        dst_path: &Path,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Image table keyed by `repository:tag`.
    fn images(&self) -> impl Future<Output = Result<HashMap<String, ImageRecord>>> + Send;

    /// Running containers keyed by image id (last-wins on duplicates).
    fn ps(&self) -> impl Future<Output = Result<HashMap<String, ContainerRecord>>> + Send;

    /// Image table filtered to the given tags, each image joined with its
    /// declared environment and matched container.
    fn inspect(
        &self,
        repo_tags: &[String],
    ) -> impl Future<Output = Result<Vec<InspectedImage>>> + Send;

    /// Pulls each tag independently and concurrently; the aggregate fails if
    /// any pull fails, with every failure observable.
    fn pull(&self, repo_tags: &[String]) -> impl Future<Output = Result<()>> + Send;
}

/// Explicit configuration for a `run` invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub entrypoint: Option<String>,
    pub cmd: Vec<String>,
    pub detached: bool,
    pub interactive: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            entrypoint: None,
            cmd: Vec::new(),
            detached: true,
            interactive: true,
        }
    }
}

impl RunOptions {
    /// Options for the short-lived inspection container: a detached login
    /// shell, so `/etc/minipaas` can be copied out.
    pub fn login_shell() -> Self {
        Self {
            entrypoint: Some("/bin/bash".to_owned()),
            cmd: vec!["--login".to_owned()],
            ..Self::default()
        }
    }
}

/// Engine client backed by the `docker` command line.
#[derive(Debug, Clone)]
pub struct Docker {
    command: String,
}

impl Default for Docker {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl Docker {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut line = self.command.clone();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Runs the engine command with the given arguments and captures stdout.
    /// Stderr passes through to the user.
    async fn run(&self, args: &[&str]) -> Result<String> {
        log::debug!("running `{}`", self.command_line(args));
        let output = tokio::process::Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                command: self.command_line(args),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: self.command_line(args),
                status: output.status.code(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_container(&self, image: &str, options: &RunOptions) -> Result<String> {
        let mut args = vec!["run"];
        if options.interactive {
            args.push("--interactive=true");
        }
        if options.detached {
            args.push("--detach=true");
        }
        let entrypoint = options
            .entrypoint
            .as_ref()
            .map(|entrypoint| format!("--entrypoint={entrypoint}"));
        if let Some(ref entrypoint) = entrypoint {
            args.push(entrypoint);
        }
        args.push(image);
        for arg in &options.cmd {
            args.push(arg);
        }

        let container_id = self.run(&args).await?;
        Ok(container_id.trim().to_owned())
    }

    async fn inspect_one(&self, id: &str) -> Result<InspectEntry> {
        let args = ["inspect", id];
        let output = self.run(&args).await?;
        let mut entries: Vec<InspectEntry> =
            serde_json::from_str(&output).map_err(|source| Error::InspectParse {
                command: self.command_line(&args),
                source,
            })?;

        match entries.pop() {
            Some(entry) => Ok(entry),
            None => Err(Error::EmptyInspect {
                command: self.command_line(&args),
            }),
        }
    }

    /// Attaches the terminal to a running container and waits until the
    /// session ends.
    pub async fn attach(&self, container_id: &str) -> Result<()> {
        let args = ["attach", container_id];
        log::debug!("running `{}`", self.command_line(&args));
        let status = tokio::process::Command::new(&self.command)
            .args(args)
            .status()
            .await
            .map_err(|source| Error::Spawn {
                command: self.command_line(&args),
                source,
            })?;

        if !status.success() {
            // the shell's own exit status comes back through attach
            log::debug!("attach session ended with status {:?}", status.code());
        }
        Ok(())
    }
}

impl Engine for Docker {
    async fn start_detached(&self, image: &str) -> Result<String> {
        self.run_container(image, &RunOptions::default()).await
    }

    async fn start_for_extraction(&self, image_id: &str) -> Result<String> {
        self.run_container(image_id, &RunOptions::login_shell())
            .await
    }

    async fn start_interactive_shell(&self, image_id: &str) -> Result<String> {
        self.run_container(image_id, &RunOptions::login_shell())
            .await
    }

    async fn stop(&self, container_id: &str) -> Result<()> {
        self.run(&["stop", container_id]).await?;
        if let Err(err) = self.run(&["rm", "--force", container_id]).await {
            log::warn!("failed to remove container `{container_id}`: {err}");
        }
        Ok(())
    }

    async fn stop_detached(&self, container_id: &str) -> Result<()> {
        self.run(&["stop", container_id]).await?;

        let engine = self.clone();
        let container_id = container_id.to_owned();
        tokio::spawn(async move {
            tokio::time::sleep(REMOVE_GRACE).await;
            if let Err(err) = engine.run(&["rm", "--force", &container_id]).await {
                log::warn!("failed to remove container `{container_id}`: {err}");
            }
        });

        Ok(())
    }

    async fn cp(&self, container_id: &str, src_path: &str, dst_path: &Path) -> Result<()> {
        let src = format!("{container_id}:{src_path}");
        let dst = dst_path.to_string_lossy();
        self.run(&["cp", &src, &dst]).await?;
        Ok(())
    }

    async fn images(&self) -> Result<HashMap<String, ImageRecord>> {
        let output = self.run(&["images", "--no-trunc"]).await?;
        Ok(parse_images(&output))
    }

    async fn ps(&self) -> Result<HashMap<String, ContainerRecord>> {
        let output = self.run(&["ps", "--quiet", "--no-trunc"]).await?;
        let ids: Vec<&str> = output
            .lines()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect();

        let inspected = join_all(ids.iter().map(|id| self.inspect_one(id))).await;
        let mut records = Vec::with_capacity(inspected.len());
        for entry in inspected {
            records.push(entry?.into_container_record());
        }

        Ok(key_by_image(records))
    }

    async fn inspect(&self, repo_tags: &[String]) -> Result<Vec<InspectedImage>> {
        let normalized = normalize_repo_tags(repo_tags);

        let (containers, images) = tokio::try_join!(self.ps(), self.images())?;
        let picked = filter_images(images, &normalized);

        let entries =
            join_all(picked.iter().map(|image| self.inspect_one(&image.id))).await;
        let mut environments = Vec::with_capacity(picked.len());
        for entry in entries {
            environments.push(entry?.into_env());
        }

        Ok(join_containers(picked, environments, &containers))
    }

    async fn pull(&self, repo_tags: &[String]) -> Result<()> {
        let results = join_all(repo_tags.iter().map(|tag| async move {
            self.run(&["pull", tag])
                .await
                .map(drop)
                .map_err(|err| (tag.clone(), Box::new(err)))
        }))
        .await;

        let failures: Vec<(String, Box<Error>)> =
            results.into_iter().filter_map(std::result::Result::err).collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Pull {
                total: repo_tags.len(),
                failures,
            })
        }
    }
}
