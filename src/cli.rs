//! Command line interface.

use clap::{Parser, Subcommand};

use crate::cache::CacheDir;
use crate::engine::{Docker, Engine};
use crate::inventory::ServiceManager;
use crate::output;

#[derive(Debug, Parser)]
#[command(name = "minipaas", version, about = "Container service inventory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List service images with their metadata and runtime state.
    Status {
        /// Images to list as `repository[:tag]`; all local images when empty.
        repo_tags: Vec<String>,
    },
    /// Pull the given images, then list them.
    Pull {
        repo_tags: Vec<String>,
    },
    /// Start a detached container per image, then list them.
    Start {
        repo_tags: Vec<String>,
    },
    /// Stop the running container behind each image, then list them.
    Stop {
        repo_tags: Vec<String>,
    },
    /// Open an interactive login shell inside a fresh container.
    Shell {
        repo_tag: String,
    },
}

pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Docker::default();
    let cache = CacheDir::default_location()?;
    let manager = ServiceManager::new(engine.clone(), cache);

    match cli.command {
        Command::Status { repo_tags } => {
            output::print_services(&manager.services(&repo_tags).await?);
        }
        Command::Pull { repo_tags } => {
            output::print_services(&manager.pull(&repo_tags).await?);
        }
        Command::Start { repo_tags } => {
            output::print_services(&manager.start(&repo_tags).await?);
        }
        Command::Stop { repo_tags } => {
            output::print_services(&manager.stop(&repo_tags).await?);
        }
        Command::Shell { repo_tag } => shell(&engine, &repo_tag).await?,
    }

    Ok(())
}

/// Starts a login-shell container, hands the terminal over to it, and tears
/// the container down once the session ends. Removal is deferred so the
/// prompt returns immediately.
async fn shell(engine: &Docker, repo_tag: &str) -> crate::engine::Result<()> {
    let container_id = engine.start_interactive_shell(repo_tag).await?;
    engine.attach(&container_id).await?;
    engine.stop_detached(&container_id).await
}
