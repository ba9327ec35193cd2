//! Command line interface for the qchat release builder.

mod args;

pub use args::{Args, BuildArgs, Command};

use crate::bundler::{ReleaseArtifact, ReleaseOrchestrator};
use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<()> {
    let args = Args::parse_args();
    match args.command {
        Command::Build(build) => {
            build_release(&build).await?;
        }
    }
    Ok(())
}

/// Runs one release from parsed `build` arguments.
pub async fn build_release(args: &BuildArgs) -> Result<ReleaseArtifact> {
    args.validate()?;
    let settings = args.to_settings()?;

    let artifact = ReleaseOrchestrator::from_settings(settings)?.run().await?;

    log::info!("Artifacts:");
    for file in artifact.files() {
        log::info!("  {}", file.display());
    }
    Ok(artifact)
}
