//! Compiler, test and lint invocation.

use crate::bundler::{
    Result,
    builder::tool_detection::HAS_LIPO,
    error::{Context, Error},
    platform::HostPlatform,
    settings::{BuildTarget, Settings},
    utils::{command, fs},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Minimum macOS version the binary is built for.
pub const MACOSX_DEPLOYMENT_TARGET: &str = "10.13";

/// Runs the Rust toolchain for the package being released.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Runs the package's unit tests.
    async fn test(&self, settings: &Settings) -> Result<()>;

    /// Runs clippy over the package.
    async fn lint(&self, settings: &Settings) -> Result<()>;

    /// Compiles every target and returns the single binary to package.
    async fn build(&self, settings: &Settings, platform: HostPlatform) -> Result<PathBuf>;
}

/// Environment applied to every cargo invocation.
pub fn cargo_env(release: bool, platform: HostPlatform) -> Vec<(&'static str, String)> {
    let mut env = vec![("CARGO_NET_GIT_FETCH_WITH_CLI", "true".to_string())];
    if release {
        env.push(("CARGO_INCREMENTAL", "0".to_string()));
        env.push(("CARGO_PROFILE_RELEASE_LTO", "thin".to_string()));
        env.push(("RUSTFLAGS", "-C force-frame-pointers=yes".to_string()));
    }
    if platform == HostPlatform::MacOs {
        env.push(("MACOSX_DEPLOYMENT_TARGET", MACOSX_DEPLOYMENT_TARGET.to_string()));
    }
    env
}

/// `cargo build` arguments for `settings`.
pub fn build_args(settings: &Settings) -> Vec<String> {
    let mut args = vec![
        "build".to_string(),
        "--locked".to_string(),
        "--package".to_string(),
        settings.package_name().to_string(),
    ];
    for target in settings.targets() {
        args.push("--target".to_string());
        args.push(target.triple().to_string());
    }
    if settings.is_release() {
        args.push("--release".to_string());
    }
    args
}

/// Where cargo leaves the binary for `target`.
pub fn target_binary(settings: &Settings, target: &BuildTarget) -> PathBuf {
    settings
        .workspace_dir()
        .join("target")
        .join(target.triple())
        .join(settings.profile_dir())
        .join(settings.package_name())
}

/// [`Toolchain`] that shells out to `cargo` and `lipo`.
#[derive(Clone, Debug)]
pub struct CargoToolchain {
    cargo: PathBuf,
}

impl Default for CargoToolchain {
    fn default() -> Self {
        let cargo = std::env::var_os("CARGO")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("cargo"));
        Self { cargo }
    }
}

impl CargoToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(cargo: impl Into<PathBuf>) -> Self {
        Self {
            cargo: cargo.into(),
        }
    }

    fn cargo(&self, settings: &Settings, release: bool, platform: HostPlatform) -> Command {
        let mut cmd = Command::new(&self.cargo);
        cmd.current_dir(settings.workspace_dir())
            .envs(cargo_env(release, platform));
        cmd
    }

    async fn universal_binary(&self, settings: &Settings) -> Result<PathBuf> {
        if !*HAS_LIPO {
            return Err(Error::configuration(
                "lipo is required to build a universal macOS binary",
            ));
        }

        let out_path = settings
            .build_dir()
            .join(format!("{}-universal-apple-darwin", settings.binary_name()));
        fs::create_dir_all(settings.build_dir(), false).await?;

        let mut lipo = Command::new("lipo");
        lipo.arg("-create").arg("-output").arg(&out_path);
        for target in settings.targets() {
            lipo.arg(target_binary(settings, target));
        }
        command::run_captured(lipo).await?;

        log::info!("✓ Created universal binary {}", out_path.display());
        Ok(out_path)
    }

    async fn copy_first_target(&self, settings: &Settings) -> Result<PathBuf> {
        let target = settings
            .targets()
            .first()
            .context("no compilation target configured")?;
        let out_path = settings
            .build_dir()
            .join("bin")
            .join(format!("{}-{}", settings.binary_name(), target));

        copy_binary(&target_binary(settings, target), &out_path).await?;
        Ok(out_path)
    }
}

async fn copy_binary(from: &Path, to: &Path) -> Result<()> {
    fs::copy_file(from, to).await?;
    fs::set_executable(to).await?;
    log::info!("✓ Copied {} to {}", from.display(), to.display());
    Ok(())
}

#[async_trait]
impl Toolchain for CargoToolchain {
    async fn test(&self, settings: &Settings) -> Result<()> {
        let mut cmd = self.cargo(settings, false, HostPlatform::current());
        cmd.args(["test", "--locked", "--package", settings.package_name()]);
        command::run_inherited(cmd).await
    }

    async fn lint(&self, settings: &Settings) -> Result<()> {
        let mut cmd = self.cargo(settings, false, HostPlatform::current());
        cmd.args(["clippy", "--locked", "--package", settings.package_name()]);
        command::run_inherited(cmd).await
    }

    async fn build(&self, settings: &Settings, platform: HostPlatform) -> Result<PathBuf> {
        let mut cmd = self.cargo(settings, settings.is_release(), platform);
        cmd.args(build_args(settings));
        command::run_inherited(cmd).await?;

        match platform {
            HostPlatform::MacOs => self.universal_binary(settings).await,
            // no cross-architecture builds on linux
            HostPlatform::Linux => self.copy_first_target(settings).await,
        }
    }
}
