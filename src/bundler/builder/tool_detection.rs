//! External tool detection and availability checking.
//!
//! This module provides cached runtime detection of the external tools
//! individual release stages depend on (gpg for detached signatures, lipo
//! for universal macOS binaries).

use std::sync::LazyLock;

/// Looks `tool` up on `PATH` and checks that `tool <version_arg>` succeeds.
fn detect(tool: &str, version_arg: &str, purpose: &str) -> bool {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at: {}", tool, path.display());

            match std::process::Command::new(&path).arg(version_arg).output() {
                Ok(output) if output.status.success() => {
                    let version = String::from_utf8_lossy(&output.stdout);
                    log::debug!(
                        "✓ {} available: {}",
                        tool,
                        version.lines().next().unwrap_or_default().trim()
                    );
                    true
                }
                Ok(output) => {
                    log::warn!(
                        "{} found at {} but {} check failed (exit code: {:?}). \
                         {} will fail. \
                         Stderr: {}",
                        tool,
                        path.display(),
                        version_arg,
                        output.status.code(),
                        purpose,
                        String::from_utf8_lossy(&output.stderr)
                    );
                    false
                }
                Err(e) => {
                    log::warn!(
                        "{} found at {} but failed to execute: {}. \
                         {} will fail. \
                         Check file permissions.",
                        tool,
                        path.display(),
                        e,
                        purpose
                    );
                    false
                }
            }
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", tool, e);
            false
        }
    }
}

/// Check if gpg is available for detached archive signatures.
///
/// Cached result to avoid repeated subprocess calls.
pub static HAS_GPG: LazyLock<bool> =
    LazyLock::new(|| detect("gpg", "--version", "Detached signing"));

/// Check if lipo is available for merging macOS targets.
///
/// lipo has no version flag, so presence on `PATH` is all that is checked.
pub static HAS_LIPO: LazyLock<bool> = LazyLock::new(|| match which::which("lipo") {
    Ok(path) => {
        log::debug!("Found lipo at: {}", path.display());
        true
    }
    Err(e) => {
        log::debug!("lipo not found in PATH: {}", e);
        false
    }
});
