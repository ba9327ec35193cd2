//! Compilation targets.

use crate::bundler::{
    error::{Error, Result},
    platform::HostPlatform,
};
use std::{fmt, str::FromStr};

/// A Rust target triple requested for compilation.
///
/// macOS releases build every requested target and merge them into a
/// universal binary; Linux releases build only the first target.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BuildTarget {
    triple: String,
}

impl BuildTarget {
    /// Returns the target triple (e.g., "aarch64-apple-darwin").
    pub fn triple(&self) -> &str {
        &self.triple
    }

    /// Default targets for a host platform.
    ///
    /// - **macOS**: x86_64 and aarch64 darwin (merged with `lipo`)
    /// - **Linux**: the host architecture, gnu libc
    pub fn defaults_for(platform: HostPlatform) -> Vec<Self> {
        match platform {
            HostPlatform::MacOs => vec![
                Self {
                    triple: "x86_64-apple-darwin".into(),
                },
                Self {
                    triple: "aarch64-apple-darwin".into(),
                },
            ],
            HostPlatform::Linux => vec![Self {
                triple: format!("{}-unknown-linux-gnu", std::env::consts::ARCH),
            }],
        }
    }
}

impl FromStr for BuildTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let triple = s.trim();
        let parts = triple.split('-').filter(|p| !p.is_empty()).count();
        if parts < 3 || parts != triple.split('-').count() {
            return Err(Error::configuration(format!(
                "Invalid target triple: {s:?}"
            )));
        }
        Ok(Self {
            triple: triple.to_string(),
        })
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.triple)
    }
}
