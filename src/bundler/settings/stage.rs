//! Release stage selection.

use crate::bundler::error::{Error, Result};
use std::fmt;

/// Deployment stage a release is built for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Stage {
    /// Production (also the default when no stage is given)
    #[default]
    Prod,
    /// Pre-production
    Gamma,
}

impl Stage {
    /// Parses an optional stage name. Unset means [`Stage::Prod`]; unknown
    /// names are a configuration error.
    pub fn parse(name: Option<&str>) -> Result<Self> {
        match name {
            None | Some("prod") => Ok(Self::Prod),
            Some("gamma") => Ok(Self::Gamma),
            Some(other) => Err(Error::configuration(format!(
                "Unknown stage name: {other} (expected prod or gamma)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Gamma => "gamma",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_stage_is_prod() {
        assert_eq!(Stage::parse(None).unwrap(), Stage::Prod);
        assert_eq!(Stage::parse(Some("prod")).unwrap(), Stage::Prod);
        assert_eq!(Stage::parse(Some("gamma")).unwrap(), Stage::Gamma);
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let err = Stage::parse(Some("beta")).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("beta")));
        assert!(Stage::parse(Some("Prod")).is_err());
    }
}
