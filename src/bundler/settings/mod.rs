//! Configuration for one release run.
//!
//! Raw parameters are collected by [`SettingsBuilder`] and validated into an
//! immutable [`Settings`] before any stage runs.

mod builder;
mod core;
mod credentials;
mod package;
mod stage;
mod target;

pub use builder::SettingsBuilder;
pub use core::{DEFAULT_REGION, DEFAULT_SIGNING_TIMEOUT, SIGNING_API_BASE_URL, Settings};
pub use credentials::{
    AwsCredentials, GPG_KEY_ID_ENV, GPG_PASSPHRASE_ENV, GPG_SECRET_KEY_ENV, GpgSettings,
    SigningCredentials,
};
pub use package::PackageSettings;
pub use stage::Stage;
pub use target::BuildTarget;
