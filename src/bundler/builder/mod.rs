//! Release orchestration and coordination.
//!
//! This module provides the main [`ReleaseOrchestrator`] that drives one
//! release of the `qchat` binary end to end.
//!
//! # Overview
//!
//! The orchestrator:
//! 1. Reads configuration from [`Settings`](crate::bundler::Settings)
//! 2. Runs tests and lints unless skipped
//! 3. Compiles the binary through a [`Toolchain`](crate::bundler::toolchain::Toolchain)
//! 4. Delegates to the host platform's packager
//! 5. Stages the resulting files in the output bucket
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum files for artifacts
//! - `orchestrator` - Main [`ReleaseOrchestrator`] struct
//! - [`signing`] - Detached signer selection
//! - [`tool_detection`] - External tool availability checking

pub mod checksum;
mod orchestrator;
pub mod signing;
pub mod tool_detection;

pub use orchestrator::ReleaseOrchestrator;
pub use signing::load_signer;
