//! Shared helpers for file staging and subprocess execution.

pub mod command;
pub mod fs;
