//! Slipway - the backend of a meta-build generator.
//!
//! This crate takes evaluated buildfile scopes, constructs an in-memory
//! graph of build targets with their transitively resolved settings, and
//! emits low-level rule files for a downstream incremental-build executor.
//! The buildfile parser, scope evaluator, parallel loader, and command-line
//! front end are external collaborators; they drive the interfaces exposed
//! here.

pub mod builder;
pub mod core;
pub mod frontend;
pub mod ninja;
pub mod util;

/// Test utilities for slipway unit tests.
///
/// This module is only available when running tests. It provides a
/// ready-made build configuration, default toolchain, and scope factory so
/// tests don't repeat the setup boilerplate.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    config::Config,
    error::Error,
    label::Label,
    path::{OutputFile, SourceDir, SourceFile},
    settings::{BuildSettings, Settings, TargetOs},
    target::Target,
    toolchain::Toolchain,
};

pub use builder::Builder;
pub use util::InternedString;
