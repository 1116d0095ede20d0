//! Core data structures for slipway.
//!
//! This module contains the foundational types used throughout the
//! generator: namespace paths, labels, configs, targets, per-build settings
//! and their per-toolchain views, and located errors.

pub mod config;
pub mod error;
pub mod label;
pub mod path;
pub mod settings;
pub mod target;
pub mod toolchain;

pub use config::{Config, ConfigValues};
pub use error::{Error, Location};
pub use label::Label;
pub use path::{OutputFile, SourceDir, SourceFile};
pub use settings::{BuildSettings, Settings, TargetOs};
pub use target::{OutputType, Target};
pub use toolchain::{Tool, ToolType, Toolchain};
