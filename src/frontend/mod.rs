//! The interface the external buildfile evaluator drives.
//!
//! The tokenizer, parser, and scope evaluator live outside this crate. What
//! they hand over is a [`scope::Scope`]: the current source directory, the
//! per-toolchain settings view, and the typed values a buildfile assigned.
//! This module turns such scopes into typed targets and exposes the
//! programmatic per-file identifiers buildfiles can read.

pub mod per_file_provider;
pub mod scope;
pub mod target_generator;
pub mod value;
pub mod value_extractors;

pub use scope::Scope;
pub use target_generator::{generate_target, FunctionCall};
pub use value::{Value, ValueKind};
