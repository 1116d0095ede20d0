//! Rule-file emission.
//!
//! Everything here produces line-oriented text for the downstream
//! incremental-build executor: `name = value` variables, `build` statements
//! with optional ` | ` implicit and ` || ` order-only tails, and two-space
//! indented variables under a build statement. Paths are always written
//! with forward slashes; converting to host separators is the downstream
//! tool's concern.

pub mod binary_target_writer;
pub mod escape;
pub mod helper;
pub mod path_output;

use std::path::Path;

use anyhow::Context;

use crate::core::settings::Settings;
use crate::core::target::{GraphAccess, Target};
use crate::core::toolchain::Toolchain;

pub use binary_target_writer::NinjaBinaryTargetWriter;
pub use escape::{escape_string, EscapeOptions, EscapingMode};
pub use path_output::{DirSlashEnding, PathOutput};

/// Write the rules for one target into the sink, dispatching on its kind.
///
/// Binary kinds (executable, shared library, static library, source set)
/// get compile and link rules; other kinds contribute nothing here, their
/// outputs exist only as stamp names referenced by dependents.
pub fn write_target_rules(
    target: &Target,
    graph: &dyn GraphAccess,
    toolchain: &Toolchain,
    settings: &Settings,
    out: &mut String,
) {
    if target.output_type.is_binary() {
        tracing::debug!(target_label = %target.label, "writing rules");
        NinjaBinaryTargetWriter::new(target, graph, toolchain, settings, out).run();
    }
}

/// Write an assembled rule file to disk.
pub fn write_rule_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write rule file: {}", path.display()))
}
