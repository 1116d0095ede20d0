//! Configs: named bundles of compile and link settings.
//!
//! A config can be attached to any number of targets, and targets also
//! carry settings directly. Consumers walk a target's effective settings in
//! a fixed order: the target's own values first, then each attached
//! config's, in attachment order. That order is observable in rule-file
//! text.

use serde::{Deserialize, Serialize};

use crate::core::label::Label;
use crate::core::path::SourceDir;

/// Arena index of a config owned by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigId(pub usize);

/// Compile and link settings attached to a target or config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigValues {
    /// Preprocessor defines, without the -D
    #[serde(default)]
    pub defines: Vec<String>,

    /// Header search directories
    #[serde(default)]
    pub include_dirs: Vec<SourceDir>,

    /// Flags for every compile
    #[serde(default)]
    pub cflags: Vec<String>,

    /// Flags for C compiles only
    #[serde(default)]
    pub cflags_c: Vec<String>,

    /// Flags for C++ compiles only
    #[serde(default)]
    pub cflags_cc: Vec<String>,

    /// Flags for Objective-C compiles only
    #[serde(default)]
    pub cflags_objc: Vec<String>,

    /// Flags for Objective-C++ compiles only
    #[serde(default)]
    pub cflags_objcc: Vec<String>,

    /// Linker flags
    #[serde(default)]
    pub ldflags: Vec<String>,

    /// Library search directories
    #[serde(default)]
    pub lib_dirs: Vec<SourceDir>,

    /// Libraries to link
    #[serde(default)]
    pub libs: Vec<String>,
}

impl ConfigValues {
    /// Create an empty settings bundle.
    pub fn new() -> Self {
        ConfigValues::default()
    }
}

/// A named config item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity of this config
    pub label: Label,
    /// The settings it carries
    pub config_values: ConfigValues,
}

impl Config {
    /// Create a config with empty values.
    pub fn new(label: Label) -> Self {
        Config {
            label,
            config_values: ConfigValues::new(),
        }
    }
}
