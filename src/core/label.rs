//! Target and config identity.
//!
//! A label names an item by its source directory, its name, and the
//! toolchain it is built in: `//base:base(//toolchains:msvc)`. Labels are
//! the only way items refer to each other before the builder links the
//! edges to arena indices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::path::SourceDir;
use crate::frontend::value::Value;
use crate::util::filesystem::find_filename;
use crate::util::InternedString;

/// Identity of a target or config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    /// Directory the defining buildfile lives in
    pub dir: SourceDir,
    /// Name within that directory
    pub name: InternedString,
    /// Directory of the toolchain definition
    pub toolchain_dir: SourceDir,
    /// Name of the toolchain
    pub toolchain_name: InternedString,
}

impl Label {
    /// Create a label with an explicit toolchain.
    pub fn new(
        dir: SourceDir,
        name: impl Into<InternedString>,
        toolchain_dir: SourceDir,
        toolchain_name: impl Into<InternedString>,
    ) -> Self {
        Label {
            dir,
            name: name.into(),
            toolchain_dir,
            toolchain_name: toolchain_name.into(),
        }
    }

    /// Create a label with no toolchain part.
    pub fn without_toolchain(dir: SourceDir, name: impl Into<InternedString>) -> Self {
        Label {
            dir,
            name: name.into(),
            toolchain_dir: SourceDir::default(),
            toolchain_name: InternedString::default(),
        }
    }

    /// The label of this label's toolchain.
    pub fn toolchain_label(&self) -> Label {
        Label::without_toolchain(self.toolchain_dir.clone(), self.toolchain_name)
    }

    /// Resolve a buildfile label string against a current directory and
    /// toolchain.
    ///
    /// Accepted forms: `//dir:name`, `relative/dir:name`, `:name` (current
    /// directory), and a bare directory whose last component names the
    /// target (`//base` means `//base:base`). A trailing `(//tc:name)`
    /// selects an explicit toolchain; otherwise the current toolchain is
    /// inherited.
    pub fn resolve(
        input: &str,
        current_dir: &SourceDir,
        current_toolchain: &Label,
        origin: Option<&Value>,
    ) -> Result<Label, Error> {
        let locate = |mut e: Error| {
            if let Some(origin) = origin.and_then(|v| v.origin()) {
                e = e.with_location(origin.clone());
            }
            e
        };

        if input.is_empty() {
            return Err(locate(
                Error::new("Label is empty.").with_help("A label can't be an empty string."),
            ));
        }

        // Split off an explicit "(//toolchain:name)" suffix.
        let (main, toolchain_part) = match input.find('(') {
            Some(paren) => {
                if !input.ends_with(')') {
                    return Err(locate(
                        Error::new(format!("Bad toolchain in label \"{input}\"."))
                            .with_help("A toolchain override looks like \"(//tc:name)\"."),
                    ));
                }
                (&input[..paren], Some(&input[paren + 1..input.len() - 1]))
            }
            None => (input, None),
        };

        let (toolchain_dir, toolchain_name) = match toolchain_part {
            Some(tc) => {
                let tc_label = Label::resolve(tc, current_dir, current_toolchain, origin)?;
                (tc_label.dir, tc_label.name)
            }
            None => (
                current_toolchain.dir.clone(),
                current_toolchain.name,
            ),
        };

        let (dir_part, name_part) = match main.rfind(':') {
            Some(colon) => (&main[..colon], Some(&main[colon + 1..])),
            None => (main, None),
        };

        let dir = if dir_part.is_empty() {
            current_dir.clone()
        } else {
            current_dir.resolve_relative_dir(dir_part)
        };

        let name = match name_part {
            Some(name) if !name.is_empty() => name.to_string(),
            Some(_) => {
                return Err(locate(
                    Error::new(format!("Bad name in label \"{input}\"."))
                        .with_help("The part following the colon can't be empty."),
                ))
            }
            None => {
                // No colon: the last directory component names the target.
                let trimmed = dir.value().trim_end_matches('/');
                let implicit = find_filename(trimmed);
                if implicit.is_empty() {
                    return Err(locate(
                        Error::new(format!("Label \"{input}\" names no target."))
                            .with_help("Use \"//dir:name\" or a directory with a last component."),
                    ));
                }
                implicit.to_string()
            }
        };

        Ok(Label::new(dir, name, toolchain_dir, toolchain_name))
    }

    /// User-visible rendering, optionally including the toolchain.
    pub fn user_visible_name(&self, include_toolchain: bool) -> String {
        let mut ret = format!("{}:{}", self.dir.value().trim_end_matches('/'), self.name);
        if include_toolchain && !self.toolchain_dir.is_null() {
            ret.push('(');
            ret.push_str(self.toolchain_dir.value().trim_end_matches('/'));
            ret.push(':');
            ret.push_str(&self.toolchain_name);
            ret.push(')');
        }
        ret
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_visible_name(false))
    }
}

/// A dependency edge: the label as written, plus the arena index the
/// builder fills in once the item is defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelTargetPair {
    /// The label as resolved from the buildfile
    pub label: Label,
    /// Arena index, present once the builder has linked the edge
    pub target: Option<crate::core::target::TargetId>,
}

impl LabelTargetPair {
    /// Create an unlinked edge.
    pub fn new(label: Label) -> Self {
        LabelTargetPair {
            label,
            target: None,
        }
    }
}

/// A config edge, analogous to [`LabelTargetPair`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfigPair {
    /// The label as resolved from the buildfile
    pub label: Label,
    /// Arena index, present once the builder has linked the edge
    pub config: Option<crate::core::config::ConfigId>,
}

impl LabelConfigPair {
    /// Create an unlinked edge.
    pub fn new(label: Label) -> Self {
        LabelConfigPair {
            label,
            config: None,
        }
    }
}
