//! Namespace path value types.
//!
//! Three distinct roles, three distinct types, so a raw OS path can never be
//! passed where a source-absolute path is required:
//!
//! - [`SourceFile`]: a file in the source namespace. Source-absolute
//!   (`//foo/bar.cc`) or system-absolute (`/usr/include/z.h`); never ends in
//!   a separator.
//! - [`SourceDir`]: a directory in the source namespace; always ends in a
//!   separator (or is the empty "null" value).
//! - [`OutputFile`]: a path relative to the build directory, as written into
//!   rule files. Forward slashes only.

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::frontend::value::Value;
use crate::util::filesystem::{ends_with_slash, is_path_absolute, normalize_path};

/// A file in the dual-rooted namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceFile(String);

impl SourceFile {
    /// Create a source file from an already-canonical value.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(
            !ends_with_slash(&value),
            "source file ends in a separator: {value}"
        );
        SourceFile(value)
    }

    /// The textual value.
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty "null" value.
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the value begins with `//`.
    pub fn is_source_absolute(&self) -> bool {
        self.0.starts_with("//")
    }

    /// Whether the value begins with a single `/` (an absolute OS path
    /// spelled inside the namespace).
    pub fn is_system_absolute(&self) -> bool {
        self.0.starts_with('/') && !self.is_source_absolute()
    }
}

impl std::fmt::Display for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directory in the dual-rooted namespace. Nonempty values end in `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceDir(String);

impl SourceDir {
    /// Create a source dir from an already-canonical value.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(
            value.is_empty() || ends_with_slash(&value),
            "source dir doesn't end in a separator: {value}"
        );
        SourceDir(value)
    }

    /// The textual value.
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty "null" value.
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the value begins with `//`.
    pub fn is_source_absolute(&self) -> bool {
        self.0.starts_with("//")
    }

    /// Whether the value begins with a single `/`.
    pub fn is_system_absolute(&self) -> bool {
        self.0.starts_with('/') && !self.is_source_absolute()
    }

    /// Resolve a buildfile-supplied file string against this directory.
    ///
    /// Absolute spellings (`//...`, `/...`) pass through; anything else is
    /// appended to this directory. The result is normalized. A value that
    /// resolves to a directory is a user error.
    pub fn resolve_relative_file(&self, s: &str, origin: Option<&Value>) -> Result<SourceFile, Error> {
        if s.is_empty() || ends_with_slash(s) {
            let mut err = Error::new(format!("Expected a file name, got \"{s}\"."))
                .with_help("A file name can't be empty or end in a slash.");
            if let Some(origin) = origin.and_then(|v| v.origin()) {
                err = err.with_location(origin.clone());
            }
            return Err(err);
        }
        Ok(SourceFile::new(self.resolve_relative(s)))
    }

    /// Resolve a buildfile-supplied directory string against this
    /// directory, appending the trailing separator if missing.
    pub fn resolve_relative_dir(&self, s: &str) -> SourceDir {
        let mut resolved = self.resolve_relative(s);
        if !resolved.is_empty() && !ends_with_slash(&resolved) {
            resolved.push('/');
        }
        SourceDir::new(resolved)
    }

    fn resolve_relative(&self, s: &str) -> String {
        let mut result = if s.starts_with("//") || is_path_absolute(s) {
            s.to_string()
        } else {
            format!("{}{}", self.0, s)
        };
        normalize_path(&mut result);
        result
    }
}

impl std::fmt::Display for SourceDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A path relative to the build directory, exactly as written into rule
/// files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputFile(String);

impl OutputFile {
    /// Create an output file from a build-dir-relative value.
    pub fn new(value: impl Into<String>) -> Self {
        OutputFile(value.into())
    }

    /// The textual value.
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Whether the value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mutable access for callers assembling a value piecewise.
    pub fn value_mut(&mut self) -> &mut String {
        &mut self.0
    }
}

impl std::fmt::Display for OutputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
