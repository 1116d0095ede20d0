//! Writing namespace paths into rule text.
//!
//! Rule files refer to everything relative to the build directory. A
//! source-absolute path is rebased by prefixing the inverse of the build
//! directory (precomputed once); output files are already build-dir
//! relative and pass through; system-absolute paths are written as they
//! are. Everything goes through the configured escaping on the way out.

use crate::core::path::{OutputFile, SourceDir, SourceFile};
use crate::ninja::escape::{escape_string_to, EscapeOptions, EscapingMode};

/// Whether a directory keeps its trailing slash when written.
///
/// Include directories are written without it: with a trailing separator
/// the closing quote on Windows would be preceded by a backslash and the
/// compiler would treat it as escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirSlashEnding {
    /// Keep the trailing slash.
    WithSlash,
    /// Strip the trailing slash.
    NoLastSlash,
}

/// Writes paths relative to a fixed current directory with fixed escaping.
pub struct PathOutput {
    current_dir: SourceDir,
    inverse_current_dir: String,
    options: EscapeOptions,
}

impl PathOutput {
    /// Create a path writer for the given current directory (normally the
    /// build directory).
    pub fn new(current_dir: SourceDir, mode: EscapingMode, inhibit_quoting: bool) -> Self {
        let inverse_current_dir = crate::util::filesystem::invert_dir(&current_dir);
        PathOutput {
            current_dir,
            inverse_current_dir,
            options: EscapeOptions {
                mode,
                inhibit_quoting,
            },
        }
    }

    /// The directory paths are written relative to.
    pub fn current_dir(&self) -> &SourceDir {
        &self.current_dir
    }

    /// Whether quoting is currently inhibited.
    pub fn inhibit_quoting(&self) -> bool {
        self.options.inhibit_quoting
    }

    /// Toggle quoting, for callers that supply their own quotes.
    pub fn set_inhibit_quoting(&mut self, inhibit: bool) {
        self.options.inhibit_quoting = inhibit;
    }

    /// Write a namespace file path.
    pub fn write_source_file(&self, out: &mut String, file: &SourceFile) {
        self.write_path_str(out, file.value());
    }

    /// Write a build-dir-relative output path.
    pub fn write_output_file(&self, out: &mut String, file: &OutputFile) {
        escape_string_to(out, file.value(), &self.options);
    }

    /// Write a namespace directory, with or without its trailing slash.
    pub fn write_dir(&self, out: &mut String, dir: &SourceDir, slash_ending: DirSlashEnding) {
        let value = dir.value();
        if value == "/" {
            // The system root always keeps a slash so it stays addressable.
            match slash_ending {
                DirSlashEnding::WithSlash => escape_string_to(out, "/", &self.options),
                DirSlashEnding::NoLastSlash => escape_string_to(out, "/.", &self.options),
            }
            return;
        }
        if value == "//" {
            // The source root, seen from the build directory.
            let rendered = match slash_ending {
                DirSlashEnding::WithSlash if self.inverse_current_dir.is_empty() => "./",
                DirSlashEnding::WithSlash => &self.inverse_current_dir,
                DirSlashEnding::NoLastSlash if self.inverse_current_dir.is_empty() => ".",
                DirSlashEnding::NoLastSlash => {
                    &self.inverse_current_dir[..self.inverse_current_dir.len() - 1]
                }
            };
            escape_string_to(out, rendered, &self.options);
            return;
        }

        match slash_ending {
            DirSlashEnding::WithSlash => self.write_path_str(out, value),
            DirSlashEnding::NoLastSlash => self.write_path_str(out, &value[..value.len() - 1]),
        }
    }

    fn write_path_str(&self, out: &mut String, value: &str) {
        if let Some(source_relative) = value.strip_prefix("//") {
            // Source-absolute: rebase into the current directory.
            let mut rebased =
                String::with_capacity(self.inverse_current_dir.len() + source_relative.len());
            rebased.push_str(&self.inverse_current_dir);
            rebased.push_str(source_relative);
            escape_string_to(out, &rebased, &self.options);
        } else {
            // System-absolute (or already relative): write as-is.
            escape_string_to(out, value, &self.options);
        }
    }
}
