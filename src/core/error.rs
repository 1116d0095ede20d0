//! Located error type for user-visible failures.
//!
//! Every fallible operation that can be caused by bad buildfile input
//! returns one of these. The error carries the source location of the
//! originating expression when one is known, plus an optional help text.
//! A user error discards only the target being generated; generation of
//! other targets continues.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in a buildfile: file, 1-based line, 1-based column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Buildfile the expression came from
    pub file: String,
    /// 1-based line number
    pub line: usize,
    /// 1-based column number
    pub column: usize,
}

impl Location {
    /// Create a new location.
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Location {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// An error with an optional source location and help text.
#[derive(Debug, Clone)]
pub struct Error {
    message: String,
    location: Option<Location>,
    help: Option<String>,
}

impl Error {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Error {
            message: message.into(),
            location: None,
            help: None,
        }
    }

    /// Attach the location of the originating expression.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a help text shown below the message.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The location, if one is known.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// The help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.message)?,
            None => write!(f, "{}", self.message)?,
        }
        if let Some(help) = &self.help {
            write!(f, "\n{help}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
