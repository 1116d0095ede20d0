//! The evaluated-scope boundary.
//!
//! The external evaluator produces one scope per buildfile invocation:
//! the directory the file lives in, the settings view for the toolchain it
//! is being evaluated under, and the values its assignments produced.
//! Lookups fall back to the programmatic per-file identifiers.

use std::collections::HashMap;

use crate::core::path::SourceDir;
use crate::core::settings::Settings;
use crate::frontend::per_file_provider::PerFileProvider;
use crate::frontend::value::Value;
use crate::util::InternedString;

/// An evaluated buildfile scope.
pub struct Scope<'a> {
    settings: &'a Settings,
    source_dir: SourceDir,
    values: HashMap<InternedString, Value>,
    provider: PerFileProvider,
}

impl<'a> Scope<'a> {
    /// Create an empty scope for a source directory.
    pub fn new(settings: &'a Settings, source_dir: SourceDir) -> Self {
        Scope {
            settings,
            source_dir,
            values: HashMap::new(),
            provider: PerFileProvider::new(),
        }
    }

    /// The settings view this scope is evaluated under.
    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// The directory of the buildfile this scope belongs to.
    pub fn source_dir(&self) -> &SourceDir {
        &self.source_dir
    }

    /// Assign a value, as the evaluator does for each buildfile assignment.
    pub fn set_value(&mut self, name: impl Into<InternedString>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Look up a value by name. Assigned values win; otherwise programmatic
    /// per-file identifiers are computed on demand.
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(&InternedString::new(name)) {
            return Some(value);
        }
        self.provider
            .get_programmatic_value(name, self.settings, &self.source_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestWithScope;

    #[test]
    fn test_assigned_values_win_over_programmatic() {
        let setup = TestWithScope::new();
        let mut scope = setup.scope(SourceDir::new("//foo/"));

        scope.set_value("python_path", Value::string("/custom/python"));
        assert_eq!(
            scope.get_value("python_path").unwrap().string_value().unwrap(),
            "/custom/python"
        );
    }

    #[test]
    fn test_missing_value() {
        let setup = TestWithScope::new();
        let scope = setup.scope(SourceDir::new("//foo/"));
        assert!(scope.get_value("sources").is_none());
    }
}
