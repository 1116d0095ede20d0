//! Typed extraction of buildfile values.
//!
//! These helpers turn list values into the domain types the generators
//! need: plain strings, files resolved against the scope's directory, and
//! labels resolved against the directory and current toolchain. A type
//! mismatch anywhere produces a located error and extraction stops.

use crate::core::error::Error;
use crate::core::label::{Label, LabelConfigPair, LabelTargetPair};
use crate::core::path::{SourceDir, SourceFile};
use crate::frontend::value::Value;

/// Extract a list of plain strings.
pub fn extract_list_of_strings(value: &Value) -> Result<Vec<String>, Error> {
    let mut result = Vec::new();
    for item in value.list_value()? {
        result.push(item.string_value()?.to_string());
    }
    Ok(result)
}

/// Extract a list of files, resolving each against the current directory.
pub fn extract_list_of_relative_files(
    value: &Value,
    current_dir: &SourceDir,
) -> Result<Vec<SourceFile>, Error> {
    let mut result = Vec::new();
    for item in value.list_value()? {
        let s = item.string_value()?;
        result.push(current_dir.resolve_relative_file(s, Some(item))?);
    }
    Ok(result)
}

/// Extract a list of labels, resolving each against the current directory
/// and toolchain.
pub fn extract_list_of_labels(
    value: &Value,
    current_dir: &SourceDir,
    current_toolchain: &Label,
) -> Result<Vec<Label>, Error> {
    let mut result = Vec::new();
    for item in value.list_value()? {
        let s = item.string_value()?;
        result.push(Label::resolve(s, current_dir, current_toolchain, Some(item))?);
    }
    Ok(result)
}

/// Extract a list of labels as unlinked target edges.
pub fn extract_label_target_pairs(
    value: &Value,
    current_dir: &SourceDir,
    current_toolchain: &Label,
) -> Result<Vec<LabelTargetPair>, Error> {
    Ok(extract_list_of_labels(value, current_dir, current_toolchain)?
        .into_iter()
        .map(LabelTargetPair::new)
        .collect())
}

/// Extract a list of labels as unlinked config edges.
pub fn extract_label_config_pairs(
    value: &Value,
    current_dir: &SourceDir,
    current_toolchain: &Label,
) -> Result<Vec<LabelConfigPair>, Error> {
    Ok(extract_list_of_labels(value, current_dir, current_toolchain)?
        .into_iter()
        .map(LabelConfigPair::new)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Location;

    fn toolchain() -> Label {
        Label::without_toolchain(SourceDir::new("//tc/"), "default")
    }

    #[test]
    fn test_extract_strings() {
        let value = Value::list(vec![Value::string("a"), Value::string("b")]);
        assert_eq!(extract_list_of_strings(&value).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_extract_strings_type_mismatch() {
        let value = Value::list(vec![Value::string("a"), Value::integer(3)]);
        assert!(extract_list_of_strings(&value).is_err());

        let not_a_list = Value::string("a");
        assert!(extract_list_of_strings(&not_a_list).is_err());
    }

    #[test]
    fn test_extract_relative_files() {
        let dir = SourceDir::new("//foo/");
        let value = Value::list(vec![
            Value::string("input1.cc"),
            Value::string("../bar/input2.cc"),
            Value::string("//abs/input3.cc"),
        ]);
        let files = extract_list_of_relative_files(&value, &dir).unwrap();
        let values: Vec<&str> = files.iter().map(|f| f.value()).collect();
        assert_eq!(
            values,
            vec!["//foo/input1.cc", "//bar/input2.cc", "//abs/input3.cc"]
        );
    }

    #[test]
    fn test_extract_relative_files_rejects_dir() {
        let dir = SourceDir::new("//foo/");
        let value = Value::list(vec![
            Value::string("subdir/").with_origin(Location::new("//foo/BUILD", 4, 1))
        ]);
        let err = extract_list_of_relative_files(&value, &dir).unwrap_err();
        assert_eq!(err.location().unwrap().line, 4);
    }

    #[test]
    fn test_extract_labels() {
        let dir = SourceDir::new("//foo/");
        let value = Value::list(vec![Value::string("//base:base"), Value::string(":local")]);
        let labels = extract_list_of_labels(&value, &dir, &toolchain()).unwrap();
        assert_eq!(labels[0].to_string(), "//base:base");
        assert_eq!(labels[1].to_string(), "//foo:local");
        assert_eq!(labels[0].toolchain_name.as_str(), "default");
    }
}
