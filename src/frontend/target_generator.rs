//! Turning evaluated scopes into typed targets.
//!
//! A buildfile defines a target by calling a function named after the
//! output kind (`executable("name") { ... }`). By the time this module
//! runs, the evaluator has reduced the block to a scope full of typed
//! values; [`generate_target`] validates the call, pulls the recognized
//! variables, and hands the finished target to the build-settings sink.
//! A user error discards the target being generated; other targets are
//! unaffected.

use crate::core::error::{Error, Location};
use crate::core::label::Label;
use crate::core::settings::Item;
use crate::core::target::{OutputType, Target};
use crate::frontend::scope::Scope;
use crate::frontend::value::Value;
use crate::frontend::value_extractors::{
    extract_label_config_pairs, extract_label_target_pairs, extract_list_of_relative_files,
    extract_list_of_strings,
};
use crate::util::filesystem::ensure_string_is_in_output_dir;

// Recognized buildfile variable names.
const ALL_DEPENDENT_CONFIGS: &str = "all_dependent_configs";
const ARGS: &str = "args";
const CONFIGS: &str = "configs";
const DATA: &str = "data";
const DATADEPS: &str = "datadeps";
const DEPS: &str = "deps";
const DIRECT_DEPENDENT_CONFIGS: &str = "direct_dependent_configs";
const EXTERNAL: &str = "external";
const FORWARD_DEPENDENT_CONFIGS_FROM: &str = "forward_dependent_configs_from";
const GYP_FILE: &str = "gyp_file";
const HARD_DEP: &str = "hard_dep";
const OUTPUTS: &str = "outputs";
const OUTPUT_EXTENSION: &str = "output_extension";
const OUTPUT_NAME: &str = "output_name";
const SCRIPT: &str = "script";
const SOURCES: &str = "sources";
const SOURCE_PREREQS: &str = "source_prereqs";

/// The function-call expression a target definition came from, used for
/// error locations.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    /// The function name as written (the output kind)
    pub name: String,
    /// Where the call appears
    pub location: Location,
}

impl FunctionCall {
    /// Create a function-call node.
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        FunctionCall {
            name: name.into(),
            location,
        }
    }
}

/// Generate a target of the named output kind from an evaluated scope and
/// hand it to the build-settings sink.
///
/// `args` are the positional arguments of the defining call; exactly one
/// string (the target name) is required.
pub fn generate_target(
    scope: &Scope,
    function_call: &FunctionCall,
    args: &[Value],
    output_type: &str,
) -> Result<(), Error> {
    // Name is the argument to the function.
    if args.len() != 1 {
        return Err(Error::new("Target generator requires one string argument.")
            .with_help("Otherwise I'm not sure what to call this target.")
            .with_location(function_call.location.clone()));
    }
    let name = args[0].string_value()?;

    // The target lives in the scope's directory under the scope's toolchain.
    let toolchain_label = scope.settings().toolchain_label();
    let label = Label::new(
        scope.source_dir().clone(),
        name,
        toolchain_label.dir.clone(),
        toolchain_label.name,
    );

    tracing::debug!(target_label = %label.user_visible_name(true), "defining target");

    let mut target = Target::new(label);

    // All target kinds use these.
    fill_dependent_configs(scope, &mut target)?;
    fill_data(scope, &mut target)?;
    fill_dependencies(scope, &mut target)?;
    fill_gyp_file(scope, &mut target)?;

    // Kind-specific generation.
    match output_type {
        "copy" => generate_copy_target(scope, &mut target)?,
        "custom" => generate_script_target(scope, &mut target)?,
        "executable" => generate_binary_target(scope, &mut target, OutputType::Executable)?,
        "group" => target.output_type = OutputType::Group,
        "shared_library" => generate_binary_target(scope, &mut target, OutputType::SharedLibrary)?,
        "source_set" => generate_binary_target(scope, &mut target, OutputType::SourceSet)?,
        "static_library" => generate_binary_target(scope, &mut target, OutputType::StaticLibrary)?,
        _ => {
            return Err(Error::new("Not a known output type")
                .with_help("I am very confused.")
                .with_location(function_call.location.clone()))
        }
    }

    scope.settings().build_settings().item_defined(Item::Target(target));
    Ok(())
}

fn generate_binary_target(
    scope: &Scope,
    target: &mut Target,
    output_type: OutputType,
) -> Result<(), Error> {
    target.output_type = output_type;
    fill_sources(scope, target)?;
    fill_source_prereqs(scope, target)?;
    fill_configs(scope, target)?;
    fill_external(scope, target)?;
    fill_output_name(scope, target)?;
    fill_output_extension(scope, target)?;
    Ok(())
}

fn generate_copy_target(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    target.output_type = OutputType::CopyFiles;
    fill_sources(scope, target)?;
    fill_outputs(scope, target)?;

    if target.sources.is_empty() {
        return Err(Error::new("Empty sources for copy command.")
            .with_help("You have to specify at least one file to copy in the \"sources\"."));
    }
    Ok(())
}

fn generate_script_target(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    target.output_type = OutputType::Custom;
    fill_sources(scope, target)?;
    fill_source_prereqs(scope, target)?;
    fill_script(scope, target)?;
    fill_script_args(scope, target)?;
    fill_outputs(scope, target)?;

    if target.script_values.script.is_null() {
        return Err(Error::new("No script specified.")
            .with_help("A custom target needs a \"script\" to run."));
    }
    Ok(())
}

fn fill_sources(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(SOURCES) else {
        return Ok(());
    };
    target.sources = extract_list_of_relative_files(value, scope.source_dir())?;
    Ok(())
}

fn fill_source_prereqs(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(SOURCE_PREREQS) else {
        return Ok(());
    };
    target.source_prereqs = extract_list_of_relative_files(value, scope.source_dir())?;
    Ok(())
}

fn fill_data(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(DATA) else {
        return Ok(());
    };
    target.data = extract_list_of_relative_files(value, scope.source_dir())?;
    Ok(())
}

fn fill_configs(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(CONFIGS) else {
        return Ok(());
    };
    let toolchain = scope.settings().toolchain_label().clone();
    target.configs = extract_label_config_pairs(value, scope.source_dir(), &toolchain)?;
    Ok(())
}

fn fill_dependent_configs(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let toolchain = scope.settings().toolchain_label().clone();
    if let Some(value) = scope.get_value(ALL_DEPENDENT_CONFIGS) {
        target.all_dependent_configs =
            extract_label_config_pairs(value, scope.source_dir(), &toolchain)?;
    }
    if let Some(value) = scope.get_value(DIRECT_DEPENDENT_CONFIGS) {
        target.direct_dependent_configs =
            extract_label_config_pairs(value, scope.source_dir(), &toolchain)?;
    }
    Ok(())
}

fn fill_dependencies(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let toolchain = scope.settings().toolchain_label().clone();
    if let Some(value) = scope.get_value(DEPS) {
        target.deps = extract_label_target_pairs(value, scope.source_dir(), &toolchain)?;
    }
    if let Some(value) = scope.get_value(DATADEPS) {
        target.datadeps = extract_label_target_pairs(value, scope.source_dir(), &toolchain)?;
    }

    // This is a list of dependent targets to have their configs forwarded,
    // so it goes here rather than in fill_configs.
    if let Some(value) = scope.get_value(FORWARD_DEPENDENT_CONFIGS_FROM) {
        target.forward_dependent_configs =
            extract_label_target_pairs(value, scope.source_dir(), &toolchain)?;
    }

    fill_hard_dep(scope, target)?;
    Ok(())
}

fn fill_hard_dep(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(HARD_DEP) else {
        return Ok(());
    };
    target.hard_dep = value.boolean_value()?;
    Ok(())
}

fn fill_external(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(EXTERNAL) else {
        return Ok(());
    };
    target.external = value.boolean_value()?;
    Ok(())
}

fn fill_output_name(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(OUTPUT_NAME) else {
        return Ok(());
    };
    target.output_name = value.string_value()?.to_string();
    Ok(())
}

fn fill_output_extension(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(OUTPUT_EXTENSION) else {
        return Ok(());
    };
    target.output_extension = value.string_value()?.to_string();
    Ok(())
}

fn fill_gyp_file(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(GYP_FILE) else {
        return Ok(());
    };
    let s = value.string_value()?;
    target.gyp_file = scope.source_dir().resolve_relative_file(s, Some(value))?;
    Ok(())
}

fn fill_script(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(SCRIPT) else {
        return Ok(());
    };
    let s = value.string_value()?;
    target.script_values.script = scope.source_dir().resolve_relative_file(s, Some(value))?;
    Ok(())
}

fn fill_script_args(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(ARGS) else {
        return Ok(());
    };
    target.script_values.args = extract_list_of_strings(value)?;
    Ok(())
}

fn fill_outputs(scope: &Scope, target: &mut Target) -> Result<(), Error> {
    let Some(value) = scope.get_value(OUTPUTS) else {
        return Ok(());
    };
    let items = value.list_value()?;
    let build_dir = scope.settings().build_settings().build_dir().clone();

    let mut outputs = Vec::with_capacity(items.len());
    for item in items {
        let s = item.string_value()?;
        let file = scope.source_dir().resolve_relative_file(s, Some(item))?;

        // Validate that outputs are in the output dir.
        ensure_string_is_in_output_dir(&build_dir, file.value(), Some(item))?;
        outputs.push(file);
    }
    target.script_values.outputs = outputs;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::SourceDir;
    use crate::test_support::TestWithScope;

    fn call() -> FunctionCall {
        FunctionCall::new("executable", Location::new("//foo/BUILD", 1, 1))
    }

    #[test]
    fn test_requires_one_string_argument() {
        let setup = TestWithScope::new();
        let scope = setup.scope(SourceDir::new("//foo/"));

        let err = generate_target(&scope, &call(), &[], "executable").unwrap_err();
        assert!(err.message().contains("one string argument"));
        assert_eq!(err.location().unwrap().file, "//foo/BUILD");

        let two = [Value::string("a"), Value::string("b")];
        assert!(generate_target(&scope, &call(), &two, "executable").is_err());

        let not_string = [Value::integer(4)];
        assert!(generate_target(&scope, &call(), &not_string, "executable").is_err());
    }

    #[test]
    fn test_unknown_output_type() {
        let setup = TestWithScope::new();
        let scope = setup.scope(SourceDir::new("//foo/"));
        let args = [Value::string("bar")];

        let err = generate_target(&scope, &call(), &args, "zeppelin").unwrap_err();
        assert!(err.message().contains("Not a known output type"));
        // Nothing was defined.
        assert!(setup.drain_items().is_empty());
    }

    #[test]
    fn test_generates_executable() {
        let setup = TestWithScope::new();
        let mut scope = setup.scope(SourceDir::new("//foo/"));
        scope.set_value(
            SOURCES,
            Value::list(vec![Value::string("main.cc"), Value::string("util.cc")]),
        );
        scope.set_value(DEPS, Value::list(vec![Value::string("//base:base")]));
        scope.set_value(HARD_DEP, Value::boolean(true));

        let args = [Value::string("bar")];
        generate_target(&scope, &call(), &args, "executable").unwrap();

        let items = setup.drain_items();
        assert_eq!(items.len(), 1);
        let Item::Target(target) = &items[0] else {
            panic!("expected a target");
        };
        assert_eq!(target.label.to_string(), "//foo:bar");
        assert_eq!(target.output_type, OutputType::Executable);
        assert_eq!(target.sources.len(), 2);
        assert_eq!(target.sources[0].value(), "//foo/main.cc");
        assert_eq!(target.deps.len(), 1);
        assert_eq!(target.deps[0].label.to_string(), "//base:base");
        assert!(target.hard_dep);
        assert_eq!(
            target.label.toolchain_name.as_str(),
            scope.settings().toolchain_label().name.as_str()
        );
    }

    #[test]
    fn test_type_mismatch_discards_target() {
        let setup = TestWithScope::new();
        let mut scope = setup.scope(SourceDir::new("//foo/"));
        scope.set_value(SOURCES, Value::string("not_a_list"));

        let args = [Value::string("bar")];
        assert!(generate_target(&scope, &call(), &args, "source_set").is_err());
        assert!(setup.drain_items().is_empty());
    }

    #[test]
    fn test_copy_requires_sources() {
        let setup = TestWithScope::new();
        let scope = setup.scope(SourceDir::new("//foo/"));
        let args = [Value::string("stuff")];

        let err = generate_target(&scope, &call(), &args, "copy").unwrap_err();
        assert!(err.message().contains("Empty sources"));
    }

    #[test]
    fn test_custom_target_outputs_must_be_in_build_dir() {
        let setup = TestWithScope::new();
        let mut scope = setup.scope(SourceDir::new("//foo/"));
        scope.set_value(SCRIPT, Value::string("run.py"));
        scope.set_value(
            OUTPUTS,
            Value::list(vec![Value::string("//foo/generated.h")]),
        );

        let args = [Value::string("gen")];
        let err = generate_target(&scope, &call(), &args, "custom").unwrap_err();
        assert!(err.message().contains("not inside output directory"));
    }

    #[test]
    fn test_custom_target_generates() {
        let setup = TestWithScope::new();
        let mut scope = setup.scope(SourceDir::new("//foo/"));
        scope.set_value(SCRIPT, Value::string("run.py"));
        scope.set_value(
            ARGS,
            Value::list(vec![Value::string("--out"), Value::string("x")]),
        );
        scope.set_value(
            OUTPUTS,
            Value::list(vec![Value::string("//out/Debug/gen/foo/generated.h")]),
        );

        let args = [Value::string("gen")];
        generate_target(&scope, &call(), &args, "custom").unwrap();

        let items = setup.drain_items();
        let Item::Target(target) = &items[0] else {
            panic!("expected a target");
        };
        assert_eq!(target.output_type, OutputType::Custom);
        assert_eq!(target.script_values.script.value(), "//foo/run.py");
        assert_eq!(target.script_values.args, vec!["--out", "x"]);
        assert_eq!(
            target.script_values.outputs[0].value(),
            "//out/Debug/gen/foo/generated.h"
        );
    }
}
