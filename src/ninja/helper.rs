//! Output-file naming and rule selection.
//!
//! All values here are build-dir relative, the form rule files use. The
//! object-file scheme is `<obj dir>/<target>.<basename>.<ext>` so every
//! output name within a target is unique even when two source directories
//! contribute files with the same basename.

use crate::core::path::{OutputFile, SourceFile};
use crate::core::settings::Settings;
use crate::core::target::{OutputType, Target};
use crate::core::toolchain::ToolType;
use crate::util::filesystem::{
    extension_for_output_type, find_filename_no_extension, SourceFileType,
};

/// The rule-name prefix for this toolchain: empty for the default
/// toolchain, `<name>_` otherwise.
pub fn rule_prefix(settings: &Settings) -> String {
    if settings.is_default_toolchain() {
        String::new()
    } else {
        format!("{}_", settings.toolchain_label().name)
    }
}

/// The compile rule for a source type, with the toolchain prefix applied.
/// None means the type is not compiled (headers, unknown files).
pub fn rule_for_source_type(settings: &Settings, file_type: SourceFileType) -> Option<String> {
    let base = match file_type {
        SourceFileType::C => "cc",
        SourceFileType::Cc => "cxx",
        SourceFileType::ObjC => "objc",
        SourceFileType::ObjCc => "objcxx",
        SourceFileType::Rc => "rc",
        // Assembly goes through the C compiler driver.
        SourceFileType::Asm => "cc",
        SourceFileType::Header | SourceFileType::Unknown => return None,
    };
    Some(format!("{}{}", rule_prefix(settings), base))
}

/// The link tool for a target's output type. None for kinds with no link
/// step; such targets contribute only their compile rules.
pub fn tool_type_for_target(target: &Target) -> Option<ToolType> {
    match target.output_type {
        OutputType::StaticLibrary => Some(ToolType::Alink),
        OutputType::SharedLibrary => Some(ToolType::Solink),
        OutputType::Executable => Some(ToolType::Link),
        _ => None,
    }
}

/// The object-file extension for a compiled source.
pub fn object_extension(settings: &Settings, file_type: SourceFileType) -> &'static str {
    match file_type {
        SourceFileType::Rc => "res",
        _ => {
            if settings.is_win() {
                "obj"
            } else {
                "o"
            }
        }
    }
}

/// The object directory of a target, build-dir relative:
/// `<toolchain subdir>obj/<source dir>/`.
pub fn target_output_dir(settings: &Settings, target: &Target) -> String {
    let mut result = settings.toolchain_output_subdir().value().to_string();
    result.push_str("obj/");

    let dir = target.label.dir.value();
    debug_assert!(dir.starts_with("//"));
    result.push_str(&dir[2..]);
    result
}

/// The object file a source compiles to, prefixed with the owning target's
/// name.
pub fn output_file_for_source(
    settings: &Settings,
    target: &Target,
    source: &SourceFile,
    file_type: SourceFileType,
) -> OutputFile {
    OutputFile::new(format!(
        "{}{}.{}.{}",
        target_output_dir(settings, target),
        target.label.name,
        find_filename_no_extension(source.value()),
        object_extension(settings, file_type),
    ))
}

/// The output file other targets reference for this one.
///
/// Binary kinds get their platform naming (the `lib` filename prefix and
/// the `lib/` directory exist only off Windows); everything else gets a
/// stamp file in the object directory. For a Windows shared library this is
/// the import library; the `.dll` itself is the writer's concern.
pub fn target_output_file(settings: &Settings, target: &Target) -> OutputFile {
    let lib_prefix = if settings.is_win() { "" } else { "lib" };
    let name = target.effective_output_name();

    let mut value = match target.output_type {
        OutputType::Unknown
        | OutputType::Group
        | OutputType::SourceSet
        | OutputType::CopyFiles
        | OutputType::Custom => {
            // These don't get hashed since they never exist as real
            // compiler inputs; the stamp stands in for the target.
            let mut value = target_output_dir(settings, target);
            value.push_str(name);
            value.push_str(".stamp");
            return OutputFile::new(value);
        }
        OutputType::Executable => {
            // Executables have nothing in the output name other than the
            // name from the buildfile.
            format!("{}{}", settings.toolchain_output_subdir().value(), name)
        }
        OutputType::SharedLibrary => {
            let lib_dir = if settings.is_win() { "" } else { "lib/" };
            format!(
                "{}{}{}{}",
                settings.toolchain_output_subdir().value(),
                lib_dir,
                lib_prefix,
                name
            )
        }
        OutputType::StaticLibrary => {
            format!("{}{}{}", target_output_dir(settings, target), lib_prefix, name)
        }
    };

    let extension = if target.output_extension.is_empty() {
        extension_for_output_type(target.output_type, settings.target_os())
    } else {
        &target.output_extension
    };
    if !extension.is_empty() {
        value.push('.');
        value.push_str(extension);
    }

    OutputFile::new(value)
}
