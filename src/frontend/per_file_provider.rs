//! Programmatic per-file identifiers.
//!
//! Inside a buildfile, a handful of identifiers are computed rather than
//! assigned: the current and default toolchain names, the python path, and
//! the root/target output and gen directories. Each is computed on first
//! lookup from the scope's settings and cached for the lifetime of the
//! scope. Directory values are exposed without the trailing slash.

use std::cell::OnceCell;

use crate::core::path::SourceDir;
use crate::core::settings::Settings;
use crate::frontend::value::Value;
use crate::util::filesystem::directory_with_no_last_slash;

/// Identifier for the current toolchain label.
pub const CURRENT_TOOLCHAIN: &str = "current_toolchain";
/// Identifier for the default toolchain label.
pub const DEFAULT_TOOLCHAIN: &str = "default_toolchain";
/// Identifier for the python executable path.
pub const PYTHON_PATH: &str = "python_path";
/// Identifier for the build directory.
pub const ROOT_BUILD_DIR: &str = "root_build_dir";
/// Identifier for the toolchain gen directory.
pub const ROOT_GEN_DIR: &str = "root_gen_dir";
/// Identifier for the toolchain output directory.
pub const ROOT_OUT_DIR: &str = "root_out_dir";
/// Identifier for the current file's gen directory.
pub const TARGET_GEN_DIR: &str = "target_gen_dir";
/// Identifier for the current file's output directory.
pub const TARGET_OUT_DIR: &str = "target_out_dir";

/// Lazy cache of the programmatic values for one scope.
#[derive(Debug, Default)]
pub struct PerFileProvider {
    current_toolchain: OnceCell<Value>,
    default_toolchain: OnceCell<Value>,
    python_path: OnceCell<Value>,
    root_build_dir: OnceCell<Value>,
    root_gen_dir: OnceCell<Value>,
    root_out_dir: OnceCell<Value>,
    target_gen_dir: OnceCell<Value>,
    target_out_dir: OnceCell<Value>,
}

impl PerFileProvider {
    /// Create an empty cache.
    pub fn new() -> Self {
        PerFileProvider::default()
    }

    /// Look up a programmatic identifier, computing and caching its value on
    /// first use. Returns None for identifiers this provider doesn't handle.
    pub fn get_programmatic_value(
        &self,
        ident: &str,
        settings: &Settings,
        source_dir: &SourceDir,
    ) -> Option<&Value> {
        match ident {
            CURRENT_TOOLCHAIN => Some(self.current_toolchain.get_or_init(|| {
                Value::string(settings.toolchain_label().user_visible_name(false))
            })),
            DEFAULT_TOOLCHAIN => Some(self.default_toolchain.get_or_init(|| {
                Value::string(settings.default_toolchain_label().user_visible_name(false))
            })),
            PYTHON_PATH => Some(self.python_path.get_or_init(|| {
                Value::string(
                    settings
                        .build_settings()
                        .python_path()
                        .to_string_lossy()
                        .into_owned(),
                )
            })),
            ROOT_BUILD_DIR => Some(self.root_build_dir.get_or_init(|| {
                Value::string(directory_with_no_last_slash(
                    settings.build_settings().build_dir(),
                ))
            })),
            ROOT_GEN_DIR => Some(self.root_gen_dir.get_or_init(|| {
                Value::string(directory_with_no_last_slash(&settings.toolchain_gen_dir()))
            })),
            ROOT_OUT_DIR => Some(self.root_out_dir.get_or_init(|| {
                Value::string(directory_with_no_last_slash(
                    &settings.toolchain_output_dir(),
                ))
            })),
            TARGET_GEN_DIR => Some(self.target_gen_dir.get_or_init(|| {
                Value::string(directory_with_no_last_slash(
                    &settings.gen_dir_for_source_dir(source_dir),
                ))
            })),
            TARGET_OUT_DIR => Some(self.target_out_dir.get_or_init(|| {
                Value::string(directory_with_no_last_slash(
                    &settings.output_dir_for_source_dir(source_dir),
                ))
            })),
            _ => None,
        }
    }
}
