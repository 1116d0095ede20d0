//! Per-build settings and the per-toolchain view of them.
//!
//! [`BuildSettings`] describes one build: one source root, one output
//! directory, one set of command-line args. It is configured once during
//! setup and logically immutable afterwards; readers don't lock. There may
//! be several [`Settings`] views referring to one `BuildSettings`, one per
//! toolchain.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::label::Label;
use crate::core::path::{OutputFile, SourceDir, SourceFile};
use crate::core::target::Target;
use crate::frontend::value::Value;
use crate::util::filesystem::{ends_with_slash, invert_dir};
use crate::util::InternedString;

/// The OS the generated rules compile for.
///
/// This is the *target* OS: it decides what text gets emitted (object
/// extensions, manifest lines, library naming). Decisions about the machine
/// slipway itself runs on branch on the host instead, down in the path
/// algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    /// macOS
    Mac,
    /// Windows
    Win,
    /// Linux and other ELF platforms
    Linux,
}

/// An item handed to the build-settings sink when a buildfile defines it.
#[derive(Debug, Clone)]
pub enum Item {
    /// A target definition
    Target(Target),
    /// A config definition
    Config(Config),
}

impl Item {
    /// The label of the defined item.
    pub fn label(&self) -> &Label {
        match self {
            Item::Target(target) => &target.label,
            Item::Config(config) => &config.label,
        }
    }
}

/// Callback invoked whenever an item is defined. May be called from worker
/// threads, so implementations must only enqueue and wake.
pub type ItemDefinedCallback = Arc<dyn Fn(Item) + Send + Sync>;

/// Settings for one build: one toplevel output directory.
pub struct BuildSettings {
    root_path: PathBuf,
    root_path_utf8: String,
    secondary_source_path: Option<PathBuf>,
    python_path: PathBuf,

    build_config_file: SourceFile,
    build_dir: SourceDir,
    build_to_source_dir_string: String,
    build_args: BTreeMap<InternedString, Value>,

    item_defined_callback: Option<ItemDefinedCallback>,
}

impl BuildSettings {
    /// Create empty build settings; callers fill them in during setup.
    pub fn new() -> Self {
        BuildSettings {
            root_path: PathBuf::new(),
            root_path_utf8: String::new(),
            secondary_source_path: None,
            python_path: PathBuf::new(),
            build_config_file: SourceFile::default(),
            build_dir: SourceDir::default(),
            build_to_source_dir_string: String::new(),
            build_args: BTreeMap::new(),
            item_defined_callback: None,
        }
    }

    /// Absolute path of the source root on the local system. Everything is
    /// relative to this. Does not end in a separator.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// The root path as UTF-8.
    pub fn root_path_utf8(&self) -> &str {
        &self.root_path_utf8
    }

    /// Set the source root. The value must not end in a separator.
    pub fn set_root_path(&mut self, root: PathBuf) {
        let as_str = root.to_string_lossy().into_owned();
        assert!(
            !ends_with_slash(&as_str),
            "root path ends in a separator: {as_str}"
        );
        self.root_path = root;
        self.root_path_utf8 = as_str;
    }

    /// A parallel directory hierarchy searched for buildfiles not found in
    /// the root hierarchy, letting buildfiles live in a separate tree during
    /// development.
    pub fn secondary_source_path(&self) -> Option<&Path> {
        self.secondary_source_path.as_deref()
    }

    /// Set the secondary source tree.
    pub fn set_secondary_source_path(&mut self, path: PathBuf) {
        self.secondary_source_path = Some(path);
    }

    /// Path of the python executable to run scripts with.
    pub fn python_path(&self) -> &Path {
        &self.python_path
    }

    /// Set the python executable path.
    pub fn set_python_path(&mut self, path: PathBuf) {
        self.python_path = path;
    }

    /// The buildfile evaluated to set up the build configuration.
    pub fn build_config_file(&self) -> &SourceFile {
        &self.build_config_file
    }

    /// Set the build configuration file.
    pub fn set_build_config_file(&mut self, file: SourceFile) {
        self.build_config_file = file;
    }

    /// The build directory: the source-absolute root of all output files.
    /// Default-toolchain files go directly in here; other toolchains get
    /// separate subdirectories inside it.
    pub fn build_dir(&self) -> &SourceDir {
        &self.build_dir
    }

    /// Set the build directory, recomputing its inverse.
    pub fn set_build_dir(&mut self, dir: SourceDir) {
        self.build_to_source_dir_string = invert_dir(&dir);
        self.build_dir = dir;
    }

    /// The inverse of the build directory, ending in a separator.
    /// Example: a build dir of `//out/Debug/` gives `../../`.
    pub fn build_to_source_dir_string(&self) -> &str {
        &self.build_to_source_dir_string
    }

    /// Build args, normally specified on the command line.
    pub fn build_args(&self) -> &BTreeMap<InternedString, Value> {
        &self.build_args
    }

    /// Mutable access to the build args during setup.
    pub fn build_args_mut(&mut self) -> &mut BTreeMap<InternedString, Value> {
        &mut self.build_args
    }

    /// The full absolute OS path corresponding to the given file in the
    /// root source tree.
    pub fn full_path(&self, file: &SourceFile) -> PathBuf {
        self.resolve_against(&self.root_path, file.value())
    }

    /// The full absolute OS path corresponding to the given directory.
    pub fn full_dir_path(&self, dir: &SourceDir) -> PathBuf {
        self.resolve_against(&self.root_path, dir.value())
    }

    /// The absolute OS path inside the secondary source tree, or None when
    /// no secondary tree is set. Callers must consult `full_path` first.
    pub fn full_path_secondary(&self, file: &SourceFile) -> Option<PathBuf> {
        self.secondary_source_path
            .as_ref()
            .map(|root| self.resolve_against(root, file.value()))
    }

    fn resolve_against(&self, root: &Path, value: &str) -> PathBuf {
        if let Some(source_relative) = value.strip_prefix("//") {
            root.join(source_relative)
        } else {
            PathBuf::from(value)
        }
    }

    /// Install the callback invoked when an item is defined.
    pub fn set_item_defined_callback(&mut self, callback: ItemDefinedCallback) {
        self.item_defined_callback = Some(callback);
    }

    /// Called when an item is defined, possibly from a worker thread.
    pub fn item_defined(&self, item: Item) {
        if let Some(callback) = self.item_defined_callback.as_deref() {
            callback(item);
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings::new()
    }
}

impl fmt::Debug for BuildSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildSettings")
            .field("root_path", &self.root_path)
            .field("build_dir", &self.build_dir)
            .field("build_args", &self.build_args.len())
            .finish_non_exhaustive()
    }
}

/// Read-only per-toolchain view of a build.
#[derive(Debug, Clone)]
pub struct Settings {
    build_settings: Arc<BuildSettings>,
    toolchain_label: Label,
    default_toolchain_label: Label,
    target_os: TargetOs,
    toolchain_output_subdir: OutputFile,
}

impl Settings {
    /// Create the view for one toolchain.
    ///
    /// The output subdir is empty for the default toolchain; otherwise it is
    /// a directory segment ending in `/` that namespaces this toolchain's
    /// files inside the build directory.
    pub fn new(
        build_settings: Arc<BuildSettings>,
        toolchain_label: Label,
        default_toolchain_label: Label,
        target_os: TargetOs,
        toolchain_output_subdir: OutputFile,
    ) -> Self {
        debug_assert!(
            toolchain_output_subdir.is_empty()
                || ends_with_slash(toolchain_output_subdir.value())
        );
        Settings {
            build_settings,
            toolchain_label,
            default_toolchain_label,
            target_os,
            toolchain_output_subdir,
        }
    }

    /// The underlying build settings.
    pub fn build_settings(&self) -> &BuildSettings {
        &self.build_settings
    }

    /// The label of this view's toolchain.
    pub fn toolchain_label(&self) -> &Label {
        &self.toolchain_label
    }

    /// The label of the build's default toolchain.
    pub fn default_toolchain_label(&self) -> &Label {
        &self.default_toolchain_label
    }

    /// Whether this view is for the default toolchain.
    pub fn is_default_toolchain(&self) -> bool {
        self.toolchain_label == self.default_toolchain_label
    }

    /// The OS the generated rules compile for.
    pub fn target_os(&self) -> TargetOs {
        self.target_os
    }

    /// Whether the target OS is Windows.
    pub fn is_win(&self) -> bool {
        self.target_os == TargetOs::Win
    }

    /// Whether the target OS is macOS.
    pub fn is_mac(&self) -> bool {
        self.target_os == TargetOs::Mac
    }

    /// Whether the target OS is Linux.
    pub fn is_linux(&self) -> bool {
        self.target_os == TargetOs::Linux
    }

    /// This toolchain's subdirectory under the build dir; empty for the
    /// default toolchain.
    pub fn toolchain_output_subdir(&self) -> &OutputFile {
        &self.toolchain_output_subdir
    }

    /// The root of this toolchain's output files, as a source-absolute
    /// directory.
    pub fn toolchain_output_dir(&self) -> SourceDir {
        let mut result = self.build_settings.build_dir().value().to_string();
        result.push_str(self.toolchain_output_subdir.value());
        SourceDir::new(result)
    }

    /// The root of this toolchain's generated files.
    pub fn toolchain_gen_dir(&self) -> SourceDir {
        let mut result = self.toolchain_output_dir().value().to_string();
        result.push_str("gen/");
        SourceDir::new(result)
    }

    /// The object-file directory corresponding to a source directory.
    pub fn output_dir_for_source_dir(&self, source_dir: &SourceDir) -> SourceDir {
        let mut result = self.toolchain_output_dir().value().to_string();
        result.push_str("obj/");

        // The source dir is source-absolute, so trim off the two leading
        // slashes to append to the toolchain object directory.
        debug_assert!(source_dir.is_source_absolute());
        result.push_str(&source_dir.value()[2..]);
        SourceDir::new(result)
    }

    /// The generated-file directory corresponding to a source directory.
    pub fn gen_dir_for_source_dir(&self, source_dir: &SourceDir) -> SourceDir {
        let mut result = self.toolchain_gen_dir().value().to_string();
        debug_assert!(source_dir.is_source_absolute());
        result.push_str(&source_dir.value()[2..]);
        SourceDir::new(result)
    }

    /// The object-file directory for a target.
    pub fn target_output_dir(&self, target: &Target) -> SourceDir {
        self.output_dir_for_source_dir(&target.label.dir)
    }

    /// The generated-file directory for a target.
    pub fn target_gen_dir(&self, target: &Target) -> SourceDir {
        self.gen_dir_for_source_dir(&target.label.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::OutputType;

    fn settings_with_build_dir(subdir: &str) -> Settings {
        let mut build_settings = BuildSettings::new();
        build_settings.set_build_dir(SourceDir::new("//out/Debug/"));
        let toolchain = Label::without_toolchain(SourceDir::new("//tc/"), "default");
        Settings::new(
            Arc::new(build_settings),
            toolchain.clone(),
            toolchain,
            TargetOs::Linux,
            OutputFile::new(subdir),
        )
    }

    #[test]
    fn test_build_dir_inverse() {
        let mut build_settings = BuildSettings::new();
        build_settings.set_build_dir(SourceDir::new("//out/Debug/"));
        assert_eq!(build_settings.build_to_source_dir_string(), "../../");
    }

    #[test]
    #[should_panic(expected = "root path ends in a separator")]
    fn test_root_path_trailing_separator_asserts() {
        let mut build_settings = BuildSettings::new();
        build_settings.set_root_path(PathBuf::from("/home/user/src/"));
    }

    #[test]
    fn test_full_path() {
        let mut build_settings = BuildSettings::new();
        build_settings.set_root_path(PathBuf::from("/home/user/src"));

        assert_eq!(
            build_settings.full_path(&SourceFile::new("//foo/bar.cc")),
            PathBuf::from("/home/user/src/foo/bar.cc")
        );
        assert_eq!(
            build_settings.full_path(&SourceFile::new("/abs/file.cc")),
            PathBuf::from("/abs/file.cc")
        );
        assert_eq!(
            build_settings.full_path_secondary(&SourceFile::new("//foo/bar.cc")),
            None
        );

        build_settings.set_secondary_source_path(PathBuf::from("/home/user/alt"));
        assert_eq!(
            build_settings.full_path_secondary(&SourceFile::new("//foo/bar.cc")),
            Some(PathBuf::from("/home/user/alt/foo/bar.cc"))
        );
    }

    #[test]
    fn test_derived_dirs_default_toolchain() {
        let settings = settings_with_build_dir("");
        assert_eq!(settings.toolchain_output_dir().value(), "//out/Debug/");
        assert_eq!(settings.toolchain_gen_dir().value(), "//out/Debug/gen/");
        assert_eq!(
            settings
                .output_dir_for_source_dir(&SourceDir::new("//foo/"))
                .value(),
            "//out/Debug/obj/foo/"
        );
        assert_eq!(
            settings
                .gen_dir_for_source_dir(&SourceDir::new("//foo/"))
                .value(),
            "//out/Debug/gen/foo/"
        );
    }

    #[test]
    fn test_derived_dirs_secondary_toolchain() {
        let settings = settings_with_build_dir("arm/");
        assert_eq!(settings.toolchain_output_dir().value(), "//out/Debug/arm/");
        assert_eq!(
            settings.toolchain_gen_dir().value(),
            "//out/Debug/arm/gen/"
        );
    }

    #[test]
    fn test_target_dirs() {
        let settings = settings_with_build_dir("");
        let target = Target::with_type(
            Label::without_toolchain(SourceDir::new("//foo/"), "bar"),
            OutputType::SourceSet,
        );
        assert_eq!(
            settings.target_output_dir(&target).value(),
            "//out/Debug/obj/foo/"
        );
        assert_eq!(
            settings.target_gen_dir(&target).value(),
            "//out/Debug/gen/foo/"
        );
    }

    #[test]
    fn test_build_args() {
        use crate::frontend::value::Value;
        use crate::util::InternedString;

        let mut build_settings = BuildSettings::new();
        build_settings
            .build_args_mut()
            .insert(InternedString::new("is_component_build"), Value::boolean(true));
        build_settings
            .build_args_mut()
            .insert(InternedString::new("cpu_arch"), Value::string("x64"));

        let args = build_settings.build_args();
        assert_eq!(args.len(), 2);
        assert!(args[&InternedString::new("is_component_build")]
            .boolean_value()
            .unwrap());
        assert_eq!(
            args[&InternedString::new("cpu_arch")].string_value().unwrap(),
            "x64"
        );
    }

    #[test]
    fn test_item_defined_sink() {
        use std::sync::Mutex;

        let received: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let mut build_settings = BuildSettings::new();
        build_settings.set_item_defined_callback(Arc::new(move |item: Item| {
            sink.lock().unwrap().push(item.label().to_string());
        }));

        let target = Target::new(Label::without_toolchain(SourceDir::new("//foo/"), "bar"));
        build_settings.item_defined(Item::Target(target));

        assert_eq!(received.lock().unwrap().as_slice(), &["//foo:bar".to_string()]);
    }
}
