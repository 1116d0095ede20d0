//! Core target types and the resolution pass.
//!
//! A target is the unit of buildable output: an executable, a library, a
//! source set, a group, a copy step, or a custom script. Targets reference
//! each other by label; the builder owns them in an arena and links the
//! edges to indices. Once every direct dependency of a target has been
//! resolved, [`Target::on_resolved`] pulls the transitive information this
//! target needs: inherited libraries, library search paths, libraries, and
//! dependent configs.

use serde::{Deserialize, Serialize};

use crate::core::config::{ConfigId, ConfigValues};
use crate::core::label::{Label, LabelConfigPair, LabelTargetPair};
use crate::core::path::{SourceDir, SourceFile};
use crate::util::OrderedSet;

/// Arena index of a target owned by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub usize);

/// What kind of output a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    /// Not yet typed; only valid before generation completes
    Unknown,

    /// A named collection of dependencies with no output of its own
    Group,

    /// Executable binary
    #[serde(alias = "bin")]
    Executable,

    /// Shared/dynamic library (.so / .dylib / .dll)
    #[serde(alias = "dylib")]
    SharedLibrary,

    /// Static library (.a / .lib)
    #[serde(alias = "lib")]
    StaticLibrary,

    /// Compile-only aggregate; its objects are linked into dependents
    SourceSet,

    /// Copies files to the output directory
    CopyFiles,

    /// Runs a script to produce outputs
    Custom,
}

impl Default for OutputType {
    fn default() -> Self {
        OutputType::Unknown
    }
}

impl OutputType {
    /// The buildfile-facing name of this output type.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Unknown => "unknown",
            OutputType::Group => "group",
            OutputType::Executable => "executable",
            OutputType::SharedLibrary => "shared_library",
            OutputType::StaticLibrary => "static_library",
            OutputType::SourceSet => "source_set",
            OutputType::CopyFiles => "copy",
            OutputType::Custom => "custom",
        }
    }

    /// Whether this target kind may appear as a library input on a link
    /// line.
    pub fn is_linkable(&self) -> bool {
        matches!(self, OutputType::StaticLibrary | OutputType::SharedLibrary)
    }

    /// Whether this kind is compiled and linked by the binary rule writer.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            OutputType::Executable
                | OutputType::SharedLibrary
                | OutputType::StaticLibrary
                | OutputType::SourceSet
        )
    }
}

/// Settings for custom (script) targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptValues {
    /// The script to run
    pub script: SourceFile,
    /// Arguments passed to the script
    pub args: Vec<String>,
    /// Files the script produces; must be inside the build directory
    pub outputs: Vec<SourceFile>,
}

/// Read access to the item arenas during resolution and rule writing.
///
/// Implemented by the builder; the resolution pass and the rule writers are
/// written against this seam so they can be driven by a test fixture.
pub trait GraphAccess {
    /// The target at the given arena index.
    fn target(&self, id: TargetId) -> &Target;
    /// The settings of the config at the given arena index.
    fn config_values(&self, id: ConfigId) -> &ConfigValues;
}

/// A build target with its configuration and resolved state.
#[derive(Debug, Clone, Serialize)]
pub struct Target {
    /// Identity of this target
    pub label: Label,

    /// What kind of artifact to produce
    pub output_type: OutputType,

    /// Overrides the label name in the output file; empty means default
    pub output_name: String,

    /// Overrides the platform extension; empty means use the default
    pub output_extension: String,

    /// Files to compile
    pub sources: Vec<SourceFile>,

    /// Compile-time extra dependencies of every source
    pub source_prereqs: Vec<SourceFile>,

    /// Runtime data dependencies
    pub data: Vec<SourceFile>,

    /// Targets depending on this one should get an order dependency
    pub hard_dep: bool,

    /// Linked dependencies
    pub deps: Vec<LabelTargetPair>,

    /// Non-linked dependencies
    pub datadeps: Vec<LabelTargetPair>,

    /// Configs this target inherits settings from
    pub configs: Vec<LabelConfigPair>,

    /// Configs that every dependent (direct and indirect) of this target
    /// gets. These are not added to this target by the generator; resolution
    /// applies them.
    pub all_dependent_configs: Vec<LabelConfigPair>,

    /// Configs that targets depending directly on this one get
    pub direct_dependent_configs: Vec<LabelConfigPair>,

    /// Deps whose direct-dependent configs are re-exported as this target's
    pub forward_dependent_configs: Vec<LabelTargetPair>,

    /// Whether this target is externally maintained
    pub external: bool,

    /// Settings attached directly to this target
    pub config_values: ConfigValues,

    /// Settings for custom (script) targets
    pub script_values: ScriptValues,

    /// Fallback project file for generators that bridge to another system
    pub gyp_file: SourceFile,

    /// Static libraries and source sets from transitive deps. These need to
    /// be linked only into the end target (executable, shared library) and
    /// do not get pushed beyond shared-library boundaries. Filled by
    /// resolution.
    pub inherited_libraries: OrderedSet<TargetId>,

    /// Library search paths from this target's configs and statically
    /// linked deps. Filled by resolution.
    pub all_lib_dirs: OrderedSet<SourceDir>,

    /// Libraries from this target's configs and statically linked deps.
    /// Filled by resolution.
    pub all_libs: OrderedSet<String>,
}

impl Target {
    /// Create an untyped target with the given label.
    pub fn new(label: Label) -> Self {
        Target {
            label,
            output_type: OutputType::Unknown,
            output_name: String::new(),
            output_extension: String::new(),
            sources: Vec::new(),
            source_prereqs: Vec::new(),
            data: Vec::new(),
            hard_dep: false,
            deps: Vec::new(),
            datadeps: Vec::new(),
            configs: Vec::new(),
            all_dependent_configs: Vec::new(),
            direct_dependent_configs: Vec::new(),
            forward_dependent_configs: Vec::new(),
            external: false,
            config_values: ConfigValues::new(),
            script_values: ScriptValues::default(),
            gyp_file: SourceFile::default(),
            inherited_libraries: OrderedSet::new(),
            all_lib_dirs: OrderedSet::new(),
            all_libs: OrderedSet::new(),
        }
    }

    /// Create a target with a type, for tests and programmatic construction.
    pub fn with_type(label: Label, output_type: OutputType) -> Self {
        let mut target = Target::new(label);
        target.output_type = output_type;
        target
    }

    /// The name used for output files: the explicit `output_name` when set,
    /// otherwise the label name.
    pub fn effective_output_name(&self) -> &str {
        if self.output_name.is_empty() {
            &self.label.name
        } else {
            &self.output_name
        }
    }

    /// Whether this target may appear as a library input on a link line.
    pub fn is_linkable(&self) -> bool {
        self.output_type.is_linkable()
    }

    /// Pull dependent information once all direct deps are resolved.
    ///
    /// Preconditions: every edge of this target has been linked to an arena
    /// index, and every target reachable through `deps` has itself been
    /// resolved. The builder guarantees both by resolving in dependency
    /// order; cycles are its job to reject.
    pub fn on_resolved(&mut self, graph: &dyn GraphAccess) {
        tracing::debug!(target_label = %self.label, "resolving target");

        self.pull_dependent_configs(graph);
        self.pull_forwarded_configs(graph);
        self.pull_inherited_libraries(graph);
        self.pull_libs_and_lib_dirs(graph);
    }

    /// Apply dependent configs: this target's own dependent-config lists
    /// apply to itself, a dep's direct-dependent configs apply to this
    /// target, and a dep's all-dependent configs both apply here and
    /// propagate up through this target.
    fn pull_dependent_configs(&mut self, graph: &dyn GraphAccess) {
        let mut unique: std::collections::HashSet<ConfigId> = self
            .configs
            .iter()
            .filter_map(|pair| pair.config)
            .collect();

        let mut add_to_configs = |configs: &mut Vec<LabelConfigPair>, pair: &LabelConfigPair| {
            if let Some(id) = pair.config {
                if unique.insert(id) {
                    configs.push(pair.clone());
                }
            }
        };

        for pair in self.all_dependent_configs.iter().chain(&self.direct_dependent_configs) {
            add_to_configs(&mut self.configs, pair);
        }

        let mut pushed_up = Vec::new();
        for dep_pair in &self.deps {
            let Some(dep_id) = dep_pair.target else { continue };
            let dep = graph.target(dep_id);
            for pair in &dep.all_dependent_configs {
                add_to_configs(&mut self.configs, pair);
                pushed_up.push(pair.clone());
            }
            for pair in &dep.direct_dependent_configs {
                add_to_configs(&mut self.configs, pair);
            }
        }

        let mut pushed_unique: std::collections::HashSet<ConfigId> = self
            .all_dependent_configs
            .iter()
            .filter_map(|pair| pair.config)
            .collect();
        for pair in pushed_up {
            if let Some(id) = pair.config {
                if pushed_unique.insert(id) {
                    self.all_dependent_configs.push(pair);
                }
            }
        }
    }

    /// Re-export the direct-dependent configs of every dep named in
    /// `forward_dependent_configs` as this target's own.
    fn pull_forwarded_configs(&mut self, graph: &dyn GraphAccess) {
        let mut unique: std::collections::HashSet<ConfigId> = self
            .direct_dependent_configs
            .iter()
            .filter_map(|pair| pair.config)
            .collect();

        for fwd_pair in &self.forward_dependent_configs {
            let Some(fwd_id) = fwd_pair.target else { continue };
            for pair in &graph.target(fwd_id).direct_dependent_configs {
                if let Some(id) = pair.config {
                    if unique.insert(id) {
                        self.direct_dependent_configs.push(pair.clone());
                    }
                }
            }
        }
    }

    /// Collect the static linkables reachable through deps. Static
    /// libraries and source sets propagate themselves and everything they
    /// inherited; a shared library propagates itself and stops the walk.
    fn pull_inherited_libraries(&mut self, graph: &dyn GraphAccess) {
        for dep_pair in &self.deps {
            let Some(dep_id) = dep_pair.target else { continue };
            let dep = graph.target(dep_id);
            match dep.output_type {
                OutputType::StaticLibrary | OutputType::SourceSet => {
                    self.inherited_libraries.insert(dep_id);
                    self.inherited_libraries
                        .extend(dep.inherited_libraries.iter().copied());
                }
                OutputType::SharedLibrary => {
                    self.inherited_libraries.insert(dep_id);
                }
                _ => {}
            }
        }
    }

    /// Accumulate library search paths and libraries: first from this
    /// target's own settings and attached configs (in walk order), then from
    /// each inherited library.
    fn pull_libs_and_lib_dirs(&mut self, graph: &dyn GraphAccess) {
        let config_ids: Vec<Option<ConfigId>> = std::iter::once(None)
            .chain(self.configs.iter().map(|pair| pair.config))
            .collect();
        for id in config_ids {
            let values = match id {
                None => &self.config_values,
                Some(id) => graph.config_values(id),
            };
            self.all_lib_dirs.extend(values.lib_dirs.iter().cloned());
            self.all_libs.extend(values.libs.iter().cloned());
        }

        for lib_id in self.inherited_libraries.as_slice().to_vec() {
            let lib = graph.target(lib_id);
            self.all_lib_dirs.extend(lib.all_lib_dirs.iter().cloned());
            self.all_libs.extend(lib.all_libs.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;

    /// Minimal arena for resolution tests.
    struct TestGraph {
        targets: Vec<Target>,
        configs: Vec<Config>,
    }

    impl TestGraph {
        fn new() -> Self {
            TestGraph {
                targets: Vec::new(),
                configs: Vec::new(),
            }
        }

        fn add_target(&mut self, target: Target) -> TargetId {
            self.targets.push(target);
            TargetId(self.targets.len() - 1)
        }

        fn add_config(&mut self, config: Config) -> ConfigId {
            self.configs.push(config);
            ConfigId(self.configs.len() - 1)
        }

        fn resolve(&mut self, id: TargetId) {
            let mut target = self.targets[id.0].clone();
            target.on_resolved(&*self);
            self.targets[id.0] = target;
        }
    }

    impl GraphAccess for TestGraph {
        fn target(&self, id: TargetId) -> &Target {
            &self.targets[id.0]
        }

        fn config_values(&self, id: ConfigId) -> &ConfigValues {
            &self.configs[id.0].config_values
        }
    }

    fn label(dir: &str, name: &str) -> Label {
        Label::without_toolchain(SourceDir::new(dir), name)
    }

    fn dep_on(target: &mut Target, dep_label: Label, id: TargetId) {
        let mut pair = LabelTargetPair::new(dep_label);
        pair.target = Some(id);
        target.deps.push(pair);
    }

    #[test]
    fn test_static_chain_inherits_transitively() {
        let mut graph = TestGraph::new();

        let leaf = Target::with_type(label("//a/", "leaf"), OutputType::StaticLibrary);
        let leaf_id = graph.add_target(leaf);
        graph.resolve(leaf_id);

        let mut mid = Target::with_type(label("//b/", "mid"), OutputType::StaticLibrary);
        dep_on(&mut mid, label("//a/", "leaf"), leaf_id);
        let mid_id = graph.add_target(mid);
        graph.resolve(mid_id);

        let mut exe = Target::with_type(label("//c/", "exe"), OutputType::Executable);
        dep_on(&mut exe, label("//b/", "mid"), mid_id);
        let exe_id = graph.add_target(exe);
        graph.resolve(exe_id);

        let inherited: Vec<TargetId> = graph
            .target(exe_id)
            .inherited_libraries
            .iter()
            .copied()
            .collect();
        assert_eq!(inherited, vec![mid_id, leaf_id]);
    }

    #[test]
    fn test_shared_library_blocks_propagation() {
        let mut graph = TestGraph::new();

        let inner = Target::with_type(label("//a/", "inner"), OutputType::StaticLibrary);
        let inner_id = graph.add_target(inner);
        graph.resolve(inner_id);

        let mut shared = Target::with_type(label("//b/", "shared"), OutputType::SharedLibrary);
        dep_on(&mut shared, label("//a/", "inner"), inner_id);
        let shared_id = graph.add_target(shared);
        graph.resolve(shared_id);

        let mut exe = Target::with_type(label("//c/", "exe"), OutputType::Executable);
        dep_on(&mut exe, label("//b/", "shared"), shared_id);
        let exe_id = graph.add_target(exe);
        graph.resolve(exe_id);

        // The shared library itself is inherited, but its static innards
        // stay behind the boundary.
        let inherited: Vec<TargetId> = graph
            .target(exe_id)
            .inherited_libraries
            .iter()
            .copied()
            .collect();
        assert_eq!(inherited, vec![shared_id]);
    }

    #[test]
    fn test_group_contributes_nothing() {
        let mut graph = TestGraph::new();

        let group = Target::with_type(label("//g/", "group"), OutputType::Group);
        let group_id = graph.add_target(group);
        graph.resolve(group_id);

        let mut exe = Target::with_type(label("//c/", "exe"), OutputType::Executable);
        dep_on(&mut exe, label("//g/", "group"), group_id);
        let exe_id = graph.add_target(exe);
        graph.resolve(exe_id);

        assert!(graph.target(exe_id).inherited_libraries.is_empty());
    }

    #[test]
    fn test_libs_accumulate_in_order_with_dedup() {
        let mut graph = TestGraph::new();

        let mut leaf = Target::with_type(label("//a/", "leaf"), OutputType::StaticLibrary);
        leaf.config_values.libs.push("z".to_string());
        leaf.config_values.libs.push("common".to_string());
        leaf.config_values
            .lib_dirs
            .push(SourceDir::new("//third_party/lib/"));
        let leaf_id = graph.add_target(leaf);
        graph.resolve(leaf_id);

        let mut exe = Target::with_type(label("//c/", "exe"), OutputType::Executable);
        exe.config_values.libs.push("common".to_string());
        exe.config_values.libs.push("first".to_string());
        dep_on(&mut exe, label("//a/", "leaf"), leaf_id);
        let exe_id = graph.add_target(exe);
        graph.resolve(exe_id);

        let libs: Vec<&str> = graph
            .target(exe_id)
            .all_libs
            .iter()
            .map(|s| s.as_str())
            .collect();
        // Own libs first in insertion order, then the dep's, deduplicated.
        assert_eq!(libs, vec!["common", "first", "z"]);

        let dirs: Vec<&str> = graph
            .target(exe_id)
            .all_lib_dirs
            .iter()
            .map(|d| d.value())
            .collect();
        assert_eq!(dirs, vec!["//third_party/lib/"]);
    }

    #[test]
    fn test_config_libs_walked_in_attachment_order() {
        let mut graph = TestGraph::new();

        let mut config = Config::new(label("//cfg/", "uses_m"));
        config.config_values.libs.push("m".to_string());
        let config_id = graph.add_config(config);

        let mut exe = Target::with_type(label("//c/", "exe"), OutputType::Executable);
        exe.config_values.libs.push("own".to_string());
        let mut pair = LabelConfigPair::new(label("//cfg/", "uses_m"));
        pair.config = Some(config_id);
        exe.configs.push(pair);
        let exe_id = graph.add_target(exe);
        graph.resolve(exe_id);

        let libs: Vec<&str> = graph
            .target(exe_id)
            .all_libs
            .iter()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(libs, vec!["own", "m"]);
    }

    #[test]
    fn test_forward_dependent_configs() {
        let mut graph = TestGraph::new();

        let config_id = graph.add_config(Config::new(label("//cfg/", "exported")));

        let mut dep = Target::with_type(label("//a/", "dep"), OutputType::StaticLibrary);
        let mut exported = LabelConfigPair::new(label("//cfg/", "exported"));
        exported.config = Some(config_id);
        dep.direct_dependent_configs.push(exported);
        let dep_id = graph.add_target(dep);
        graph.resolve(dep_id);

        let mut mid = Target::with_type(label("//b/", "mid"), OutputType::StaticLibrary);
        dep_on(&mut mid, label("//a/", "dep"), dep_id);
        let mut fwd = LabelTargetPair::new(label("//a/", "dep"));
        fwd.target = Some(dep_id);
        mid.forward_dependent_configs.push(fwd);
        let mid_id = graph.add_target(mid);
        graph.resolve(mid_id);

        // The dep's direct-dependent config is now re-exported by mid.
        let reexported: Vec<ConfigId> = graph
            .target(mid_id)
            .direct_dependent_configs
            .iter()
            .filter_map(|pair| pair.config)
            .collect();
        assert_eq!(reexported, vec![config_id]);
    }

    #[test]
    fn test_dep_dependent_configs_apply_here() {
        let mut graph = TestGraph::new();

        let all_id = graph.add_config(Config::new(label("//cfg/", "for_everyone")));
        let direct_id = graph.add_config(Config::new(label("//cfg/", "for_direct")));

        let mut dep = Target::with_type(label("//a/", "dep"), OutputType::StaticLibrary);
        let mut all_pair = LabelConfigPair::new(label("//cfg/", "for_everyone"));
        all_pair.config = Some(all_id);
        dep.all_dependent_configs.push(all_pair);
        let mut direct_pair = LabelConfigPair::new(label("//cfg/", "for_direct"));
        direct_pair.config = Some(direct_id);
        dep.direct_dependent_configs.push(direct_pair);
        let dep_id = graph.add_target(dep);
        graph.resolve(dep_id);

        let mut mid = Target::with_type(label("//b/", "mid"), OutputType::StaticLibrary);
        dep_on(&mut mid, label("//a/", "dep"), dep_id);
        let mid_id = graph.add_target(mid);
        graph.resolve(mid_id);

        let mid_configs: Vec<ConfigId> = graph
            .target(mid_id)
            .configs
            .iter()
            .filter_map(|pair| pair.config)
            .collect();
        assert!(mid_configs.contains(&all_id));
        assert!(mid_configs.contains(&direct_id));

        // The all-dependent config travels onward; the direct one doesn't.
        let mut top = Target::with_type(label("//c/", "top"), OutputType::Executable);
        dep_on(&mut top, label("//b/", "mid"), mid_id);
        let top_id = graph.add_target(top);
        graph.resolve(top_id);

        let top_configs: Vec<ConfigId> = graph
            .target(top_id)
            .configs
            .iter()
            .filter_map(|pair| pair.config)
            .collect();
        assert!(top_configs.contains(&all_id));
        assert!(!top_configs.contains(&direct_id));
    }
}
