//! Rule emission for binary targets.
//!
//! One writer instance emits everything for one resolved target: the
//! compiler-variable block, one build line per compilable source, and then
//! either the link block (executables and libraries) or a stamp rule
//! (source sets). The writer is total: malformed state is caught before it
//! gets here, and a target kind with no link tool simply contributes its
//! compile rules only.

use crate::core::config::ConfigValues;
use crate::core::path::OutputFile;
use crate::core::settings::Settings;
use crate::core::target::{GraphAccess, OutputType, Target, TargetId};
use crate::core::toolchain::{Tool, Toolchain};
use crate::ninja::escape::{escape_string_to, EscapeOptions, EscapingMode};
use crate::ninja::helper;
use crate::ninja::path_output::{DirSlashEnding, PathOutput};
use crate::util::filesystem::{find_filename, get_source_file_type, SourceFileType};
use crate::util::OrderedSet;

/// Escape options for writing compiler and linker flags.
///
/// Some flag strings are actually multiple flags that expect to be just
/// added to the command line; quoting is assumed to be done by the
/// buildfiles if they want such things quoted.
fn flag_options() -> EscapeOptions {
    EscapeOptions {
        mode: EscapingMode::Ninja,
        inhibit_quoting: true,
    }
}

/// Writes the rules for one binary target.
pub struct NinjaBinaryTargetWriter<'a> {
    target: &'a Target,
    graph: &'a dyn GraphAccess,
    toolchain: &'a Toolchain,
    settings: &'a Settings,
    path_output: PathOutput,
    out: &'a mut String,
}

impl<'a> NinjaBinaryTargetWriter<'a> {
    /// Create a writer for a resolved target.
    pub fn new(
        target: &'a Target,
        graph: &'a dyn GraphAccess,
        toolchain: &'a Toolchain,
        settings: &'a Settings,
        out: &'a mut String,
    ) -> Self {
        let path_output = PathOutput::new(
            settings.build_settings().build_dir().clone(),
            EscapingMode::Ninja,
            true,
        );
        NinjaBinaryTargetWriter {
            target,
            graph,
            toolchain,
            settings,
            path_output,
            out,
        }
    }

    /// Emit everything for this target.
    pub fn run(&mut self) {
        self.write_compiler_vars();

        let object_files = self.write_sources();

        if self.target.output_type == OutputType::SourceSet {
            self.write_source_set_stamp(&object_files);
        } else {
            self.write_linker_stuff(&object_files);
        }
    }

    /// The target's own settings followed by each attached config's, in
    /// attachment order.
    fn config_values_list(&self) -> Vec<&'a ConfigValues> {
        std::iter::once(&self.target.config_values)
            .chain(
                self.target
                    .configs
                    .iter()
                    .filter_map(|pair| pair.config.map(|id| self.graph.config_values(id))),
            )
            .collect()
    }

    fn write_compiler_vars(&mut self) {
        let values_list = self.config_values_list();

        // Defines.
        self.out.push_str("defines =");
        let define_options = EscapeOptions::new(EscapingMode::Shell);
        for values in &values_list {
            for define in &values.defines {
                self.out.push_str(" -D");
                escape_string_to(self.out, define, &define_options);
            }
        }
        self.out.push('\n');

        // Include directories. The quotes are ours, so the path itself is
        // written with quoting inhibited.
        self.out.push_str("includes =");
        for values in &values_list {
            for dir in &values.include_dirs {
                self.out.push_str(" \"-I");
                self.path_output
                    .write_dir(self.out, dir, DirSlashEnding::NoLastSlash);
                self.out.push('"');
            }
        }
        self.out.push('\n');

        // C flags and friends.
        let options = flag_options();
        let families: [(&str, fn(&ConfigValues) -> &Vec<String>); 5] = [
            ("cflags", |v| &v.cflags),
            ("cflags_c", |v| &v.cflags_c),
            ("cflags_cc", |v| &v.cflags_cc),
            ("cflags_objc", |v| &v.cflags_objc),
            ("cflags_objcc", |v| &v.cflags_objcc),
        ];
        for (name, accessor) in families {
            self.out.push_str(name);
            self.out.push_str(" =");
            for values in &values_list {
                for flag in accessor(values) {
                    self.out.push(' ');
                    escape_string_to(self.out, flag, &options);
                }
            }
            self.out.push('\n');
        }

        self.out.push('\n');
    }

    /// Emit one build line per compilable source; returns the object files
    /// in source order.
    fn write_sources(&mut self) -> Vec<OutputFile> {
        let mut object_files = Vec::with_capacity(self.target.sources.len());

        let implicit_deps = self.sources_implicit_deps();

        for source in &self.target.sources {
            let file_type = get_source_file_type(source, self.settings.target_os());
            if file_type == SourceFileType::Unknown {
                continue; // Skip unknown file types.
            }
            let Some(rule) = helper::rule_for_source_type(self.settings, file_type) else {
                continue; // Skip files not needing compilation.
            };

            let output_file =
                helper::output_file_for_source(self.settings, self.target, source, file_type);

            self.out.push_str("build ");
            self.path_output.write_output_file(self.out, &output_file);
            self.out.push_str(": ");
            self.out.push_str(&rule);
            self.out.push(' ');
            self.path_output.write_source_file(self.out, source);
            self.out.push_str(&implicit_deps);
            self.out.push('\n');

            object_files.push(output_file);
        }
        self.out.push('\n');

        object_files
    }

    /// The ` | prereq...` tail appended to every compile line, from the
    /// target's source prereqs. Empty when there are none.
    fn sources_implicit_deps(&self) -> String {
        if self.target.source_prereqs.is_empty() {
            return String::new();
        }
        let mut ret = String::from(" |");
        for prereq in &self.target.source_prereqs {
            ret.push(' ');
            self.path_output.write_source_file(&mut ret, prereq);
        }
        ret
    }

    fn write_linker_stuff(&mut self, object_files: &[OutputFile]) {
        // Kinds without a link tool contribute only their compile rules.
        let Some(tool_type) = helper::tool_type_for_target(self.target) else {
            return;
        };

        // Manifest file on Windows.
        let mut windows_manifest = OutputFile::default();
        if self.settings.is_win() {
            let value = windows_manifest.value_mut();
            value.push_str(&helper::target_output_dir(self.settings, self.target));
            value.push_str(&self.target.label.name);
            value.push_str(".intermediate.manifest");

            self.out.push_str("manifests = ");
            self.path_output.write_output_file(self.out, &windows_manifest);
            self.out.push('\n');
        }

        let tool = self.toolchain.tool(tool_type);
        self.write_linker_flags(&tool, &windows_manifest);
        self.write_libs(&tool);

        // The external output file is the one that other libs depend on.
        let external_output_file = helper::target_output_file(self.settings, self.target);

        // The internal output file is the "main thing" we think we're
        // making. For a shared library on Windows this is the .dll while
        // the external output is the import library; everywhere else the
        // two are the same.
        let internal_output_file = if self.target.output_type == OutputType::SharedLibrary
            && self.settings.is_win()
        {
            OutputFile::new(format!(
                "{}{}.dll",
                self.settings.toolchain_output_subdir().value(),
                self.target.label.name
            ))
        } else {
            external_output_file.clone()
        };

        self.write_link_command(
            tool_type,
            &external_output_file,
            &internal_output_file,
            object_files,
        );

        if self.target.output_type == OutputType::SharedLibrary {
            // The shared object name doesn't include a path.
            self.out.push_str("  soname = ");
            self.out.push_str(find_filename(internal_output_file.value()));
            self.out.push('\n');

            self.out.push_str("  lib = ");
            self.path_output.write_output_file(self.out, &internal_output_file);
            self.out.push('\n');

            if self.settings.is_win() {
                self.out.push_str("  dll = ");
                self.path_output.write_output_file(self.out, &internal_output_file);
                self.out.push('\n');

                self.out.push_str("  implibflag = /IMPLIB:");
                self.path_output.write_output_file(self.out, &external_output_file);
                self.out.push('\n');
            }
        }

        self.out.push('\n');
    }

    fn write_linker_flags(&mut self, tool: &Tool, windows_manifest: &OutputFile) {
        self.out.push_str("ldflags =");

        // First the ldflags from the target and its configs.
        let options = flag_options();
        for values in self.config_values_list() {
            for flag in &values.ldflags {
                self.out.push(' ');
                escape_string_to(self.out, flag, &options);
            }
        }

        // Followed by library search paths that have been recursively
        // pushed through the dependency tree. These reach the linker's
        // command line, so they get shell escaping on top.
        if !self.target.all_lib_dirs.is_empty() {
            let lib_path_output = PathOutput::new(
                self.path_output.current_dir().clone(),
                EscapingMode::NinjaShell,
                false,
            );
            for dir in &self.target.all_lib_dirs {
                self.out.push(' ');
                self.out.push_str(&tool.lib_dir_prefix);
                lib_path_output.write_dir(self.out, dir, DirSlashEnding::NoLastSlash);
            }
        }

        // Append the manifest flag on Windows to reference our file.
        if self.settings.is_win() {
            self.out.push_str(" /MANIFEST /ManifestFile:");
            self.path_output.write_output_file(self.out, windows_manifest);
        }
        self.out.push('\n');
    }

    fn write_libs(&mut self, tool: &Tool) {
        self.out.push_str("libs =");

        // Libraries that have been recursively pushed through the
        // dependency tree.
        let lib_options = EscapeOptions::new(EscapingMode::NinjaShell);
        const FRAMEWORK_ENDING: &str = ".framework";
        for lib in &self.target.all_libs {
            if self.settings.is_mac() && lib.ends_with(FRAMEWORK_ENDING) {
                // Libraries ending in ".framework" on Mac get the
                // -framework switch with the extension stripped.
                self.out.push_str(" -framework ");
                escape_string_to(
                    self.out,
                    &lib[..lib.len() - FRAMEWORK_ENDING.len()],
                    &lib_options,
                );
            } else {
                self.out.push(' ');
                self.out.push_str(&tool.lib_prefix);
                escape_string_to(self.out, lib, &lib_options);
            }
        }
        self.out.push('\n');
    }

    fn write_link_command(
        &mut self,
        tool_type: crate::core::toolchain::ToolType,
        external_output_file: &OutputFile,
        internal_output_file: &OutputFile,
        object_files: &[OutputFile],
    ) {
        self.out.push_str("build ");
        self.path_output.write_output_file(self.out, internal_output_file);
        if external_output_file != internal_output_file {
            self.out.push(' ');
            self.path_output.write_output_file(self.out, external_output_file);
        }
        self.out.push_str(": ");
        self.out.push_str(&helper::rule_prefix(self.settings));
        self.out.push_str(tool_type.name());

        let (extra_object_files, linkable_deps, non_linkable_deps) = self.get_deps();

        // Object files.
        for object in object_files {
            self.out.push(' ');
            self.path_output.write_output_file(self.out, object);
        }
        for object in &extra_object_files {
            self.out.push(' ');
            self.path_output.write_output_file(self.out, object);
        }

        // Libs.
        for &dep_id in &linkable_deps {
            self.out.push(' ');
            let output = helper::target_output_file(self.settings, self.graph.target(dep_id));
            self.path_output.write_output_file(self.out, &output);
        }

        self.write_implicit_dependencies(&non_linkable_deps);

        self.out.push('\n');
    }

    fn write_source_set_stamp(&mut self, object_files: &[OutputFile]) {
        // The stamp rule for source sets is generally not used, since
        // targets that depend on this will reference the object files
        // directly. However, writing this rule allows the user to type the
        // name of the target and get a build, which can be convenient for
        // development.
        self.out.push_str("build ");
        let stamp = helper::target_output_file(self.settings, self.target);
        self.path_output.write_output_file(self.out, &stamp);
        self.out.push_str(": ");
        self.out.push_str(&helper::rule_prefix(self.settings));
        self.out.push_str("stamp");

        let (extra_object_files, _linkable_deps, non_linkable_deps) = self.get_deps();

        // The classifier never puts extra object files in a source set:
        // any source sets we depend on appear in our non-linkable deps
        // instead.
        debug_assert!(extra_object_files.is_empty());

        for object in object_files {
            self.out.push(' ');
            self.path_output.write_output_file(self.out, object);
        }

        self.write_implicit_dependencies(&non_linkable_deps);

        self.out.push('\n');
    }

    /// Classify everything this target's link line has to mention:
    /// expanded source-set objects, linkable deps, and order-only deps.
    /// Order follows `deps`, then `inherited_libraries`, then `datadeps`.
    fn get_deps(&self) -> (OrderedSet<OutputFile>, Vec<TargetId>, Vec<TargetId>) {
        let mut extra_object_files = OrderedSet::new();
        let mut linkable_deps = Vec::new();
        let mut non_linkable_deps = Vec::new();

        // Normal deps.
        for dep_pair in &self.target.deps {
            let Some(dep_id) = dep_pair.target else { continue };
            if self.target.inherited_libraries.contains(&dep_id) {
                continue; // Don't add dupes.
            }
            self.classify_dependency(
                dep_id,
                &mut extra_object_files,
                &mut linkable_deps,
                &mut non_linkable_deps,
            );
        }

        // Inherited libraries.
        for &dep_id in &self.target.inherited_libraries {
            self.classify_dependency(
                dep_id,
                &mut extra_object_files,
                &mut linkable_deps,
                &mut non_linkable_deps,
            );
        }

        // Data deps are always non-linkable.
        for dep_pair in &self.target.datadeps {
            if let Some(dep_id) = dep_pair.target {
                non_linkable_deps.push(dep_id);
            }
        }

        (extra_object_files, linkable_deps, non_linkable_deps)
    }

    fn classify_dependency(
        &self,
        dep_id: TargetId,
        extra_object_files: &mut OrderedSet<OutputFile>,
        linkable_deps: &mut Vec<TargetId>,
        non_linkable_deps: &mut Vec<TargetId>,
    ) {
        let dep = self.graph.target(dep_id);

        // Only executables and shared libraries link libraries. Child deps
        // of static libraries get pushed up the dependency tree until one
        // of these is reached, and source sets don't link at all.
        let can_link_libs = matches!(
            self.target.output_type,
            OutputType::Executable | OutputType::SharedLibrary
        );

        if dep.output_type == OutputType::SourceSet {
            if self.target.output_type == OutputType::SourceSet {
                // A source set depending on another source set gets an
                // order dependency, so building this target also compiles
                // the other one even though nothing uses its files here.
                non_linkable_deps.push(dep_id);
            } else {
                // Linking in a source set: take its object files. The
                // source set is the prefix for the object names, not this
                // target.
                for source in &dep.sources {
                    let file_type = get_source_file_type(source, self.settings.target_os());
                    if file_type != SourceFileType::Unknown && file_type != SourceFileType::Header
                    {
                        extra_object_files.insert(helper::output_file_for_source(
                            self.settings,
                            dep,
                            source,
                            file_type,
                        ));
                    }
                }
            }
        } else if can_link_libs && dep.is_linkable() {
            linkable_deps.push(dep_id);
        } else {
            non_linkable_deps.push(dep_id);
        }
    }

    /// Append the ` || ` order-only tail: every non-linkable dep's output
    /// file, then the target's data files.
    fn write_implicit_dependencies(&mut self, non_linkable_deps: &[TargetId]) {
        if non_linkable_deps.is_empty() && self.target.data.is_empty() {
            return;
        }
        self.out.push_str(" ||");

        // Non-linkable targets.
        for &dep_id in non_linkable_deps {
            self.out.push(' ');
            let output = helper::target_output_file(self.settings, self.graph.target(dep_id));
            self.path_output.write_output_file(self.out, &output);
        }

        // Data files.
        for data in &self.target.data {
            self.out.push(' ');
            self.path_output.write_source_file(self.out, data);
        }
    }
}
