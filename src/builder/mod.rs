//! The builder: single owner of every defined item.
//!
//! Generators run on worker threads and hand finished items to the
//! build-settings sink; the sink endpoint here only enqueues, so it is safe
//! to call from any thread. The builder later drains the queue into its
//! arenas on its own thread, links every label edge to an arena index,
//! orders the dependency graph, rejects cycles, and runs the resolution
//! pass over each target with its dependencies resolved first.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use thiserror::Error;

use crate::core::config::{Config, ConfigId, ConfigValues};
use crate::core::label::{Label, LabelConfigPair, LabelTargetPair};
use crate::core::settings::{Item, ItemDefinedCallback};
use crate::core::target::{GraphAccess, Target, TargetId};

/// Errors from assembling or resolving the item graph.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Two items were defined with the same label.
    #[error("duplicate definition of `{label}`")]
    DuplicateDefinition { label: String },

    /// A target references a label nothing defines.
    #[error("`{from}` depends on `{to}` which was never defined")]
    UnresolvedDependency { from: String, to: String },

    /// A target references a config label nothing defines.
    #[error("`{from}` uses config `{to}` which was never defined")]
    UnresolvedConfig { from: String, to: String },

    /// The dependency graph has a cycle.
    #[error("cycle detected in the dependency graph: {}", labels.join(" -> "))]
    CycleDetected { labels: Vec<String> },
}

/// Owns all targets and configs and drives resolution.
pub struct Builder {
    targets: Vec<Target>,
    configs: Vec<Config>,
    target_index: HashMap<Label, TargetId>,
    config_index: HashMap<Label, ConfigId>,
    queue: Arc<Mutex<VecDeque<Item>>>,
}

impl Builder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Builder {
            targets: Vec::new(),
            configs: Vec::new(),
            target_index: HashMap::new(),
            config_index: HashMap::new(),
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// The callback to install as the build-settings item sink.
    ///
    /// The callback only enqueues and returns, so generators on worker
    /// threads never block on builder state.
    pub fn item_sink(&self) -> ItemDefinedCallback {
        let queue = Arc::clone(&self.queue);
        Arc::new(move |item: Item| {
            queue.lock().unwrap().push_back(item);
        })
    }

    /// Move queued items into the arenas. Returns how many were taken.
    pub fn drain(&mut self) -> Result<usize, BuildError> {
        let items: Vec<Item> = {
            let mut queue = self.queue.lock().unwrap();
            queue.drain(..).collect()
        };

        let count = items.len();
        for item in items {
            match item {
                Item::Target(target) => {
                    self.add_target(target)?;
                }
                Item::Config(config) => {
                    self.add_config(config)?;
                }
            }
        }
        Ok(count)
    }

    /// Add a target directly, bypassing the sink.
    pub fn add_target(&mut self, target: Target) -> Result<TargetId, BuildError> {
        if self.target_index.contains_key(&target.label) {
            return Err(BuildError::DuplicateDefinition {
                label: target.label.to_string(),
            });
        }
        let id = TargetId(self.targets.len());
        self.target_index.insert(target.label.clone(), id);
        self.targets.push(target);
        Ok(id)
    }

    /// Add a config directly, bypassing the sink.
    pub fn add_config(&mut self, config: Config) -> Result<ConfigId, BuildError> {
        if self.config_index.contains_key(&config.label) {
            return Err(BuildError::DuplicateDefinition {
                label: config.label.to_string(),
            });
        }
        let id = ConfigId(self.configs.len());
        self.config_index.insert(config.label.clone(), id);
        self.configs.push(config);
        Ok(id)
    }

    /// Look up a target by label.
    pub fn target_by_label(&self, label: &Label) -> Option<TargetId> {
        self.target_index.get(label).copied()
    }

    /// All targets in definition order.
    pub fn targets(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, target)| (TargetId(i), target))
    }

    /// Link every label edge of every target to its arena index, order the
    /// graph, and resolve each target after its dependencies.
    ///
    /// Returns the resolution order. Unresolved labels and dependency
    /// cycles are errors; resolution itself cannot fail.
    pub fn resolve_all(&mut self) -> Result<Vec<TargetId>, BuildError> {
        self.link_edges()?;

        // Dependency edges point dep -> dependent so a topological sort
        // yields dependencies first.
        let mut graph: DiGraph<TargetId, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..self.targets.len())
            .map(|i| graph.add_node(TargetId(i)))
            .collect();
        for (i, target) in self.targets.iter().enumerate() {
            for dep_pair in &target.deps {
                if let Some(dep_id) = dep_pair.target {
                    graph.add_edge(nodes[dep_id.0], nodes[i], ());
                }
            }
        }

        let order = match toposort(&graph, None) {
            Ok(order) => order,
            Err(cycle) => {
                // Name the members of the strongly connected component the
                // offending node belongs to.
                let labels = tarjan_scc(&graph)
                    .into_iter()
                    .find(|scc| scc.len() > 1 || scc.contains(&cycle.node_id()))
                    .map(|scc| {
                        scc.iter()
                            .map(|&node| self.targets[graph[node].0].label.to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                return Err(BuildError::CycleDetected { labels });
            }
        };

        let mut resolved_order = Vec::with_capacity(order.len());
        for node in order {
            let id = graph[node];

            // Take the target out of the arena so the resolution pass can
            // read its (already resolved) dependencies through us.
            let placeholder = Target::new(Label::default());
            let mut target = std::mem::replace(&mut self.targets[id.0], placeholder);
            target.on_resolved(&*self);
            self.targets[id.0] = target;

            resolved_order.push(id);
        }

        tracing::debug!(targets = resolved_order.len(), "resolved target graph");
        Ok(resolved_order)
    }

    fn link_edges(&mut self) -> Result<(), BuildError> {
        // Work against snapshots of the index maps so targets can be
        // mutated while looking up labels.
        let target_index = self.target_index.clone();
        let config_index = self.config_index.clone();

        for target in &mut self.targets {
            let from = target.label.to_string();

            let link_targets = |pairs: &mut Vec<LabelTargetPair>| -> Result<(), BuildError> {
                for pair in pairs {
                    match target_index.get(&pair.label) {
                        Some(&id) => pair.target = Some(id),
                        None => {
                            return Err(BuildError::UnresolvedDependency {
                                from: from.clone(),
                                to: pair.label.to_string(),
                            })
                        }
                    }
                }
                Ok(())
            };
            link_targets(&mut target.deps)?;
            link_targets(&mut target.datadeps)?;
            link_targets(&mut target.forward_dependent_configs)?;

            let link_configs = |pairs: &mut Vec<LabelConfigPair>| -> Result<(), BuildError> {
                for pair in pairs {
                    match config_index.get(&pair.label) {
                        Some(&id) => pair.config = Some(id),
                        None => {
                            return Err(BuildError::UnresolvedConfig {
                                from: from.clone(),
                                to: pair.label.to_string(),
                            })
                        }
                    }
                }
                Ok(())
            };
            link_configs(&mut target.configs)?;
            link_configs(&mut target.all_dependent_configs)?;
            link_configs(&mut target.direct_dependent_configs)?;
        }
        Ok(())
    }

    /// Serialize every target to a machine-readable description file.
    pub fn emit_target_descriptions(&self, path: &Path) -> anyhow::Result<()> {
        let descriptions: Vec<TargetDescription> = self
            .targets
            .iter()
            .map(TargetDescription::from_target)
            .collect();

        let json = serde_json::to_string_pretty(&descriptions)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write target descriptions: {}", path.display()))?;
        Ok(())
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl GraphAccess for Builder {
    fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }

    fn config_values(&self, id: ConfigId) -> &ConfigValues {
        &self.configs[id.0].config_values
    }
}

/// Machine-readable summary of one target, for IDE and tooling integration.
#[derive(Debug, Serialize)]
struct TargetDescription {
    label: String,
    #[serde(rename = "type")]
    output_type: &'static str,
    sources: Vec<String>,
    deps: Vec<String>,
    all_libs: Vec<String>,
    all_lib_dirs: Vec<String>,
}

impl TargetDescription {
    fn from_target(target: &Target) -> Self {
        TargetDescription {
            label: target.label.user_visible_name(true),
            output_type: target.output_type.as_str(),
            sources: target.sources.iter().map(|s| s.value().to_string()).collect(),
            deps: target.deps.iter().map(|d| d.label.to_string()).collect(),
            all_libs: target.all_libs.iter().cloned().collect(),
            all_lib_dirs: target
                .all_lib_dirs
                .iter()
                .map(|d| d.value().to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::SourceDir;
    use crate::core::target::OutputType;

    fn label(dir: &str, name: &str) -> Label {
        Label::without_toolchain(SourceDir::new(dir), name)
    }

    fn target_with_deps(dir: &str, name: &str, deps: &[Label]) -> Target {
        let mut target = Target::with_type(label(dir, name), OutputType::StaticLibrary);
        for dep in deps {
            target.deps.push(LabelTargetPair::new(dep.clone()));
        }
        target
    }

    #[test]
    fn test_resolve_orders_deps_first() {
        let mut builder = Builder::new();
        let leaf = builder
            .add_target(target_with_deps("//a/", "leaf", &[]))
            .unwrap();
        let top = builder
            .add_target(target_with_deps("//b/", "top", &[label("//a/", "leaf")]))
            .unwrap();

        let order = builder.resolve_all().unwrap();
        let leaf_pos = order.iter().position(|&id| id == leaf).unwrap();
        let top_pos = order.iter().position(|&id| id == top).unwrap();
        assert!(leaf_pos < top_pos);

        // The edge got linked and the resolution ran.
        assert_eq!(builder.target(top).deps[0].target, Some(leaf));
        assert!(builder.target(top).inherited_libraries.contains(&leaf));
    }

    #[test]
    fn test_unresolved_dependency() {
        let mut builder = Builder::new();
        builder
            .add_target(target_with_deps("//b/", "top", &[label("//a/", "ghost")]))
            .unwrap();

        let err = builder.resolve_all().unwrap_err();
        match err {
            BuildError::UnresolvedDependency { from, to } => {
                assert_eq!(from, "//b:top");
                assert_eq!(to, "//a:ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_detected() {
        let mut builder = Builder::new();
        builder
            .add_target(target_with_deps("//a/", "x", &[label("//b/", "y")]))
            .unwrap();
        builder
            .add_target(target_with_deps("//b/", "y", &[label("//a/", "x")]))
            .unwrap();

        let err = builder.resolve_all().unwrap_err();
        match err {
            BuildError::CycleDetected { labels } => {
                assert_eq!(labels.len(), 2);
                assert!(labels.contains(&"//a:x".to_string()));
                assert!(labels.contains(&"//b:y".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_definition() {
        let mut builder = Builder::new();
        builder
            .add_target(target_with_deps("//a/", "x", &[]))
            .unwrap();
        let err = builder
            .add_target(target_with_deps("//a/", "x", &[]))
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateDefinition { .. }));
    }

    #[test]
    fn test_sink_delivers_from_worker_thread() {
        let mut builder = Builder::new();
        let sink = builder.item_sink();

        let handle = std::thread::spawn(move || {
            let target = Target::with_type(label("//w/", "from_worker"), OutputType::Group);
            (*sink)(Item::Target(target));
        });
        handle.join().unwrap();

        assert_eq!(builder.drain().unwrap(), 1);
        assert!(builder
            .target_by_label(&label("//w/", "from_worker"))
            .is_some());
    }

    #[test]
    fn test_emit_target_descriptions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.json");

        let mut builder = Builder::new();
        let mut target = target_with_deps("//a/", "lib", &[]);
        target.config_values.libs.push("z".to_string());
        builder.add_target(target).unwrap();
        builder.resolve_all().unwrap();

        builder.emit_target_descriptions(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["label"], "//a:lib");
        assert_eq!(parsed[0]["type"], "static_library");
        assert_eq!(parsed[0]["all_libs"][0], "z");
    }
}
