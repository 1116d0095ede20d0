//! Test fixtures.
//!
//! `TestWithScope` wires up the objects nearly every test needs: build
//! settings with a `//out/Debug/` build directory, a default-toolchain
//! settings view for a chosen target OS, a toolchain, and a sink that
//! records defined items for inspection.

use std::sync::{Arc, Mutex};

use crate::core::label::Label;
use crate::core::path::{OutputFile, SourceDir};
use crate::core::settings::{BuildSettings, Item, Settings, TargetOs};
use crate::core::toolchain::Toolchain;
use crate::frontend::scope::Scope;

/// A ready-made build setup for tests.
pub struct TestWithScope {
    settings: Settings,
    toolchain: Toolchain,
    items: Arc<Mutex<Vec<Item>>>,
}

impl TestWithScope {
    /// A Linux-targeting setup; most tests don't care which OS.
    pub fn new() -> Self {
        Self::with_target_os(TargetOs::Linux)
    }

    /// A setup targeting the given OS.
    pub fn with_target_os(target_os: TargetOs) -> Self {
        let items: Arc<Mutex<Vec<Item>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&items);

        let mut build_settings = BuildSettings::new();
        build_settings.set_build_dir(SourceDir::new("//out/Debug/"));
        build_settings.set_item_defined_callback(Arc::new(move |item: Item| {
            sink.lock().unwrap().push(item);
        }));

        let toolchain_label = Label::without_toolchain(SourceDir::new("//toolchain/"), "default");
        let settings = Settings::new(
            Arc::new(build_settings),
            toolchain_label.clone(),
            toolchain_label.clone(),
            target_os,
            OutputFile::default(),
        );
        let toolchain = Toolchain::new(toolchain_label);

        TestWithScope {
            settings,
            toolchain,
            items,
        }
    }

    /// The settings view.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The toolchain.
    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// A fresh scope for a buildfile in the given directory.
    pub fn scope(&self, source_dir: SourceDir) -> Scope<'_> {
        Scope::new(&self.settings, source_dir)
    }

    /// Everything the sink received so far, clearing it.
    pub fn drain_items(&self) -> Vec<Item> {
        std::mem::take(&mut *self.items.lock().unwrap())
    }
}

impl Default for TestWithScope {
    fn default() -> Self {
        TestWithScope::new()
    }
}
