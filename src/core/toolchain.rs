//! Toolchain definitions: the tools a rule file refers to.
//!
//! A toolchain names one tool per role (compiling C, linking, stamping, and
//! so on). The rule writer only needs the rule-name tokens and the library
//! prefixes; the tool command lines themselves are declared in the
//! toolchain's buildfile and consumed by the downstream executor.

use std::collections::HashMap;

use crate::core::label::Label;

/// The role a tool plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolType {
    /// C compiler
    Cc,
    /// C++ compiler
    Cxx,
    /// Objective-C compiler
    ObjC,
    /// Objective-C++ compiler
    ObjCxx,
    /// Windows resource compiler
    Rc,
    /// Static-library archiver
    Alink,
    /// Shared-library linker
    Solink,
    /// Executable linker
    Link,
    /// Stamp-file writer
    Stamp,
    /// File copier
    Copy,
}

impl ToolType {
    /// The rule-name token written into rule files.
    pub fn name(&self) -> &'static str {
        match self {
            ToolType::Cc => "cc",
            ToolType::Cxx => "cxx",
            ToolType::ObjC => "objc",
            ToolType::ObjCxx => "objcxx",
            ToolType::Rc => "rc",
            ToolType::Alink => "alink",
            ToolType::Solink => "solink",
            ToolType::Link => "link",
            ToolType::Stamp => "stamp",
            ToolType::Copy => "copy",
        }
    }
}

/// One tool in a toolchain.
#[derive(Debug, Clone, Default)]
pub struct Tool {
    /// The command line template, consumed by the downstream executor
    pub command: String,
    /// Prefix for each library on the link line (e.g. `-l`)
    pub lib_prefix: String,
    /// Prefix for each library search path on the link line (e.g. `-L`)
    pub lib_dir_prefix: String,
}

impl Tool {
    /// Create an empty tool.
    pub fn new() -> Self {
        Tool::default()
    }
}

/// A toolchain: a label plus one tool per role.
#[derive(Debug, Clone)]
pub struct Toolchain {
    label: Label,
    tools: HashMap<ToolType, Tool>,
}

impl Toolchain {
    /// Create a toolchain with no tools defined.
    pub fn new(label: Label) -> Self {
        Toolchain {
            label,
            tools: HashMap::new(),
        }
    }

    /// The label identifying this toolchain.
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Define or replace a tool.
    pub fn set_tool(&mut self, tool_type: ToolType, tool: Tool) {
        self.tools.insert(tool_type, tool);
    }

    /// The tool for a role. Roles with no definition get an empty tool,
    /// matching a toolchain buildfile that leaves them out.
    pub fn tool(&self, tool_type: ToolType) -> Tool {
        self.tools.get(&tool_type).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::SourceDir;

    #[test]
    fn test_tool_lookup_defaults_to_empty() {
        let toolchain = Toolchain::new(Label::without_toolchain(
            SourceDir::new("//tc/"),
            "default",
        ));
        let tool = toolchain.tool(ToolType::Solink);
        assert!(tool.lib_prefix.is_empty());
        assert!(tool.lib_dir_prefix.is_empty());
    }

    #[test]
    fn test_set_and_get_tool() {
        let mut toolchain = Toolchain::new(Label::without_toolchain(
            SourceDir::new("//tc/"),
            "default",
        ));
        let mut tool = Tool::new();
        tool.lib_prefix = "-l".to_string();
        tool.lib_dir_prefix = "-L".to_string();
        toolchain.set_tool(ToolType::Link, tool);

        assert_eq!(toolchain.tool(ToolType::Link).lib_prefix, "-l");
        assert_eq!(toolchain.tool(ToolType::Link).lib_dir_prefix, "-L");
    }

    #[test]
    fn test_tool_type_names() {
        assert_eq!(ToolType::Cxx.name(), "cxx");
        assert_eq!(ToolType::Solink.name(), "solink");
        assert_eq!(ToolType::Stamp.name(), "stamp");
    }
}
