//! Host-tool detection.
//!
//! Backend selection depends on which ISO-authoring tools are installed on the
//! host. The lookup is behind the [`ToolLookup`] trait so the decision is an
//! explicit dependency of the build step rather than an ambient `PATH` query:
//! production code passes [`HostTools`], tests pass a [`FixedTools`] set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolves an external tool name to an executable path, if present.
pub trait ToolLookup {
    /// Locate `tool`, returning the path to its executable.
    fn find(&self, tool: &str) -> Option<PathBuf>;

    /// Check whether `tool` is present at all.
    fn is_available(&self, tool: &str) -> bool {
        self.find(tool).is_some()
    }
}

/// Tool lookup against the host's executable search path.
pub struct HostTools;

impl ToolLookup for HostTools {
    fn find(&self, tool: &str) -> Option<PathBuf> {
        which::which(tool).ok()
    }
}

/// A fixed set of tools, independent of the host.
///
/// Useful in tests and in orchestrators that resolve tool paths themselves
/// (e.g. from a hermetic toolchain directory).
#[derive(Debug, Default)]
pub struct FixedTools {
    tools: HashMap<String, PathBuf>,
}

impl FixedTools {
    /// Create an empty set (no tool is ever found).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tool` as available at `path`.
    pub fn with(mut self, tool: &str, path: impl AsRef<Path>) -> Self {
        self.tools.insert(tool.to_string(), path.as_ref().to_path_buf());
        self
    }
}

impl ToolLookup for FixedTools {
    fn find(&self, tool: &str) -> Option<PathBuf> {
        self.tools.get(tool).cloned()
    }
}
