use crate::LaunchTable;
use std::path::Path;
use tokio::process::Command;

/// Capability to execute a program file as a standalone program
///
/// Implementations only decide *what* is started. Standard streams and
/// resource limits are attached by the `ExecutionContext` that owns the
/// execution window.
pub trait Runner {
    /// Build the command that starts `program`
    fn command(&self, program: &Path) -> Command;
}

/// Runs programs as child processes, choosing an interpreter by extension
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    launch: LaunchTable,
}

impl ProcessRunner {
    pub fn new(launch: LaunchTable) -> Self {
        Self { launch }
    }

    pub fn launch_table(&self) -> &LaunchTable {
        &self.launch
    }
}

impl Runner for ProcessRunner {
    fn command(&self, program: &Path) -> Command {
        self.launch.command(program)
    }
}
