use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// How a program file is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// Execute the file itself (compiled binary or script with a shebang)
    Direct,
    /// Hand the file to an interpreter
    Interpreter { command: String, args: Vec<String> },
}

impl Launch {
    /// Interpreter without extra arguments
    pub fn interpreter(command: impl Into<String>) -> Self {
        Self::Interpreter {
            command: command.into(),
            args: Vec::new(),
        }
    }

    /// Check if the file is executed directly
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct)
    }

    /// Build the command line for `program`
    ///
    /// The program receives no arguments beyond its own path.
    pub fn command(&self, program: &Path) -> Command {
        match self {
            Self::Direct => Command::new(executable_path(program)),
            Self::Interpreter { command, args } => {
                let mut cmd = Command::new(command);
                cmd.args(args).arg(program);
                cmd
            }
        }
    }
}

// A bare file name would be looked up on PATH instead of in the working directory.
fn executable_path(program: &Path) -> PathBuf {
    match program.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => program.to_path_buf(),
        _ => Path::new(".").join(program),
    }
}

/// Launch rules keyed by file extension
#[derive(Debug, Clone)]
pub struct LaunchTable {
    by_extension: HashMap<String, Launch>,
}

impl LaunchTable {
    /// Table without any rule: every file is executed directly
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Add or replace the rule for `extension` (without the leading dot)
    pub fn with(mut self, extension: impl Into<String>, launch: Launch) -> Self {
        self.by_extension.insert(extension.into(), launch);
        self
    }

    /// Rule for `program`, falling back to `Launch::Direct`
    pub fn lookup(&self, program: &Path) -> &Launch {
        const DIRECT: &Launch = &Launch::Direct;
        program
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension.get(ext))
            .unwrap_or(DIRECT)
    }

    pub fn command(&self, program: &Path) -> Command {
        self.lookup(program).command(program)
    }
}

impl Default for LaunchTable {
    fn default() -> Self {
        Self::empty()
            .with("py", Launch::interpreter("python3"))
            .with("sh", Launch::interpreter("sh"))
            .with("js", Launch::interpreter("node"))
            .with("rb", Launch::interpreter("ruby"))
            .with("pl", Launch::interpreter("perl"))
    }
}
