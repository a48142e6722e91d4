use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason why a program run or a check failed
///
/// This is returned as `Err(Failure)` from `ExecutionContext::run()` and
/// `TestCase::check()`. A passing check returns `Ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Failure {
    // === Resource limits ===
    /// Program was still running when the deadline fired
    #[error("Time Limit Exceeded")]
    TimeLimitExceeded,

    // === Program errors ===
    /// Program exited abnormally
    ///
    /// Covers exhaustion of the memory ceiling too: the program's own
    /// allocation failure is reported as-is.
    #[error("{}", describe_exit(*code, *signal, stderr))]
    RuntimeError {
        code: Option<i32>,
        signal: Option<i32>,
        stderr: String,
    },

    // === Judging ===
    /// Normalized output differs from the normalized expectation
    #[error("output mismatch\n  actual: {actual:?}\nexpected: {expected:?}")]
    OutputMismatch { actual: String, expected: String },

    // === Harness errors ===
    /// Program could not be started (missing file, bad interpreter, ...)
    #[error("failed to launch program: {0}")]
    Launch(String),

    /// Pipe or wait failure inside the execution window
    #[error("i/o error during execution: {0}")]
    Io(String),
}

fn describe_exit(code: Option<i32>, signal: Option<i32>, stderr: &str) -> String {
    let mut message = match (code, signal) {
        (_, Some(signal)) => format!("program killed by signal {signal}"),
        (Some(code), None) => format!("program exited with status {code}"),
        (None, None) => "program exited abnormally".to_string(),
    };
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        message.push('\n');
        message.push_str(stderr);
    }
    message
}

impl Failure {
    /// Returns true if this represents a resource limit violation
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::TimeLimitExceeded)
    }

    /// Returns true if the program itself misbehaved
    pub fn is_program_error(&self) -> bool {
        matches!(self, Self::RuntimeError { .. })
    }

    /// Returns true if the harness could not complete the run
    pub fn is_harness_error(&self) -> bool {
        matches!(self, Self::Launch(_) | Self::Io(_))
    }

    /// Short judge verdict code
    pub fn verdict(&self) -> &'static str {
        match self {
            Self::TimeLimitExceeded => "TLE",
            Self::RuntimeError { .. } => "RE",
            Self::OutputMismatch { .. } => "WA",
            Self::Launch(_) | Self::Io(_) => "IE",
        }
    }
}
