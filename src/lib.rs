//! Judge solution programs against input/output cases
//!
//! A `TestCase` resolves the program under test from the test file's name,
//! runs it under time and memory limits with an in-memory standard input,
//! and compares its normalized standard output with the expectation.

mod case;
mod context;
mod limits;
pub mod log;
pub mod naming;
pub mod normalize;
mod outcome;
mod program;
pub mod resolver;
mod runner;
mod size;
mod termination;

pub use case::{TestCase, TestCaseBuilder};
pub use context::ExecutionContext;
pub use limits::{Limits, TimeLimit};
pub use naming::{ConfigError, NamingConfig};
pub use normalize::refine;
pub use outcome::RunOutcome;
pub use program::{Launch, LaunchTable};
pub use resolver::resolve_main;
pub use runner::{ProcessRunner, Runner};
pub use size::ByteSize;
pub use termination::Failure;
