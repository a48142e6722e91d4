use crate::normalize::{refine, refine_input};
use crate::resolver::resolve_main;
use crate::{
    ByteSize, ExecutionContext, Failure, Limits, NamingConfig, ProcessRunner, RunOutcome, Runner,
    TimeLimit,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builder for a `TestCase` seeded from `file!()`
#[macro_export]
macro_rules! suite {
    () => {
        $crate::TestCase::builder(::std::file!())
    };
}

type SharedRunner = Arc<dyn Runner + Send + Sync>;

/// Judge settings shared by every check of one test file
///
/// The main program path is fixed when the suite is built. Keep the suite in
/// a `static LazyLock` to resolve it once per test file:
///
/// ```ignore
/// static SUITE: LazyLock<TestCase> = LazyLock::new(|| {
///     pstest::suite!().time_limit(TimeLimit::from_secs(1)).build()
/// });
/// ```
pub struct TestCase {
    main: PathBuf,
    limits: Limits,
    problem_url: Option<String>,
    runner: SharedRunner,
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("main", &self.main)
            .field("limits", &self.limits)
            .field("problem_url", &self.problem_url)
            .finish_non_exhaustive()
    }
}

pub struct TestCaseBuilder {
    test_file: PathBuf,
    main: Option<PathBuf>,
    limits: Limits,
    problem_url: Option<String>,
    naming: Option<NamingConfig>,
    runner: Option<SharedRunner>,
}

impl TestCaseBuilder {
    pub fn time_limit(mut self, limit: impl Into<TimeLimit>) -> Self {
        self.limits.time = Some(limit.into());
        self
    }

    pub fn memory_limit(mut self, size: ByteSize) -> Self {
        self.limits.memory = Some(size);
        self
    }

    pub fn problem_url(mut self, url: impl Into<String>) -> Self {
        self.problem_url = Some(url.into());
        self
    }

    /// Use this program instead of resolving one from the test file name
    pub fn main(mut self, path: impl Into<PathBuf>) -> Self {
        self.main = Some(path.into());
        self
    }

    /// Resolve with this configuration instead of `NamingConfig::global()`
    pub fn naming(mut self, naming: NamingConfig) -> Self {
        self.naming = Some(naming);
        self
    }

    pub fn runner(mut self, runner: impl Runner + Send + Sync + 'static) -> Self {
        self.runner = Some(Arc::new(runner));
        self
    }

    pub fn build(self) -> TestCase {
        let main = match self.main {
            Some(main) => main,
            None => {
                let naming = self.naming.as_ref().unwrap_or_else(|| NamingConfig::global());
                resolve_main(&self.test_file, naming)
            }
        };
        TestCase {
            main,
            limits: self.limits,
            problem_url: self.problem_url,
            runner: self
                .runner
                .unwrap_or_else(|| Arc::new(ProcessRunner::default())),
        }
    }
}

impl TestCase {
    /// Start a suite for the test defined in `test_file`
    pub fn builder(test_file: impl Into<PathBuf>) -> TestCaseBuilder {
        TestCaseBuilder {
            test_file: test_file.into(),
            main: None,
            limits: Limits::default(),
            problem_url: None,
            naming: None,
            runner: None,
        }
    }

    pub fn main(&self) -> &Path {
        &self.main
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn problem_url(&self) -> Option<&str> {
        self.problem_url.as_deref()
    }

    /// Run the main program with `input`
    pub async fn run(&self, input: Option<&str>) -> Result<RunOutcome, Failure> {
        self.run_program(&self.main, input).await
    }

    /// Run `program` under this suite's limits
    ///
    /// The input is normalized before it is fed to the program.
    pub async fn run_program(
        &self,
        program: &Path,
        input: Option<&str>,
    ) -> Result<RunOutcome, Failure> {
        let input = input.map(refine_input);
        ExecutionContext::new(self.runner.as_ref(), self.limits)
            .run(program, input.as_deref())
            .await
    }

    /// Run the main program and compare its output with `expected`
    pub async fn check(
        &self,
        input: Option<&str>,
        expected: Option<&str>,
    ) -> Result<String, Failure> {
        self.check_program(&self.main, input, expected).await
    }

    /// Run `program` and compare its output with `expected`
    ///
    /// Returns the normalized output. Without an expectation, any run that
    /// finishes within its limits passes.
    pub async fn check_program(
        &self,
        program: &Path,
        input: Option<&str>,
        expected: Option<&str>,
    ) -> Result<String, Failure> {
        let actual = self.run_program(program, input).await?.refined();
        if let Some(expected) = expected {
            let expected = refine(expected);
            if actual != expected {
                return Err(Failure::OutputMismatch { actual, expected });
            }
        }
        Ok(actual)
    }

    /// Like `check`, panicking on failure
    pub async fn assert_tc(&self, input: Option<&str>, expected: Option<&str>) {
        self.assert_program(&self.main, input, expected).await;
    }

    /// Like `check_program`, panicking on failure
    pub async fn assert_program(&self, program: &Path, input: Option<&str>, expected: Option<&str>) {
        if let Err(failure) = self.check_program(program, input, expected).await {
            panic!("[{}] {}: {failure}", failure.verdict(), program.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_main_skips_resolution() {
        let case = TestCase::builder("tests/test_solve.py")
            .main("bin/other")
            .build();
        assert_eq!(case.main(), Path::new("bin/other"));
    }

    #[test]
    fn main_is_resolved_at_build() {
        let case = TestCase::builder("tests/test_solve.py")
            .naming(NamingConfig::default())
            .time_limit(TimeLimit::from_millis(500))
            .memory_limit(ByteSize::mb(256.0))
            .problem_url("https://www.acmicpc.net/problem/1000")
            .build();
        assert_eq!(case.main(), Path::new("tests/solve.py"));
        assert_eq!(case.limits().deadline(), Some(std::time::Duration::from_millis(500)));
        assert_eq!(case.problem_url(), Some("https://www.acmicpc.net/problem/1000"));
    }

    #[test]
    fn suite_macro_uses_this_file() {
        let case = crate::suite!().naming(NamingConfig::default()).build();
        // src/case.rs holds no `test` marker, so the name is kept
        assert_eq!(case.main(), Path::new("src/case.rs"));
    }
}
