//! Execution window for a single program run
//!
//! Four resources are scoped to the window:
//!
//! - input feed: the program's stdin is an in-memory text
//! - output capture: stdout and stderr are collected in memory
//! - deadline: a wall-clock countdown that kills the program when it fires
//! - memory ceiling: the program's address-space limit
//!
//! Guards are plain locals, so they are released in reverse order of
//! acquisition on every exit path, including timeouts and I/O errors.
//! Limits are installed in the child only; the harness process keeps its
//! own streams and rlimits untouched.

use crate::{ByteSize, Failure, Limits, RunOutcome, Runner};
use bytes::{Bytes, BytesMut};
use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::time::Sleep;

/// Runs one program under a set of limits
#[derive(Debug)]
pub struct ExecutionContext<'a, R: Runner + ?Sized> {
    runner: &'a R,
    limits: Limits,
}

impl<'a, R: Runner + ?Sized> ExecutionContext<'a, R> {
    pub fn new(runner: &'a R, limits: Limits) -> Self {
        Self { runner, limits }
    }

    /// Run `program` with `input` as its standard input
    ///
    /// Returns:
    /// - `Ok(RunOutcome)` if the program exited successfully within its limits
    /// - `Err(Failure)` on timeout, abnormal exit, or launch/pipe failure
    #[tracing::instrument(skip_all, fields(program = %program.display()))]
    pub async fn run(&self, program: &Path, input: Option<&str>) -> Result<RunOutcome, Failure> {
        let mut command = self.runner.command(program);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        MemoryCeiling::new(self.limits.memory).install(&mut command);

        let started = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|e| Failure::Launch(format!("{}: {e}", program.display())))?;
        tracing::debug!(pid = child.id(), "program started");

        let mut group = ProcessGroup::of(&child);
        let mut feed = InputFeed::acquire(&mut child, input);
        let mut capture = OutputCapture::acquire(&mut child);
        let mut deadline = Deadline::arm(self.limits.deadline());

        let finished = deadline
            .guard(async {
                let exited = async {
                    let status = child.wait().await?;
                    // Leftover background processes would keep the capture pipes open.
                    group.kill();
                    Ok::<_, io::Error>(status)
                };
                tokio::try_join!(feed.pump(), capture.drain(), exited).map(|(_, _, status)| status)
            })
            .await;

        let status = match finished {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                kill_tree(&mut child, &mut group).await;
                return Err(Failure::Io(e.to_string()));
            }
            Err(failure) => {
                tracing::debug!("deadline fired, killing program");
                kill_tree(&mut child, &mut group).await;
                return Err(failure);
            }
        };
        let elapsed = started.elapsed();

        let (stdout, stderr) = capture.take();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        tracing::debug!(?status, elapsed_ms = elapsed.as_millis() as u64, "program exited");

        if !status.success() {
            return Err(Failure::RuntimeError {
                code: status.code(),
                signal: exit_signal(&status),
                stderr,
            });
        }

        Ok(RunOutcome {
            stdout,
            stderr,
            code: status.code(),
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Kill the program together with anything it spawned, then reap it
async fn kill_tree(child: &mut Child, group: &mut ProcessGroup) {
    group.kill();
    if let Err(e) = child.start_kill() {
        tracing::trace!(error = %e, "program already gone");
    }
    if let Err(e) = child.wait().await {
        tracing::warn!(error = %e, "failed to reap program");
    }
}

/// Process group created for the program at spawn
///
/// The group id is recorded up front because `Child::id` is gone once the
/// program has been reaped. Dropping the guard kills the group, so a
/// cancelled run leaves nothing behind.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn of(child: &Child) -> Self {
        Self { pgid: child.id() }
    }

    /// SIGKILL every process in the group, at most once
    fn kill(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        #[cfg(unix)]
        {
            // SAFETY: kill(2) has no memory-safety preconditions; the negative
            // pid targets the group created with `process_group(0)`.
            let rc = unsafe { libc::kill(-(pgid as libc::pid_t), libc::SIGKILL) };
            tracing::trace!(pgid, delivered = rc == 0, "process group killed");
        }
        #[cfg(not(unix))]
        let _ = pgid;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Standard input of the program, fed from in-memory text
struct InputFeed {
    stdin: Option<ChildStdin>,
    data: Bytes,
}

impl InputFeed {
    fn acquire(child: &mut Child, input: Option<&str>) -> Self {
        let data = input.map_or_else(Bytes::new, |text| Bytes::copy_from_slice(text.as_bytes()));
        Self {
            stdin: child.stdin.take(),
            data,
        }
    }

    /// Write everything, then close the pipe so the program sees EOF
    async fn pump(&mut self) -> io::Result<()> {
        let Some(mut stdin) = self.stdin.take() else {
            return Ok(());
        };
        match stdin.write_all(&self.data).await {
            // The program may exit without reading its input.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }
}

impl Drop for InputFeed {
    fn drop(&mut self) {
        tracing::trace!(pending = self.stdin.is_some(), "input feed released");
    }
}

/// Captured standard output and standard error of the program
struct OutputCapture {
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    out: BytesMut,
    err: BytesMut,
}

impl OutputCapture {
    fn acquire(child: &mut Child) -> Self {
        Self {
            stdout: child.stdout.take(),
            stderr: child.stderr.take(),
            out: BytesMut::new(),
            err: BytesMut::new(),
        }
    }

    async fn drain(&mut self) -> io::Result<()> {
        tokio::try_join!(
            read_all(self.stdout.take(), &mut self.out),
            read_all(self.stderr.take(), &mut self.err)
        )?;
        Ok(())
    }

    fn take(&mut self) -> (Bytes, Bytes) {
        (
            std::mem::take(&mut self.out).freeze(),
            std::mem::take(&mut self.err).freeze(),
        )
    }
}

impl Drop for OutputCapture {
    fn drop(&mut self) {
        tracing::trace!(
            stdout_bytes = self.out.len(),
            stderr_bytes = self.err.len(),
            "output capture released"
        );
    }
}

async fn read_all<S: AsyncRead + Unpin>(stream: Option<S>, sink: &mut BytesMut) -> io::Result<()> {
    if let Some(mut stream) = stream {
        while stream.read_buf(sink).await? != 0 {}
    }
    Ok(())
}

/// Wall-clock countdown around the guarded body
///
/// Dropping the deadline disarms it.
struct Deadline {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Deadline {
    fn arm(limit: Option<Duration>) -> Self {
        if let Some(limit) = limit {
            tracing::debug!(?limit, "deadline armed");
        }
        Self {
            sleep: limit.map(|limit| Box::pin(tokio::time::sleep(limit))),
        }
    }

    /// Await `body`, failing with `TimeLimitExceeded` if the countdown ends first
    async fn guard<F: Future>(&mut self, body: F) -> Result<F::Output, Failure> {
        let Some(sleep) = self.sleep.as_mut() else {
            return Ok(body.await);
        };
        tokio::select! {
            biased;
            output = body => Ok(output),
            () = sleep => Err(Failure::TimeLimitExceeded),
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        if self.sleep.take().is_some() {
            tracing::trace!("deadline disarmed");
        }
    }
}

/// Address-space ceiling installed in the program before it starts
#[derive(Debug, Clone, Copy)]
struct MemoryCeiling(Option<ByteSize>);

impl MemoryCeiling {
    fn new(size: Option<ByteSize>) -> Self {
        Self(size)
    }

    #[cfg(unix)]
    fn install(&self, command: &mut Command) {
        let Some(size) = self.0 else {
            return;
        };
        tracing::debug!(bytes = size.bytes(), "memory ceiling installed");
        let bytes = libc::rlim_t::try_from(size.bytes()).unwrap_or(libc::RLIM_INFINITY);
        // SAFETY: the hook runs between fork and exec and only calls
        // async-signal-safe functions (getrlimit/setrlimit).
        unsafe {
            command.pre_exec(move || lower_address_space(bytes));
        }
    }

    #[cfg(not(unix))]
    fn install(&self, _command: &mut Command) {
        if self.0.is_some() {
            tracing::warn!("memory ceiling is not supported on this platform");
        }
    }
}

/// Lower the soft `RLIMIT_AS` of the calling process, keeping the hard limit
#[cfg(unix)]
fn lower_address_space(bytes: libc::rlim_t) -> io::Result<()> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: `limit` is a valid, writable rlimit struct.
    if unsafe { libc::getrlimit(libc::RLIMIT_AS, &mut limit) } != 0 {
        return Err(io::Error::last_os_error());
    }
    limit.rlim_cur = if limit.rlim_max == libc::RLIM_INFINITY {
        bytes
    } else {
        bytes.min(limit.rlim_max)
    };
    // SAFETY: `limit` is a valid rlimit struct.
    if unsafe { libc::setrlimit(libc::RLIMIT_AS, &limit) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
