//! Trace subprocess driver
//!
//! Owns exactly one `tracert`/`traceroute` process per session and exposes
//! its stdout as a line stream. Termination is bounded: `stop` kills the
//! process and waits up to the grace period for it to be reaped, and
//! `kill_on_drop` guarantees nothing is leaked on any other path.

use crate::trace::config::TraceConfig;
use crate::trace::error::TraceError;
use crate::trace::parser::Dialect;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

/// A running trace subprocess and its stdout line stream.
#[derive(Debug)]
pub struct TraceProcess {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

impl TraceProcess {
    /// Build the platform trace command for a target, without spawning it.
    ///
    /// `tracert -h <hops> -w <ms>` on Windows, `traceroute -m <hops> -w <s>`
    /// elsewhere. A configured command override replaces the program and
    /// arguments wholesale; the target is appended either way.
    pub fn command(dialect: Dialect, target: &str, config: &TraceConfig) -> Command {
        let mut cmd = if let Some(parts) = &config.command_override {
            let mut cmd = Command::new(&parts[0]);
            cmd.args(&parts[1..]);
            cmd
        } else {
            match dialect {
                Dialect::Tracert => {
                    let mut cmd = Command::new("tracert");
                    cmd.arg("-h")
                        .arg(config.max_hops.to_string())
                        .arg("-w")
                        .arg(config.probe_timeout.as_millis().to_string());
                    cmd
                }
                Dialect::Traceroute => {
                    // traceroute takes the wait in whole seconds.
                    let wait_secs = config.probe_timeout.as_secs().max(1);
                    let mut cmd = Command::new("traceroute");
                    cmd.arg("-m")
                        .arg(config.max_hops.to_string())
                        .arg("-w")
                        .arg(wait_secs.to_string());
                    cmd
                }
            }
        };
        cmd.arg(target);
        cmd
    }

    /// Spawn the trace subprocess for a resolved target.
    pub fn spawn(dialect: Dialect, target: &str, config: &TraceConfig) -> Result<Self, TraceError> {
        let mut cmd = Self::command(dialect, target, config);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let program = cmd.as_std().get_program().to_string_lossy().into_owned();
        let mut child = cmd
            .spawn()
            .map_err(|e| TraceError::Process(format!("failed to start {program}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TraceError::Process(format!("{program} stdout not captured")))?;

        Ok(Self {
            child,
            lines: BufReader::new(stdout).lines(),
        })
    }

    /// Read the next stdout line. `Ok(None)` means the stream closed.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }

    /// Kill the subprocess and wait up to `grace` for it to be reaped.
    ///
    /// After this returns no further lines can be observed; if the process
    /// somehow outlives the grace period, `kill_on_drop` still reclaims it.
    pub async fn stop(mut self, grace: Duration) {
        let _ = self.child.start_kill();
        let _ = tokio::time::timeout(grace, self.child.wait()).await;
    }

    /// Wait for natural exit, collecting stderr alongside.
    ///
    /// The wait is bounded: a child that closed stdout but keeps running
    /// is killed after `grace` and then reaped.
    pub async fn finish(mut self, grace: Duration) -> (Option<ExitStatus>, String) {
        let mut stderr_buf = String::new();
        let stderr = self.child.stderr.take();
        let drain_stderr = async {
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_string(&mut stderr_buf).await;
            }
        };
        let child = &mut self.child;
        let wait_bounded = async move {
            match tokio::time::timeout(grace, child.wait()).await {
                Ok(status) => status.ok(),
                Err(_) => {
                    let _ = child.start_kill();
                    child.wait().await.ok()
                }
            }
        };
        let (status, ()) = tokio::join!(wait_bounded, drain_stderr);
        (status, stderr_buf)
    }
}
