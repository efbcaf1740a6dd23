use std::{path::PathBuf, process::Stdio};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader},
    process::Child,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use singtown_core::LogBuffer;

use crate::{
    error::{ExecError, ExecResult},
    util::{kill, shell_command},
};

/// Shell command to run and how to treat its output.
#[derive(Clone, Debug, Default)]
pub struct ProcConfig {
    /// Script passed to the platform shell.
    pub command: String,
    /// Discard stdout instead of streaming it to the log.
    pub ignore_stdout: bool,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ProcConfig {
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn ignore_stdout(mut self, ignore: bool) -> Self {
        self.ignore_stdout = ignore;
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Runs one shell command with its output routed to a [`LogBuffer`].
///
/// Stdout is appended line by line while the child runs, each line as
/// produced (newline included). Stderr is drained concurrently and only
/// appended when the command fails.
pub struct ProcRunner {
    cfg: ProcConfig,
}

impl ProcRunner {
    pub fn new(cfg: ProcConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ProcConfig {
        &self.cfg
    }

    /// Run to completion.
    pub async fn run(&self, logs: &LogBuffer) -> ExecResult<()> {
        self.run_until(logs, &CancellationToken::new()).await
    }

    /// Run until the child exits or `cancel` fires; a cancelled child is killed.
    pub async fn run_until(&self, logs: &LogBuffer, cancel: &CancellationToken) -> ExecResult<()> {
        let mut child = self.spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut collected = Vec::new();
            if let Some(mut err) = stderr {
                let _ = err.read_to_end(&mut collected).await;
            }
            collected
        });

        tokio::select! {
            res = stream_lines(stdout, logs) => res?,
            _ = cancel.cancelled() => return self.abort(&mut child, stderr_task).await,
        }

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = cancel.cancelled() => return self.abort(&mut child, stderr_task).await,
        };

        if status.success() {
            debug!(target: "singtown.exec.proc", command = %self.cfg.command, "exit success");
            stderr_task.abort();
            return Ok(());
        }

        let stderr = stderr_task.await.unwrap_or_default();
        if !stderr.is_empty() {
            logs.write(&String::from_utf8_lossy(&stderr), "");
        }

        match status.code() {
            Some(code) => {
                debug!(target: "singtown.exec.proc", command = %self.cfg.command, code, "exit non-zero");
                Err(ExecError::NonZeroExit { code })
            }
            None => Err(ExecError::KilledBySignal),
        }
    }

    fn spawn(&self) -> ExecResult<Child> {
        if self.cfg.command.trim().is_empty() {
            return Err(ExecError::MissingProgram);
        }

        let mut cmd = shell_command(&self.cfg.command);
        if let Some(cwd) = &self.cfg.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &self.cfg.env {
            cmd.env(k, v);
        }

        let stdout = if self.cfg.ignore_stdout {
            Stdio::null()
        } else {
            Stdio::piped()
        };
        cmd.stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        trace!(target: "singtown.exec.proc", command = %self.cfg.command, "spawn");
        cmd.spawn().map_err(|e| ExecError::Spawn(e.to_string()))
    }

    async fn abort(
        &self,
        child: &mut Child,
        stderr_task: tokio::task::JoinHandle<Vec<u8>>,
    ) -> ExecResult<()> {
        debug!(target: "singtown.exec.proc", command = %self.cfg.command, "cancelled; killing child");
        let _ = kill(child).await;
        stderr_task.abort();
        Err(ExecError::Cancelled)
    }
}

/// Append every line of `out` to `logs` unchanged; no-op when stdout is not piped.
async fn stream_lines<R>(out: Option<R>, logs: &LogBuffer) -> ExecResult<()>
where
    R: AsyncRead + Unpin,
{
    let Some(out) = out else {
        return Ok(());
    };
    let mut reader = BufReader::new(out);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&line);
        trace!(target: "singtown.exec.proc.out", line = %text.trim_end());
        logs.write(&text, "");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn run(cfg: ProcConfig) -> (ExecResult<()>, Option<String>) {
        let logs = LogBuffer::new();
        let res = ProcRunner::new(cfg).run(&logs).await;
        (res, logs.drain())
    }

    #[tokio::test]
    async fn stdout_lines_are_logged_unchanged() {
        let (res, logs) = run(ProcConfig::shell("echo Hello, World!")).await;
        res.unwrap();
        assert_eq!(logs.as_deref(), Some("Hello, World!\n"));
    }

    #[tokio::test]
    async fn partial_last_line_is_kept() {
        let (res, logs) = run(ProcConfig::shell("printf 'a\\nb'")).await;
        res.unwrap();
        assert_eq!(logs.as_deref(), Some("a\nb"));
    }

    #[tokio::test]
    async fn ignored_stdout_logs_nothing() {
        let (res, logs) = run(ProcConfig::shell("echo Hello, World!").ignore_stdout(true)).await;
        res.unwrap();
        assert!(logs.is_none());
    }

    #[tokio::test]
    async fn stderr_is_logged_only_on_failure() {
        let (res, logs) = run(ProcConfig::shell("echo warn 1>&2")).await;
        res.unwrap();
        assert!(logs.is_none());

        let (res, logs) = run(ProcConfig::shell("echo out; echo oops 1>&2; exit 3")).await;
        assert!(matches!(res, Err(ExecError::NonZeroExit { code: 3 })));
        assert_eq!(logs.as_deref(), Some("out\noops\n"));
    }

    #[tokio::test]
    async fn stderr_is_drained_on_failure_even_when_stdout_is_ignored() {
        let cfg = ProcConfig::shell("echo out; echo oops 1>&2; exit 1").ignore_stdout(true);
        let (res, logs) = run(cfg).await;
        assert!(res.is_err());
        assert_eq!(logs.as_deref(), Some("oops\n"));
    }

    #[tokio::test]
    async fn unknown_command_fails() {
        let (res, logs) = run(ProcConfig::shell("invalid_command")).await;
        assert!(matches!(res, Err(ExecError::NonZeroExit { code: 127 })));
        assert!(logs.unwrap().contains("invalid_command"));
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let (res, _) = run(ProcConfig::shell("  ")).await;
        assert!(matches!(res, Err(ExecError::MissingProgram)));
    }

    #[tokio::test]
    async fn cwd_and_env_are_applied() {
        let dir = std::env::temp_dir();
        let cfg = ProcConfig::shell("echo $SINGTOWN_EPOCHS; pwd")
            .env("SINGTOWN_EPOCHS", "10")
            .cwd(&dir);
        let (res, logs) = run(cfg).await;
        res.unwrap();

        let logs = logs.unwrap();
        let mut lines = logs.lines();
        assert_eq!(lines.next(), Some("10"));
        let pwd = std::path::PathBuf::from(lines.next().unwrap());
        assert_eq!(pwd.canonicalize().unwrap(), dir.canonicalize().unwrap());
    }

    #[tokio::test]
    async fn cancellation_kills_the_child() {
        let logs = LogBuffer::new();
        let cancel = CancellationToken::new();
        let runner = ProcRunner::new(ProcConfig::shell("sleep 30"));

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let res = runner.run_until(&logs, &cancel).await;
        assert!(matches!(res, Err(ExecError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
