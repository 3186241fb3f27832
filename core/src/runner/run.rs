use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::cab::{severity, Cab, RuntimeStatus};
use crate::error::{CabError, RunnerError};
use crate::proc;
use crate::subst::Namespace;

use super::io_pump::{pump_lines, LineStream, LineTap};

const LINE_CHANNEL_CAPACITY: usize = 256;

/// What one cab run produced: the process exit code and the wrangler
/// verdict, which are judged together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub status: RuntimeStatus,
    pub duration_ms: u64,
}

impl RunOutcome {
    /// Overall success. A declared verdict overrides the exit code in both
    /// directions; without one, a zero exit code decides.
    pub fn success(&self) -> bool {
        match self.status {
            RuntimeStatus::Success => true,
            RuntimeStatus::Failure => false,
            RuntimeStatus::Unknown => self.exit_code == 0,
        }
    }
}

/// Compile the cab's invocation, run it, and wrangle its output line by
/// line as it arrives. Every surviving line is re-emitted through the log
/// at its wrangled severity. Cleanup directives run after the process
/// exits, whatever the outcome.
pub async fn run_cab(cab: &mut Cab, ns: Option<&Namespace>) -> Result<RunOutcome, CabError> {
    let (argv, venv) = cab.build_invocation(ns)?;
    cab.reset_runtime_status();

    let mut command = Command::new(&argv[0]);
    command
        .args(&argv[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &cab.management().environment {
        command.env(key, value);
    }
    if let Some(venv) = &venv {
        apply_virtual_env(&mut command, venv);
    }

    info!(cab = %cab.name(), command = %argv.join(" "), "running");
    let started = Instant::now();

    let mut child = command
        .spawn()
        .map_err(|e| RunnerError::Spawn(format!("{}: {e}", argv[0])))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| RunnerError::Spawn("no stdout".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| RunnerError::Spawn("no stderr".into()))?;

    let (line_tx, mut line_rx) = mpsc::channel::<LineTap>(LINE_CHANNEL_CAPACITY);
    let out_task = pump_lines(stdout, LineStream::Stdout, line_tx.clone());
    let err_task = pump_lines(stderr, LineStream::Stderr, line_tx);

    // Drain until both pumps hang up. Wrangling is order-sensitive (the
    // first verdict wins), so lines go through one at a time, in arrival
    // order.
    while let Some(tap) = line_rx.recv().await {
        let (line, sev) = cab.apply_wranglers(&tap.line, tap.stream.default_severity());
        if let Some(line) = line {
            emit_wrangled(cab.name(), tap.stream, &line, sev);
        }
    }

    if let Ok(Err(err)) = out_task.await {
        warn!(cab = %cab.name(), %err, "stdout pump failed");
    }
    if let Ok(Err(err)) = err_task.await {
        warn!(cab = %cab.name(), %err, "stderr pump failed");
    }

    let wait = child.wait().await.map_err(RunnerError::Wait)?;
    let exit_code = wait.code().unwrap_or(-1);
    let outcome = RunOutcome {
        exit_code,
        status: cab.runtime_status(),
        duration_ms: started.elapsed().as_millis() as u64,
    };

    proc::cleanup_outputs(&cab.management().cleanup);

    debug!(
        cab = %cab.name(),
        exit_code,
        status = ?outcome.status,
        duration_ms = outcome.duration_ms,
        "run finished"
    );
    Ok(outcome)
}

/// Approximate a venv activation for the child: its bin directory leads
/// the search path and VIRTUAL_ENV points at the root.
fn apply_virtual_env(command: &mut Command, venv: &str) {
    let bin = Path::new(venv).join("bin");
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    let dirs = std::iter::once(bin).chain(std::env::split_paths(&path_var));
    if let Ok(joined) = std::env::join_paths(dirs) {
        command.env("PATH", joined);
    }
    command.env("VIRTUAL_ENV", venv);
}

fn emit_wrangled(cab: &str, stream: LineStream, line: &str, sev: u8) {
    let stream = stream.label();
    if sev >= severity::ERROR {
        error!(cab = %cab, stream, "{line}");
    } else if sev >= severity::WARNING {
        warn!(cab = %cab, stream, "{line}");
    } else if sev >= severity::INFO {
        info!(cab = %cab, stream, "{line}");
    } else if sev >= severity::DEBUG {
        debug!(cab = %cab, stream, "{line}");
    } else {
        trace!(cab = %cab, stream, "{line}");
    }
}
