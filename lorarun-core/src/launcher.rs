//! Launching the simulator process.
//!
//! # Failure kinds
//!
//! Two distinct things can go wrong with a trial. If the program can't be
//! started at all (missing, not executable) the launcher returns
//! [`Error::Launch`], which aborts the whole run. If the program starts but
//! exits with a non-zero status, that's reported as
//! [`TrialStatus::Failed`] and it's up to the runner's policy whether to
//! carry on.
//!
//! [`Error::Launch`]: ../error/enum.Error.html#variant.Launch
//! [`TrialStatus::Failed`]: enum.TrialStatus.html#variant.Failed

use std::fmt;
use std::io;
use std::process::{self, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::RunSettings;
use crate::error::{Error, Result};
use crate::invocation::Invocation;

/// How often a running child is checked for exit when a timeout is set.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Result of a single trial that was successfully launched.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrialStatus {
    Succeeded,
    /// Non-zero exit. Exit code is missing if the process was terminated
    /// by a signal.
    Failed(Option<i32>),
    /// Killed after exceeding the per-trial timeout.
    TimedOut,
}

impl TrialStatus {
    pub fn from_exit(status: ExitStatus) -> Self {
        if status.success() {
            TrialStatus::Succeeded
        } else {
            TrialStatus::Failed(status.code())
        }
    }

    pub fn is_success(&self) -> bool {
        *self == TrialStatus::Succeeded
    }
}

impl fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialStatus::Succeeded => write!(f, "succeeded"),
            TrialStatus::Failed(Some(code)) => write!(f, "failed with exit code {}", code),
            TrialStatus::Failed(None) => write!(f, "terminated by signal"),
            TrialStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Something capable of running a single trial to completion.
pub trait Launcher {
    /// Called once before the first trial.
    fn prepare(&mut self, _settings: &RunSettings) -> Result<()> {
        Ok(())
    }

    /// Runs the invocation, blocking until it finishes.
    fn launch(&mut self, invocation: &Invocation) -> Result<TrialStatus>;
}

/// Shared view of the trial process currently running, if any.
///
/// Clones refer to the same slot, so a signal handler can hold one while
/// the launcher is owned by the runner.
#[derive(Debug, Clone, Default)]
pub struct ChildHandle {
    pid: Arc<Mutex<Option<u32>>>,
}

impl ChildHandle {
    fn set(&self, pid: Option<u32>) {
        *self.pid.lock().unwrap_or_else(|e| e.into_inner()) = pid;
    }

    pub fn pid(&self) -> Option<u32> {
        *self.pid.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sends `SIGTERM` to the running trial. Returns `false` if there was
    /// no trial running or the signal couldn't be delivered.
    pub fn terminate(&self) -> bool {
        let guard = self.pid.lock().unwrap_or_else(|e| e.into_inner());
        match *guard {
            Some(pid) => send_terminate(pid),
            None => false,
        }
    }
}

#[cfg(unix)]
fn send_terminate(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) == 0 }
}

#[cfg(not(unix))]
fn send_terminate(_pid: u32) -> bool {
    false
}

/// Launches trials as child processes sharing this process's standard
/// streams, so simulator output lands right after each banner.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    timeout: Option<Duration>,
    child: ChildHandle,
}

impl ProcessLauncher {
    pub fn new(timeout: Option<Duration>) -> Self {
        ProcessLauncher {
            timeout,
            child: ChildHandle::default(),
        }
    }

    /// Handle for signalling whichever trial is running at the time.
    pub fn child_handle(&self) -> ChildHandle {
        self.child.clone()
    }

    fn wait_with_timeout(
        &self,
        child: &mut process::Child,
        timeout: Duration,
    ) -> io::Result<Option<ExitStatus>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                // child may have exited in the meantime, in which case
                // kill fails and wait reaps it
                let _ = child.kill();
                child.wait()?;
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        ProcessLauncher::new(None)
    }
}

impl Launcher for ProcessLauncher {
    /// Interpreters happily start without the script present and fail on
    /// every trial, so check for the script upfront.
    fn prepare(&mut self, settings: &RunSettings) -> Result<()> {
        if settings.interpreter.is_some() && !settings.script.is_file() {
            return Err(Error::launch(
                settings.script.to_string_lossy(),
                io::Error::new(io::ErrorKind::NotFound, "simulator script not found"),
            ));
        }
        Ok(())
    }

    fn launch(&mut self, invocation: &Invocation) -> Result<TrialStatus> {
        debug!("spawning: {}", invocation);
        let mut child = process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::launch(invocation.program.as_str(), e))?;

        self.child.set(Some(child.id()));
        let waited = match self.timeout {
            None => child.wait().map(Some),
            Some(timeout) => self.wait_with_timeout(&mut child, timeout),
        };
        self.child.set(None);

        match waited? {
            Some(status) => Ok(TrialStatus::from_exit(status)),
            None => {
                warn!(
                    "trial exceeded timeout of {} ms and was killed",
                    self.timeout.unwrap_or_default().as_millis()
                );
                Ok(TrialStatus::TimedOut)
            }
        }
    }
}
