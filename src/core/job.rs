use std::fmt;

use nix::sys::wait::WaitStatus;

/// How a child process ended.
///
/// Displays the way the `status` builtin and the background completion
/// notices report it, e.g. `exit value 0` or `terminated by signal 9`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitClassification {
    /// The process exited normally with this code.
    Exited(i32),
    /// The process was killed by this signal number.
    Signaled(i32),
}

impl ExitClassification {
    /// Classifies a `waitpid` result. Returns `None` for statuses that do not
    /// mean the process is gone (e.g. `StillAlive`, `Stopped`).
    pub fn from_wait_status(wait_status: WaitStatus) -> Option<Self> {
        match wait_status {
            WaitStatus::Exited(_, code) => Some(ExitClassification::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(ExitClassification::Signaled(signal as i32)),
            _ => None,
        }
    }
}

impl Default for ExitClassification {
    fn default() -> Self {
        ExitClassification::Exited(0)
    }
}

impl fmt::Display for ExitClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ExitClassification::Exited(code) => write!(f, "exit value {}", code),
            ExitClassification::Signaled(signo) => write!(f, "terminated by signal {}", signo),
        }
    }
}
