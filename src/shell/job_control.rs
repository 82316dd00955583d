//! Bookkeeping for background processes.

use std::fmt;

use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::core::job::ExitClassification;
use crate::errors::{Error, Result};

/// Background processes that have been launched but not yet reaped, in
/// launch order.
#[derive(Default)]
pub struct JobManager {
    jobs: Vec<Pid>,
}

impl JobManager {
    pub fn new() -> Self {
        Default::default()
    }

    /// Starts tracking a background process.
    pub fn register(&mut self, pid: Pid) {
        debug!("tracking background process {}", pid);
        self.jobs.push(pid);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Pids still being tracked, in launch order.
    pub fn pids(&self) -> &[Pid] {
        &self.jobs
    }

    /// Collects every background process that has terminated, without
    /// blocking.
    ///
    /// Finished processes are returned in launch order and stop being
    /// tracked; the rest keep their relative order and are checked again on
    /// the next call.
    pub fn reap_all(&mut self) -> Result<Vec<(Pid, ExitClassification)>> {
        let mut finished = Vec::new();
        let mut failure: Option<Error> = None;

        self.jobs.retain(|&pid| {
            if failure.is_some() {
                return true;
            }

            match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => true,
                Ok(wait_status) => match ExitClassification::from_wait_status(wait_status) {
                    Some(outcome) => {
                        debug!("background process {} is done: {}", pid, outcome);
                        finished.push((pid, outcome));
                        false
                    }
                    None => true,
                },
                Err(Errno::EINTR) => true,
                Err(Errno::ECHILD) => {
                    warn!("background process {} is no longer our child, forgetting it", pid);
                    false
                }
                Err(e) => {
                    failure = Some(e.into());
                    true
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(finished),
        }
    }

    /// Asks every tracked process to terminate and stops tracking them,
    /// without waiting for them to exit.
    pub fn terminate_all(&mut self) {
        for pid in self.jobs.drain(..) {
            debug!("sending SIGTERM to background process {}", pid);
            log_if_err!(
                signal::kill(pid, Signal::SIGTERM),
                "failed to terminate background process {}",
                pid
            );
        }
    }
}

impl fmt::Debug for JobManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} jobs", self.jobs.len())?;
        for pid in &self.jobs {
            write!(f, " {}", pid)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::process::Command;
    use std::thread;
    use std::time::{Duration, Instant};

    fn spawn(program: &str, args: &[&str]) -> Pid {
        let child = Command::new(program).args(args).spawn().unwrap();
        Pid::from_raw(child.id() as i32)
    }

    /// Polls `reap_all` until something finishes or a generous timeout.
    fn reap_until_some(manager: &mut JobManager) -> Vec<(Pid, ExitClassification)> {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let finished = manager.reap_all().unwrap();
            if !finished.is_empty() || Instant::now() > deadline {
                return finished;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_register() {
        let mut manager = JobManager::new();
        assert!(manager.is_empty());

        let first = spawn("sleep", &["0"]);
        let second = spawn("sleep", &["0"]);
        manager.register(first);
        manager.register(second);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.pids(), &[first, second]);

        while !manager.is_empty() {
            reap_until_some(&mut manager);
        }
    }

    #[test]
    fn test_reap_preserves_order_of_running_jobs() {
        let mut manager = JobManager::new();
        let slow_first = spawn("sleep", &["30"]);
        let quick = spawn("sh", &["-c", "exit 3"]);
        let slow_last = spawn("sleep", &["30"]);
        manager.register(slow_first);
        manager.register(quick);
        manager.register(slow_last);

        let finished = reap_until_some(&mut manager);
        assert_eq!(finished, vec![(quick, ExitClassification::Exited(3))]);
        assert_eq!(manager.pids(), &[slow_first, slow_last]);

        manager.terminate_all();
        for pid in &[slow_first, slow_last] {
            assert_eq!(
                wait::waitpid(*pid, None).unwrap(),
                WaitStatus::Signaled(*pid, Signal::SIGTERM, false)
            );
        }
    }

    #[test]
    fn test_reap_reports_signals() {
        let mut manager = JobManager::new();
        let pid = spawn("sleep", &["30"]);
        manager.register(pid);
        assert!(manager.reap_all().unwrap().is_empty());

        signal::kill(pid, Signal::SIGKILL).unwrap();
        let finished = reap_until_some(&mut manager);
        assert_eq!(finished, vec![(pid, ExitClassification::Signaled(9))]);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_terminate_all_empties_registry() {
        let mut manager = JobManager::new();
        let pids: Vec<Pid> = (0..3).map(|_| spawn("sleep", &["30"])).collect();
        for &pid in &pids {
            manager.register(pid);
        }

        manager.terminate_all();
        assert!(manager.is_empty());
        for pid in pids {
            assert_eq!(
                wait::waitpid(pid, None).unwrap(),
                WaitStatus::Signaled(pid, Signal::SIGTERM, false)
            );
        }
    }

    #[test]
    fn test_forgets_processes_that_are_not_children() {
        let mut manager = JobManager::new();
        let pid = spawn("true", &[]);
        wait::waitpid(pid, None).unwrap();
        manager.register(pid);

        assert!(manager.reap_all().unwrap().is_empty());
        assert!(manager.is_empty());
    }
}
