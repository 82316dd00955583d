//! Launching external commands.
//!
//! The child half of `fork` must not lock or log. The C strings, open flags
//! and error messages it needs are prepared beforehand. The one allocation
//! left after `fork` is the pointer array `execvp` builds from `argv`.

use std::ffi::CString;
use std::io::Write;
use std::os::unix::io::RawFd;

use log::{debug, info};
use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::libc;
use nix::sys::stat::Mode;
use nix::sys::wait;
use nix::unistd::{self, ForkResult, Pid};

use crate::core::job::ExitClassification;
use crate::core::parser::Command;
use crate::errors::{ErrorKind, Result, ResultExt};
use crate::shell::job_control::JobManager;
use crate::shell::signals;
use crate::util;

/// Where background commands read from and write to unless redirected.
const NULL_DEVICE: &str = "/dev/null";
const DUP2_FAILED: &[u8] = b"smallsh: dup2() failed\n";
const SIGNAL_SETUP_FAILED: &[u8] = b"smallsh: failed to reset signal handlers\n";

/// What happened to a launched command, as seen by the shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The command ran in the foreground and has finished.
    Foreground(ExitClassification),
    /// The command is running in the background with this pid.
    Background(Pid),
}

struct Redirect {
    path: CString,
    flags: OFlag,
    mode: Mode,
    failure_message: Vec<u8>,
}

impl Redirect {
    fn input(path: &str) -> Result<Self> {
        Ok(Self {
            path: to_c_string(path)?,
            flags: OFlag::O_RDONLY,
            mode: Mode::empty(),
            failure_message: format!("cannot open {} for input\n", path).into_bytes(),
        })
    }

    fn output(path: &str) -> Result<Self> {
        Ok(Self {
            path: to_c_string(path)?,
            flags: OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            mode: Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH,
            failure_message: format!("cannot open {} for output\n", path).into_bytes(),
        })
    }

    /// Opens the file and moves it onto `target`. Child side only.
    fn apply(&self, target: RawFd) {
        let fd = match fcntl::open(self.path.as_c_str(), self.flags, self.mode) {
            Ok(fd) => fd,
            Err(_) => exit_child(&self.failure_message),
        };
        if unistd::dup2(fd, target).is_err() {
            exit_child(DUP2_FAILED);
        }
        if fd != target {
            let _ = unistd::close(fd);
        }
    }
}

/// A `Command` converted into the form `execvp` wants.
struct PreparedCommand {
    program: CString,
    argv: Vec<CString>,
    stdin: Option<Redirect>,
    stdout: Option<Redirect>,
    background: bool,
    not_found_message: Vec<u8>,
}

impl PreparedCommand {
    fn new(command: &Command) -> Result<Self> {
        let background = command.background;
        let stdin = match (&command.input_path, background) {
            (Some(path), _) => Some(Redirect::input(path)?),
            (None, true) => Some(Redirect::input(NULL_DEVICE)?),
            (None, false) => None,
        };
        let stdout = match (&command.output_path, background) {
            (Some(path), _) => Some(Redirect::output(path)?),
            (None, true) => Some(Redirect::output(NULL_DEVICE)?),
            (None, false) => None,
        };

        Ok(Self {
            program: to_c_string(&command.program)?,
            argv: command
                .argv
                .iter()
                .map(|arg| to_c_string(arg))
                .collect::<Result<_>>()?,
            stdin,
            stdout,
            background,
            not_found_message: format!("{}: no such file or directory\n", command.program)
                .into_bytes(),
        })
    }
}

fn to_c_string(word: &str) -> Result<CString> {
    CString::new(word).chain_err(|| ErrorKind::InvalidWord(word.to_string()))
}

/// Runs `command` in a child process.
///
/// A foreground command is waited for and its classification returned; a
/// signal death is also reported on `stdout`. A background command has its
/// pid printed on `stdout` and registered with `jobs`.
///
/// Redirection and exec failures happen in the child, which reports them
/// and exits with status 1. Only failing to fork (or to prepare the
/// arguments) is an error here, and in that case no process was created.
pub fn launch(
    command: &Command,
    jobs: &mut JobManager,
    stdout: &mut dyn Write,
) -> Result<LaunchOutcome> {
    let prepared = PreparedCommand::new(command)?;

    // Anything still buffered would otherwise be interleaved with the
    // child's output.
    stdout.flush()?;

    match unsafe { unistd::fork() } {
        Err(e) => Err(e).chain_err(|| ErrorKind::Fork),
        Ok(ForkResult::Child) => run_child(&prepared),
        Ok(ForkResult::Parent { child }) => {
            info!("launched {} as {}", command.program, child);
            if prepared.background {
                jobs.register(child);
                writeln!(stdout, "background pid is {}", child)?;
                stdout.flush()?;
                Ok(LaunchOutcome::Background(child))
            } else {
                let outcome = wait_for_foreground(child)?;
                debug!("foreground process {} finished: {}", child, outcome);
                if let ExitClassification::Signaled(signo) = outcome {
                    writeln!(stdout, "terminated by signal {}", signo)?;
                    stdout.flush()?;
                }
                Ok(LaunchOutcome::Foreground(outcome))
            }
        }
    }
}

/// Blocks until `pid` terminates. Interrupted waits are retried.
fn wait_for_foreground(pid: Pid) -> Result<ExitClassification> {
    loop {
        match wait::waitpid(pid, None) {
            Ok(wait_status) => {
                if let Some(outcome) = ExitClassification::from_wait_status(wait_status) {
                    return Ok(outcome);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn run_child(prepared: &PreparedCommand) -> ! {
    if signals::reset_for_child(prepared.background).is_err() {
        exit_child(SIGNAL_SETUP_FAILED);
    }

    if let Some(ref redirect) = prepared.stdin {
        redirect.apply(libc::STDIN_FILENO);
    }
    if let Some(ref redirect) = prepared.stdout {
        redirect.apply(libc::STDOUT_FILENO);
    }

    let _ = unistd::execvp(&prepared.program, &prepared.argv);
    exit_child(&prepared.not_found_message)
}

fn exit_child(message: &[u8]) -> ! {
    util::write_all_raw(libc::STDERR_FILENO, message);
    unsafe { libc::_exit(1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use nix::sys::wait::WaitStatus;
    use tempdir::TempDir;

    fn run(command: &Command) -> (LaunchOutcome, String) {
        let mut jobs = JobManager::new();
        let mut stdout: Vec<u8> = Vec::new();
        let outcome = launch(command, &mut jobs, &mut stdout).unwrap();
        (outcome, String::from_utf8(stdout).unwrap())
    }

    #[test]
    fn test_foreground_exit_code() {
        let command = Command::new("sh").arg("-c").arg("exit 7");
        let (outcome, stdout) = run(&command);
        assert_eq!(outcome, LaunchOutcome::Foreground(ExitClassification::Exited(7)));
        assert_eq!(stdout, "");
    }

    #[test]
    fn test_foreground_killed_by_signal() {
        let command = Command::new("sh").arg("-c").arg("kill -9 $$");
        let (outcome, stdout) = run(&command);
        assert_eq!(
            outcome,
            LaunchOutcome::Foreground(ExitClassification::Signaled(9))
        );
        assert_eq!(stdout, "terminated by signal 9\n");
    }

    #[test]
    fn test_program_not_found() {
        let command = Command::new("smallsh-no-such-program");
        let (outcome, _) = run(&command);
        assert_eq!(outcome, LaunchOutcome::Foreground(ExitClassification::Exited(1)));
    }

    #[test]
    fn test_output_redirect_creates_and_truncates() {
        let temp_dir = TempDir::new("smallsh").unwrap();
        let path = temp_dir.path().join("out.txt");
        fs::write(&path, "this line is longer than the output\n").unwrap();

        let command = Command::new("echo")
            .arg("hello")
            .output(path.to_str().unwrap());
        let (outcome, stdout) = run(&command);
        assert_eq!(outcome, LaunchOutcome::Foreground(ExitClassification::Exited(0)));
        assert_eq!(stdout, "");
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_input_and_output_redirect() {
        let temp_dir = TempDir::new("smallsh").unwrap();
        let input = temp_dir.path().join("in.txt");
        let output = temp_dir.path().join("out.txt");
        fs::write(&input, "b\na\nc\n").unwrap();

        let command = Command::new("sort")
            .input(input.to_str().unwrap())
            .output(output.to_str().unwrap());
        let (outcome, _) = run(&command);
        assert_eq!(outcome, LaunchOutcome::Foreground(ExitClassification::Exited(0)));
        assert_eq!(fs::read_to_string(&output).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn test_missing_input_fails_in_child() {
        let temp_dir = TempDir::new("smallsh").unwrap();
        let missing = temp_dir.path().join("missing.txt");
        let output = temp_dir.path().join("out.txt");

        let command = Command::new("cat")
            .input(missing.to_str().unwrap())
            .output(output.to_str().unwrap());
        let (outcome, _) = run(&command);
        assert_eq!(outcome, LaunchOutcome::Foreground(ExitClassification::Exited(1)));
        // stdin is redirected before stdout, so the output file is never made
        assert!(!output.exists());
    }

    #[test]
    fn test_unwritable_output_fails_in_child() {
        let temp_dir = TempDir::new("smallsh").unwrap();
        let output = temp_dir.path().join("no-such-dir").join("out.txt");

        let command = Command::new("echo").output(output.to_str().unwrap());
        let (outcome, _) = run(&command);
        assert_eq!(outcome, LaunchOutcome::Foreground(ExitClassification::Exited(1)));
    }

    #[test]
    fn test_background_registers_pid() {
        let mut jobs = JobManager::new();
        let mut stdout: Vec<u8> = Vec::new();
        let command = Command::new("sleep").arg("0").background(true);

        let outcome = launch(&command, &mut jobs, &mut stdout).unwrap();
        let pid = match outcome {
            LaunchOutcome::Background(pid) => pid,
            other => panic!("expected a background launch, got {:?}", other),
        };
        assert_eq!(jobs.pids(), &[pid]);
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            format!("background pid is {}\n", pid)
        );
        assert_eq!(wait::waitpid(pid, None).unwrap(), WaitStatus::Exited(pid, 0));
    }

    #[test]
    fn test_background_defaults_to_null_device() {
        let mut jobs = JobManager::new();
        let command = Command::new("cat").background(true);

        let outcome = launch(&command, &mut jobs, &mut Vec::<u8>::new()).unwrap();
        if let LaunchOutcome::Background(pid) = outcome {
            // cat sees end of file on /dev/null straight away
            assert_eq!(wait::waitpid(pid, None).unwrap(), WaitStatus::Exited(pid, 0));
        } else {
            panic!("expected a background launch, got {:?}", outcome);
        }
    }

    #[test]
    fn test_nul_byte_is_rejected_before_fork() {
        let mut jobs = JobManager::new();
        let command = Command::new("echo").arg("a\0b").background(true);

        let result = launch(&command, &mut jobs, &mut Vec::<u8>::new());
        match result {
            Err(e) => match *e.kind() {
                ErrorKind::InvalidWord(ref word) => assert_eq!(word, "a\0b"),
                ref other => panic!("unexpected error: {:?}", other),
            },
            Ok(outcome) => panic!("expected an error, got {:?}", outcome),
        }
        assert!(jobs.is_empty());
    }
}
