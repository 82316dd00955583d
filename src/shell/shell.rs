//! Smallsh - Shell Module
//!
//! The Shell owns everything that lives as long as the process: the status
//! of the last foreground command, the background jobs and the
//! foreground-only flag. It reads command lines, runs builtins itself and
//! hands everything else to the launcher.

use std::fmt;
use std::io::{self, Write};

use log::{debug, error, info};

use crate::core::job::ExitClassification;
use crate::core::parser::Parser;
use crate::editor::{LineReader, StdinReader};
use crate::errors::{ErrorKind, Result};
use crate::shell::{
    builtins,
    execute_command::{self, LaunchOutcome},
    job_control::JobManager,
    signals::{self, BackgroundMode},
    Flow, ShellConfig,
};

/// Smallsh Shell
pub struct Shell {
    config: ShellConfig,
    reader: Box<dyn LineReader>,
    stdout: Box<dyn Write>,
    job_manager: JobManager,
    /// How the last foreground command ended.
    last_status: ExitClassification,
    background_mode: BackgroundMode,
}

impl Shell {
    /// Constructs a Shell reading from standard input and writing to
    /// standard output.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        Shell::with_io(config, Box::new(StdinReader::new()), Box::new(io::stdout()))
    }

    /// Constructs a Shell with its own line source and output sink.
    pub fn with_io(
        config: ShellConfig,
        reader: Box<dyn LineReader>,
        stdout: Box<dyn Write>,
    ) -> Result<Shell> {
        let background_mode = if config.install_signal_handlers {
            signals::install_handlers()?;
            BackgroundMode::global()
        } else {
            BackgroundMode::detached(true)
        };
        background_mode.set_allowed(!config.foreground_only);

        let shell = Shell {
            config,
            reader,
            stdout,
            job_manager: JobManager::new(),
            last_status: ExitClassification::default(),
            background_mode,
        };

        info!("smallsh started up");
        Ok(shell)
    }

    /// How the most recent foreground command ended. Background jobs never
    /// change this.
    pub fn last_status(&self) -> ExitClassification {
        self.last_status
    }

    pub fn background_mode(&self) -> &BackgroundMode {
        &self.background_mode
    }

    pub fn jobs(&self) -> &JobManager {
        &self.job_manager
    }

    pub(crate) fn stdout(&mut self) -> &mut dyn Write {
        &mut *self.stdout
    }

    /// Runs commands until `exit` or end of input, then terminates any
    /// background jobs that are still running.
    ///
    /// Returns an error only if the shell cannot go on, e.g. `fork` failed.
    pub fn run(&mut self) -> Result<()> {
        let result = self.execute_from_stdin();
        log_if_err!(&result, "main loop stopped");
        self.shutdown();
        result
    }

    /// Terminates background jobs without waiting for them.
    pub fn shutdown(&mut self) {
        self.job_manager.terminate_all();
        log_if_err!(self.stdout.flush(), "flush stdout during shutdown");
        info!("smallsh has shut down");
    }

    /// Runs command lines from the line reader until `exit` or end of input.
    pub fn execute_from_stdin(&mut self) -> Result<()> {
        loop {
            self.report_finished_jobs()?;

            let line = match self.prompt()? {
                Some(line) => line,
                None => {
                    info!("end of input");
                    return Ok(());
                }
            };

            if self.execute_command_string(&line)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Prints the prompt and reads a line. A read interrupted by a signal is
    /// retried after prompting again on a fresh line.
    /// Returns `None` when end of file is reached.
    fn prompt(&mut self) -> Result<Option<String>> {
        write!(self.stdout, "{}", self.config.prompt)?;
        self.stdout.flush()?;

        loop {
            match self.reader.read_line() {
                Ok(line) => return Ok(line),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                    debug!("read interrupted, prompting again");
                    write!(self.stdout, "\n{}", self.config.prompt)?;
                    self.stdout.flush()?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Reports background jobs that finished since the last prompt.
    fn report_finished_jobs(&mut self) -> Result<()> {
        for (pid, outcome) in self.job_manager.reap_all()? {
            writeln!(self.stdout, "background pid {} is done: {}", pid, outcome)?;
        }
        self.stdout.flush()?;
        Ok(())
    }

    /// Parses and runs a single command line.
    pub fn execute_command_string(&mut self, input: &str) -> Result<Flow> {
        let parser = Parser::new(self.background_mode.is_allowed(), self.config.max_arguments);
        let command = match parser.parse_line(input) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                if let ErrorKind::TooManyArguments(_) = *e.kind() {
                    eprintln!("smallsh: {}", e);
                    return Ok(Flow::Continue);
                }

                return Err(e);
            }
        };

        if builtins::is_builtin(&command.program) {
            return builtins::run(self, &command);
        }

        match execute_command::launch(&command, &mut self.job_manager, &mut *self.stdout) {
            Ok(LaunchOutcome::Foreground(outcome)) => self.last_status = outcome,
            Ok(LaunchOutcome::Background(_)) => {}
            Err(e) => match *e.kind() {
                ErrorKind::InvalidWord(_) => eprintln!("smallsh: {}", e),
                _ => {
                    error!("{}: {}", command.program, e);
                    return Err(e);
                }
            },
        }

        Ok(Flow::Continue)
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}\nlast status: {}\n{:?}",
            self.job_manager, self.last_status, self.background_mode
        )
    }
}
