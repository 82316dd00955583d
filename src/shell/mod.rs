pub use self::execute_command::{launch, LaunchOutcome};
pub use self::job_control::JobManager;
pub use self::shell::Shell;
pub use self::signals::BackgroundMode;

mod builtins;
pub mod execute_command;
pub mod job_control;
#[allow(clippy::module_inception)]
pub mod shell;
pub mod signals;

use crate::core::parser::MAX_ARGUMENTS;

const DEFAULT_PROMPT: &str = ": ";

/// What the main loop should do after a command line has been handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Policy object to control a Shell's behavior
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Install the SIGINT and SIGTSTP handlers and share the process-wide
    /// foreground-only flag with them.
    install_signal_handlers: bool,

    /// Most arguments a command may have after its program name.
    max_arguments: usize,

    /// Printed before every line is read.
    prompt: String,

    /// Start with `&` ignored, as if SIGTSTP had already been received once.
    foreground_only: bool,
}

impl ShellConfig {
    /// Creates an interactive shell configuration.
    ///
    /// # Complete List
    /// - SIGINT and SIGTSTP handlers are installed
    /// - Background mode follows the process-wide flag toggled by SIGTSTP
    pub fn interactive() -> Self {
        Self {
            install_signal_handlers: true,
            ..Default::default()
        }
    }

    /// Creates a noninteractive shell configuration.
    ///
    /// # Complete List
    /// - No signal handlers are installed
    /// - Background mode is private to the shell and can only be changed
    ///   through `Shell::background_mode`
    pub fn noninteractive() -> Self {
        Default::default()
    }

    pub fn foreground_only(self, foreground_only: bool) -> Self {
        Self {
            foreground_only,
            ..self
        }
    }

    pub fn max_arguments(self, max_arguments: usize) -> Self {
        Self {
            max_arguments,
            ..self
        }
    }

    pub fn prompt<S: Into<String>>(self, prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            ..self
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            install_signal_handlers: false,
            max_arguments: MAX_ARGUMENTS,
            prompt: DEFAULT_PROMPT.to_string(),
            foreground_only: false,
        }
    }
}
