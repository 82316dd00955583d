//! Smallsh builtins
//!
//! `cd`, `status` and `exit` run inside the shell process. They ignore
//! redirections and `&`.

use log::debug;

use self::dirs::Cd;
use self::exit::Exit;
use self::status::Status;
use crate::core::parser::Command;
use crate::errors::Result;
use crate::shell::{Flow, Shell};

mod dirs;
mod exit;
mod status;

const CD_NAME: &str = "cd";
const EXIT_NAME: &str = "exit";
const STATUS_NAME: &str = "status";

/// Represents a Smallsh builtin command such as cd or status.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// Runs the command with the given arguments in the `shell` environment.
    fn run(shell: &mut Shell, args: &[String]) -> Result<Flow>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, EXIT_NAME, STATUS_NAME].contains(&program.as_ref())
}

/// precondition: command is a builtin.
pub fn run(shell: &mut Shell, command: &Command) -> Result<Flow> {
    debug_assert!(is_builtin(&command.program));

    if command.input_path.is_some() || command.output_path.is_some() || command.background {
        debug!("ignoring redirections and & for builtin {}", command.program);
    }

    let args = command.args();
    match command.program.as_str() {
        CD_NAME => Cd::run(shell, args),
        EXIT_NAME => Exit::run(shell, args),
        STATUS_NAME => Status::run(shell, args),
        _ => unreachable!(),
    }
}
