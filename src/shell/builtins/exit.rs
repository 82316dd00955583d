use crate::errors::Result;
use crate::shell::builtins::{self, BuiltinCommand};
use crate::shell::{Flow, Shell};

pub struct Exit;

impl BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    /// Arguments are ignored. Background jobs are terminated by the shell
    /// once the main loop has stopped.
    fn run(_shell: &mut Shell, _args: &[String]) -> Result<Flow> {
        Ok(Flow::Exit)
    }
}
