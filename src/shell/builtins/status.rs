use crate::errors::Result;
use crate::shell::builtins::{self, BuiltinCommand};
use crate::shell::{Flow, Shell};

pub struct Status;

impl BuiltinCommand for Status {
    const NAME: &'static str = builtins::STATUS_NAME;

    fn run(shell: &mut Shell, _args: &[String]) -> Result<Flow> {
        let last_status = shell.last_status();
        let stdout = shell.stdout();
        writeln!(stdout, "{}", last_status)?;
        stdout.flush()?;
        Ok(Flow::Continue)
    }
}
