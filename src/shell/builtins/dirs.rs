use std::env;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::errors::Result;
use crate::shell::builtins::{self, BuiltinCommand};
use crate::shell::{Flow, Shell};

pub struct Cd;

impl BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    /// `cd` goes to `$HOME`; `cd DIR` goes to DIR, absolute or relative.
    /// Failing leaves the working directory alone.
    fn run(_shell: &mut Shell, args: &[String]) -> Result<Flow> {
        let target = match args.first() {
            Some(dir) => PathBuf::from(dir),
            None => match ::dirs::home_dir() {
                Some(home) => home,
                None => {
                    warn!("cd: unable to get home directory");
                    eprintln!("could not cd to HOME");
                    return Ok(Flow::Continue);
                }
            },
        };

        match change_directory(&target) {
            Ok(()) => debug!("changed directory to {}", target.display()),
            Err(e) => {
                warn!("cd: {}: {}", target.display(), e);
                eprintln!("could not cd to {}", target.display());
            }
        }

        Ok(Flow::Continue)
    }
}

fn change_directory(target: &Path) -> io::Result<()> {
    if !target.is_dir() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
    }

    env::set_current_dir(target)
}
