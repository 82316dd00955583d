use std::path::PathBuf;
use std::process;

use docopt::Docopt;
use log::{debug, error, LevelFilter};
use nix::unistd::Pid;
use serde_derive::Deserialize;

use smallsh::errors::*;
use smallsh::{Shell, ShellConfig};

const LOG_FILE_NAME: &str = ".smallsh_log";

const USAGE: &str = "
smallsh.

Usage:
    smallsh [options]
    smallsh (-h | --help)
    smallsh --version

Options:
    -h --help           Show this screen.
    --version           Show version.
    --log=<path>        File to write log to, defaults to ~/.smallsh_log
    --verbose           Log at trace level.
    --foreground-only   Start with & ignored, as if SIGTSTP had been received.
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    flag_version: bool,
    flag_log: Option<String>,
    flag_verbose: bool,
    flag_foreground_only: bool,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if args.flag_version {
        println!("smallsh version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = init_logger(&args) {
        eprintln!("smallsh: failed to set up logging: {}", e);
    }
    debug!("{:?}", args);

    let shell_config = ShellConfig::interactive().foreground_only(args.flag_foreground_only);
    let result = Shell::new(shell_config).and_then(|mut shell| shell.run());
    if let Err(e) = result {
        display_error_and_exit(&e);
    }
}

fn init_logger(args: &Args) -> Result<()> {
    let log_path = match args.flag_log {
        Some(ref path) => PathBuf::from(path),
        None => default_log_path()?,
    };
    let level = if args.flag_verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };

    let pid = Pid::this();
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(fern::log_file(log_path)?)
        .apply()
        .chain_err(|| "logger already initialized")?;

    Ok(())
}

fn default_log_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(LOG_FILE_NAME))
        .ok_or_else(|| "could not determine home directory".into())
}

fn display_error_and_exit(error: &Error) -> ! {
    error!("smallsh stopped: {}", error);
    eprintln!("smallsh: {}", error);
    process::exit(1);
}
