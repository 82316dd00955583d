//! smallsh - a small interactive shell
//!
//! Reads one command line at a time, runs the `cd`, `status` and `exit`
//! builtins itself and forks everything else, optionally redirecting its
//! standard input and output and optionally leaving it in the background.
#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]

#[macro_use]
extern crate error_chain;

/// Logs `$result`'s error, if any, and carries on.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(e) = $result {
            ::log::error!("{}: {}", $fmt, e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(e) = $result {
            ::log::error!("{}: {}", format_args!($fmt, $($arg)*), e);
        }
    }};
}

pub mod core;
pub mod editor;
pub mod errors;
pub mod shell;
mod util;

pub use crate::shell::{Shell, ShellConfig};
