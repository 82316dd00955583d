//! Signal handling for the shell process itself.
//!
//! SIGINT must not kill the shell, but it should still interrupt a blocked
//! read so the prompt can be printed again. SIGTSTP switches foreground-only
//! mode on and off. Neither handler is installed with `SA_RESTART`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::errors::Result;
use crate::util;

const ENTERING_FOREGROUND_ONLY: &[u8] = b"\nEntering foreground-only mode (& is now ignored)";
const EXITING_FOREGROUND_ONLY: &[u8] = b"\nExiting foreground-only mode";

static BACKGROUND_ALLOWED: AtomicBool = AtomicBool::new(true);

/// Whether a trailing `&` currently sends commands to the background.
///
/// All clones made from the same source see the same flag.
#[derive(Clone)]
pub struct BackgroundMode {
    flag: Flag,
}

#[derive(Clone)]
enum Flag {
    /// `BACKGROUND_ALLOWED`, shared with the SIGTSTP handler.
    Global,
    /// Freed once the last clone is dropped.
    Detached(Arc<AtomicBool>),
}

impl BackgroundMode {
    /// The process-wide flag flipped by the SIGTSTP handler.
    pub fn global() -> Self {
        Self { flag: Flag::Global }
    }

    /// A flag no signal handler can see.
    pub fn detached(allowed: bool) -> Self {
        Self {
            flag: Flag::Detached(Arc::new(AtomicBool::new(allowed))),
        }
    }

    fn allowed(&self) -> &AtomicBool {
        match self.flag {
            Flag::Global => &BACKGROUND_ALLOWED,
            Flag::Detached(ref allowed) => &**allowed,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed().load(Ordering::SeqCst)
    }

    pub fn set_allowed(&self, allowed: bool) {
        self.allowed().store(allowed, Ordering::SeqCst);
    }

    /// Flips the flag and returns its new value.
    pub fn toggle(&self) -> bool {
        !self.allowed().fetch_xor(true, Ordering::SeqCst)
    }
}

impl fmt::Debug for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackgroundMode {{ allowed: {} }}", self.is_allowed())
    }
}

extern "C" fn handle_sigint(_signo: libc::c_int) {}

extern "C" fn handle_sigtstp(_signo: libc::c_int) {
    let notice = if BackgroundMode::global().toggle() {
        EXITING_FOREGROUND_ONLY
    } else {
        ENTERING_FOREGROUND_ONLY
    };
    util::write_all_raw(libc::STDOUT_FILENO, notice);
}

/// Installs the shell's SIGINT and SIGTSTP handlers.
///
/// Both handlers block every other signal while they run.
pub fn install_handlers() -> Result<()> {
    let sigint = SigAction::new(
        SigHandler::Handler(handle_sigint),
        SaFlags::empty(),
        SigSet::all(),
    );
    let sigtstp = SigAction::new(
        SigHandler::Handler(handle_sigtstp),
        SaFlags::empty(),
        SigSet::all(),
    );

    // The handlers only touch an atomic and call write(2).
    unsafe {
        signal::sigaction(Signal::SIGINT, &sigint)?;
        signal::sigaction(Signal::SIGTSTP, &sigtstp)?;
    }

    debug!("installed SIGINT and SIGTSTP handlers");
    Ok(())
}

/// Sets the dispositions a freshly forked child should run with: a
/// background child ignores SIGINT, a foreground child gets the default.
/// Every child ignores SIGTSTP.
///
/// Only async-signal-safe calls are made, and failures are returned as a
/// bare `Errno`, so this is safe to call between `fork` and `exec`.
pub fn reset_for_child(background: bool) -> nix::Result<()> {
    let sigint = if background {
        SigHandler::SigIgn
    } else {
        SigHandler::SigDfl
    };

    unsafe {
        signal::sigaction(
            Signal::SIGINT,
            &SigAction::new(sigint, SaFlags::empty(), SigSet::empty()),
        )?;
        signal::sigaction(
            Signal::SIGTSTP,
            &SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty()),
        )?;
    }

    Ok(())
}
