use std::os::unix::io::RawFd;

use nix::errno::Errno;
use nix::unistd;

/// Writes `bytes` straight to `fd` with `write(2)`, bypassing any buffering.
///
/// Only async-signal-safe calls are made, so this may be used from signal
/// handlers and from a forked child before `exec`. Errors are dropped: there
/// is nowhere left to report them.
pub fn write_all_raw(fd: RawFd, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match unistd::write(fd, bytes) {
            Ok(0) => return,
            Ok(n) => bytes = &bytes[n..],
            Err(Errno::EINTR) => continue,
            Err(_) => return,
        }
    }
}
