//! Line input for the shell.
//!
//! The shell only needs to read one line at a time, blocking, and to notice
//! when a signal interrupted the read so it can prompt again.

use std::fmt;
use std::io;
use std::os::unix::io::RawFd;

use nix::errno::Errno;
use nix::libc;
use nix::unistd;

const READ_CHUNK_SIZE: usize = 1024;

/// Source of command lines.
pub trait LineReader {
    /// Reads the next line, including its trailing newline if it had one.
    ///
    /// Returns `Ok(None)` at end of input. A read interrupted by a signal
    /// before a full line arrived fails with `io::ErrorKind::Interrupted`;
    /// calling again resumes where it left off.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Reads lines from a file descriptor with raw `read(2)` calls.
///
/// `std::io::Stdin` retries reads interrupted by signals on its own, which
/// would hide SIGINT from the shell, so this reader does its own buffering.
pub struct StdinReader {
    fd: RawFd,
    buffer: Vec<u8>,
    eof: bool,
}

impl StdinReader {
    pub fn new() -> Self {
        Self::from_raw_fd(libc::STDIN_FILENO)
    }

    /// Reads from `fd` instead of standard input. The reader does not take
    /// ownership of `fd`.
    pub fn from_raw_fd(fd: RawFd) -> Self {
        Self {
            fd,
            buffer: Vec::with_capacity(READ_CHUNK_SIZE),
            eof: false,
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl Default for StdinReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader for StdinReader {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }

            if self.eof {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let rest: Vec<u8> = self.buffer.drain(..).collect();
                return Ok(Some(String::from_utf8_lossy(&rest).into_owned()));
            }

            let mut chunk = [0; READ_CHUNK_SIZE];
            match unistd::read(self.fd, &mut chunk) {
                Ok(0) => self.eof = true,
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(Errno::EINTR) => return Err(io::ErrorKind::Interrupted.into()),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl fmt::Debug for StdinReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StdinReader {{ fd: {}, buffered: {}, eof: {} }}",
            self.fd,
            self.buffer.len(),
            self.eof
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::util;

    fn reader_for(input: &[u8]) -> StdinReader {
        let (read_end, write_end) = unistd::pipe().unwrap();
        util::write_all_raw(write_end, input);
        unistd::close(write_end).unwrap();
        StdinReader::from_raw_fd(read_end)
    }

    #[test]
    fn test_reads_lines_in_order() {
        let mut reader = reader_for(b"ls -la\nstatus\n");
        assert_eq!(reader.read_line().unwrap(), Some("ls -la\n".to_string()));
        assert_eq!(reader.read_line().unwrap(), Some("status\n".to_string()));
        assert_eq!(reader.read_line().unwrap(), None);
        unistd::close(reader.fd).unwrap();
    }

    #[test]
    fn test_partial_last_line() {
        let mut reader = reader_for(b"echo hi\nexit");
        assert_eq!(reader.read_line().unwrap(), Some("echo hi\n".to_string()));
        assert_eq!(reader.read_line().unwrap(), Some("exit".to_string()));
        assert_eq!(reader.read_line().unwrap(), None);
        unistd::close(reader.fd).unwrap();
    }

    #[test]
    fn test_empty_input() {
        let mut reader = reader_for(b"");
        assert_eq!(reader.read_line().unwrap(), None);
        unistd::close(reader.fd).unwrap();
    }
}
