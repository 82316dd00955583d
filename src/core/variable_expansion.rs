use nix::unistd::{self, Pid};

/// The only variable the shell knows about: its own process id.
const PID_VARIABLE: &str = "$$";

/// Expands every `$$` in `word` to the shell's process id.
pub fn expand_pid(word: &str) -> String {
    expand_pid_with(word, unistd::getpid())
}

/// Expands every `$$` in `word` to `pid`.
///
/// Occurrences are matched left to right without overlapping, so `$$$`
/// becomes the pid followed by a single `$`.
pub fn expand_pid_with(word: &str, pid: Pid) -> String {
    if !word.contains(PID_VARIABLE) {
        return word.to_string();
    }

    word.replace(PID_VARIABLE, &pid.to_string())
}
