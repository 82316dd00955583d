//! Smallsh Parser
//!
//! Command lines are split on spaces and newlines only; there is no quoting.
//! The operators `<`, `>` and `&` must be separate words.

use log::debug;
use nix::unistd::{self, Pid};

pub use self::ast::Command;
use crate::core::variable_expansion;
use crate::errors::{ErrorKind, Result};

pub mod ast;

/// Upper bound on arguments following the program name.
pub const MAX_ARGUMENTS: usize = 512;

const SEPARATORS: &[char] = &[' ', '\n'];
const COMMENT_MARKER: char = '#';
const INPUT_REDIRECT: &str = "<";
const OUTPUT_REDIRECT: &str = ">";
const BACKGROUND: &str = "&";

/// Lazily yields the words of a command line.
#[derive(Debug)]
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let start = self.rest.trim_start_matches(SEPARATORS);
        if start.is_empty() {
            self.rest = start;
            return None;
        }

        let end = start.find(SEPARATORS).unwrap_or_else(|| start.len());
        let (token, rest) = start.split_at(end);
        self.rest = rest;
        Some(token)
    }
}

/// Splits `line` into words.
///
/// Returns `None` for a blank line or a comment (first word starts with `#`),
/// meaning there is nothing to run.
pub fn tokenize(line: &str) -> Option<Tokens<'_>> {
    let mut probe = Tokens { rest: line };
    match probe.next() {
        None => None,
        Some(first) if first.starts_with(COMMENT_MARKER) => None,
        Some(_) => Some(Tokens { rest: line }),
    }
}

/// Turns words into a `Command`.
#[derive(Clone, Copy, Debug)]
pub struct Parser {
    background_allowed: bool,
    max_arguments: usize,
    pid: Pid,
}

impl Parser {
    /// `background_allowed` is sampled once, when the parser is created, so a
    /// mode switch mid-line cannot change how a single line is parsed.
    pub fn new(background_allowed: bool, max_arguments: usize) -> Self {
        Self {
            background_allowed,
            max_arguments,
            pid: unistd::getpid(),
        }
    }

    /// Uses `pid` instead of the shell's own pid for `$$` expansion.
    pub fn with_pid(self, pid: Pid) -> Self {
        Self { pid, ..self }
    }

    /// Parses a full command line. `Ok(None)` means there is nothing to run.
    pub fn parse_line(&self, line: &str) -> Result<Option<Command>> {
        match tokenize(line) {
            Some(tokens) => self.parse(tokens),
            None => Ok(None),
        }
    }

    /// Parses a sequence of words.
    ///
    /// `&` only backgrounds the command when it is the last word; any word
    /// after it resets the flag. While background mode is disabled `&` is
    /// dropped without becoming an argument.
    pub fn parse<'a, I>(&self, tokens: I) -> Result<Option<Command>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let expand = |word: &str| variable_expansion::expand_pid_with(word, self.pid);

        let mut command: Option<Command> = None;
        let mut input_path = None;
        let mut output_path = None;
        let mut looking_for_input = false;
        let mut looking_for_output = false;
        let mut background = false;

        for token in tokens {
            background = false;

            match token {
                INPUT_REDIRECT => looking_for_input = true,
                OUTPUT_REDIRECT => looking_for_output = true,
                BACKGROUND => background = self.background_allowed,
                word if looking_for_input => {
                    input_path = Some(expand(word));
                    looking_for_input = false;
                }
                word if looking_for_output => {
                    output_path = Some(expand(word));
                    looking_for_output = false;
                }
                word => match command {
                    None => command = Some(Command::new(expand(word))),
                    Some(ref mut current) => {
                        if current.args().len() >= self.max_arguments {
                            return Err(ErrorKind::TooManyArguments(self.max_arguments).into());
                        }
                        current.argv.push(expand(word));
                    }
                },
            }
        }

        let command = command.map(|command| Command {
            input_path,
            output_path,
            background,
            ..command
        });
        if command.is_none() {
            debug!("command line has no program, ignoring it");
        }
        debug!("parsed Command: {:?}", command);
        Ok(command)
    }
}
