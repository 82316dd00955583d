/// A parsed command line: one program invocation.
///
/// `argv[0]` is always `program`, so `argv` is never empty for a parsed
/// command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub program: String,
    pub argv: Vec<String>,
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub background: bool,
}

impl Command {
    pub fn new<S: Into<String>>(program: S) -> Self {
        let program = program.into();
        Self {
            argv: vec![program.clone()],
            program,
            input_path: None,
            output_path: None,
            background: false,
        }
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.argv.push(arg.into());
        self
    }

    pub fn input<S: Into<String>>(mut self, path: S) -> Self {
        self.input_path = Some(path.into());
        self
    }

    pub fn output<S: Into<String>>(mut self, path: S) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }
}
