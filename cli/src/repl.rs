use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use interpreter::{
    build_function, export::export_to_path, parse_expr, Environment, Equation, EquationError,
    ExportError, Format, Function, History, Identifier, Value,
};
use thiserror::Error;

use crate::{config::Config, draw::draw};

const HELP: &str = "\
Lines are evaluated and added to the tape:
  2+2            an equation
  r := 10        a variable
  f(x) := x*r    a function of up to five parameters
  # text         a comment
Commands:
  :help                  show this text
  :list                  show the tape
  :vars                  show every binding
  :edit N TEXT           replace line N and evaluate it again
  :delete N              remove line N, its bindings stay
  :clear                 remove every line, bindings stay
  :reset                 remove every line and every binding
  :export PATH [FORMAT]  write the tape as markdown, latex or plain text
  :draw EXPR|NAME        plot a function of one variable
  :quit                  leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Line(String),
    Help,
    List,
    Vars,
    Edit(usize, String),
    Delete(usize),
    Clear,
    Reset,
    Export(PathBuf, Option<String>),
    Draw(String),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `:{0}`, try :help")]
    Unknown(String),
    #[error("`:{0}` needs {1}")]
    Missing(&'static str, &'static str),
    #[error("`{0}` is not a line number")]
    BadIndex(String),
    #[error("there is no line {0}")]
    NoLine(usize),
}

#[derive(Debug, Error)]
pub enum ReplError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("cannot draw: {0}")]
    Draw(#[from] EquationError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Line numbers are shown from 1.
fn parse_index(arg: &str) -> Result<usize, CommandError> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::BadIndex(arg.to_owned())),
    }
}

fn split_arg(rest: &str) -> (&str, &str) {
    let rest = rest.trim_start();
    match rest.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (rest, ""),
    }
}

/// Anything not starting with `:` is a line for the tape.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let Some(command) = line.trim().strip_prefix(':') else {
        return Ok(Command::Line(line.to_owned()));
    };
    let (name, rest) = split_arg(command);
    Ok(match name {
        "help" | "h" => Command::Help,
        "list" | "l" => Command::List,
        "vars" => Command::Vars,
        "clear" => Command::Clear,
        "reset" => Command::Reset,
        "quit" | "q" => Command::Quit,
        "edit" => {
            let (index, text) = split_arg(rest);
            if index.is_empty() {
                return Err(CommandError::Missing("edit", "a line number and new text"));
            }
            Command::Edit(parse_index(index)?, text.to_owned())
        }
        "delete" => {
            if rest.is_empty() {
                return Err(CommandError::Missing("delete", "a line number"));
            }
            Command::Delete(parse_index(rest)?)
        }
        "export" => {
            let (path, format) = split_arg(rest);
            if path.is_empty() {
                return Err(CommandError::Missing("export", "a file name"));
            }
            let format = (!format.is_empty()).then(|| format.to_owned());
            Command::Export(PathBuf::from(path), format)
        }
        "draw" => {
            if rest.is_empty() {
                return Err(CommandError::Missing("draw", "an expression or a function name"));
            }
            Command::Draw(rest.to_owned())
        }
        _ => return Err(CommandError::Unknown(name.to_owned())),
    })
}

/// A named one-argument function, or an expression in its one free name
/// (`x` when there is none).
fn plot_target(text: &str, env: &Environment) -> Result<Function, EquationError> {
    if let Some(Value::Function(function)) = env.get(text.trim()) {
        return Ok(function.clone());
    }
    let expr = parse_expr(text)?;
    let free = expr
        .identifiers()
        .into_iter()
        .find(|id| !env.contains(id.as_str()))
        .cloned()
        .unwrap_or_else(|| Identifier::from("x"));
    let define = build_function(Identifier::from("draw"), vec![free], text, env)?;
    Ok(Function::User(Arc::new(define)))
}

/// How a record is printed on the tape.
pub fn show(equation: &Equation, details: bool) -> String {
    match equation.output().error() {
        Some(err) if details => format!("{equation} ({err})"),
        _ => equation.to_string(),
    }
}

pub enum Flow {
    Continue,
    Quit,
}

/// One interactive session: a history and the settings it is shown with.
pub struct Session {
    history: History,
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session {
            history: History::new(),
            config,
        }
    }

    #[cfg(test)]
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn submit(&mut self, line: &str) -> String {
        let details = self.config.show_error_details;
        show(self.history.submit(line), details)
    }

    pub fn export(&self, path: &Path, format: Option<Format>) -> Result<(), ExportError> {
        let options = self.config.export_options(path, format);
        export_to_path(self.history.equations(), &options, path)
    }

    fn numbered(&self, index: usize, equation: &Equation) -> String {
        format!("[{}] {}", index + 1, show(equation, self.config.show_error_details))
    }

    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> Result<Flow, ReplError> {
        match command {
            Command::Line(line) => {
                let index = self.history.len();
                self.history.submit(line);
                if let Some(equation) = self.history.get(index) {
                    writeln!(out, "{}", self.numbered(index, equation))?;
                }
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::List => {
                for (index, equation) in self.history.iter().enumerate() {
                    writeln!(out, "{}", self.numbered(index, equation))?;
                }
            }
            Command::Vars => {
                for (name, value) in self.history.environment().iter() {
                    writeln!(out, "{name} = {value}")?;
                }
            }
            Command::Edit(index, text) => {
                self.history
                    .update(index, text)
                    .map_err(|_| CommandError::NoLine(index + 1))?;
                if let Some(equation) = self.history.get(index) {
                    writeln!(out, "{}", self.numbered(index, equation))?;
                }
            }
            Command::Delete(index) => {
                let removed = self
                    .history
                    .remove(index)
                    .map_err(|_| CommandError::NoLine(index + 1))?;
                writeln!(out, "removed {}", removed.text())?;
            }
            Command::Clear => self.history.clear(),
            Command::Reset => self.history.reset(),
            Command::Export(path, format) => {
                let format = format.map(|f| f.parse::<Format>()).transpose()?;
                self.export(&path, format)?;
                writeln!(out, "wrote {}", path.display())?;
            }
            Command::Draw(text) => {
                let function = plot_target(&text, self.history.environment())?;
                let plot = draw(&function, &self.config.draw)
                    .map_err(|err| ReplError::Draw(err.into()))?;
                write!(out, "{plot}")?;
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

/// Reads commands until `:quit` or the end of input. Failed commands are
/// reported on `err` and the session goes on.
pub fn run(
    session: &mut Session,
    input: impl BufRead,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let result = parse_command(&line)
            .map_err(ReplError::from)
            .and_then(|command| session.execute(command, out));
        match result {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(ReplError::Io(e)) => return Err(e),
            Err(e) => {
                tracing::debug!(line = %line, error = %e, "command failed");
                writeln!(err, "{e}")?;
            }
        }
        out.flush()?;
    }
    Ok(())
}
