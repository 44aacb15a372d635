//! Writing a history out as a document.
//!
//! Comment records become prose and equations become `text = value`
//! lines. Assignments and blank records are left out of every format.

use std::{
    fmt::{self, Display, Formatter},
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::equation::{Equation, Kind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Markdown,
    Latex,
    Plain,
}

impl Format {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::Latex => "latex",
            Format::Plain => "plain",
        }
    }

    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        path.extension()?.to_str()?.parse().ok()
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Format {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Format::Markdown),
            "latex" | "tex" => Ok(Format::Latex),
            "plain" | "text" | "txt" => Ok(Format::Plain),
            _ => Err(ExportError::UnknownFormat(s.to_owned())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unknown export format `{0}` (expected markdown, latex or plain)")]
    UnknownFormat(String),
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportOptions {
    pub format: Format,
    pub title: Option<String>,
    pub comment: Option<String>,
}

impl ExportOptions {
    pub fn new(format: Format) -> Self {
        ExportOptions {
            format,
            ..Default::default()
        }
    }
}

fn exported<'a>(equations: &'a [Equation]) -> impl Iterator<Item = &'a Equation> {
    equations
        .iter()
        .filter(|e| matches!(e.kind(), Kind::Comment | Kind::Equation))
}

fn code_span(text: &str) -> String {
    if text.contains('`') {
        format!("`` {text} ``")
    } else {
        format!("`{text}`")
    }
}

fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '{' | '}' | '$' | '&' | '#' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            '^' => out.push_str(r"\^{}"),
            '~' => out.push_str(r"\~{}"),
            '<' => out.push_str(r"\textless{}"),
            '>' => out.push_str(r"\textgreater{}"),
            _ => out.push(c),
        }
    }
    out
}

fn render_plain(
    equations: &[Equation],
    options: &ExportOptions,
    f: &mut Formatter,
) -> fmt::Result {
    for heading in [&options.title, &options.comment].into_iter().flatten() {
        writeln!(f, "{heading}\n")?;
    }
    for equation in exported(equations) {
        match equation.comment() {
            Some(comment) => writeln!(f, "{comment}")?,
            None => writeln!(f, "{} = {}", equation.text().trim(), equation.output())?,
        }
    }
    Ok(())
}

fn render_markdown(
    equations: &[Equation],
    options: &ExportOptions,
    f: &mut Formatter,
) -> fmt::Result {
    if let Some(title) = &options.title {
        writeln!(f, "# {title}\n")?;
    }
    if let Some(comment) = &options.comment {
        writeln!(f, "{comment}\n")?;
    }
    for equation in exported(equations) {
        match equation.comment() {
            Some(comment) => writeln!(f, "{comment}\n")?,
            None => writeln!(
                f,
                "{} = {}\n",
                code_span(equation.text().trim()),
                equation.output()
            )?,
        }
    }
    Ok(())
}

fn render_latex(
    equations: &[Equation],
    options: &ExportOptions,
    f: &mut Formatter,
) -> fmt::Result {
    f.write_str("\\documentclass{article}\n\\begin{document}\n\n")?;
    if let Some(title) = &options.title {
        writeln!(f, "\\section*{{{}}}\n", escape_latex(title))?;
    }
    if let Some(comment) = &options.comment {
        writeln!(f, "{}\n", escape_latex(comment))?;
    }
    for equation in exported(equations) {
        match equation.comment() {
            Some(comment) => writeln!(f, "{}\n", escape_latex(comment))?,
            None => writeln!(
                f,
                "\\noindent\\texttt{{{}}} = {}\n",
                escape_latex(equation.text().trim()),
                escape_latex(&equation.output().to_string())
            )?,
        }
    }
    f.write_str("\\end{document}\n")
}

/// The records and options of one export, formatted on demand.
struct Document<'a> {
    equations: &'a [Equation],
    options: &'a ExportOptions,
}

impl Display for Document<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.options.format {
            Format::Plain => render_plain(self.equations, self.options, f),
            Format::Markdown => render_markdown(self.equations, self.options, f),
            Format::Latex => render_latex(self.equations, self.options, f),
        }
    }
}

/// Renders the whole document in memory.
pub fn render(equations: &[Equation], options: &ExportOptions) -> String {
    let mut out = Document { equations, options }.to_string();
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

pub fn write_to(
    equations: &[Equation],
    options: &ExportOptions,
    mut writer: impl Write,
) -> Result<(), ExportError> {
    writer.write_all(render(equations, options).as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn export_to_path(
    equations: &[Equation],
    options: &ExportOptions,
    path: &Path,
) -> Result<(), ExportError> {
    let write = || -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(render(equations, options).as_bytes())?;
        writer.flush()
    };
    write().map_err(|source| ExportError::Write {
        path: path.to_owned(),
        source,
    })?;
    tracing::debug!(path = %path.display(), format = %options.format, "exported history");
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::History;

    fn history() -> History {
        let mut history = History::new();
        for line in ["# Section 1", "2+2", "r:=10", "r*2", "", "1/0"] {
            history.submit(line);
        }
        history
    }

    #[test]
    fn plain_text() {
        let options = ExportOptions {
            format: Format::Plain,
            title: Some("Homework".into()),
            comment: None,
        };
        assert_eq!(
            render(history().equations(), &options),
            "Homework\n\nSection 1\n2+2 = 4\nr*2 = 20\n1/0 = error\n"
        );
    }

    #[test]
    fn markdown() {
        let options = ExportOptions {
            format: Format::Markdown,
            title: Some("Homework".into()),
            comment: Some("Chapter two".into()),
        };
        assert_eq!(
            render(history().equations(), &options),
            "# Homework\n\nChapter two\n\nSection 1\n\n`2+2` = 4\n\n`r*2` = 20\n\n`1/0` = error\n"
        );
    }

    #[test]
    fn latex_escapes_specials() {
        let mut history = History::new();
        history.submit("# 50% of a_1 & more");
        history.submit("2^3");
        let rendered = render(history.equations(), &ExportOptions::new(Format::Latex));
        assert!(rendered.starts_with("\\documentclass{article}\n\\begin{document}\n"));
        assert!(rendered.contains("50\\% of a\\_1 \\& more\n"));
        assert!(rendered.contains("\\noindent\\texttt{2\\^{}3} = 8\n"));
        assert!(rendered.ends_with("\\end{document}\n"));
    }

    #[test]
    fn empty_history() {
        assert_eq!(render(&[], &ExportOptions::new(Format::Plain)), "\n");
    }

    #[test]
    fn write_errors_reach_the_caller() {
        struct Full;

        impl fmt::Write for Full {
            fn write_str(&mut self, _: &str) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        let history = history();
        for format in [Format::Plain, Format::Markdown, Format::Latex] {
            let options = ExportOptions::new(format);
            let document = Document {
                equations: history.equations(),
                options: &options,
            };
            assert_eq!(fmt::write(&mut Full, format_args!("{document}")), Err(fmt::Error));
        }
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("MD".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!("tex".parse::<Format>().unwrap(), Format::Latex);
        assert_eq!("text".parse::<Format>().unwrap(), Format::Plain);
        assert!(matches!(
            "docx".parse::<Format>(),
            Err(ExportError::UnknownFormat(_))
        ));
        assert_eq!(Format::from_path(Path::new("out.md")), Some(Format::Markdown));
        assert_eq!(Format::from_path(Path::new("out")), None);
    }

    #[test]
    fn writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        export_to_path(
            history().equations(),
            &ExportOptions::new(Format::Plain),
            &path,
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Section 1\n2+2 = 4\nr*2 = 20\n1/0 = error\n"
        );

        let missing = dir.path().join("no/such/dir/history.txt");
        let err = export_to_path(history().equations(), &ExportOptions::default(), &missing)
            .unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
    }

    #[test]
    fn write_to_any_writer() {
        let mut buffer = Vec::new();
        write_to(history().equations(), &ExportOptions::new(Format::Plain), &mut buffer).unwrap();
        assert!(String::from_utf8(buffer).unwrap().starts_with("Section 1\n"));
    }
}
