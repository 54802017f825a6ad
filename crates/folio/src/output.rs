//! Terminal output for the CLI.

use std::fmt::Display;
use std::path::Path;

use console::{Style, Term};

/// Styled status messages on stderr and plain data on stdout.
///
/// Results (`folio export` paths, `folio toc` JSON) go to stdout so they can
/// be piped into other tools while progress messages still reach the terminal.
pub(crate) struct Output {
    status: Term,
    data: Term,
    ok: Style,
    failure: Style,
    heading: Style,
    label: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            status: Term::stderr(),
            data: Term::stdout(),
            ok: Style::new().green(),
            failure: Style::new().red(),
            heading: Style::new().cyan().bold(),
            label: Style::new().dim(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        self.status_line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.status_line(self.ok.apply_to(msg));
    }

    pub(crate) fn error(&self, msg: &str) {
        self.status_line(self.failure.apply_to(msg));
    }

    pub(crate) fn heading(&self, msg: &str) {
        self.status_line(self.heading.apply_to(msg));
    }

    /// Print `label` in a fixed-width dim column followed by a path.
    pub(crate) fn path(&self, label: &str, path: &Path) {
        let label = format!("{label:>6}");
        self.status_line(format!("{} {}", self.label.apply_to(label), path.display()));
    }

    /// Write a result line to stdout.
    pub(crate) fn data(&self, text: &str) -> std::io::Result<()> {
        self.data.write_line(text)
    }

    fn status_line(&self, line: impl Display) {
        // Write errors on stderr are ignored.
        let _ = self.status.write_line(&line.to_string());
    }
}
