//! Colored terminal output.

use console::{Style, Term};

/// Width of the rule printed around the publish summary.
const RULE_WIDTH: usize = 70;

/// Line-oriented writer with a few fixed styles. Write errors are ignored.
pub(crate) struct Output {
    term: Term,
}

impl Output {
    /// Status output on stderr.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    /// Command results on stdout, so they can be piped.
    #[must_use]
    pub(crate) fn stdout() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    fn line(&self, style: Option<Style>, msg: &str) {
        let _ = match style {
            Some(style) => self.term.write_line(&style.apply_to(msg).to_string()),
            None => self.term.write_line(msg),
        };
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(None, msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(Some(Style::new().green()), msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(Some(Style::new().yellow()), msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(Some(Style::new().red()), msg);
    }

    pub(crate) fn highlight(&self, msg: &str) {
        self.line(Some(Style::new().cyan().bold()), msg);
    }

    pub(crate) fn rule(&self) {
        self.line(Some(Style::new().dim()), &"=".repeat(RULE_WIDTH));
    }
}
