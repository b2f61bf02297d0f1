use crate::ast::{Snippet, SourceMap};
use super::{Diagnostic, Severity};

pub struct AnsiRenderer {
    pub use_color: bool,
}

impl AnsiRenderer {
    fn bold(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1m{s}\x1b[0m") } else { s.to_string() }
    }

    fn bold_red(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[1;31m{s}\x1b[0m") } else { s.to_string() }
    }

    fn cyan(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[36m{s}\x1b[0m") } else { s.to_string() }
    }

    fn dim(&self, s: &str) -> String {
        if self.use_color { format!("\x1b[2m{s}\x1b[0m") } else { s.to_string() }
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let mut out = String::new();

        let severity = match d.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let header = match d.code {
            Some(code) => format!("{severity}[{code}]"),
            None => severity.to_string(),
        };
        let header = match d.severity {
            Severity::Error => self.bold_red(&header),
            Severity::Warning => self.bold(&self.cyan(&header)),
        };
        out.push_str(&format!("{}: {}\n", header, self.bold(&d.message)));

        let primary = d.labels.iter().find(|l| l.is_primary);
        if let (Some(label), Some(source)) = (primary, &d.source) {
            let Snippet { line, column, text, width } =
                SourceMap::new(source).snippet(label.span.start, label.span.end);

            out.push_str(&format!("  {} {}:{}\n", self.cyan("-->"), line, column));

            let gutter = line.to_string().len();
            let pipe = self.cyan("|");
            let pad = " ".repeat(gutter);

            out.push_str(&format!("{pad} {pipe}\n"));

            let line_num = self.cyan(&format!("{line:>gutter$}"));
            out.push_str(&format!("{line_num} {pipe} {text}\n"));

            let carets = self.bold_red(&"^".repeat(width));
            let indent = " ".repeat(column - 1);
            if label.message.is_empty() {
                out.push_str(&format!("{pad} {pipe} {indent}{carets}\n"));
            } else {
                out.push_str(&format!("{pad} {pipe} {indent}{carets} {}\n",
                    self.bold_red(&label.message)));
            }

            out.push_str(&format!("{pad} {pipe}\n"));
        }

        for note in &d.notes {
            out.push_str(&format!("  {} note: {}\n", self.dim("="), note));
        }

        if let Some(suggestion) = &d.suggestion {
            out.push_str(&format!("  {} suggestion: {}\n", self.dim("="), suggestion));
        }

        out
    }
}
