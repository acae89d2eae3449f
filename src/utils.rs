use crate::error::ContractError;
use std::fmt::{self, Write};

/// Renders `err` as a compact plain-text report against `source`:
///
/// ```text
/// [TypeError]: Cannot find symbol Uuid in scope
///   -> user.contract:2:3
///    |
///  2 |  Uuid id
///    |  ^^^^
///    |
/// ```
///
/// Tabs are shown as four spaces. The underline spans the error when it sits
/// on one line and is a single caret otherwise.
pub fn format_error(err: &ContractError, source: &str) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, err, source);
    out
}

fn write_report(out: &mut String, err: &ContractError, source: &str) -> fmt::Result {
    let span = &err.span;
    writeln!(out, "[{}]: {}", err.name(), err.message)?;
    writeln!(out, "  -> {}:{}:{}", span.file, span.start.line, span.start.column)?;
    writeln!(out, "   |")?;

    let Some(raw_line) = source_line(source, span.start.line) else {
        return Ok(());
    };

    let display_line = raw_line.replace('\t', "    ");
    writeln!(out, "{:>2} |  {}", span.start.line, display_line)?;

    let padding: String = raw_line
        .chars()
        .take(span.start.column.saturating_sub(1))
        .map(|c| if c == '\t' { "    " } else { " " })
        .collect();

    let length = if span.end.line == span.start.line {
        span.end.column.saturating_sub(span.start.column).max(1)
    } else {
        1
    };
    writeln!(out, "   |  {}{}", padding, "^".repeat(length))?;
    writeln!(out, "   |")
}

/// The 1-based `line` of `source`, without its line terminator.
fn source_line(source: &str, line: usize) -> Option<&str> {
    let index = line.checked_sub(1)?;
    source
        .split('\n')
        .nth(index)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
}
