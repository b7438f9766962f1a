//! Normalisation of the server's escaped console text.
//!
//! The dedicated server escapes whitespace inside console output: a logical
//! line break arrives as the two characters `\n`, a tab as `\t`, and a
//! leading space as `\u0020`. One physical socket line may therefore carry
//! several logical lines.

/// Escape token for a space.
pub const SPACE_TOKEN: &str = "\\u0020";
/// Escape token for a tab.
pub const TAB_TOKEN: &str = "\\t";
/// Escape token for a line break.
pub const NEWLINE_TOKEN: &str = "\\n";

const PROMPT_PREFIX: &str = "<consoleN>";

/// Replaces every escape token with its literal character.
///
/// The replacement characters never form a new token, so applying `clean`
/// twice yields the same text as applying it once.
#[must_use]
pub fn clean(raw: &str) -> String {
    raw.replace(SPACE_TOKEN, " ")
        .replace(TAB_TOKEN, "\t")
        .replace(NEWLINE_TOKEN, "\n")
}

/// Removes the physical line terminator (`\n` or `\r\n`) from a socket line.
#[must_use]
pub fn strip_terminator(raw: &str) -> &str {
    let without_lf = raw.strip_suffix('\n').unwrap_or(raw);
    without_lf.strip_suffix('\r').unwrap_or(without_lf)
}

/// Splits normalised text into logical lines.
///
/// A terminal escaped newline leaves an empty final segment, which is not a
/// line of its own and is dropped.
pub fn logical_lines(normalized: &str) -> impl Iterator<Item = &str> {
    let body = normalized.strip_suffix('\n').unwrap_or(normalized);
    let empty = body.is_empty() && normalized.is_empty();
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(move |_| !empty)
}

/// Reports whether a line is the console prompt echoed after each command.
#[must_use]
pub fn is_prompt(line: &str) -> bool {
    line.starts_with(PROMPT_PREFIX)
}
