//! Parser for Make-style dependency files as emitted by gcc/clang
//! `-MMD -MF`.
//!
//! Format: `output: input1 input2 \` with backslash-newline continuation
//! and backslash-escaped spaces in paths. Parsing is deliberately
//! permissive: a stale or truncated depfile must make the command dirty,
//! never break the build, so failure is reported as `None` rather than an
//! error.

use std::path::PathBuf;

/// Returns the discovered inputs, or `None` when the content is empty or
/// not a recognizable dependency rule.
pub fn parse(content: &str) -> Option<Vec<PathBuf>> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut separator: Option<usize> = None;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                // Line continuation behaves as whitespace.
                Some('\n') => {
                    chars.next();
                    flush(&mut tokens, &mut current);
                }
                Some('\r') => {
                    chars.next();
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    flush(&mut tokens, &mut current);
                }
                // Escaped character, most commonly a space in a path.
                Some(&escaped) => {
                    chars.next();
                    current.push(escaped);
                }
                None => current.push('\\'),
            },
            // The first token-terminating colon splits targets from inputs.
            ':' if separator.is_none()
                && chars.peek().map(|n| n.is_whitespace()).unwrap_or(true) =>
            {
                flush(&mut tokens, &mut current);
                separator = Some(tokens.len());
            }
            c if c.is_whitespace() => flush(&mut tokens, &mut current),
            c => current.push(c),
        }
    }
    flush(&mut tokens, &mut current);

    let separator = separator?;
    Some(tokens[separator..].iter().map(PathBuf::from).collect())
}

fn flush(tokens: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}
