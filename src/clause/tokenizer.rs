//! Parenthesis-aware scanning over clause text.
//!
//! Clauses nest freely: a condition may contain a selector whose filter
//! contains another condition. All splitting and operator scanning here
//! tracks a single parenthesis depth so that operators inside a nested
//! selector (`c(f:Suit=Red)`) never leak into the enclosing clause.

use serde::{Deserialize, Serialize};

use super::error::ClauseError;

/// Comparison operator between two getter values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl CompareOp {
    /// The clause-text spelling of this operator.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "!=",
            CompareOp::Greater => ">",
            CompareOp::GreaterOrEqual => ">=",
            CompareOp::Less => "<",
            CompareOp::LessOrEqual => "<=",
        }
    }

    /// Apply this operator to a pair of ordered values.
    #[must_use]
    pub fn compare<T: PartialOrd>(self, left: &T, right: &T) -> bool {
        match self {
            CompareOp::Equal => left == right,
            CompareOp::NotEqual => left != right,
            CompareOp::Greater => left > right,
            CompareOp::GreaterOrEqual => left >= right,
            CompareOp::Less => left < right,
            CompareOp::LessOrEqual => left <= right,
        }
    }
}

/// Check that parentheses balance.
#[must_use]
pub fn balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Split on a delimiter at parenthesis depth zero.
///
/// Fragments are trimmed. Empty fragments are kept so callers can
/// report arity errors precisely.
pub fn split_top_level(text: &str, delim: char) -> Result<Vec<&str>, ClauseError> {
    if !balanced(text) {
        return Err(ClauseError::UnbalancedParens(text.to_string()));
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == delim && depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    Ok(parts)
}

/// Split a comma-separated argument list at depth zero.
pub fn split_args(text: &str) -> Result<Vec<&str>, ClauseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(trimmed, ',')
}

/// Split semicolon-separated command statements, dropping empties.
pub fn split_statements(text: &str) -> Result<Vec<&str>, ClauseError> {
    Ok(split_top_level(text, ';')?
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect())
}

/// Check whether one parenthesis pair wraps the entire text.
#[must_use]
pub fn is_wrapped(text: &str) -> bool {
    let text = text.trim();
    if !text.starts_with('(') || !text.ends_with(')') {
        return false;
    }
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                // The opening paren must not close before the end.
                if depth == 0 && i != text.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Strip one fully-wrapping parenthesis pair, if present.
#[must_use]
pub fn strip_parens(text: &str) -> &str {
    let mut text = text.trim();
    while is_wrapped(text) {
        text = text[1..text.len() - 1].trim();
    }
    text
}

/// Find the first comparison operator outside any parentheses.
///
/// Returns `(byte_index, op, symbol_len)`. A `!` only counts when
/// followed by `=`; a standalone `!` is a negation and belongs to the
/// condition parser.
#[must_use]
pub fn find_comparison(text: &str) -> Option<(usize, CompareOp, usize)> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b'>' if depth == 0 => {
                return if bytes.get(i + 1) == Some(&b'=') {
                    Some((i, CompareOp::GreaterOrEqual, 2))
                } else {
                    Some((i, CompareOp::Greater, 1))
                };
            }
            b'<' if depth == 0 => {
                return if bytes.get(i + 1) == Some(&b'=') {
                    Some((i, CompareOp::LessOrEqual, 2))
                } else {
                    Some((i, CompareOp::Less, 1))
                };
            }
            b'!' if depth == 0 && bytes.get(i + 1) == Some(&b'=') => {
                return Some((i, CompareOp::NotEqual, 2));
            }
            b'=' if depth == 0 => return Some((i, CompareOp::Equal, 1)),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Find the first top-level logical connector (`&` or `|`).
#[must_use]
pub fn find_logical(text: &str) -> Option<(usize, char)> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '&' | '|' if depth == 0 => return Some((i, c)),
            _ => {}
        }
    }
    None
}

/// Split `Verb(args)` into the verb and the raw argument text.
///
/// A verb without parentheses gets an empty argument string.
pub fn split_call(text: &str) -> Result<(&str, &str), ClauseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ClauseError::Empty);
    }
    if !balanced(text) {
        return Err(ClauseError::UnbalancedParens(text.to_string()));
    }
    match text.find('(') {
        Some(open) => {
            if !text.ends_with(')') {
                return Err(ClauseError::UnbalancedParens(text.to_string()));
            }
            let verb = text[..open].trim();
            let args = &text[open + 1..text.len() - 1];
            Ok((verb, args))
        }
        None => Ok((text, "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced() {
        assert!(balanced("c(z:Deck,x:1)"));
        assert!(balanced(""));
        assert!(!balanced("c(z:Deck"));
        assert!(!balanced(")("));
    }

    #[test]
    fn test_split_args_nested() {
        let parts = split_args("c(z:Deck,x:1), z:Hand").unwrap();
        assert_eq!(parts, vec!["c(z:Deck,x:1)", "z:Hand"]);
    }

    #[test]
    fn test_split_args_empty() {
        assert!(split_args("").unwrap().is_empty());
        assert!(split_args("   ").unwrap().is_empty());
    }

    #[test]
    fn test_split_args_unbalanced() {
        assert!(matches!(
            split_args("c(z:Deck"),
            Err(ClauseError::UnbalancedParens(_))
        ));
    }

    #[test]
    fn test_split_statements() {
        let stmts = split_statements("EndCurrentPhase; SendMessage(hi);").unwrap();
        assert_eq!(stmts, vec!["EndCurrentPhase", "SendMessage(hi)"]);
    }

    #[test]
    fn test_find_comparison_skips_selector_parens() {
        // The `=` inside c(...) must not be found.
        let (idx, op, len) = find_comparison("c(f:Suit=Red)!=x").unwrap();
        assert_eq!(op, CompareOp::NotEqual);
        assert_eq!(&"c(f:Suit=Red)!=x"[idx..idx + len], "!=");
    }

    #[test]
    fn test_find_comparison_two_char_first() {
        let (_, op, len) = find_comparison("a>=b").unwrap();
        assert_eq!(op, CompareOp::GreaterOrEqual);
        assert_eq!(len, 2);
    }

    #[test]
    fn test_find_comparison_bang_without_equal() {
        // A lone `!` is negation, not a comparison.
        assert!(find_comparison("!abc").is_none());
    }

    #[test]
    fn test_find_logical() {
        assert_eq!(find_logical("a=1&b=2"), Some((3, '&')));
        assert_eq!(find_logical("c(t:A&B)=x|y=2"), Some((10, '|')));
        assert_eq!(find_logical("a=1"), None);
    }

    #[test]
    fn test_is_wrapped() {
        assert!(is_wrapped("(a=1)"));
        assert!(!is_wrapped("(a=1)&(b=2)"));
        assert!(!is_wrapped("a=1"));
    }

    #[test]
    fn test_strip_parens() {
        assert_eq!(strip_parens("((a=1))"), "a=1");
        assert_eq!(strip_parens("(a)&(b)"), "(a)&(b)");
    }

    #[test]
    fn test_split_call() {
        assert_eq!(split_call("UseAction(draw)").unwrap(), ("UseAction", "draw"));
        assert_eq!(split_call("EndCurrentPhase").unwrap(), ("EndCurrentPhase", ""));
        assert!(split_call("Broken(arg").is_err());
    }
}
