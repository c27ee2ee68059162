//! Recursive-descent parser for the boolean filter language
//!
//! Call forms (`AND(...)`, `OR(...)`, `NOT(...)`) are recognized by a
//! case-insensitive prefix plus a closing parenthesis; their interior is
//! split into top-level arguments by scanning with a parenthesis depth
//! counter, so commas inside nested calls or quoted text that happens to
//! contain parentheses do not split. Anything that is not a recognized call
//! form is a leaf condition.

use super::error::FilterError;
use regex::{Regex, RegexBuilder};

/// A compiled filter expression node
///
/// Leaves carry their compiled case-insensitive regex alongside the source
/// text; combinators hold their children in written order and evaluate with
/// left-to-right short-circuiting.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Plain substring condition (regex metacharacters escaped)
    Literal { text: String, re: Regex },
    /// Slash-delimited regex condition
    Pattern { source: String, re: Regex },
    /// All children must match
    And(Vec<Expr>),
    /// At least one child must match
    Or(Vec<Expr>),
    /// Single-child negation
    Not(Box<Expr>),
}

impl Expr {
    /// Evaluate this expression against decoded frame text
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Expr::Literal { re, .. } | Expr::Pattern { re, .. } => re.is_match(text),
            Expr::And(children) => children.iter().all(|c| c.matches(text)),
            Expr::Or(children) => children.iter().any(|c| c.matches(text)),
            Expr::Not(child) => !child.matches(text),
        }
    }
}

/// Parse a non-empty filter expression into an AST
pub fn parse(expr: &str) -> Result<Expr, FilterError> {
    let expr = expr.trim();

    if let Some(inner) = call_interior(expr, "AND(") {
        let children = split_top_level(inner)
            .into_iter()
            .map(parse)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Expr::And(children));
    }
    if let Some(inner) = call_interior(expr, "OR(") {
        let children = split_top_level(inner)
            .into_iter()
            .map(parse)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Expr::Or(children));
    }
    if let Some(inner) = call_interior(expr, "NOT(") {
        return Ok(Expr::Not(Box::new(parse(inner)?)));
    }

    parse_condition(expr)
}

/// Slice out the interior of a call form, or `None` if `expr` is not one
///
/// The prefix check is ASCII case-insensitive; the interior runs up to the
/// final `)`. Expressions missing the closing parenthesis are not call
/// forms and fall through to condition parsing.
fn call_interior<'a>(expr: &'a str, prefix: &str) -> Option<&'a str> {
    if expr.len() > prefix.len()
        && expr.is_char_boundary(prefix.len())
        && expr[..prefix.len()].eq_ignore_ascii_case(prefix)
        && expr.ends_with(')')
    {
        Some(&expr[prefix.len()..expr.len() - 1])
    } else {
        None
    }
}

/// Split call-form interior text on commas at top level
///
/// A comma separates arguments only at parenthesis depth zero and outside
/// quoted or slash-delimited segments, so `AND("a,b","c")` has exactly two
/// arguments and `/a{1,2}/` stays one. A slash only opens a regex segment
/// when a closing slash follows, so an unpaired `/` in bare text
/// (`AND(a/b,c)`) does not suppress separators. A trailing empty argument
/// is dropped; interior empty arguments are kept (they compile to empty
/// literals, which match everything).
fn split_top_level(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut in_slashes = false;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        match c {
            '"' if !in_slashes => in_quotes = !in_quotes,
            '/' if !in_quotes => {
                if in_slashes {
                    in_slashes = false;
                } else if inner[i + 1..].contains('/') {
                    in_slashes = true;
                }
            }
            _ if in_quotes || in_slashes => {}
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < inner.len() {
        parts.push(&inner[start..]);
    }

    parts
}

/// Parse a leaf condition into a compiled case-insensitive regex node
fn parse_condition(cond: &str) -> Result<Expr, FilterError> {
    let cond = cond.trim();

    // Slash-delimited text is a raw regex pattern
    if cond.len() >= 2 && cond.starts_with('/') && cond.ends_with('/') {
        let pattern = &cond[1..cond.len() - 1];
        let re = build_regex(pattern)?;
        return Ok(Expr::Pattern {
            source: pattern.to_string(),
            re,
        });
    }

    // Quoted text is a literal; the quotes are stripped
    let text = if cond.len() >= 2 && cond.starts_with('"') && cond.ends_with('"') {
        &cond[1..cond.len() - 1]
    } else {
        cond
    };
    let re = build_regex(&regex::escape(text))?;
    Ok(Expr::Literal {
        text: text.to_string(),
        re,
    })
}

fn build_regex(pattern: &str) -> Result<Regex, FilterError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| FilterError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_requires_all() {
        let expr = parse(r#"AND("0x","111")"#).unwrap();
        assert!(expr.matches("0x111"));
        assert!(expr.matches("111 at 0x20"));
        assert!(!expr.matches("0x55"));
        assert!(!expr.matches("111"));
    }

    #[test]
    fn test_or_requires_any() {
        let expr = parse(r#"OR("ERR","WARN")"#).unwrap();
        assert!(expr.matches("ERR: boom"));
        assert!(expr.matches("WARN: odd"));
        assert!(!expr.matches("INFO: fine"));
    }

    #[test]
    fn test_not_negates() {
        let expr = parse(r#"NOT("DEBUG")"#).unwrap();
        assert!(expr.matches("INFO: fine"));
        assert!(!expr.matches("DEBUG: noise"));
    }

    #[test]
    fn test_nested_expression() {
        let expr = parse(r#"AND(OR("0x","111"),NOT("DEBUG"))"#).unwrap();
        assert!(expr.matches("0x55"));
        assert!(!expr.matches("0x55 DEBUG"));
        assert!(expr.matches("111"));
        assert!(!expr.matches("no match here"));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let expr = parse(r#"and(or("a","b"),not("c"))"#).unwrap();
        assert!(expr.matches("a"));
        assert!(!expr.matches("a c"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let expr = parse(r#""error""#).unwrap();
        assert!(expr.matches("ERROR: disk full"));
        assert!(expr.matches("Error: disk full"));
    }

    #[test]
    fn test_split_respects_nesting() {
        let expr = parse(r#"AND(OR("a","b"),"c")"#).unwrap();
        match expr {
            Expr::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_split_respects_quoted_commas() {
        let expr = parse(r#"AND("a,b","c")"#).unwrap();
        match &expr {
            Expr::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
        assert!(expr.matches("a,b and c"));
        assert!(!expr.matches("a b c"));
    }

    #[test]
    fn test_split_respects_regex_commas() {
        let expr = parse(r#"AND(/a{1,2}/,"b")"#).unwrap();
        match &expr {
            Expr::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
        assert!(expr.matches("aa b"));
    }

    #[test]
    fn test_unpaired_slash_does_not_swallow_separators() {
        let expr = parse("AND(a/b,c)").unwrap();
        match &expr {
            Expr::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
        assert!(expr.matches("a/b then c"));
        assert!(!expr.matches("a/b only"));
    }

    #[test]
    fn test_regex_condition_searches() {
        let expr = parse("/^0x[0-9a-f]+$/").unwrap();
        assert!(expr.matches("0xDEADBEEF"));
        assert!(!expr.matches("hello"));
    }

    #[test]
    fn test_bare_text_is_literal() {
        // Bare text with regex metacharacters matches literally
        let expr = parse("a.b").unwrap();
        assert!(expr.matches("xa.bx"));
        assert!(!expr.matches("aXb"));
    }

    #[test]
    fn test_unknown_call_form_falls_through_to_literal() {
        let expr = parse(r#"XOR("a","b")"#).unwrap();
        assert!(matches!(expr, Expr::Literal { .. }));
        assert!(expr.matches(r#"saw XOR("a","b") in stream"#));
        assert!(!expr.matches("a"));
    }

    #[test]
    fn test_unbalanced_parens_fall_through_to_literal() {
        let expr = parse(r#"AND("a","b""#).unwrap();
        assert!(matches!(expr, Expr::Literal { .. }));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let err = parse("/[unclosed/").unwrap_err();
        assert!(err.to_string().contains("[unclosed"));
    }

    #[test]
    fn test_empty_call_interiors() {
        // AND() has no children and matches everything; OR() matches nothing
        let expr = parse("AND()").unwrap();
        assert!(expr.matches("anything"));
        let expr = parse("OR()").unwrap();
        assert!(!expr.matches("anything"));
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(split_top_level(r#""a","b""#), vec![r#""a""#, r#""b""#]);
        assert_eq!(
            split_top_level(r#"OR("a","b"),"c""#),
            vec![r#"OR("a","b")"#, r#""c""#]
        );
        assert_eq!(split_top_level(""), Vec::<&str>::new());
    }
}
