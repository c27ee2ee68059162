//! Compiled, immutable filter predicate
//!
//! A [`Matcher`] wraps the parsed expression together with its source text.
//! Matchers are never mutated after compilation; the monitor swaps the
//! active matcher atomically, so readers always observe either the old or
//! the new predicate in full.

use super::error::FilterError;
use super::parser::{self, Expr};

/// Compiled filter expression exposing a text-match predicate
#[derive(Debug, Clone)]
pub struct Matcher {
    source: String,
    /// `None` for the empty expression, which matches everything
    ast: Option<Expr>,
}

impl Matcher {
    /// Compile a filter expression
    ///
    /// The empty (or all-whitespace) expression compiles to an always-true
    /// matcher. The only failure mode is an invalid `/regex/` leaf; unknown
    /// call forms fall through to literal matching (see the module docs).
    pub fn compile(source: &str) -> Result<Self, FilterError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Ok(Self::match_all());
        }
        let ast = parser::parse(trimmed)?;
        Ok(Self {
            source: trimmed.to_string(),
            ast: Some(ast),
        })
    }

    /// The matcher that accepts every frame
    pub fn match_all() -> Self {
        Self {
            source: String::new(),
            ast: None,
        }
    }

    /// Evaluate the predicate against decoded frame text
    pub fn matches(&self, text: &str) -> bool {
        match &self.ast {
            Some(expr) => expr.matches(text),
            None => true,
        }
    }

    /// The original expression string this matcher was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_expression_matches_everything() {
        let m = Matcher::compile("").unwrap();
        assert!(m.matches(""));
        assert!(m.matches("anything at all"));
        assert_eq!(m.source(), "");

        let m = Matcher::compile("   ").unwrap();
        assert!(m.matches("whitespace-only source too"));
    }

    #[test]
    fn test_source_is_trimmed_original_text() {
        let m = Matcher::compile(r#"  AND("a","b")  "#).unwrap();
        assert_eq!(m.source(), r#"AND("a","b")"#);
    }

    #[test]
    fn test_compile_error_reports_pattern() {
        let err = Matcher::compile("/(/").unwrap_err();
        let FilterError::InvalidRegex { pattern, .. } = err;
        assert_eq!(pattern, "(");
    }

    proptest! {
        /// Escaping makes any quoted text match itself, metacharacters included
        #[test]
        fn quoted_literal_matches_itself(text in "[ -~&&[^\"/,()]]{1,24}") {
            let trimmed = text.trim();
            prop_assume!(!trimmed.is_empty());
            let m = Matcher::compile(&format!("\"{text}\"")).unwrap();
            let probed = format!("prefix {text} suffix");
            prop_assert!(m.matches(&probed));
        }

        /// NOT is an involution for any literal condition
        #[test]
        fn double_negation(text in "[a-zA-Z0-9 ]{1,16}", probe in "[a-zA-Z0-9 ]{0,32}") {
            let trimmed = text.trim();
            prop_assume!(!trimmed.is_empty());
            let plain = Matcher::compile(&format!("\"{text}\"")).unwrap();
            let doubled = Matcher::compile(&format!("NOT(NOT(\"{text}\"))")).unwrap();
            prop_assert_eq!(plain.matches(&probe), doubled.matches(&probe));
        }
    }
}
