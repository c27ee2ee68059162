//! Filter expression compilation and matching
//!
//! Frames are filtered through a small boolean expression language before
//! they are written to the log. An expression is compiled once into an
//! immutable [`Matcher`]; updating the active filter replaces the matcher
//! wholesale, which is what makes runtime swaps race-free.
//!
//! # Syntax
//!
//! ```text
//! expr      := AND(expr, expr, ...) | OR(expr, expr, ...) | NOT(expr) | condition
//! condition := "literal text" | /regex pattern/ | bare text
//! ```
//!
//! Keywords are case-insensitive. All leaf conditions are case-insensitive
//! *search* operations against the decoded frame text: quoted and bare text
//! match as plain substrings (regex metacharacters are escaped), while
//! slash-delimited text is a full regex pattern. The empty expression
//! matches every frame.
//!
//! # Examples
//!
//! ```text
//! AND("0x","111")                 # contains both 0x and 111
//! OR("ERR","WARN")                # contains ERR or WARN
//! NOT("DEBUG")                    # does not contain DEBUG
//! AND(OR("0x","111"),NOT(/dbg/))  # nesting works
//! ```
//!
//! # Fall-through
//!
//! Unknown call forms (`XOR(...)`) and expressions with unbalanced
//! parentheses are not rejected; they fall through to literal substring
//! matching on the raw text. This mirrors long-standing operator-visible
//! behavior and is intentional. The only compile failure is an invalid
//! regex inside `/.../`.

pub mod error;
pub mod matcher;
pub mod parser;

pub use error::FilterError;
pub use matcher::Matcher;
pub use parser::Expr;
