//! # Parser - Tokens to Schema Records
//!
//! This module turns a comment-stripped token list into nested schema
//! records (`serde_json::Value` objects).
//!
//! ## Collect, Don't Throw
//!
//! Parsing never stops at the first problem. Every complaint is recorded
//! against the offending token while the pass keeps going, so one parse
//! reports every problem in the document:
//!
//! ```text
//! tokens ──▶ TokenCursor ──▶ grammar::root ──▶ { entities, scenarios }
//!                 │
//!                 └──▶ Reported ──▶ Token.errors
//! ```
//!
//! ## Module Structure
//!
//! - [`cursor`] - Sequential token view with put-off buffer and block capture
//! - [`builder`] - Record accumulation for one directive
//! - [`grammar`] - One parser per directive
//!
//! ## Public API
//!
//! ```
//! use apidsl_syntax::parse_document;
//!
//! let document = parse_document("blog.api", "entity Article {}");
//! assert_eq!(document.schema["entities"][0]["name"], "Article");
//! assert!(!document.has_errors());
//! ```

pub mod builder;
pub mod cursor;

mod grammar;

use serde_json::Value;

use crate::scanner::scan;
use crate::token::{Diagnostic, Token, strip_line_comments};
use cursor::{Reported, TokenCursor};

pub use grammar::classify;
pub use grammar::path_parameters;

/// Parse tokens into the root record `{ entities, scenarios }`.
///
/// Line comments must already be stripped. Diagnostics end up in the
/// `errors` list of the tokens they concern.
pub fn parse(tokens: &mut [Token]) -> Value {
    let mut reported = Reported::new();
    let root = {
        let mut cursor = TokenCursor::new(tokens, &mut reported);
        grammar::root(&mut cursor)
    };
    for (index, diagnostic) in reported {
        tokens[index].errors.push(diagnostic);
    }
    root
}

/// A scanned and parsed source.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: String,
    pub tokens: Vec<Token>,
    pub schema: Value,
}

impl Document {
    /// Every diagnostic attached to the document's tokens, in token order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.tokens.iter().flat_map(|t| t.errors.iter())
    }

    pub fn has_errors(&self) -> bool {
        self.tokens.iter().any(Token::has_errors)
    }
}

/// Scan, strip line comments and parse.
pub fn parse_document(uri: &str, text: &str) -> Document {
    let mut tokens = strip_line_comments(scan(uri, text));
    let schema = parse(&mut tokens);
    Document {
        uri: uri.to_string(),
        tokens,
        schema,
    }
}
