//! Sequential view over a token slice.
//!
//! A [`TokenCursor`] never owns tokens and never mutates them. Complaints are
//! recorded as `(token index, Diagnostic)` pairs in a sink shared by every
//! cursor of one pass, and attached to the tokens once parsing is done.
//!
//! ## Blocks
//!
//! [`TokenCursor::capture_block`] consumes a balanced `{ ... }` run and hands
//! back a sub-cursor over its interior. Nested braces are tracked by depth, so
//! inner blocks stay intact for the nested directive parser:
//!
//! ```text
//! { field a: * { schema { ... } } }   ← outer cursor consumes all of it
//!   └─────────── sub-cursor ──────┘
//! ```
//!
//! ## Put-off Tokens
//!
//! Descriptions and annotations precede the directive they belong to. The
//! directive loop moves them into a side buffer with [`TokenCursor::put_off`],
//! and the directive parser drains them once it knows what it is parsing.

use std::collections::HashSet;
use std::ops::Deref;

use crate::token::{Diagnostic, Token, TokenKind};

/// Diagnostics collected during a pass, keyed by absolute token index.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Reported {
    entries: Vec<(usize, Diagnostic)>,
    indices: HashSet<usize>,
}

impl Reported {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, index: usize, diagnostic: Diagnostic) {
        self.indices.insert(index);
        self.entries.push((index, diagnostic));
    }

    /// True when some diagnostic already points at `index`.
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }
}

impl Deref for Reported {
    type Target = [(usize, Diagnostic)];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl IntoIterator for Reported {
    type Item = (usize, Diagnostic);
    type IntoIter = std::vec::IntoIter<(usize, Diagnostic)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl PartialEq<Vec<(usize, Diagnostic)>> for Reported {
    fn eq(&self, other: &Vec<(usize, Diagnostic)>) -> bool {
        &self.entries == other
    }
}

pub struct TokenCursor<'t, 'd> {
    tokens: &'t [Token],
    pos: usize,
    end: usize,
    put_off: Vec<usize>,
    reported: &'d mut Reported,
}

impl<'t, 'd> TokenCursor<'t, 'd> {
    /// Cursor over the whole token slice.
    pub fn new(tokens: &'t [Token], reported: &'d mut Reported) -> Self {
        Self {
            tokens,
            pos: 0,
            end: tokens.len(),
            put_off: Vec::new(),
            reported,
        }
    }

    /// Current token, if any.
    pub fn peek(&self) -> Option<&'t Token> {
        self.nth(0)
    }

    /// Look ahead n tokens.
    pub fn nth(&self, n: usize) -> Option<&'t Token> {
        let index = self.pos + n;
        (index < self.end).then(|| &self.tokens[index])
    }

    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.end
    }

    /// Absolute index of the current token, for later [`Self::report_at`].
    pub fn mark(&self) -> usize {
        self.pos
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    pub fn at_any(&self, kinds: &[TokenKind]) -> bool {
        self.peek_kind().is_some_and(|k| kinds.contains(&k))
    }

    /// True when the current token starts on `line`.
    pub fn on_line(&self, line: usize) -> bool {
        self.peek().is_some_and(|t| t.line == line)
    }

    /// Consume the current token unconditionally.
    pub fn bump(&mut self) -> Option<&'t Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: TokenKind) -> Option<&'t Token> {
        if self.at(kind) { self.bump() } else { None }
    }

    /// Consume a token of `kind` or record a diagnostic.
    ///
    /// A failed expectation does not consume anything; the offending token is
    /// left for the caller's loop to handle.
    pub fn expect(&mut self, kind: TokenKind, what: &str) -> Option<&'t Token> {
        if let Some(token) = self.eat(kind) {
            return Some(token);
        }
        let message = match self.peek() {
            Some(found) => format!("expected {what}, found `{}`", found.value),
            None => format!("expected {what}"),
        };
        self.report(message);
        None
    }

    /// Record a diagnostic on the current token.
    ///
    /// At the end of the range the last token of the range takes it, and an
    /// empty slice drops it.
    pub fn report(&mut self, message: impl Into<String>) {
        let index = if self.pos < self.end {
            self.pos
        } else if self.end > 0 {
            self.end - 1
        } else {
            log::debug!("dropping diagnostic on empty input: {}", message.into());
            return;
        };
        self.report_at(index, message);
    }

    /// Record a diagnostic on the token at an index taken from [`Self::mark`].
    pub fn report_at(&mut self, index: usize, message: impl Into<String>) {
        let Some(token) = self.tokens.get(index) else {
            return;
        };
        let diagnostic = token.diagnostic(message);
        log::debug!("{}:{diagnostic}", token.uri);
        self.reported.push(index, diagnostic);
    }

    /// Discard the current token with an "unexpected" diagnostic.
    ///
    /// Tokens already carrying a diagnostic are discarded silently.
    pub fn trash(&mut self) {
        let index = self.pos;
        let Some(token) = self.bump() else {
            return;
        };
        if !self.reported.contains(index) {
            self.report_at(index, format!("unexpected `{}`", token.value));
        }
    }

    /// Move leading tokens of the given kinds into the put-off buffer.
    pub fn put_off(&mut self, kinds: &[TokenKind]) {
        while self.at_any(kinds) {
            self.put_off.push(self.pos);
            self.pos += 1;
        }
    }

    /// Take every put-off token, oldest first.
    pub fn drain_put_off(&mut self) -> Vec<&'t Token> {
        self.put_off
            .drain(..)
            .map(|index| &self.tokens[index])
            .collect()
    }

    /// Consume a balanced `{ ... }` block and return a cursor over its interior.
    ///
    /// Returns `None` without consuming when the current token is not `{`.
    pub fn capture_block(&mut self) -> Option<TokenCursor<'t, '_>> {
        self.capture(TokenKind::BLOCK_OPEN, TokenKind::BLOCK_CLOSE)
    }

    /// Consume a balanced `( ... )` group and return a cursor over its interior.
    pub fn capture_parens(&mut self) -> Option<TokenCursor<'t, '_>> {
        self.capture(TokenKind::PAREN_OPEN, TokenKind::PAREN_CLOSE)
    }

    fn capture(&mut self, open: TokenKind, close: TokenKind) -> Option<TokenCursor<'t, '_>> {
        if !self.at(open) {
            return None;
        }
        let open_at = self.pos;
        let start = self.pos + 1;
        let mut depth = 0usize;
        let mut close_at = None;
        for index in open_at..self.end {
            let kind = self.tokens[index].kind;
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    close_at = Some(index);
                    break;
                }
            }
        }

        let inner_end = match close_at {
            Some(index) => {
                self.pos = index + 1;
                index
            }
            None => {
                let message = format!("unclosed `{}`", self.tokens[open_at].value);
                self.report_at(open_at, message);
                self.pos = self.end;
                self.end
            }
        };

        Some(TokenCursor {
            tokens: self.tokens,
            pos: start,
            end: inner_end,
            put_off: Vec::new(),
            reported: &mut *self.reported,
        })
    }

    /// Discard what is left of this cursor, reporting put-off tokens nobody claimed.
    pub fn finish(&mut self) {
        while !self.is_empty() {
            self.trash();
        }
        for index in std::mem::take(&mut self.put_off) {
            log::debug!(
                "dropping dangling {:?} at {}:{}",
                self.tokens[index].kind,
                self.tokens[index].line,
                self.tokens[index].column
            );
        }
    }
}
