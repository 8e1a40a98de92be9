//! Token kinds, positioned tokens and the diagnostics attached to them.
//!
//! Every token carries a semantic tag ([`TokenKind`]) decided by the scanner
//! rule that produced it. Tags are deliberately fine grained: the directive
//! parsers dispatch on them directly instead of re-inspecting token text.

use std::fmt;
use std::sync::Arc;

/// Semantic tag of a scanned token.
///
/// We use SCREAMING_CASE so the tags read like the grammar they describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum TokenKind {
    // === Comments ===
    /// `// ...` comment, removed before parsing
    LINE_COMMENT,
    /// `/// ...` comment, attached to the following directive
    DESCRIPTION,

    // === Directive headers ===
    /// `entity` keyword
    ENTITY,
    /// Name following `entity` or `inner`
    ENTITY_NAME,
    /// `mutable` modifier in front of `field`
    MUTABLE,
    /// `field` keyword
    FIELD,
    /// Name following `field`
    FIELD_NAME,
    /// `parameter` keyword
    PARAMETER,
    /// Name following `parameter`
    PARAMETER_NAME,
    /// `query` keyword
    QUERY,
    /// Name following `query`
    QUERY_NAME,
    /// `inner` keyword (explicit subtype)
    INNER,
    /// `endpoint` keyword
    ENDPOINT,
    /// Optional name of an endpoint directive
    ENDPOINT_NAME,
    /// Upper-case HTTP method (`GET`, `POST`, ...)
    METHOD,
    /// Request path (`/persons/$id`)
    PATH,
    /// `scenario` keyword
    SCENARIO,
    /// Name following `scenario`
    SCENARIO_NAME,
    /// Type string after a `:`
    TYPE,

    // === Scenario and annotation syntax ===
    /// `@name(` command invocation
    COMMAND,
    /// `@name` without arguments in parentheses
    ANNOTATION,
    /// `$a.b` reference
    VARIABLE,
    /// Left-hand side of `name = value`
    ASSIGN_NAME,
    /// `summary` / `description` property keyword
    PROPERTY,
    /// Rest-of-line text of a property
    PROPERTY_VALUE,

    // === Generic directive keywords ===
    /// Lower-case HTTP method sub-key inside an endpoint block
    METHOD_KEY,
    /// `request`
    REQUEST,
    /// `success`
    SUCCESS,
    /// `failure`
    FAILURE,
    /// `schema`
    SCHEMA,
    /// `setup`
    SETUP,
    /// `receive`
    RECEIVE,
    /// `enum`
    ENUM,
    /// `default`
    DEFAULT,
    /// `example`
    EXAMPLE,

    // === Literal values ===
    /// Double-quoted string, quotes included
    STRING,
    /// Signed or unsigned number
    NUMBER,
    /// `true` / `false`
    BOOLEAN,
    /// `null`
    NULL,
    /// Run of characters no rule claimed
    UNQUOTED,

    // === Punctuation ===
    BLOCK_OPEN,
    BLOCK_CLOSE,
    PAREN_OPEN,
    PAREN_CLOSE,
    ARRAY_OPEN,
    ARRAY_CLOSE,
    COMMA,
    EQUALS,
}

impl TokenKind {
    /// Tokens the parser sets aside and attaches to the next directive.
    pub const DEFERRED: &'static [TokenKind] = &[TokenKind::DESCRIPTION, TokenKind::ANNOTATION];

    /// Tokens accepted by the shared value-literal rule.
    pub const LITERALS: &'static [TokenKind] = &[
        TokenKind::STRING,
        TokenKind::NUMBER,
        TokenKind::BOOLEAN,
        TokenKind::NULL,
    ];

    /// Returns true for comment tokens.
    pub fn is_comment(self) -> bool {
        matches!(self, Self::LINE_COMMENT | Self::DESCRIPTION)
    }

    /// Returns true for literal value tokens.
    pub fn is_literal(self) -> bool {
        Self::LITERALS.contains(&self)
    }

    /// Returns true for tokens that can start a value (literal, reference, array, ...).
    pub fn starts_value(self) -> bool {
        self.is_literal()
            || matches!(
                self,
                Self::VARIABLE | Self::UNQUOTED | Self::ARRAY_OPEN | Self::BLOCK_OPEN
            )
    }

    /// Map a generic directive keyword to its tag.
    pub fn from_keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "get" | "post" | "put" | "patch" | "delete" | "head" => Self::METHOD_KEY,
            "request" => Self::REQUEST,
            "success" => Self::SUCCESS,
            "failure" => Self::FAILURE,
            "schema" => Self::SCHEMA,
            "setup" => Self::SETUP,
            "receive" => Self::RECEIVE,
            "enum" => Self::ENUM,
            "default" => Self::DEFAULT,
            "example" => Self::EXAMPLE,
            _ => return None,
        };
        Some(kind)
    }

    /// Classify a literal value's text.
    pub fn from_literal(text: &str) -> TokenKind {
        match text {
            "true" | "false" => Self::BOOLEAN,
            "null" => Self::NULL,
            _ if text.starts_with('"') => Self::STRING,
            _ => Self::NUMBER,
        }
    }
}

/// A parse-time complaint about one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// A positioned, semantically tagged lexical unit.
///
/// Everything except `errors` is fixed once the scanner emits the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Logical source identifier shared by all tokens of one scan.
    pub uri: Arc<str>,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    pub value: String,
    pub kind: TokenKind,
    pub errors: Vec<Diagnostic>,
}

impl Token {
    pub fn new(uri: Arc<str>, line: usize, column: usize, value: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            uri,
            line,
            column,
            value: value.into(),
            kind,
            errors: Vec::new(),
        }
    }

    /// Build a diagnostic positioned at this token.
    pub fn diagnostic(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Remove line-comment tokens ahead of parsing.
///
/// Description comments survive: the parser attaches them to directives.
pub fn strip_line_comments(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::LINE_COMMENT)
        .collect()
}

/// Iterate over every diagnostic attached to a token list, with its uri.
pub fn diagnostics(tokens: &[Token]) -> impl Iterator<Item = (&str, &Diagnostic)> {
    tokens
        .iter()
        .flat_map(|t| t.errors.iter().map(move |d| (t.uri.as_ref(), d)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, value: &str) -> Token {
        Token::new(Arc::from("test.api"), 1, 1, value, kind)
    }

    #[test]
    fn keywords_map_to_tags() {
        assert_eq!(TokenKind::from_keyword("get"), Some(TokenKind::METHOD_KEY));
        assert_eq!(TokenKind::from_keyword("delete"), Some(TokenKind::METHOD_KEY));
        assert_eq!(TokenKind::from_keyword("schema"), Some(TokenKind::SCHEMA));
        assert_eq!(TokenKind::from_keyword("entity"), None);
    }

    #[test]
    fn literal_classification() {
        assert_eq!(TokenKind::from_literal("\"a\""), TokenKind::STRING);
        assert_eq!(TokenKind::from_literal("-12"), TokenKind::NUMBER);
        assert_eq!(TokenKind::from_literal("true"), TokenKind::BOOLEAN);
        assert_eq!(TokenKind::from_literal("null"), TokenKind::NULL);
    }

    #[test]
    fn value_starters() {
        assert!(TokenKind::STRING.starts_value());
        assert!(TokenKind::ARRAY_OPEN.starts_value());
        assert!(!TokenKind::FIELD.starts_value());
    }

    #[test]
    fn strip_keeps_descriptions() {
        let tokens = vec![
            token(TokenKind::LINE_COMMENT, "note"),
            token(TokenKind::DESCRIPTION, "doc"),
            token(TokenKind::ENTITY, "entity"),
        ];
        let kinds: Vec<_> = strip_line_comments(tokens).iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::DESCRIPTION, TokenKind::ENTITY]);
    }

    #[test]
    fn diagnostics_are_flattened() {
        let mut t = token(TokenKind::UNQUOTED, "oops");
        t.errors.push(t.diagnostic("unexpected `oops`"));
        let tokens = vec![token(TokenKind::ENTITY, "entity"), t];
        let all: Vec<_> = diagnostics(&tokens).collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, "test.api");
        assert_eq!(all[0].1.to_string(), "1:1: unexpected `oops`");
    }
}
