//! # Scanner - Classifying Source Text
//!
//! The scanner walks the source once, trying an ordered table of anchored
//! regex rules at each offset. The first rule that matches wins, emits one
//! token per capture group and moves the offset past its match.
//!
//! ## Rule Priority
//!
//! Several rules overlap: `summary` is both a bare property keyword and a
//! word that could be folded into an unquoted run, `GET /x` is a request line
//! but `endpoint GET /x` is an endpoint header. The table order decides, and
//! it must not be reshuffled without changing which inputs are accepted:
//!
//! ```text
//! comments → type colon → headers → command/annotation → array brackets
//!   → variables → request lines → assignments → bare properties
//!   → generic keywords → literals → punctuation/newline
//! ```
//!
//! ## Total Scanning
//!
//! Scanning never fails. Characters no rule claims accumulate into a run
//! that is flushed as a single trimmed [`TokenKind::UNQUOTED`] token when the
//! next rule matches or the line ends. Whitespace-only runs vanish.
//!
//! A rule starting with a word character never matches in the middle of a
//! word, so `myentity Foo` does not contain an entity header.

use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};

use crate::token::{Token, TokenKind};

/// How a capture group turns into a token.
#[derive(Debug, Clone, Copy)]
enum Emit {
    Kind(TokenKind),
    /// Tag decided by [`TokenKind::from_keyword`]
    Keyword,
    /// Tag decided by [`TokenKind::from_literal`]
    Literal,
    /// Single punctuation character
    Punct,
    /// Consumed without a token
    Skip,
}

struct Rule {
    name: &'static str,
    pattern: Regex,
    groups: &'static [Emit],
    /// Only matches at line start or after whitespace.
    needs_separator: bool,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, groups: &'static [Emit]) -> Self {
        let pattern = Regex::new(&format!("^(?:{pattern})")).expect("invalid scanner rule");
        Self {
            name,
            pattern,
            groups,
            needs_separator: false,
        }
    }

    fn after_separator(mut self) -> Self {
        self.needs_separator = true;
        self
    }

    fn captures<'h>(&self, rest: &'h str, prev: Option<char>) -> Option<Captures<'h>> {
        if self.needs_separator && prev.is_some_and(|c| !c.is_whitespace()) {
            return None;
        }
        self.pattern
            .captures(rest)
            .filter(|caps| caps.get(0).is_some_and(|m| !m.is_empty()))
    }
}

const METHODS_RE: &str = "GET|POST|PUT|PATCH|DELETE|HEAD";
const IDENT_RE: &str = r"[A-Za-z_]\w*";
const PATH_RE: &str = r"/(?:[\w\-.~/$]|\{\w+\})*";

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        use Emit::*;
        use TokenKind::*;
        vec![
            Rule::new(
                "description",
                r"///[ \t]?([^\r\n]*?)[ \t\r]*(?m:$)",
                &[Kind(DESCRIPTION)],
            )
            .after_separator(),
            Rule::new(
                "line-comment",
                r"//[ \t]?([^\r\n]*?)[ \t\r]*(?m:$)",
                &[Kind(LINE_COMMENT)],
            )
            .after_separator(),
            Rule::new("type", r":[ \t]*([A-Za-z_*][\w.<>*?]*)", &[Kind(TYPE)]),
            Rule::new(
                "entity",
                &format!(r"(entity)\s+({IDENT_RE})"),
                &[Kind(ENTITY), Kind(ENTITY_NAME)],
            ),
            Rule::new(
                "field",
                &format!(r"(?:(mutable)\s+)?(field)\s+({IDENT_RE})"),
                &[Kind(MUTABLE), Kind(FIELD), Kind(FIELD_NAME)],
            ),
            Rule::new(
                "parameter",
                &format!(r"(parameter)\s+({IDENT_RE})"),
                &[Kind(PARAMETER), Kind(PARAMETER_NAME)],
            ),
            Rule::new(
                "query",
                &format!(r"(query)\s+({IDENT_RE})"),
                &[Kind(QUERY), Kind(QUERY_NAME)],
            ),
            Rule::new(
                "inner",
                &format!(r"(inner)\s+({IDENT_RE})"),
                &[Kind(INNER), Kind(ENTITY_NAME)],
            ),
            Rule::new(
                "endpoint",
                &format!(
                    r"(endpoint)(?:\s+({METHODS_RE})\b)?(?:\s+({IDENT_RE}))?(?:\s+({METHODS_RE})\b)?\s+({PATH_RE})"
                ),
                &[
                    Kind(ENDPOINT),
                    Kind(METHOD),
                    Kind(ENDPOINT_NAME),
                    Kind(METHOD),
                    Kind(PATH),
                ],
            ),
            Rule::new(
                "scenario",
                &format!(r#"(scenario)\s+({IDENT_RE}|"[^"\r\n]*")"#),
                &[Kind(SCENARIO), Kind(SCENARIO_NAME)],
            ),
            Rule::new("command", r"@(\w+)(\()", &[Kind(COMMAND), Kind(PAREN_OPEN)]),
            Rule::new("annotation", r"@(\w+)", &[Kind(ANNOTATION)]),
            Rule::new("array-open", r"(\[)", &[Kind(ARRAY_OPEN)]),
            Rule::new("array-close", r"(\])", &[Kind(ARRAY_CLOSE)]),
            Rule::new("variable", r"(\$[A-Za-z_][\w.]*)", &[Kind(VARIABLE)]),
            Rule::new(
                "request-line",
                &format!(r"({METHODS_RE})[ \t]+(/(?:[\w\-.~/$?=&%:+]|\{{\w+\}})*)"),
                &[Kind(METHOD), Kind(PATH)],
            ),
            Rule::new("assignment", r"([A-Za-z_][\w.]*)[ \t]*=", &[Kind(ASSIGN_NAME)]),
            Rule::new(
                "property",
                r"(summary|description)[ \t]+([^\r\n{}]*[^\s{}])",
                &[Kind(PROPERTY), Kind(PROPERTY_VALUE)],
            ),
            Rule::new(
                "keyword",
                r"(get|post|put|patch|delete|head|request|success|failure|schema|setup|receive|enum|default|example)\b",
                &[Keyword],
            ),
            Rule::new(
                "literal",
                r#"("(?:[^"\\\r\n]|\\.)*"|-?\d+(?:\.\d+)?\b|(?:true|false|null)\b)"#,
                &[Literal],
            ),
            Rule::new("punctuation", r"([{}(),=])", &[Punct]),
            Rule::new("newline", r"(\r?\n)", &[Skip]),
        ]
    })
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn punct_kind(text: &str) -> TokenKind {
    match text {
        "{" => TokenKind::BLOCK_OPEN,
        "}" => TokenKind::BLOCK_CLOSE,
        "(" => TokenKind::PAREN_OPEN,
        ")" => TokenKind::PAREN_CLOSE,
        "," => TokenKind::COMMA,
        _ => TokenKind::EQUALS,
    }
}

/// Maps byte offsets to 1-based line/column pairs.
struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, starts }
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&s| s <= offset);
        let start = self.starts[line - 1];
        let column = self.text[start..offset].chars().count() + 1;
        (line, column)
    }
}

struct Scanner<'a> {
    uri: Arc<str>,
    text: &'a str,
    index: LineIndex<'a>,
    tokens: Vec<Token>,
    /// Start of the pending unquoted run.
    run_start: Option<usize>,
}

impl<'a> Scanner<'a> {
    fn push(&mut self, offset: usize, value: &str, kind: TokenKind) {
        let (line, column) = self.index.position(offset);
        self.tokens
            .push(Token::new(self.uri.clone(), line, column, value, kind));
    }

    fn flush_run(&mut self, end: usize) {
        let Some(start) = self.run_start.take() else {
            return;
        };
        let raw = &self.text[start..end];
        let value = raw.trim();
        if value.is_empty() {
            return;
        }
        let lead = raw.len() - raw.trim_start().len();
        self.push(start + lead, value, TokenKind::UNQUOTED);
    }

    fn emit(&mut self, rule: &Rule, offset: usize, caps: &Captures<'_>) {
        for (i, emit) in rule.groups.iter().enumerate() {
            let Some(m) = caps.get(i + 1) else {
                continue;
            };
            let kind = match *emit {
                Emit::Kind(kind) => kind,
                Emit::Keyword => TokenKind::from_keyword(m.as_str()).unwrap_or(TokenKind::UNQUOTED),
                Emit::Literal => TokenKind::from_literal(m.as_str()),
                Emit::Punct => punct_kind(m.as_str()),
                Emit::Skip => continue,
            };
            self.push(offset + m.start(), m.as_str(), kind);
        }
    }

    fn run(mut self) -> Vec<Token> {
        let mut offset = 0;
        while offset < self.text.len() {
            let rest = &self.text[offset..];
            let prev = self.text[..offset].chars().next_back();
            let Some(cur) = rest.chars().next() else {
                break;
            };

            let mid_word = prev.is_some_and(is_word) && is_word(cur);
            let matched = if mid_word {
                None
            } else {
                rules()
                    .iter()
                    .find_map(|rule| rule.captures(rest, prev).map(|caps| (rule, caps)))
            };

            match matched {
                Some((rule, caps)) => {
                    self.flush_run(offset);
                    log::trace!("rule `{}` matched at {offset}", rule.name);
                    self.emit(rule, offset, &caps);
                    offset += caps.get(0).map_or(cur.len_utf8(), |m| m.end());
                }
                None => {
                    self.run_start.get_or_insert(offset);
                    offset += cur.len_utf8();
                }
            }
        }
        self.flush_run(self.text.len());
        self.tokens
    }
}

/// Scan source text into tokens.
///
/// `uri` is a logical source identifier copied onto every token for
/// diagnostics; no file-system access happens here.
pub fn scan(uri: &str, text: &str) -> Vec<Token> {
    let scanner = Scanner {
        uri: Arc::from(uri),
        text,
        index: LineIndex::new(text),
        tokens: Vec::new(),
        run_start: None,
    };
    let tokens = scanner.run();
    log::debug!("scanned {} tokens from {uri}", tokens.len());
    tokens
}
