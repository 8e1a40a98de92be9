//! Schema record accumulation for one directive.

use serde_json::{Map, Number, Value};

use super::cursor::TokenCursor;
use crate::token::{Token, TokenKind};

/// Convert a value token into its record value.
///
/// Strings lose exactly one layer of surrounding double quotes. Escapes are
/// left as written.
pub fn literal_value(token: &Token) -> Value {
    match token.kind {
        TokenKind::STRING => Value::String(unquote(&token.value).to_string()),
        TokenKind::NUMBER => number(&token.value),
        TokenKind::BOOLEAN => Value::Bool(token.value == "true"),
        TokenKind::NULL => Value::Null,
        _ => Value::String(token.value.clone()),
    }
}

/// Strip one layer of double quotes, if both are present.
pub fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(text)
}

fn number(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

/// Accumulates named values for one directive.
///
/// Shape checks are minimal: a mismatching tag becomes a diagnostic on the
/// token, never a failure.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    record: Map<String, Value>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a scalar, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.record.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.record.contains_key(key)
    }

    /// Assign the current token's value when its tag is allowed.
    ///
    /// On mismatch the token is left in place and gets a diagnostic.
    /// Returns the consumed token.
    pub fn set_token<'t>(
        &mut self,
        key: &str,
        cursor: &mut TokenCursor<'t, '_>,
        allowed: &[TokenKind],
    ) -> Option<&'t Token> {
        if !cursor.at_any(allowed) {
            let message = match cursor.peek() {
                Some(found) => format!("unexpected `{}` for `{key}`", found.value),
                None => format!("missing value for `{key}`"),
            };
            cursor.report(message);
            return None;
        }
        let token = cursor.bump()?;
        self.set(key, literal_value(token));
        Some(token)
    }

    /// Append to an array-valued key, creating it when absent.
    pub fn push(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.record.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                log::warn!("`{key}` was a scalar, turning it into an array");
                let previous = existing.take();
                *existing = Value::Array(vec![previous, value]);
            }
            None => {
                self.record.insert(key.to_string(), Value::Array(vec![value]));
            }
        }
    }

    /// Make sure `key` holds an array, even an empty one.
    pub fn ensure_array(&mut self, key: &str) {
        self.record
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
    }

    /// Read an `[ ... ]` literal into `key`.
    ///
    /// Literal elements are kept; anything else inside the brackets is
    /// skipped. A missing `[` is reported and nothing is consumed.
    pub fn set_array(&mut self, key: &str, cursor: &mut TokenCursor<'_, '_>) {
        if cursor.expect(TokenKind::ARRAY_OPEN, "`[`").is_none() {
            return;
        }
        self.set(key, read_array(cursor));
    }

    /// Finish the record.
    pub fn build(self) -> Value {
        Value::Object(self.record)
    }
}

/// Read array elements up to and including the closing `]`.
///
/// The opening `[` must already be consumed.
pub fn read_array(cursor: &mut TokenCursor<'_, '_>) -> Value {
    let mut items = Vec::new();
    loop {
        let Some(token) = cursor.bump() else {
            cursor.report("unclosed `[`");
            break;
        };
        match token.kind {
            TokenKind::ARRAY_CLOSE => break,
            TokenKind::COMMA => {}
            TokenKind::ARRAY_OPEN => items.push(read_array(cursor)),
            kind if kind.is_literal() || matches!(kind, TokenKind::UNQUOTED | TokenKind::VARIABLE) => {
                items.push(literal_value(token));
            }
            kind => log::debug!("skipping {kind:?} `{}` in array", token.value),
        }
    }
    Value::Array(items)
}
