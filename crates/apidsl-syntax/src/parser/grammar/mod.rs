//! # Directive Parsers
//!
//! One function per schema construct. Every directive parser has the same
//! shape:
//!
//! 1. consume the directive keyword
//! 2. drain put-off descriptions and annotations into the record
//! 3. consume the positional tokens (name, type, method and path)
//! 4. if a block follows, loop over it and dispatch on the leading tag of
//!    each member, trashing whatever no rule claims
//!
//! Nothing here returns an error. Problems become diagnostics on the
//! offending token and the record is built from whatever was recognised.
//!
//! ## Module Structure
//!
//! - [`entity`] - entities, fields, inline subschemas
//! - [`endpoint`] - endpoints, parameters, queries, request and response bodies
//! - [`scenario`] - scenarios, commands, shorthand requests

mod endpoint;
mod entity;
mod scenario;

pub use endpoint::path_parameters;

use serde_json::{Map, Value};

use super::builder::{SchemaBuilder, literal_value, read_array};
use super::cursor::TokenCursor;
use crate::token::TokenKind;
use crate::types::TypeExpr;

/// Tokens accepted where a default or example value is expected.
const VALUE_TOKENS: &[TokenKind] = &[
    TokenKind::STRING,
    TokenKind::NUMBER,
    TokenKind::BOOLEAN,
    TokenKind::NULL,
    TokenKind::UNQUOTED,
];

/// Parse the whole token stream into `{ entities, scenarios }`.
pub fn root(cursor: &mut TokenCursor<'_, '_>) -> Value {
    let mut entities = Vec::new();
    let mut scenarios = Vec::new();

    loop {
        cursor.put_off(TokenKind::DEFERRED);
        match cursor.peek_kind() {
            None => break,
            Some(TokenKind::ENTITY) => entities.push(entity::parse_entity(cursor)),
            Some(TokenKind::SCENARIO) => scenarios.push(scenario::parse_scenario(cursor)),
            Some(_) => cursor.trash(),
        }
    }
    cursor.finish();

    log::debug!(
        "parsed {} entities and {} scenarios",
        entities.len(),
        scenarios.len()
    );
    let mut root = Map::new();
    root.insert("entities".into(), Value::Array(entities));
    root.insert("scenarios".into(), Value::Array(scenarios));
    Value::Object(root)
}

/// Move put-off descriptions and annotations into the record.
///
/// Consecutive description lines are joined with newlines.
fn attach_put_off(cursor: &mut TokenCursor<'_, '_>, builder: &mut SchemaBuilder) {
    let mut lines = Vec::new();
    for token in cursor.drain_put_off() {
        match token.kind {
            TokenKind::DESCRIPTION => lines.push(token.value.as_str()),
            TokenKind::ANNOTATION => builder.push("annotation", token.value.as_str()),
            _ => {}
        }
    }
    if !lines.is_empty() {
        builder.set("description", lines.join("\n"));
    }
}

/// `summary ...` / `description ...`
fn property(cursor: &mut TokenCursor<'_, '_>, builder: &mut SchemaBuilder) {
    let Some(keyword) = cursor.bump() else {
        return;
    };
    builder.set_token(&keyword.value, cursor, &[TokenKind::PROPERTY_VALUE]);
}

/// Consume an optional `: type`, validating it.
///
/// The raw string is stored under `type` even when it does not parse, so the
/// record still says what was written.
fn type_annotation(
    cursor: &mut TokenCursor<'_, '_>,
    builder: &mut SchemaBuilder,
) -> Option<TypeExpr> {
    let at = cursor.mark();
    let token = cursor.eat(TokenKind::TYPE)?;
    builder.set("type", token.value.as_str());
    match TypeExpr::parse(&token.value) {
        Ok(ty) => Some(ty),
        Err(err) => {
            cursor.report_at(at, format!("invalid type `{}`: {err}", token.value));
            None
        }
    }
}

/// Handle the members shared by field, parameter and query blocks.
///
/// Returns false when the current token is none of them.
fn value_option(cursor: &mut TokenCursor<'_, '_>, builder: &mut SchemaBuilder) -> bool {
    match cursor.peek_kind() {
        Some(TokenKind::PROPERTY) => property(cursor, builder),
        Some(TokenKind::DEFAULT) => {
            cursor.bump();
            builder.set_token("default", cursor, VALUE_TOKENS);
        }
        Some(TokenKind::EXAMPLE) => {
            cursor.bump();
            if let Some(value) = value(cursor) {
                builder.set("example", value);
            }
        }
        Some(TokenKind::ENUM) => {
            cursor.bump();
            builder.set_array("enum", cursor);
        }
        _ => return false,
    }
    true
}

/// `= value` after a type.
fn inline_default(cursor: &mut TokenCursor<'_, '_>, builder: &mut SchemaBuilder) {
    if cursor.eat(TokenKind::EQUALS).is_some() {
        builder.set_token("default", cursor, VALUE_TOKENS);
    }
}

/// Shared value-literal rule.
///
/// Literals, bare words, `$references` (kept with the `$`), arrays, and
/// nested `{ name = value }` objects.
fn value(cursor: &mut TokenCursor<'_, '_>) -> Option<Value> {
    match cursor.peek_kind() {
        Some(kind) if kind.is_literal() || matches!(kind, TokenKind::UNQUOTED | TokenKind::VARIABLE) => {
            cursor.bump().map(literal_value)
        }
        Some(TokenKind::ARRAY_OPEN) => {
            cursor.bump();
            Some(read_array(cursor))
        }
        Some(TokenKind::BLOCK_OPEN) => {
            let mut block = cursor.capture_block()?;
            Some(Value::Object(assignments(&mut block)))
        }
        _ => {
            cursor.expect(TokenKind::STRING, "a value");
            None
        }
    }
}

/// Read `name = value` lines until the cursor is exhausted.
fn assignments(cursor: &mut TokenCursor<'_, '_>) -> Map<String, Value> {
    let mut map = Map::new();
    while !cursor.is_empty() {
        if cursor.at(TokenKind::ASSIGN_NAME) {
            assignment(cursor, &mut map);
        } else {
            cursor.trash();
        }
    }
    map
}

/// One `name = value`, nesting dotted names.
fn assignment(cursor: &mut TokenCursor<'_, '_>, map: &mut Map<String, Value>) {
    let Some(name) = cursor.eat(TokenKind::ASSIGN_NAME) else {
        return;
    };
    if let Some(value) = value(cursor) {
        insert_path(map, &name.value, value);
    }
}

/// Insert under a dotted name, creating intermediate objects.
fn insert_path(map: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(inner) = slot {
                insert_path(inner, rest, value);
            }
        }
    }
}

/// Name of the subtype generated for a self-defined field.
///
/// Camel-cases the field name and drops a plural ending:
/// `line_items` → `LineItem`, `categories` → `Category`.
pub fn classify(field_name: &str) -> String {
    let camel: String = field_name
        .split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    singularize(&camel)
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["sses", "xes", "ches", "shes", "uses"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{}", &suffix[..suffix.len() - 2]);
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    word.strip_suffix('s').unwrap_or(word).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::cursor::Reported;
    use crate::scanner::scan;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("address", "Address")]
    #[case("addresses", "Address")]
    #[case("line_items", "LineItem")]
    #[case("categories", "Category")]
    #[case("boxes", "Box")]
    #[case("status", "Status")]
    #[case("statuses", "Status")]
    #[case("shippingAddress", "ShippingAddress")]
    #[case("analysis", "Analysis")]
    fn classify_field_names(#[case] field: &str, #[case] expected: &str) {
        assert_eq!(classify(field), expected);
    }

    #[test]
    fn dotted_assignments_nest() {
        let tokens = scan("t", r#"user.name = "ann" user.age = 3 tags = ["a"] ok = true"#);
        let mut reported = Reported::new();
        let mut cursor = TokenCursor::new(&tokens, &mut reported);
        let map = assignments(&mut cursor);
        drop(cursor);

        assert_eq!(
            Value::Object(map),
            json!({ "user": { "name": "ann", "age": 3 }, "tags": ["a"], "ok": true })
        );
        assert!(reported.is_empty());
    }

    #[test]
    fn nested_object_values() {
        let tokens = scan("t", "body = { id = $created.id }");
        let mut reported = Reported::new();
        let mut cursor = TokenCursor::new(&tokens, &mut reported);
        let map = assignments(&mut cursor);

        assert_eq!(Value::Object(map), json!({ "body": { "id": "$created.id" } }));
    }

    #[test]
    fn missing_value_is_reported() {
        let tokens = scan("t", "a = }");
        let mut reported = Reported::new();
        let mut cursor = TokenCursor::new(&tokens, &mut reported);
        let map = assignments(&mut cursor);
        drop(cursor);

        assert!(map.is_empty());
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].1.message, "expected a value, found `}`");
    }
}
