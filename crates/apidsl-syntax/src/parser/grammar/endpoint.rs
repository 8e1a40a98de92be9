//! Endpoints and what hangs off them.
//!
//! ```text
//! endpoint [METHOD] [name] [METHOD] /path/$id {
//!   parameter id: Person.id
//!   query expand: Boolean?
//!   request: Person
//!   success 200: Person
//!   failure 404 { field reason: String }
//!   get { ... }          // per-method record, same members
//! }
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::entity::members;
use super::{attach_put_off, inline_default, property, type_annotation, value_option};
use crate::parser::builder::SchemaBuilder;
use crate::parser::cursor::TokenCursor;
use crate::token::TokenKind;

/// Placeholder names in a path, in order of first appearance.
///
/// Both `$name` and `{name}` are recognised. A repeated name binds once.
pub fn path_parameters(path: &str) -> Vec<String> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER
        .get_or_init(|| Regex::new(r"\$(\w+)|\{(\w+)\}").expect("Invalid placeholder regex"));
    let mut names: Vec<String> = Vec::new();
    for m in re
        .captures_iter(path)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
    {
        if !names.iter().any(|name| name == m.as_str()) {
            names.push(m.as_str().to_string());
        }
    }
    names
}

/// `endpoint ... /path { ... }`
pub(super) fn parse_endpoint(cursor: &mut TokenCursor<'_, '_>) -> Value {
    let mut builder = SchemaBuilder::new();
    let keyword_at = cursor.mark();
    cursor.bump();
    attach_put_off(cursor, &mut builder);

    while cursor.at_any(&[TokenKind::METHOD, TokenKind::ENDPOINT_NAME]) {
        let at = cursor.mark();
        let Some(token) = cursor.bump() else {
            break;
        };
        if token.kind == TokenKind::ENDPOINT_NAME {
            builder.set("name", token.value.as_str());
        } else if builder.contains("method") {
            cursor.report_at(at, format!("second method `{}`", token.value));
        } else {
            builder.set("method", token.value.as_str());
        }
    }

    if let Some(path) = cursor.expect(TokenKind::PATH, "an endpoint path") {
        builder.set("path", path.value.as_str());
        builder.set("path_parameters", path_parameters(&path.value));
    }

    if let Some(mut block) = cursor.capture_block() {
        endpoint_members(&mut block, &mut builder, true);
    }

    if !builder.contains("method") && !builder.contains("methods") {
        cursor.report_at(keyword_at, "endpoint declares no method");
    }
    builder.build()
}

fn endpoint_members(cursor: &mut TokenCursor<'_, '_>, builder: &mut SchemaBuilder, top: bool) {
    loop {
        cursor.put_off(TokenKind::DEFERRED);
        match cursor.peek_kind() {
            None => break,
            Some(TokenKind::PARAMETER) => builder.push("parameters", parse_parameter(cursor)),
            Some(TokenKind::QUERY) => builder.push("query", parse_query(cursor)),
            Some(TokenKind::REQUEST) => {
                let request = parse_body(cursor, "request");
                builder.set("request", request);
            }
            Some(kind @ (TokenKind::SUCCESS | TokenKind::FAILURE)) => {
                let key = if kind == TokenKind::SUCCESS { "success" } else { "failure" };
                let response = parse_body(cursor, key);
                builder.set(key, response);
            }
            Some(TokenKind::PROPERTY) => property(cursor, builder),
            Some(TokenKind::METHOD_KEY) if top => builder.push("methods", parse_method(cursor)),
            Some(_) => cursor.trash(),
        }
    }
    cursor.finish();
}

/// `get { ... }` inside an endpoint block.
fn parse_method(cursor: &mut TokenCursor<'_, '_>) -> Value {
    let mut builder = SchemaBuilder::new();
    if let Some(key) = cursor.bump() {
        builder.set("method", key.value.to_uppercase());
    }
    attach_put_off(cursor, &mut builder);
    if let Some(mut block) = cursor.capture_block() {
        endpoint_members(&mut block, &mut builder, false);
    }
    builder.build()
}

/// `request ...`, `success [status] ...` or `failure [status] ...`.
///
/// The body is either a `: Type` or a block of fields.
fn parse_body(cursor: &mut TokenCursor<'_, '_>, name: &str) -> Value {
    let mut builder = SchemaBuilder::new();
    let keyword_at = cursor.mark();
    cursor.bump();
    attach_put_off(cursor, &mut builder);
    builder.set("name", name);

    if name != "request" && cursor.at(TokenKind::NUMBER) {
        builder.set_token("status", cursor, &[TokenKind::NUMBER]);
    }
    let typed = type_annotation(cursor, &mut builder).is_some() || builder.contains("type");

    if let Some(mut block) = cursor.capture_block() {
        builder.ensure_array("fields");
        builder.ensure_array("subtypes");
        members(&mut block, &mut builder, false);
    } else if !typed && name == "request" {
        cursor.report_at(keyword_at, "`request` needs a type or a block of fields");
    }
    builder.build()
}

pub(super) fn parse_parameter(cursor: &mut TokenCursor<'_, '_>) -> Value {
    parse_value_directive(cursor, TokenKind::PARAMETER_NAME)
}

pub(super) fn parse_query(cursor: &mut TokenCursor<'_, '_>) -> Value {
    parse_value_directive(cursor, TokenKind::QUERY_NAME)
}

/// `parameter name[: Type] [= default] [{ ... }]` and the same for `query`.
fn parse_value_directive(cursor: &mut TokenCursor<'_, '_>, name_kind: TokenKind) -> Value {
    let mut builder = SchemaBuilder::new();
    cursor.bump();
    attach_put_off(cursor, &mut builder);
    builder.set_token("name", cursor, &[name_kind]);
    type_annotation(cursor, &mut builder);
    inline_default(cursor, &mut builder);

    if let Some(mut block) = cursor.capture_block() {
        while !block.is_empty() {
            if !value_option(&mut block, &mut builder) {
                block.trash();
            }
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::cursor::Reported;
    use crate::scanner::scan;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn endpoint(text: &str) -> (Value, Vec<String>) {
        let tokens = scan("t", text);
        let mut reported = Reported::new();
        let record = {
            let mut cursor = TokenCursor::new(&tokens, &mut reported);
            parse_endpoint(&mut cursor)
        };
        (record, reported.into_iter().map(|(_, d)| d.message).collect())
    }

    #[rstest]
    #[case("/persons/$id", &["id"])]
    #[case("/a/{org}/b/$id", &["org", "id"])]
    #[case("/plain", &[])]
    #[case("/a/$id/b/{id}/c/$slug", &["id", "slug"])]
    fn placeholders(#[case] path: &str, #[case] expected: &[&str]) {
        assert_eq!(path_parameters(path), expected);
    }

    #[test]
    fn header_with_body() {
        let (record, errors) = endpoint(
            "endpoint show GET /persons/$id {\n  summary Fetch one\n  parameter id: Person.id\n  query expand: Boolean? = false\n  success 200: Person\n  failure 404 { field reason: String }\n}",
        );
        assert_eq!(
            record,
            json!({
                "name": "show",
                "method": "GET",
                "path": "/persons/$id",
                "path_parameters": ["id"],
                "summary": "Fetch one",
                "parameters": [{ "name": "id", "type": "Person.id" }],
                "query": [{ "name": "expand", "type": "Boolean?", "default": false }],
                "success": { "name": "success", "status": 200, "type": "Person" },
                "failure": {
                    "name": "failure",
                    "status": 404,
                    "fields": [{ "name": "reason", "mutable": false, "type": "String" }],
                    "subtypes": []
                }
            })
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn method_sub_keys() {
        let (record, errors) = endpoint(
            "endpoint /articles {\n  get { success: List<Article> }\n  post { request: Article success 201: Article }\n}",
        );
        assert_eq!(
            record["methods"],
            json!([
                { "method": "GET", "success": { "name": "success", "type": "List<Article>" } },
                {
                    "method": "POST",
                    "request": { "name": "request", "type": "Article" },
                    "success": { "name": "success", "status": 201, "type": "Article" }
                }
            ])
        );
        assert!(record.get("method").is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn missing_method_is_reported() {
        let (_, errors) = endpoint("endpoint /articles {}");
        assert_eq!(errors, vec!["endpoint declares no method"]);
    }

    #[test]
    fn untyped_request_is_reported() {
        let (_, errors) = endpoint("endpoint POST /articles { request }");
        assert_eq!(errors, vec!["`request` needs a type or a block of fields"]);
    }

    #[test]
    fn second_method_is_reported() {
        let (record, errors) = endpoint("endpoint GET show POST /a");
        assert_eq!(record["method"], json!("GET"));
        assert_eq!(errors, vec!["second method `POST`"]);
    }

    #[test]
    fn parameter_block() {
        let tokens = scan(
            "t",
            "parameter page: Integer {\n  description Page number\n  default 1\n  example 3\n  enum [1, 2, 3]\n  bogus\n}",
        );
        let mut reported = Reported::new();
        let record = {
            let mut cursor = TokenCursor::new(&tokens, &mut reported);
            parse_parameter(&mut cursor)
        };
        assert_eq!(
            record,
            json!({
                "name": "page",
                "type": "Integer",
                "description": "Page number",
                "default": 1,
                "example": 3,
                "enum": [1, 2, 3]
            })
        );
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].1.message, "unexpected `bogus`");
    }
}
