//! Scenarios and their steps.
//!
//! ```text
//! scenario "Publish article" {
//!   @login("admin", remember = true)     // command, parenthesised arguments
//!   @wait 100                            // command, same-line arguments
//!   POST /articles { title = "Hello" receive { status = 201 } }
//!   $Article.show { setup { id = $created.id } }
//! }
//! ```

use serde_json::{Map, Value};

use super::{assignment, assignments, attach_put_off, property, value};
use crate::parser::builder::{SchemaBuilder, unquote};
use crate::parser::cursor::TokenCursor;
use crate::token::TokenKind;

/// `scenario Name { ... }`
pub(super) fn parse_scenario(cursor: &mut TokenCursor<'_, '_>) -> Value {
    let mut builder = SchemaBuilder::new();
    cursor.bump();
    attach_put_off(cursor, &mut builder);
    if let Some(name) = cursor.expect(TokenKind::SCENARIO_NAME, "a scenario name") {
        builder.set("name", unquote(&name.value));
    }
    builder.ensure_array("steps");

    if let Some(mut block) = cursor.capture_block() {
        loop {
            // annotations are commands here, only descriptions wait
            block.put_off(&[TokenKind::DESCRIPTION]);
            match block.peek_kind() {
                None => break,
                Some(TokenKind::COMMAND | TokenKind::ANNOTATION) => {
                    builder.push("steps", parse_command(&mut block));
                }
                Some(TokenKind::METHOD) => builder.push("steps", parse_request(&mut block)),
                Some(TokenKind::VARIABLE) => {
                    builder.push("steps", parse_reference_request(&mut block));
                }
                Some(TokenKind::PROPERTY) => property(&mut block, &mut builder),
                Some(_) => block.trash(),
            }
        }
        block.finish();
    }
    builder.build()
}

/// `@name(arg, key = value)` or `@name arg arg` on one line.
pub(super) fn parse_command(cursor: &mut TokenCursor<'_, '_>) -> Value {
    let mut builder = SchemaBuilder::new();
    let Some(keyword) = cursor.bump() else {
        return builder.build();
    };
    attach_put_off(cursor, &mut builder);
    builder.set("kind", "command");
    builder.set("name", keyword.value.as_str());

    let mut arguments = Vec::new();
    let mut options = Map::new();
    if keyword.kind == TokenKind::COMMAND {
        if let Some(mut group) = cursor.capture_parens() {
            while !group.is_empty() {
                match group.peek_kind() {
                    Some(TokenKind::COMMA) => {
                        group.bump();
                    }
                    Some(TokenKind::ASSIGN_NAME) => assignment(&mut group, &mut options),
                    Some(kind) if kind.starts_value() => {
                        if let Some(argument) = value(&mut group) {
                            arguments.push(argument);
                        }
                    }
                    _ => group.trash(),
                }
            }
        }
    } else {
        while cursor.on_line(keyword.line)
            && cursor.peek_kind().is_some_and(|k| k.starts_value() && k != TokenKind::BLOCK_OPEN)
        {
            if let Some(argument) = value(cursor) {
                arguments.push(argument);
            }
        }
    }

    builder.set("arguments", arguments);
    builder.set("options", options);
    builder.build()
}

/// `METHOD /path [{ ... }]`
pub(super) fn parse_request(cursor: &mut TokenCursor<'_, '_>) -> Value {
    let mut builder = SchemaBuilder::new();
    attach_put_off(cursor, &mut builder);
    builder.set("kind", "request");
    if let Some(method) = cursor.bump() {
        builder.set("method", method.value.as_str());
    }
    if let Some(path) = cursor.expect(TokenKind::PATH, "a request path") {
        builder.set("path", path.value.as_str());
    }
    request_block(cursor, &mut builder);
    builder.build()
}

/// `$Entity.endpoint [{ ... }]`
pub(super) fn parse_reference_request(cursor: &mut TokenCursor<'_, '_>) -> Value {
    let mut builder = SchemaBuilder::new();
    attach_put_off(cursor, &mut builder);
    builder.set("kind", "request");
    if let Some(reference) = cursor.bump() {
        let endpoint = reference.value.trim_start_matches('$');
        builder.set("endpoint", endpoint);
    }
    request_block(cursor, &mut builder);
    builder.build()
}

/// `setup { ... }`, `receive { ... }` and bare `name = value` overrides.
fn request_block(cursor: &mut TokenCursor<'_, '_>, builder: &mut SchemaBuilder) {
    let Some(mut block) = cursor.capture_block() else {
        return;
    };
    let mut assign = Map::new();
    while !block.is_empty() {
        match block.peek_kind() {
            Some(kind @ (TokenKind::SETUP | TokenKind::RECEIVE)) => {
                let key = if kind == TokenKind::SETUP { "setup" } else { "receive" };
                block.bump();
                match block.capture_block() {
                    Some(mut inner) => {
                        let map = assignments(&mut inner);
                        builder.set(key, map);
                    }
                    None => {
                        block.expect(TokenKind::BLOCK_OPEN, &format!("`{{` after `{key}`"));
                    }
                }
            }
            Some(TokenKind::ASSIGN_NAME) => assignment(&mut block, &mut assign),
            _ => block.trash(),
        }
    }
    if !assign.is_empty() {
        builder.set("assign", assign);
    }
}
