//! Entities, fields and inline subschemas.

use serde_json::Value;

use super::{
    attach_put_off, classify, endpoint, inline_default, property, type_annotation, value_option,
};
use crate::parser::builder::SchemaBuilder;
use crate::parser::cursor::TokenCursor;
use crate::token::TokenKind;
use crate::types::TypeExpr;

/// `entity Name { ... }` or `inner Name { ... }`.
pub(super) fn parse_entity(cursor: &mut TokenCursor<'_, '_>) -> Value {
    let mut builder = SchemaBuilder::new();
    cursor.bump();
    attach_put_off(cursor, &mut builder);
    builder.set_token("name", cursor, &[TokenKind::ENTITY_NAME]);
    init_members(&mut builder, true);

    if let Some(mut block) = cursor.capture_block() {
        members(&mut block, &mut builder, true);
    }
    builder.build()
}

/// The `schema { ... }` block of a self-defined field, named by the caller.
pub(super) fn parse_subschema(cursor: &mut TokenCursor<'_, '_>, name: &str) -> Value {
    let mut builder = SchemaBuilder::new();
    builder.set("name", name);
    init_members(&mut builder, false);
    members(cursor, &mut builder, false);
    builder.build()
}

fn init_members(builder: &mut SchemaBuilder, endpoints: bool) {
    builder.ensure_array("fields");
    if endpoints {
        builder.ensure_array("endpoints");
    }
    builder.ensure_array("subtypes");
}

/// Loop over an entity-like block.
///
/// Request and response bodies reuse this with `endpoints` off.
pub(super) fn members(
    cursor: &mut TokenCursor<'_, '_>,
    builder: &mut SchemaBuilder,
    endpoints: bool,
) {
    loop {
        cursor.put_off(TokenKind::DEFERRED);
        match cursor.peek_kind() {
            None => break,
            Some(TokenKind::FIELD | TokenKind::MUTABLE) => {
                let (field, subtype) = parse_field(cursor);
                builder.push("fields", field);
                if let Some(subtype) = subtype {
                    builder.push("subtypes", subtype);
                }
            }
            Some(TokenKind::INNER | TokenKind::ENTITY) => {
                builder.push("subtypes", parse_entity(cursor));
            }
            Some(TokenKind::ENDPOINT) if endpoints => {
                builder.push("endpoints", endpoint::parse_endpoint(cursor));
            }
            Some(TokenKind::PROPERTY) => property(cursor, builder),
            Some(_) => cursor.trash(),
        }
    }
    cursor.finish();
}

/// `[mutable] field name: Type [= default] [{ ... }]`.
///
/// Returns the field record plus the subschema generated from a
/// `schema { ... }` block, which belongs to the enclosing entity.
pub(super) fn parse_field(cursor: &mut TokenCursor<'_, '_>) -> (Value, Option<Value>) {
    let mut builder = SchemaBuilder::new();
    let mutable = cursor.eat(TokenKind::MUTABLE).is_some();
    cursor.expect(TokenKind::FIELD, "`field`");
    attach_put_off(cursor, &mut builder);

    let name = builder
        .set_token("name", cursor, &[TokenKind::FIELD_NAME])
        .map(|t| t.value.clone())
        .unwrap_or_default();
    builder.set("mutable", mutable);

    let type_at = cursor.mark();
    let ty = if cursor.at(TokenKind::TYPE) {
        type_annotation(cursor, &mut builder)
    } else {
        cursor.expect(TokenKind::TYPE, &format!("a type for field `{name}`"));
        None
    };
    inline_default(cursor, &mut builder);

    let mut subtype = None;
    if let Some(mut block) = cursor.capture_block() {
        while !block.is_empty() {
            if value_option(&mut block, &mut builder) {
                continue;
            }
            if block.eat(TokenKind::SCHEMA).is_some() {
                let subtype_name = classify(&name);
                match block.capture_block() {
                    Some(mut schema) => {
                        subtype = Some(parse_subschema(&mut schema, &subtype_name));
                        builder.set("subtype", subtype_name);
                    }
                    None => {
                        block.expect(TokenKind::BLOCK_OPEN, "`{` after `schema`");
                    }
                }
                continue;
            }
            block.trash();
        }
    }

    match ty.as_ref().map(TypeExpr::base) {
        Some(TypeExpr::SelfDefined) if subtype.is_none() => {
            cursor.report_at(type_at, format!("field `{name}` of type `*` needs a `schema` block"));
        }
        Some(TypeExpr::Named(base)) if base == "Enum" && !builder.contains("enum") => {
            cursor.report_at(type_at, format!("field `{name}` of type `Enum` needs an `enum` list"));
        }
        _ => {}
    }
    (builder.build(), subtype)
}
