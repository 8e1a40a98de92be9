//! Loading schema records into the node arena.
//!
//! Construction is strictly top-down: a node is attached, then its children,
//! so by the time anything derived is computed the whole tree exists.

use std::collections::HashSet;

use apidsl_config::Config;
use serde_json::{Value, json};

use crate::error::GraphError;
use crate::graph::{Graph, NodeId, NodeKind};
use crate::models::types::Type;

/// Keys a per-method endpoint record takes from its directive when unset.
const INHERITED: &[&str] = &[
    "path",
    "path_parameters",
    "parameters",
    "query",
    "summary",
    "description",
    "annotation",
];

/// Build the graph for a root record `{ entities, scenarios }`.
pub fn build(schema: &Value, config: Config) -> Result<Graph, GraphError> {
    let mut graph = Graph::new(schema.clone(), config);
    let root = graph.root_id();

    for record in array(schema, "entities") {
        add_entity(&mut graph, root, record)?;
    }
    for record in array(schema, "scenarios") {
        let Some(name) = text(record, "name") else {
            log::warn!("skipping scenario record without a name");
            continue;
        };
        graph.attach(root, NodeKind::Scenario, name, None, record.clone(), None)?;
    }

    log::debug!("built graph with {} nodes", graph.node_count());
    Ok(graph)
}

fn array<'v>(record: &'v Value, key: &str) -> impl Iterator<Item = &'v Value> {
    record.get(key).and_then(Value::as_array).into_iter().flatten()
}

fn text<'v>(record: &'v Value, key: &str) -> Option<&'v str> {
    record.get(key).and_then(Value::as_str)
}

fn parse_type(
    graph: &Graph,
    owner: NodeId,
    name: &str,
    record: &Value,
) -> Result<Option<Type>, GraphError> {
    let Some(raw) = text(record, "type") else {
        return Ok(None);
    };
    Type::parse(raw)
        .map(Some)
        .map_err(|source| GraphError::InvalidType {
            node: format!("{}.{name}", graph.path_of(owner)),
            type_string: raw.to_string(),
            source,
        })
}

fn add_entity(graph: &mut Graph, parent: NodeId, record: &Value) -> Result<(), GraphError> {
    let Some(name) = text(record, "name") else {
        log::warn!("skipping entity record without a name under {}", graph.path_of(parent));
        return Ok(());
    };
    let entity = graph.attach(parent, NodeKind::Entity, name, None, record.clone(), None)?;

    add_fields(graph, entity, record)?;
    for subtype in array(record, "subtypes") {
        add_entity(graph, entity, subtype)?;
    }
    for endpoint in array(record, "endpoints") {
        add_endpoint(graph, entity, endpoint)?;
    }
    Ok(())
}

fn add_fields(graph: &mut Graph, owner: NodeId, record: &Value) -> Result<(), GraphError> {
    for field in array(record, "fields") {
        let Some(name) = text(field, "name") else {
            log::warn!("skipping field record without a name under {}", graph.path_of(owner));
            continue;
        };
        let ty = parse_type(graph, owner, name, field)?.unwrap_or_else(Type::string);
        graph.attach(owner, NodeKind::Field, name, None, field.clone(), Some(ty))?;
    }
    Ok(())
}

/// One node per method: the header method plus every `methods` entry.
fn add_endpoint(graph: &mut Graph, entity: NodeId, record: &Value) -> Result<(), GraphError> {
    let Some(path) = text(record, "path") else {
        log::warn!("skipping endpoint without a path under {}", graph.path_of(entity));
        return Ok(());
    };

    let mut variants = Vec::new();
    if let Some(method) = text(record, "method") {
        let name = text(record, "name")
            .map(str::to_string)
            .unwrap_or_else(|| method.to_lowercase());
        let mut own = record.clone();
        if let Some(map) = own.as_object_mut() {
            map.remove("methods");
        }
        variants.push((name, method.to_uppercase(), own));
    }
    for entry in array(record, "methods") {
        let Some(method) = text(entry, "method") else {
            continue;
        };
        let mut merged = entry.clone();
        if let (Some(map), Some(directive)) = (merged.as_object_mut(), record.as_object()) {
            for key in INHERITED {
                if !map.contains_key(*key)
                    && let Some(value) = directive.get(*key)
                {
                    map.insert(key.to_string(), value.clone());
                }
            }
        }
        variants.push((method.to_lowercase(), method.to_uppercase(), merged));
    }

    for (name, method, record) in variants {
        let signature = format!("{method} {path}");
        let endpoint = graph.attach(entity, NodeKind::Endpoint, &name, Some(signature), record, None)?;
        add_endpoint_children(graph, entity, endpoint)?;
    }
    Ok(())
}

fn add_endpoint_children(
    graph: &mut Graph,
    entity: NodeId,
    endpoint: NodeId,
) -> Result<(), GraphError> {
    let record = graph.node(endpoint).schema.clone();
    let mut placeholders: Vec<String> = array(&record, "path_parameters")
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    if placeholders.is_empty()
        && let Some(path) = text(&record, "path")
    {
        placeholders = apidsl_syntax::path_parameters(path);
    }
    let mut seen = HashSet::new();
    placeholders.retain(|name| seen.insert(name.clone()));
    let declared: Vec<&Value> = array(&record, "parameters").collect();

    for name in &placeholders {
        let found = declared.iter().find(|p| text(p, "name") == Some(name.as_str()));
        let (schema, ty) = match found {
            Some(parameter) => ((*parameter).clone(), parse_type(graph, endpoint, name, parameter)?),
            None => inferred_parameter(graph, entity, name),
        };
        graph.attach(endpoint, NodeKind::Parameter, name, None, schema, ty)?;
    }
    for parameter in declared {
        let Some(name) = text(parameter, "name") else {
            continue;
        };
        if placeholders.iter().any(|p| p == name) {
            continue;
        }
        let ty = parse_type(graph, endpoint, name, parameter)?;
        graph.attach(endpoint, NodeKind::Parameter, name, None, parameter.clone(), ty)?;
    }

    for query in array(&record, "query") {
        let Some(name) = text(query, "name") else {
            continue;
        };
        let ty = parse_type(graph, endpoint, name, query)?;
        graph.attach(endpoint, NodeKind::Query, name, None, query.clone(), ty)?;
    }

    if let Some(request) = record.get("request") {
        add_body(graph, endpoint, NodeKind::RequestBody, "request", request)?;
    }
    for key in ["success", "failure"] {
        if let Some(response) = record.get(key) {
            add_body(graph, endpoint, NodeKind::Response, key, response)?;
        }
    }
    Ok(())
}

/// Parameter for a placeholder nobody declared: the same-named field's type,
/// else an untyped string.
fn inferred_parameter(graph: &Graph, entity: NodeId, name: &str) -> (Value, Option<Type>) {
    let field = graph
        .children_of_kind(entity, NodeKind::Field)
        .find(|&f| graph.node(f).name == name);
    match field.and_then(|f| graph.node(f).ty.clone()) {
        Some(ty) => {
            log::trace!("path parameter `{name}` typed from field {}", graph.path_of(entity));
            (json!({ "name": name, "type": ty.to_string() }), Some(ty))
        }
        None => (json!({ "name": name, "type": "String" }), Some(Type::string())),
    }
}

fn add_body(
    graph: &mut Graph,
    endpoint: NodeId,
    kind: NodeKind,
    default_name: &str,
    record: &Value,
) -> Result<(), GraphError> {
    let name = text(record, "name").unwrap_or(default_name);
    let ty = parse_type(graph, endpoint, name, record)?;
    let body = graph.attach(endpoint, kind, name, None, record.clone(), ty)?;

    add_fields(graph, body, record)?;
    for subtype in array(record, "subtypes") {
        add_entity(graph, body, subtype)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(graph: &Graph, id: NodeId) -> Vec<(NodeKind, String)> {
        graph
            .children(id)
            .iter()
            .map(|&c| (graph.node(c).kind, graph.node(c).name.clone()))
            .collect()
    }

    #[test]
    fn entity_children_in_order() {
        let schema = json!({
            "entities": [{
                "name": "Article",
                "fields": [{ "name": "id", "type": "Integer" }],
                "subtypes": [{ "name": "Comment", "fields": [] }],
                "endpoints": [{ "method": "GET", "path": "/articles" }]
            }],
            "scenarios": [{ "name": "smoke", "steps": [] }]
        });
        let graph = build(&schema, Config::default()).unwrap();
        let root = graph.root_id();

        assert_eq!(
            names(&graph, root),
            vec![
                (NodeKind::Entity, "Article".to_string()),
                (NodeKind::Scenario, "smoke".to_string()),
            ]
        );
        let article = graph.children(root)[0];
        assert_eq!(
            names(&graph, article),
            vec![
                (NodeKind::Field, "id".to_string()),
                (NodeKind::Entity, "Comment".to_string()),
                (NodeKind::Endpoint, "get".to_string()),
            ]
        );
    }

    #[test]
    fn placeholder_without_declaration_uses_field_then_string() {
        let schema = json!({
            "entities": [{
                "name": "Person",
                "fields": [{ "name": "id", "type": "Integer" }],
                "endpoints": [{
                    "method": "GET",
                    "path": "/persons/$id/{slug}",
                    "path_parameters": ["id", "slug"]
                }]
            }]
        });
        let graph = build(&schema, Config::default()).unwrap();
        let endpoint = graph.resolve(graph.root_id(), "GET /persons/$id/{slug}").unwrap();
        let types: Vec<_> = graph
            .children_of_kind(endpoint, NodeKind::Parameter)
            .map(|p| (graph.node(p).name.clone(), graph.node(p).ty.as_ref().map(ToString::to_string)))
            .collect();

        assert_eq!(
            types,
            vec![
                ("id".to_string(), Some("Integer".to_string())),
                ("slug".to_string(), Some("String".to_string())),
            ]
        );
    }

    #[test]
    fn repeated_placeholder_binds_once() {
        let schema = json!({
            "entities": [{
                "name": "P",
                "endpoints": [{
                    "method": "GET",
                    "path": "/a/$id/b/{id}",
                    "path_parameters": ["id", "id"]
                }]
            }]
        });
        let graph = build(&schema, Config::default()).unwrap();
        let endpoint = graph.resolve(graph.root_id(), "GET /a/$id/b/{id}").unwrap();
        let names: Vec<_> = graph
            .children_of_kind(endpoint, NodeKind::Parameter)
            .map(|p| graph.node(p).name.clone())
            .collect();
        assert_eq!(names, vec!["id".to_string()]);
    }

    #[test]
    fn duplicate_field_is_fatal() {
        let schema = json!({
            "entities": [{
                "name": "A",
                "fields": [{ "name": "x", "type": "String" }, { "name": "x", "type": "Integer" }]
            }]
        });
        let err = build(&schema, Config::default()).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateName { ref name, .. } if name == "x"));
    }

    #[test]
    fn duplicate_entity_is_fatal() {
        let schema = json!({ "entities": [{ "name": "A" }, { "name": "A" }] });
        let err = build(&schema, Config::default()).unwrap_err();
        assert_eq!(err.to_string(), "duplicate entity `A` under <root> (already defined as entity)");
    }

    #[test]
    fn invalid_type_string_is_fatal() {
        let schema = json!({
            "entities": [{ "name": "A", "fields": [{ "name": "x", "type": "List<" }] }]
        });
        let err = build(&schema, Config::default()).unwrap_err();
        assert!(matches!(err, GraphError::InvalidType { ref node, .. } if node == "A.x"));
    }

    #[test]
    fn nameless_records_are_skipped() {
        let schema = json!({ "entities": [{ "fields": [] }, { "name": "B" }] });
        let graph = build(&schema, Config::default()).unwrap();
        assert_eq!(names(&graph, graph.root_id()), vec![(NodeKind::Entity, "B".to_string())]);
    }
}
