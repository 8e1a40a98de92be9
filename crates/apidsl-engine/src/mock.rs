//! Type-directed mock synthesis and value assertions.
//!
//! Both walk the same shape: a node with `Field` children is an object, a
//! typed node follows its type through list and optional wrappers down to a
//! primitive, an inline subtype, or a reference resolved in the node's
//! entity scope.

use std::collections::HashSet;

use apidsl_syntax::TypeExpr;
use serde_json::{Map, Value};

use crate::error::AssertionError;
use crate::graph::{Graph, NodeId, NodeKind};
use crate::models::types::{Type, primitive_accepts, primitive_mock};

/// How strictly [`Asserter`] compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertOptions {
    /// Tolerate missing required fields
    pub partial: bool,
    /// Tolerate keys no field declares
    pub allow_additional: bool,
}

impl Default for AssertOptions {
    fn default() -> Self {
        Self {
            partial: false,
            allow_additional: true,
        }
    }
}

pub(crate) struct Mocker<'g> {
    graph: &'g Graph,
    /// Objects on the current path; re-entering one yields `null`
    visiting: HashSet<NodeId>,
}

impl<'g> Mocker<'g> {
    pub(crate) fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            visiting: HashSet::new(),
        }
    }

    /// Object built from `id`'s field children.
    pub(crate) fn object(&mut self, id: NodeId) -> Value {
        if !self.visiting.insert(id) {
            log::trace!("mock cycle at {}", self.graph.path_of(id));
            return Value::Null;
        }
        let graph = self.graph;
        let mut object = Map::new();
        for field in graph.children_of_kind(id, NodeKind::Field) {
            object.insert(graph.node(field).name.clone(), self.field(field));
        }
        self.visiting.remove(&id);
        Value::Object(object)
    }

    /// Example, else default, else a value synthesised from the type.
    pub(crate) fn field(&mut self, id: NodeId) -> Value {
        let node = self.graph.node(id);
        if let Some(example) = node.schema.get("example") {
            return example.clone();
        }
        if let Some(default) = node.schema.get("default") {
            return default.clone();
        }
        let ty = node.ty.clone().unwrap_or_else(Type::string);
        self.typed(id, ty.expr())
    }

    /// Request or response payload: its type if declared, else its fields.
    pub(crate) fn body(&mut self, id: NodeId) -> Value {
        match self.graph.node(id).ty.clone() {
            Some(ty) => self.typed(id, ty.expr()),
            None => self.object(id),
        }
    }

    fn typed(&mut self, at: NodeId, expr: &TypeExpr) -> Value {
        match expr {
            TypeExpr::Optional(inner) => self.typed(at, inner),
            TypeExpr::List(inner) => Value::Array(vec![self.typed(at, inner)]),
            TypeExpr::SelfDefined => match inline_subtype(self.graph, at) {
                Some(subtype) => self.object(subtype),
                None => Value::Object(Map::new()),
            },
            TypeExpr::Named(name) if name == "Enum" => self
                .graph
                .node(at)
                .schema
                .get("enum")
                .and_then(Value::as_array)
                .and_then(|values| values.first())
                .cloned()
                .unwrap_or(Value::Null),
            TypeExpr::Named(name) => {
                if let Some(value) = primitive_mock(name) {
                    return value;
                }
                match self.graph.resolve(self.graph.scope_of(at), name) {
                    Some(target) => self.node(target),
                    None => {
                        log::debug!("no mock for unresolved `{name}` at {}", self.graph.path_of(at));
                        Value::Null
                    }
                }
            }
        }
    }

    fn node(&mut self, target: NodeId) -> Value {
        match self.graph.node(target).kind {
            NodeKind::Entity => self.object(target),
            NodeKind::Field | NodeKind::Parameter | NodeKind::Query => {
                if !self.visiting.insert(target) {
                    return Value::Null;
                }
                let value = self.field(target);
                self.visiting.remove(&target);
                value
            }
            NodeKind::RequestBody | NodeKind::Response => self.body(target),
            _ => Value::Null,
        }
    }
}

/// The subtype named by a `*` field's `subtype` key, among its siblings.
fn inline_subtype(graph: &Graph, field: NodeId) -> Option<NodeId> {
    let name = graph.node(field).schema.get("subtype").and_then(Value::as_str)?;
    let owner = graph.parent(field)?;
    graph
        .children_of_kind(owner, NodeKind::Entity)
        .find(|&id| graph.node(id).name == name)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn expectation(primitive: &str) -> &'static str {
    match primitive {
        "Integer" | "Long" => "a whole number",
        "Float" | "Double" | "Decimal" | "Number" => "a number",
        "Boolean" => "a boolean",
        _ => "a string",
    }
}

fn mismatch(path: &str, expected: &str, found: &Value) -> AssertionError {
    AssertionError::new(path, format!("expected {expected}, found {}", describe(found)))
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

pub(crate) struct Asserter<'g> {
    graph: &'g Graph,
    options: AssertOptions,
    /// Objects on the current path; a `null` reference back to one of them
    /// is where [`Mocker`] cut the cycle
    entered: Vec<NodeId>,
}

impl<'g> Asserter<'g> {
    pub(crate) fn new(graph: &'g Graph, options: AssertOptions) -> Self {
        Self {
            graph,
            options,
            entered: Vec::new(),
        }
    }

    /// Check an object against `id`'s field children.
    pub(crate) fn object(
        &mut self,
        id: NodeId,
        value: &Value,
        path: &str,
    ) -> Result<(), AssertionError> {
        let Value::Object(object) = value else {
            return Err(mismatch(path, "an object", value));
        };
        self.entered.push(id);
        let result = self.members(id, object, path);
        self.entered.pop();
        result
    }

    fn members(
        &mut self,
        id: NodeId,
        object: &Map<String, Value>,
        path: &str,
    ) -> Result<(), AssertionError> {
        let graph = self.graph;
        let fields: Vec<NodeId> = graph.children_of_kind(id, NodeKind::Field).collect();
        for &field in &fields {
            let node = graph.node(field);
            let field_path = join(path, &node.name);
            match object.get(&node.name) {
                Some(actual) => self.field(field, actual, &field_path)?,
                None => {
                    let optional = node.ty.as_ref().is_some_and(Type::is_optional);
                    if !optional && !self.options.partial {
                        return Err(AssertionError::new(field_path, "missing required field"));
                    }
                }
            }
        }

        if !self.options.allow_additional
            && let Some(key) = object
                .keys()
                .find(|key| !fields.iter().any(|&f| &graph.node(f).name == *key))
        {
            return Err(AssertionError::new(join(path, key), "undeclared field"));
        }
        Ok(())
    }

    pub(crate) fn field(
        &mut self,
        id: NodeId,
        value: &Value,
        path: &str,
    ) -> Result<(), AssertionError> {
        let ty = self.graph.node(id).ty.clone().unwrap_or_else(Type::string);
        self.typed(id, ty.expr(), value, path, &mut HashSet::new())
    }

    pub(crate) fn body(
        &mut self,
        id: NodeId,
        value: &Value,
        path: &str,
    ) -> Result<(), AssertionError> {
        match self.graph.node(id).ty.clone() {
            Some(ty) => self.typed(id, ty.expr(), value, path, &mut HashSet::new()),
            None => self.object(id, value, path),
        }
    }

    fn typed(
        &mut self,
        at: NodeId,
        expr: &TypeExpr,
        value: &Value,
        path: &str,
        following: &mut HashSet<NodeId>,
    ) -> Result<(), AssertionError> {
        match expr {
            TypeExpr::Optional(_) if value.is_null() => Ok(()),
            TypeExpr::Optional(inner) => self.typed(at, inner, value, path, following),
            TypeExpr::Named(name) if value.is_null() && self.closes_cycle(at, name, following) => {
                log::trace!("accepting null at cycle {path}");
                Ok(())
            }
            _ if value.is_null() => Err(AssertionError::new(path, "null for a required value")),
            TypeExpr::List(inner) => {
                let Value::Array(items) = value else {
                    return Err(mismatch(path, "a list", value));
                };
                for (index, item) in items.iter().enumerate() {
                    self.typed(at, inner, item, &format!("{path}[{index}]"), following)?;
                }
                Ok(())
            }
            TypeExpr::SelfDefined => match inline_subtype(self.graph, at) {
                Some(subtype) => self.object(subtype, value, path),
                None if value.is_object() => Ok(()),
                None => Err(mismatch(path, "an object", value)),
            },
            TypeExpr::Named(name) if name == "Enum" => {
                let allowed = self.graph.node(at).schema.get("enum").and_then(Value::as_array);
                match allowed {
                    Some(allowed) if !allowed.contains(value) => Err(AssertionError::new(
                        path,
                        format!("{value} is not one of {}", Value::Array(allowed.clone())),
                    )),
                    _ => Ok(()),
                }
            }
            TypeExpr::Named(name) => match primitive_accepts(name, value) {
                Some(true) => Ok(()),
                Some(false) => Err(mismatch(path, expectation(name), value)),
                None => self.reference(at, name, value, path, following),
            },
        }
    }

    fn reference(
        &mut self,
        at: NodeId,
        name: &str,
        value: &Value,
        path: &str,
        following: &mut HashSet<NodeId>,
    ) -> Result<(), AssertionError> {
        let graph = self.graph;
        let Some(target) = graph.resolve(graph.scope_of(at), name) else {
            log::debug!("not checking unresolved `{name}` at {path}");
            return Ok(());
        };
        let node = graph.node(target);
        match node.kind {
            NodeKind::Entity => self.object(target, value, path),
            NodeKind::Field | NodeKind::Parameter | NodeKind::Query => {
                if !following.insert(target) {
                    return Ok(());
                }
                let ty = node.ty.clone().unwrap_or_else(Type::string);
                let result = self.typed(target, ty.expr(), value, path, following);
                following.remove(&target);
                result
            }
            NodeKind::RequestBody | NodeKind::Response => self.body(target, value, path),
            _ => Ok(()),
        }
    }

    /// True when `name` leads back to an object or field reference already
    /// being checked further up.
    fn closes_cycle(&self, at: NodeId, name: &str, following: &HashSet<NodeId>) -> bool {
        if primitive_accepts(name, &Value::Null).is_some() {
            return false;
        }
        self.graph
            .resolve(self.graph.scope_of(at), name)
            .is_some_and(|target| self.entered.contains(&target) || following.contains(&target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    const SOURCE: &str = r#"
entity Person {
  field id: Integer
  field name: String
  field nickname: String?
  field tags: List<String>
  field manager: Person?
  field role: Enum { enum ["admin", "user"] }
  field address: * { schema { field city: String } }
  field country: String { example "NZ" }
}
"#;

    #[test]
    fn mock_person() {
        let graph = compile("t", SOURCE).unwrap();
        let person = graph.root().entity("Person").unwrap();

        assert_eq!(
            person.mock(),
            json!({
                "id": 1,
                "name": "string",
                "nickname": "string",
                "tags": ["string"],
                "manager": null,
                "role": "admin",
                "address": { "city": "string" },
                "country": "NZ"
            })
        );
    }

    #[test]
    fn mock_passes_its_own_assertion() {
        let graph = compile("t", SOURCE).unwrap();
        let person = graph.root().entity("Person").unwrap();
        assert_eq!(person.assert(&person.mock()), Ok(()));
    }

    #[test]
    fn mutual_references_terminate() {
        let graph = compile("t", "entity A { field b: B }\nentity B { field a: A }").unwrap();
        let a = graph.root().entity("A").unwrap();
        assert_eq!(a.mock(), json!({ "b": { "a": null } }));
    }

    #[test]
    fn required_cycle_accepts_its_own_mock() {
        let graph = compile("t", "entity A { field b: B }\nentity B { field a: A }").unwrap();
        let a = graph.root().entity("A").unwrap();
        let b = graph.root().entity("B").unwrap();

        assert_eq!(a.assert(&a.mock()), Ok(()));
        assert_eq!(b.assert(&b.mock()), Ok(()));
        assert_eq!(a.assert(&json!({ "b": { "a": { "b": null } } })), Ok(()));
        assert_eq!(
            a.assert(&json!({ "b": null })),
            Err(AssertionError::new("A.b", "null for a required value"))
        );
    }

    fn valid() -> Value {
        json!({
            "id": 7,
            "name": "Ann",
            "tags": [],
            "role": "user",
            "address": { "city": "Wellington" },
            "country": "NZ"
        })
    }

    #[rstest]
    #[case("/id", json!("7"), "Person.id: expected a whole number, found a string")]
    #[case("/name", Value::Null, "Person.name: null for a required value")]
    #[case("/tags", json!(["a", 2]), "Person.tags[1]: expected a string, found a number")]
    #[case("/role", json!("root"), r#"Person.role: "root" is not one of ["admin","user"]"#)]
    #[case("/address", json!({}), "Person.address.city: missing required field")]
    #[case("/manager", json!({ "id": 1 }), "Person.manager.name: missing required field")]
    fn assertion_failures(#[case] pointer: &str, #[case] replacement: Value, #[case] message: &str) {
        let graph = compile("t", SOURCE).unwrap();
        let person = graph.root().entity("Person").unwrap();
        let mut value = valid();
        match value.pointer_mut(pointer) {
            Some(slot) => *slot = replacement,
            None => {
                value[&pointer[1..]] = replacement;
            }
        }

        let err = person.assert(&value).unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn missing_field_and_options() {
        let graph = compile("t", SOURCE).unwrap();
        let person = graph.root().entity("Person").unwrap();
        let mut value = valid();
        value.as_object_mut().unwrap().remove("name");

        let err = person.assert(&value).unwrap_err();
        assert_eq!(err, AssertionError::new("Person.name", "missing required field"));

        let partial = AssertOptions { partial: true, ..AssertOptions::default() };
        assert_eq!(person.assert_with(&value, "Person", &partial), Ok(()));

        value["extra"] = json!(1);
        let strict = AssertOptions { partial: true, allow_additional: false };
        let err = person.assert_with(&value, "p", &strict).unwrap_err();
        assert_eq!(err, AssertionError::new("p.extra", "undeclared field"));
    }
}
