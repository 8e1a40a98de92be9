use std::collections::HashSet;

use serde_json::Value;

use super::{AnyNode, Endpoint, Field};
use crate::error::AssertionError;
use crate::graph::{Graph, NodeId, NodeKind};
use crate::mock::{AssertOptions, Asserter, Mocker};

node_view!(
    /// A named record type: fields, endpoints and nested subtypes.
    Entity
);

impl<'g> Entity<'g> {
    pub fn fields(&self) -> Vec<Field<'g>> {
        self.graph
            .children_of_kind(self.id, NodeKind::Field)
            .map(|id| Field::new(self.graph, id))
            .collect()
    }

    pub fn endpoints(&self) -> Vec<Endpoint<'g>> {
        self.graph
            .children_of_kind(self.id, NodeKind::Endpoint)
            .map(|id| Endpoint::new(self.graph, id))
            .collect()
    }

    pub fn subtypes(&self) -> Vec<Entity<'g>> {
        self.graph
            .children_of_kind(self.id, NodeKind::Entity)
            .map(|id| Entity::new(self.graph, id))
            .collect()
    }

    pub fn field(&self, name: &str) -> Option<Field<'g>> {
        self.fields().into_iter().find(|f| f.name() == name)
    }

    pub fn endpoint(&self, name: &str) -> Option<Endpoint<'g>> {
        self.endpoints().into_iter().find(|e| e.name() == name)
    }

    /// Enclosing entity for a subtype.
    pub fn parent_entity(&self) -> Option<Entity<'g>> {
        let parent = self.graph.parent(self.id)?;
        (self.graph.node(parent).kind == NodeKind::Entity).then(|| Entity::new(self.graph, parent))
    }

    /// Dotted path from the root, e.g. `Article.Comment`.
    pub fn qualified_name(&self) -> String {
        self.graph.path_of(self.id)
    }

    pub fn resolve(&self, path: &str) -> Option<AnyNode<'g>> {
        self.graph
            .resolve(self.id, path)
            .map(|id| AnyNode::new(self.graph, id))
    }

    /// True when some field is mutable or `@writer`, or some other entity
    /// reached through a field requires a writer.
    pub fn require_writer(&self) -> bool {
        require_writer_in(self.graph, self.id, &mut HashSet::new())
    }

    /// True when every field is writable, recursively.
    pub fn is_writable(&self) -> bool {
        writable_in(self.graph, self.id, &mut HashSet::new())
    }

    pub fn writer(&self) -> Option<Writer<'g>> {
        self.require_writer().then_some(Writer { entity: *self })
    }

    /// Representative value built from the declarations.
    pub fn mock(&self) -> Value {
        Mocker::new(self.graph).object(self.id)
    }

    /// Check `value` with default options, paths rooted at the entity name.
    pub fn assert(&self, value: &Value) -> Result<(), AssertionError> {
        let options = AssertOptions {
            allow_additional: !self.graph.config().features.strict_assertions,
            ..AssertOptions::default()
        };
        self.assert_with(value, self.name(), &options)
    }

    pub fn assert_with(
        &self,
        value: &Value,
        path: &str,
        options: &AssertOptions,
    ) -> Result<(), AssertionError> {
        Asserter::new(self.graph, *options).object(self.id, value, path)
    }
}

/// Entities a field leads to: its inline subtype or its referenced entity.
fn targets(graph: &Graph, entity: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    graph
        .children_of_kind(entity, NodeKind::Field)
        .filter_map(move |id| Field::new(graph, id).target_entity())
        .map(|target| target.id())
}

// `visited` lives for one top-level query. A revisited entity adds nothing
// new: its answer was either already folded in or is still being computed
// further up the stack.
fn require_writer_in(graph: &Graph, entity: NodeId, visited: &mut HashSet<NodeId>) -> bool {
    if !visited.insert(entity) {
        return false;
    }
    let own = graph
        .children_of_kind(entity, NodeKind::Field)
        .any(|id| Field::new(graph, id).is_writer());
    own || targets(graph, entity)
        .collect::<Vec<_>>()
        .into_iter()
        .any(|target| require_writer_in(graph, target, visited))
}

fn writable_in(graph: &Graph, entity: NodeId, visited: &mut HashSet<NodeId>) -> bool {
    if !visited.insert(entity) {
        return true;
    }
    let fields: Vec<_> = graph
        .children_of_kind(entity, NodeKind::Field)
        .map(|id| Field::new(graph, id))
        .collect();
    fields.iter().all(|field| {
        field.is_writer()
            && field
                .target_entity()
                .is_none_or(|target| writable_in(graph, target.id(), visited))
    })
}

/// Write-side projection of an entity: only its writer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Writer<'g> {
    entity: Entity<'g>,
}

impl<'g> Writer<'g> {
    pub fn entity(&self) -> Entity<'g> {
        self.entity
    }

    /// `ArticleWriter` for `Article`.
    pub fn name(&self) -> String {
        format!("{}Writer", self.entity.name())
    }

    pub fn fields(&self) -> Vec<Field<'g>> {
        self.entity
            .fields()
            .into_iter()
            .filter(Field::is_writer)
            .collect()
    }

    pub fn mock(&self) -> Value {
        let mut mocker = Mocker::new(self.entity.graph());
        let object = self
            .fields()
            .into_iter()
            .map(|field| (field.name().to_string(), mocker.field(field.id())))
            .collect();
        Value::Object(object)
    }
}
