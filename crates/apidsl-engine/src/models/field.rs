use serde_json::Value;

use super::{AnyNode, Entity, Type, effective_type};
use crate::graph::NodeKind;

node_view!(
    /// A typed member of an entity or body.
    Field
);

impl<'g> Field<'g> {
    /// Declared type, `String` when none was written.
    pub fn ty(&self) -> Type {
        self.node().ty.clone().unwrap_or_else(Type::string)
    }

    /// Declared type with references to other fields followed.
    pub fn effective_type(&self) -> Type {
        effective_type(self.graph, self.id)
    }

    pub fn is_mutable(&self) -> bool {
        self.schema()
            .get("mutable")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Mutable or annotated `@writer`.
    pub fn is_writer(&self) -> bool {
        self.is_mutable() || self.annotations().contains(&"writer")
    }

    pub fn default_value(&self) -> Option<&'g Value> {
        self.schema().get("default")
    }

    pub fn example(&self) -> Option<&'g Value> {
        self.schema().get("example")
    }

    pub fn enum_values(&self) -> &'g [Value] {
        self.schema()
            .get("enum")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Owning entity or body.
    pub fn owner(&self) -> Option<AnyNode<'g>> {
        self.graph
            .parent(self.id)
            .map(|id| AnyNode::new(self.graph, id))
    }

    /// Inline subtype declared by a `*` field's `schema` block.
    pub fn subtype(&self) -> Option<Entity<'g>> {
        let name = self.schema().get("subtype").and_then(Value::as_str)?;
        let owner = self.graph.parent(self.id)?;
        self.graph
            .children_of_kind(owner, NodeKind::Entity)
            .find(|&id| self.graph.node(id).name == name)
            .map(|id| Entity::new(self.graph, id))
    }

    /// Whatever a reference type points at.
    pub fn referenced(&self) -> Option<AnyNode<'g>> {
        let ty = self.ty();
        let path = ty.reference()?;
        let target = self.graph.resolve(self.graph.scope_of(self.id), path);
        if target.is_none() {
            log::debug!("unresolved type `{path}` on {}", self.graph.path_of(self.id));
        }
        target.map(|id| AnyNode::new(self.graph, id))
    }

    /// Entity a reference type points at, through references to other fields.
    pub fn referenced_entity(&self) -> Option<Entity<'g>> {
        let mut visiting = std::collections::HashSet::new();
        let mut current = *self;
        loop {
            if !visiting.insert(current.id) {
                return None;
            }
            match current.referenced()? {
                AnyNode::Entity(entity) => return Some(entity),
                AnyNode::Field(field) => current = field,
                _ => return None,
            }
        }
    }

    /// Inline subtype, else referenced entity.
    pub fn target_entity(&self) -> Option<Entity<'g>> {
        self.subtype().or_else(|| self.referenced_entity())
    }
}
