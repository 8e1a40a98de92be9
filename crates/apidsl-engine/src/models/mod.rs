//! Typed views over graph nodes.
//!
//! A view is a `(&Graph, NodeId)` pair. It reads the node's schema record
//! lazily and never owns anything, so views are `Copy` and can be handed out
//! freely while the graph is borrowed.

use crate::graph::{Graph, NodeId, NodeKind};

macro_rules! node_view {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'g> {
            graph: &'g $crate::graph::Graph,
            id: $crate::graph::NodeId,
        }

        impl<'g> $name<'g> {
            pub(crate) fn new(graph: &'g $crate::graph::Graph, id: $crate::graph::NodeId) -> Self {
                Self { graph, id }
            }

            pub fn id(&self) -> $crate::graph::NodeId {
                self.id
            }

            pub fn graph(&self) -> &'g $crate::graph::Graph {
                self.graph
            }

            pub fn node(&self) -> &'g $crate::graph::Node {
                self.graph.node(self.id)
            }

            pub fn name(&self) -> &'g str {
                &self.node().name
            }

            pub fn schema(&self) -> &'g serde_json::Value {
                &self.node().schema
            }

            pub fn description(&self) -> Option<&'g str> {
                self.schema().get("description").and_then(serde_json::Value::as_str)
            }

            pub fn annotations(&self) -> Vec<&'g str> {
                self.schema()
                    .get("annotation")
                    .and_then(serde_json::Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(serde_json::Value::as_str)
                    .collect()
            }
        }

        impl PartialEq for $name<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.graph, other.graph) && self.id == other.id
            }
        }

        impl Eq for $name<'_> {}
    };
}

pub mod endpoint;
pub mod entity;
pub mod field;
pub mod root;
pub mod scenario;
pub mod types;

pub use endpoint::{Endpoint, Parameter, Query, RequestBody, Response};
pub use entity::{Entity, Writer};
pub use field::Field;
pub use root::Root;
pub use scenario::{CommandStep, RequestStep, Scenario, Step};
pub use types::{Type, TypeClass};

/// Any node, viewed through the wrapper for its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyNode<'g> {
    Root(Root<'g>),
    Entity(Entity<'g>),
    Field(Field<'g>),
    Endpoint(Endpoint<'g>),
    Parameter(Parameter<'g>),
    Query(Query<'g>),
    RequestBody(RequestBody<'g>),
    Response(Response<'g>),
    Scenario(Scenario<'g>),
}

impl<'g> AnyNode<'g> {
    pub fn new(graph: &'g Graph, id: NodeId) -> Self {
        match graph.node(id).kind {
            NodeKind::Root => AnyNode::Root(Root::new(graph, id)),
            NodeKind::Entity => AnyNode::Entity(Entity::new(graph, id)),
            NodeKind::Field => AnyNode::Field(Field::new(graph, id)),
            NodeKind::Endpoint => AnyNode::Endpoint(Endpoint::new(graph, id)),
            NodeKind::Parameter => AnyNode::Parameter(Parameter::new(graph, id)),
            NodeKind::Query => AnyNode::Query(Query::new(graph, id)),
            NodeKind::RequestBody => AnyNode::RequestBody(RequestBody::new(graph, id)),
            NodeKind::Response => AnyNode::Response(Response::new(graph, id)),
            NodeKind::Scenario => AnyNode::Scenario(Scenario::new(graph, id)),
        }
    }

    pub fn as_entity(self) -> Option<Entity<'g>> {
        match self {
            AnyNode::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_field(self) -> Option<Field<'g>> {
        match self {
            AnyNode::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_endpoint(self) -> Option<Endpoint<'g>> {
        match self {
            AnyNode::Endpoint(endpoint) => Some(endpoint),
            _ => None,
        }
    }
}

/// Type of a node that carries one, following field references.
///
/// Parameters, queries and fields typed as a plain reference to another field
/// take that field's type, keeping their own optionality. A reference cycle
/// or a miss ends at `String`.
pub(crate) fn effective_type(graph: &Graph, id: NodeId) -> Type {
    let mut visiting = std::collections::HashSet::new();
    let mut optional = false;
    let mut current = id;
    let resolved = loop {
        if !visiting.insert(current) {
            log::debug!("reference cycle through {}", graph.path_of(current));
            break Type::string();
        }
        let Some(ty) = graph.node(current).ty.clone() else {
            break Type::string();
        };
        let bare = ty.to_required();
        let path = match bare.reference() {
            Some(path) if !bare.is_list() => path,
            _ => break ty,
        };
        match graph.resolve(graph.scope_of(current), path) {
            Some(target) if graph.node(target).ty.is_some() => {
                optional |= ty.is_optional();
                current = target;
            }
            Some(_) => break ty,
            None => {
                log::debug!("unresolved type `{path}` at {}", graph.path_of(id));
                break Type::string();
            }
        }
    };
    if optional { resolved.to_optional() } else { resolved }
}
