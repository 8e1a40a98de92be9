//! # Node Graph
//!
//! Every resolved construct lives in one arena owned by [`Graph`]. Nodes
//! refer to each other through [`NodeId`] indices: a parent lists its
//! children in declaration order, a child stores its parent's index. The
//! arena only grows while building and is read-only afterwards, so a
//! `&Graph` can be shared freely.
//!
//! ## Resolution
//!
//! Dotted paths resolve segment by segment:
//!
//! ```text
//! resolve("Person.id") from Article
//!   "Person": Article? no · Article's children? no · root's children → Person
//!   "id":     Person's children → Person.id        (no global fallback)
//! ```
//!
//! Only the first segment may fall back to the root; later segments are
//! looked up strictly below the previous hit. An entity checks its own
//! endpoint names before anything else, and paths shaped like
//! `"GET /persons/$id"` are matched against endpoint signatures directly.

use std::fmt;

use apidsl_config::Config;
use serde_json::Value;

use crate::error::GraphError;
use crate::models::types::Type;

pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD"];

/// Index of a node in its [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Entity,
    Field,
    Endpoint,
    Parameter,
    Query,
    RequestBody,
    Response,
    Scenario,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Root => "root",
            NodeKind::Entity => "entity",
            NodeKind::Field => "field",
            NodeKind::Endpoint => "endpoint",
            NodeKind::Parameter => "parameter",
            NodeKind::Query => "query",
            NodeKind::RequestBody => "request body",
            NodeKind::Response => "response",
            NodeKind::Scenario => "scenario",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub name: String,
    /// Secondary identity, `"METHOD path"` for endpoints
    pub id: Option<String>,
    /// The schema record this node wraps
    pub schema: Value,
    /// Parsed `type`, for nodes that declare one
    pub ty: Option<Type>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// True when `segment` is this node's name or id.
    pub fn matches(&self, segment: &str) -> bool {
        self.name == segment || self.id.as_deref() == Some(segment)
    }
}

/// Normalise `"GET  /a"` to `"GET /a"`; `None` when not method-prefixed.
pub fn signature(path: &str) -> Option<String> {
    let (method, rest) = path.split_once(' ')?;
    let rest = rest.trim_start();
    (HTTP_METHODS.contains(&method) && rest.starts_with('/')).then(|| format!("{method} {rest}"))
}

#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    config: Config,
}

impl Graph {
    pub(crate) fn new(schema: Value, config: Config) -> Self {
        let root = Node {
            kind: NodeKind::Root,
            name: String::new(),
            id: None,
            schema,
            ty: None,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            config,
        }
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Children of one kind, in declaration order.
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.node(child).kind == kind)
    }

    /// Every node below `id`, depth first, parents before children.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Attach a new child, rejecting a sibling with the same name and id.
    pub(crate) fn attach(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        name: &str,
        id: Option<String>,
        schema: Value,
        ty: Option<Type>,
    ) -> Result<NodeId, GraphError> {
        let clash = self.children(parent).iter().copied().find(|&c| {
            let sibling = self.node(c);
            sibling.name == name && sibling.id == id
        });
        if let Some(existing) = clash {
            let duplicate_source = schema
                .get("source")
                .and_then(Value::as_str)
                .or_else(|| self.source_of(parent));
            return Err(GraphError::DuplicateName {
                parent: self.path_of(parent),
                name: name.to_string(),
                id,
                existing: self.node(existing).kind,
                duplicate: kind,
                existing_source: self.source_of(existing).map(str::to_string),
                duplicate_source: duplicate_source.map(str::to_string),
            });
        }

        let node_id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            name: name.to_string(),
            id,
            schema,
            ty,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(node_id);
        Ok(node_id)
    }

    /// URI of the source file `id` was loaded from, when its top-level
    /// record carries one.
    pub fn source_of(&self, id: NodeId) -> Option<&str> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if let Some(source) = node.schema.get("source").and_then(Value::as_str) {
                return Some(source);
            }
            current = node.parent;
        }
        None
    }

    /// Dotted name path from the root, for messages.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if node.kind != NodeKind::Root {
                names.push(node.name.as_str());
            }
            current = node.parent;
        }
        if names.is_empty() {
            return "<root>".to_string();
        }
        names.reverse();
        names.join(".")
    }

    /// Nearest entity at or above `id`, else the root.
    pub fn scope_of(&self, id: NodeId) -> NodeId {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if self.node(node_id).kind == NodeKind::Entity {
                return node_id;
            }
            current = self.parent(node_id);
        }
        self.root_id()
    }

    /// Resolve a dotted path from `from`, allowing the first hop to go global.
    pub fn resolve(&self, from: NodeId, path: &str) -> Option<NodeId> {
        self.resolve_with(from, path, true)
    }

    pub fn resolve_with(&self, from: NodeId, path: &str, allow_global: bool) -> Option<NodeId> {
        if let Some(signature) = signature(path) {
            if from != self.root_id() && !allow_global {
                return None;
            }
            log::trace!("resolving `{path}` as an endpoint signature");
            return self.endpoint_by_signature(&signature);
        }

        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.resolve_segment(from, first, allow_global)?;
        for segment in segments {
            current = self.resolve_segment(current, segment, false)?;
        }
        Some(current)
    }

    fn resolve_segment(&self, from: NodeId, segment: &str, allow_global: bool) -> Option<NodeId> {
        if segment.is_empty() {
            return None;
        }
        let node = self.node(from);
        log::trace!("resolving `{segment}` at {}", self.path_of(from));

        if node.kind == NodeKind::Entity
            && let Some(endpoint) = self
                .children_of_kind(from, NodeKind::Endpoint)
                .find(|&c| self.node(c).name == segment)
        {
            return Some(endpoint);
        }
        if from != self.root_id() && node.matches(segment) {
            return Some(from);
        }
        if let Some(&child) = node.children.iter().find(|&&c| self.node(c).matches(segment)) {
            return Some(child);
        }
        if allow_global && from != self.root_id() {
            return self.resolve_segment(self.root_id(), segment, false);
        }
        None
    }

    /// Endpoint whose `"METHOD path"` id equals `signature`.
    pub fn endpoint_by_signature(&self, signature: &str) -> Option<NodeId> {
        self.descendants(self.root_id()).into_iter().find(|&id| {
            let node = self.node(id);
            node.kind == NodeKind::Endpoint && node.id.as_deref() == Some(signature)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    /// root ─ Person ─ id (field)
    ///              └ show (endpoint, "GET /persons/$id")
    ///      └ Article ─ author (field)
    fn sample() -> (Graph, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new(Value::Null, Config::default());
        let root = graph.root_id();
        let person = graph
            .attach(root, NodeKind::Entity, "Person", None, json!({}), None)
            .unwrap();
        let id = graph
            .attach(person, NodeKind::Field, "id", None, json!({}), None)
            .unwrap();
        let show = graph
            .attach(
                person,
                NodeKind::Endpoint,
                "show",
                Some("GET /persons/$id".into()),
                json!({}),
                None,
            )
            .unwrap();
        let article = graph
            .attach(root, NodeKind::Entity, "Article", None, json!({}), None)
            .unwrap();
        graph
            .attach(article, NodeKind::Field, "author", None, json!({}), None)
            .unwrap();
        (graph, person, id, show, article)
    }

    #[test]
    fn resolve_child_and_self() {
        let (graph, person, id, _, _) = sample();
        assert_eq!(graph.resolve(person, "id"), Some(id));
        assert_eq!(graph.resolve(person, "Person"), Some(person));
        assert_eq!(graph.resolve(person, "Person.id"), Some(id));
    }

    #[test]
    fn first_hop_may_go_global() {
        let (graph, person, id, _, article) = sample();
        assert_eq!(graph.resolve(article, "Person"), Some(person));
        assert_eq!(graph.resolve(article, "Person.id"), Some(id));
        assert_eq!(graph.resolve_with(article, "Person", false), None);
    }

    #[test]
    fn later_hops_stay_local() {
        let (graph, _, _, _, article) = sample();
        // "Article" exists globally but not below Person
        assert_eq!(graph.resolve(article, "Person.Article"), None);
        assert_eq!(graph.resolve(article, "Person.id.author"), None);
    }

    #[test]
    fn entity_endpoint_names_and_signatures() {
        let (graph, person, _, show, article) = sample();
        assert_eq!(graph.resolve(person, "show"), Some(show));
        assert_eq!(graph.resolve(article, "Person.show"), Some(show));
        assert_eq!(graph.resolve(graph.root_id(), "GET /persons/$id"), Some(show));
        assert_eq!(graph.resolve(article, "GET  /persons/$id"), Some(show));
        assert_eq!(graph.resolve_with(article, "GET /persons/$id", false), None);
    }

    #[rstest]
    #[case("")]
    #[case("Person.")]
    #[case(".id")]
    #[case("Nobody")]
    fn unresolvable_paths(#[case] path: &str) {
        let (graph, _, _, _, article) = sample();
        assert_eq!(graph.resolve(article, path), None);
    }

    #[test]
    fn duplicate_sibling_is_rejected() {
        let (mut graph, person, _, _, _) = sample();
        let err = graph
            .attach(person, NodeKind::Entity, "id", None, json!({}), None)
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateName {
                parent: "Person".into(),
                name: "id".into(),
                id: None,
                existing: NodeKind::Field,
                duplicate: NodeKind::Entity,
                existing_source: None,
                duplicate_source: None,
            }
        );
    }

    #[test]
    fn same_name_with_distinct_ids_is_allowed() {
        let (mut graph, person, _, _, _) = sample();
        let result = graph.attach(
            person,
            NodeKind::Endpoint,
            "show",
            Some("GET /people/$id".into()),
            json!({}),
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn paths_and_scopes() {
        let (graph, person, id, show, _) = sample();
        assert_eq!(graph.path_of(id), "Person.id");
        assert_eq!(graph.path_of(graph.root_id()), "<root>");
        assert_eq!(graph.scope_of(id), person);
        assert_eq!(graph.scope_of(show), person);
        assert_eq!(graph.scope_of(graph.root_id()), graph.root_id());
    }

    #[test]
    fn signature_normalisation() {
        assert_eq!(signature("GET   /a"), Some("GET /a".to_string()));
        assert_eq!(signature("get /a"), None);
        assert_eq!(signature("GET a"), None);
        assert_eq!(signature("Person.id"), None);
    }
}
