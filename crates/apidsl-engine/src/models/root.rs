use apidsl_config::Config;

use super::{AnyNode, Endpoint, Entity, Scenario};
use crate::graph::{Graph, NodeKind, signature};
use crate::models::endpoint::template_matches;

node_view!(
    /// Top of the graph: every entity and scenario of the compiled sources.
    Root
);

impl Graph {
    pub fn root(&self) -> Root<'_> {
        Root::new(self, self.root_id())
    }
}

impl<'g> Root<'g> {
    /// Top-level entities, in declaration order.
    pub fn entities(&self) -> Vec<Entity<'g>> {
        self.graph
            .children_of_kind(self.id, NodeKind::Entity)
            .map(|id| Entity::new(self.graph, id))
            .collect()
    }

    /// Every entity including subtypes and body-local ones, parents first.
    pub fn all_entities(&self) -> Vec<Entity<'g>> {
        self.graph
            .descendants(self.id)
            .into_iter()
            .filter(|&id| self.graph.node(id).kind == NodeKind::Entity)
            .map(|id| Entity::new(self.graph, id))
            .collect()
    }

    /// Entity by name or dotted path (`Article.Comment`).
    pub fn entity(&self, path: &str) -> Option<Entity<'g>> {
        self.resolve(path)?.as_entity()
    }

    pub fn scenarios(&self) -> Vec<Scenario<'g>> {
        self.graph
            .children_of_kind(self.id, NodeKind::Scenario)
            .map(|id| Scenario::new(self.graph, id))
            .collect()
    }

    pub fn find_scenario(&self, name: &str) -> Option<Scenario<'g>> {
        self.scenarios().into_iter().find(|s| s.name() == name)
    }

    /// Endpoints of every entity, in declaration order.
    pub fn endpoints(&self) -> Vec<Endpoint<'g>> {
        self.graph
            .descendants(self.id)
            .into_iter()
            .filter(|&id| self.graph.node(id).kind == NodeKind::Endpoint)
            .map(|id| Endpoint::new(self.graph, id))
            .collect()
    }

    /// Endpoint for a request: exact signature first, then path templates.
    pub fn find_endpoint(&self, method: &str, path: &str) -> Option<Endpoint<'g>> {
        let method = method.to_uppercase();
        let exact = signature(&format!("{method} {path}"))
            .and_then(|signature| self.graph.endpoint_by_signature(&signature));
        if let Some(id) = exact {
            return Some(Endpoint::new(self.graph, id));
        }
        self.endpoints()
            .into_iter()
            .find(|endpoint| endpoint.method() == method && template_matches(endpoint.path(), path))
    }

    pub fn resolve(&self, path: &str) -> Option<AnyNode<'g>> {
        self.graph
            .resolve(self.id, path)
            .map(|id| AnyNode::new(self.graph, id))
    }

    pub fn config(&self) -> &'g Config {
        self.graph.config()
    }
}

#[cfg(test)]
mod tests {
    use crate::compile;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"
entity Article {
  inner Comment { field body: String }
  endpoint show GET /articles/$id {}
  endpoint /articles {
    get {}
    post {}
  }
}
entity Person {
  endpoint GET /persons/{id} {}
}
scenario smoke {}
"#;

    #[test]
    fn listings() {
        let graph = compile("t", SOURCE).unwrap();
        let root = graph.root();

        let entities: Vec<_> = root.entities().iter().map(|e| e.name()).collect();
        assert_eq!(entities, vec!["Article", "Person"]);
        let all: Vec<_> = root.all_entities().iter().map(|e| e.qualified_name()).collect();
        assert_eq!(all, vec!["Article", "Article.Comment", "Person"]);
        assert_eq!(root.entity("Article.Comment").map(|e| e.name()), Some("Comment"));
        assert_eq!(root.endpoints().len(), 4);
        assert!(root.find_scenario("smoke").is_some());
        assert!(root.find_scenario("other").is_none());
    }

    #[test]
    fn find_endpoint_exact_then_template() {
        let graph = compile("t", SOURCE).unwrap();
        let root = graph.root();

        let exact = root.find_endpoint("GET", "/articles/$id").unwrap();
        assert_eq!(exact.name(), "show");
        let templated = root.find_endpoint("get", "/articles/12").unwrap();
        assert_eq!(templated, exact);
        let braces = root.find_endpoint("GET", "/persons/7?full=1").unwrap();
        assert_eq!(braces.signature(), "GET /persons/{id}");
        assert_eq!(root.find_endpoint("POST", "/articles").map(|e| e.name()), Some("post"));
        assert!(root.find_endpoint("DELETE", "/articles").is_none());
    }
}
