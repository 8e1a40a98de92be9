use serde_json::Value;

use super::{Entity, Field, Type, effective_type};
use crate::error::AssertionError;
use crate::graph::{Graph, NodeId, NodeKind};
use crate::mock::{AssertOptions, Asserter, Mocker};

node_view!(
    /// One HTTP method on one path.
    ///
    /// A directive declaring several methods under one path yields one
    /// endpoint per method, each with its own parameters and bodies.
    Endpoint
);

impl<'g> Endpoint<'g> {
    /// `"GET /persons/$id"`
    pub fn signature(&self) -> &'g str {
        self.node().id.as_deref().unwrap_or_default()
    }

    pub fn method(&self) -> &'g str {
        self.signature()
            .split_once(' ')
            .map_or("", |(method, _)| method)
    }

    pub fn path(&self) -> &'g str {
        self.signature()
            .split_once(' ')
            .map_or("", |(_, path)| path)
    }

    pub fn summary(&self) -> Option<&'g str> {
        self.schema().get("summary").and_then(Value::as_str)
    }

    /// Owning entity.
    pub fn entity(&self) -> Option<Entity<'g>> {
        let parent = self.graph.parent(self.id)?;
        (self.graph.node(parent).kind == NodeKind::Entity).then(|| Entity::new(self.graph, parent))
    }

    pub fn parameters(&self) -> Vec<Parameter<'g>> {
        self.children(NodeKind::Parameter)
            .map(|id| Parameter::new(self.graph, id))
            .collect()
    }

    /// One parameter per path placeholder, in path order.
    pub fn resolve_path_parameters(&self) -> Vec<Parameter<'g>> {
        let parameters = self.parameters();
        apidsl_syntax::path_parameters(self.path())
            .iter()
            .filter_map(|name| parameters.iter().copied().find(|p| p.name() == name))
            .collect()
    }

    pub fn query(&self) -> Vec<Query<'g>> {
        self.children(NodeKind::Query)
            .map(|id| Query::new(self.graph, id))
            .collect()
    }

    pub fn request(&self) -> Option<RequestBody<'g>> {
        self.children(NodeKind::RequestBody)
            .next()
            .map(|id| RequestBody::new(self.graph, id))
    }

    pub fn success(&self) -> Option<Response<'g>> {
        self.response("success")
    }

    pub fn failure(&self) -> Option<Response<'g>> {
        self.response("failure")
    }

    fn response(&self, name: &str) -> Option<Response<'g>> {
        self.children(NodeKind::Response)
            .find(|&id| self.graph.node(id).name == name)
            .map(|id| Response::new(self.graph, id))
    }

    fn children(&self, kind: NodeKind) -> impl Iterator<Item = NodeId> + 'g {
        self.graph.children_of_kind(self.id, kind)
    }

    /// Whether a concrete request path fits this endpoint's template.
    ///
    /// `$x` and `{x}` segments match any non-empty segment; a query string
    /// on `path` is ignored.
    pub fn matches_path(&self, path: &str) -> bool {
        template_matches(self.path(), path)
    }
}

pub(crate) fn template_matches(template: &str, path: &str) -> bool {
    let path = path.split('?').next().unwrap_or_default();
    let template: Vec<_> = template.trim_end_matches('/').split('/').collect();
    let concrete: Vec<_> = path.trim_end_matches('/').split('/').collect();
    template.len() == concrete.len()
        && template.iter().zip(&concrete).all(|(expected, actual)| {
            let placeholder = expected.starts_with('$')
                || (expected.starts_with('{') && expected.ends_with('}'));
            if placeholder {
                !actual.is_empty()
            } else {
                expected == actual
            }
        })
}

node_view!(
    /// A path parameter.
    Parameter
);

impl<'g> Parameter<'g> {
    pub fn ty(&self) -> Type {
        self.node().ty.clone().unwrap_or_else(Type::string)
    }

    /// Type with references to fields followed, `String` when unresolved.
    pub fn effective_type(&self) -> Type {
        effective_type(self.graph, self.id)
    }

    pub fn default_value(&self) -> Option<&'g Value> {
        self.schema().get("default")
    }

    pub fn example(&self) -> Option<&'g Value> {
        self.schema().get("example")
    }

    /// True when the path names it but no `parameter` directive declared it.
    pub fn is_inferred(&self) -> bool {
        self.endpoint().is_some_and(|endpoint| {
            !endpoint
                .schema()
                .get("parameters")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .any(|p| p.get("name").and_then(Value::as_str) == Some(self.name()))
        })
    }

    pub fn endpoint(&self) -> Option<Endpoint<'g>> {
        parent_endpoint(self.graph, self.id)
    }
}

node_view!(
    /// A query-string parameter.
    Query
);

impl<'g> Query<'g> {
    pub fn ty(&self) -> Type {
        self.node().ty.clone().unwrap_or_else(Type::string)
    }

    pub fn effective_type(&self) -> Type {
        effective_type(self.graph, self.id)
    }

    pub fn is_required(&self) -> bool {
        !self.ty().is_optional()
    }

    pub fn default_value(&self) -> Option<&'g Value> {
        self.schema().get("default")
    }

    pub fn enum_values(&self) -> &'g [Value] {
        self.schema()
            .get("enum")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn endpoint(&self) -> Option<Endpoint<'g>> {
        parent_endpoint(self.graph, self.id)
    }
}

fn parent_endpoint(graph: &Graph, id: NodeId) -> Option<Endpoint<'_>> {
    let parent = graph.parent(id)?;
    (graph.node(parent).kind == NodeKind::Endpoint).then(|| Endpoint::new(graph, parent))
}

fn body_fields(graph: &Graph, id: NodeId) -> Vec<Field<'_>> {
    graph
        .children_of_kind(id, NodeKind::Field)
        .map(|id| Field::new(graph, id))
        .collect()
}

node_view!(
    /// Request payload: a type or inline fields.
    RequestBody
);

impl<'g> RequestBody<'g> {
    pub fn ty(&self) -> Option<Type> {
        self.node().ty.clone()
    }

    pub fn fields(&self) -> Vec<Field<'g>> {
        body_fields(self.graph, self.id)
    }

    pub fn mock(&self) -> Value {
        Mocker::new(self.graph).body(self.id)
    }

    pub fn assert(&self, value: &Value, options: &AssertOptions) -> Result<(), AssertionError> {
        Asserter::new(self.graph, *options).body(self.id, value, "request")
    }
}

node_view!(
    /// `success` or `failure` payload with its status.
    Response
);

impl<'g> Response<'g> {
    pub fn ty(&self) -> Option<Type> {
        self.node().ty.clone()
    }

    pub fn fields(&self) -> Vec<Field<'g>> {
        body_fields(self.graph, self.id)
    }

    pub fn is_success(&self) -> bool {
        self.name() == "success"
    }

    /// Declared status; a success without one is 200.
    pub fn status(&self) -> Option<u16> {
        let declared = self
            .schema()
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|status| u16::try_from(status).ok());
        declared.or_else(|| self.is_success().then_some(200))
    }

    pub fn mock(&self) -> Value {
        Mocker::new(self.graph).body(self.id)
    }

    pub fn assert(&self, value: &Value, options: &AssertOptions) -> Result<(), AssertionError> {
        Asserter::new(self.graph, *options).body(self.id, value, self.name())
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
  field slug: String
  endpoint show GET /persons/$id/posts/{slug} {
    summary Posts by one person
    parameter id: Person.id
    query page: Integer?
    query sort: String { enum ["new", "top"] }
    failure 404 { field reason: String }
  }
  endpoint /persons {
    get { success: List<Person> }
    post {
      request { field name: String }
      success 201: Person
    }
  }
}
"#;

    #[test]
    fn header_endpoint() {
        let graph = compile("t", SOURCE).unwrap();
        let person = graph.root().entity("Person").unwrap();
        let show = person.endpoint("show").unwrap();

        assert_eq!(show.method(), "GET");
        assert_eq!(show.path(), "/persons/$id/posts/{slug}");
        assert_eq!(show.signature(), "GET /persons/$id/posts/{slug}");
        assert_eq!(show.summary(), Some("Posts by one person"));
        assert_eq!(show.entity(), Some(person));

        let parameters: Vec<_> = show
            .resolve_path_parameters()
            .iter()
            .map(|p| (p.name(), p.effective_type().to_string(), p.is_inferred()))
            .collect();
        assert_eq!(
            parameters,
            vec![
                ("id", "Integer".to_string(), false),
                ("slug", "String".to_string(), true),
            ]
        );

        let query: Vec<_> = show.query().iter().map(|q| (q.name(), q.is_required())).collect();
        assert_eq!(query, vec![("page", false), ("sort", true)]);
        assert_eq!(show.query()[1].enum_values(), &[json!("new"), json!("top")]);

        assert!(show.success().is_none());
        let failure = show.failure().unwrap();
        assert_eq!(failure.status(), Some(404));
        assert_eq!(failure.mock(), json!({ "reason": "string" }));
    }

    #[test]
    fn methods_expand_into_endpoints() {
        let graph = compile("t", SOURCE).unwrap();
        let person = graph.root().entity("Person").unwrap();
        let signatures: Vec<_> = person.endpoints().iter().map(|e| e.signature()).collect();
        assert_eq!(
            signatures,
            vec!["GET /persons/$id/posts/{slug}", "GET /persons", "POST /persons"]
        );

        let post = person.endpoint("post").unwrap();
        assert_eq!(post.request().unwrap().mock(), json!({ "name": "string" }));
        let success = post.success().unwrap();
        assert_eq!(success.status(), Some(201));
        assert_eq!(success.ty().map(|t| t.to_string()), Some("Person".to_string()));

        let get = person.endpoint("get").unwrap();
        assert_eq!(get.success().unwrap().status(), Some(200));
        assert_eq!(
            get.success().unwrap().mock(),
            json!([{ "id": 1, "slug": "string" }])
        );
    }

    #[test]
    fn response_assertions() {
        let graph = compile("t", SOURCE).unwrap();
        let get = graph.root().entity("Person").unwrap().endpoint("get").unwrap();
        let success = get.success().unwrap();
        let options = AssertOptions::default();

        assert_eq!(success.assert(&json!([{ "id": 1, "slug": "a" }]), &options), Ok(()));
        let err = success
            .assert(&json!([{ "id": 1, "slug": "a" }, { "id": "2", "slug": "b" }]), &options)
            .unwrap_err();
        assert_eq!(err.to_string(), "success[1].id: expected a whole number, found a string");
    }

    #[rstest]
    #[case("/persons/$id", "/persons/42", true)]
    #[case("/persons/{id}", "/persons/42?full=true", true)]
    #[case("/persons/$id", "/persons/", false)]
    #[case("/persons/$id", "/persons/42/posts", false)]
    #[case("/persons", "/persons/", true)]
    #[case("/persons", "/people", false)]
    fn template_matching(#[case] template: &str, #[case] path: &str, #[case] expected: bool) {
        assert_eq!(template_matches(template, path), expected);
    }
}
