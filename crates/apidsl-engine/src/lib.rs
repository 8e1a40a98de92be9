//! # apidsl-engine
//!
//! Turns the schema records produced by `apidsl-syntax` into a resolved,
//! read-only node graph that renderers and the scenario runner query.
//!
//! ```text
//! Source Text → parse_document → Schema Records → build → Graph → models::*
//!                (apidsl-syntax)                 (arena)      (typed views)
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! apidsl-engine/
//! ├── lib.rs      # compile() helpers
//! ├── error.rs    # GraphError, AssertionError, CompileError
//! ├── graph.rs    # Node arena and dotted-path resolution
//! ├── build.rs    # Schema records → nodes
//! ├── mock.rs     # Mock values and assertions
//! ├── io/         # Reading configured source files
//! └── models/     # Entity, Field, Endpoint, Root, Scenario, Type views
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use apidsl_engine::compile;
//!
//! let graph = compile("blog.api", "entity Article { mutable field title: String }").unwrap();
//! let article = graph.root().entity("Article").unwrap();
//! assert!(article.require_writer());
//! assert_eq!(article.mock()["title"], "string");
//! ```

pub mod build;
pub mod error;
pub mod graph;
pub mod io;
pub mod mock;
pub mod models;

use anyhow::Context;
use apidsl_config::Config;
use apidsl_syntax::parse_document;
use serde_json::{Value, json};

pub use build::build;
pub use error::{AssertionError, CompileError, GraphError};
pub use graph::{Graph, Node, NodeId, NodeKind};
pub use mock::AssertOptions;
pub use models::{
    AnyNode, CommandStep, Endpoint, Entity, Field, Parameter, Query, RequestBody, Response, Root,
    Scenario, Step, Type, TypeClass, Writer,
};

/// Compile one source with the default configuration.
pub fn compile(uri: &str, text: &str) -> Result<Graph, CompileError> {
    compile_with(uri, text, Config::default())
}

pub fn compile_with(uri: &str, text: &str, config: Config) -> Result<Graph, CompileError> {
    compile_sources(&[(uri, text)], config)
}

/// Parse every `(uri, text)` pair and build one graph from all of them.
///
/// Stops at the first source with parse diagnostics.
pub fn compile_sources<U, T>(sources: &[(U, T)], config: Config) -> Result<Graph, CompileError>
where
    U: AsRef<str>,
    T: AsRef<str>,
{
    let mut entities = Vec::new();
    let mut scenarios = Vec::new();

    for (uri, text) in sources {
        let document = parse_document(uri.as_ref(), text.as_ref());
        let problems: Vec<_> = document.diagnostics().collect();
        if let Some(first) = problems.first() {
            return Err(CompileError::Syntax {
                uri: document.uri.clone(),
                count: problems.len(),
                first: first.to_string(),
            });
        }
        if let Value::Object(mut schema) = document.schema {
            for (key, out) in [("entities", &mut entities), ("scenarios", &mut scenarios)] {
                if let Some(Value::Array(records)) = schema.remove(key) {
                    out.extend(records.into_iter().map(|mut record| {
                        if let Some(map) = record.as_object_mut() {
                            map.entry("source").or_insert_with(|| json!(document.uri));
                        }
                        record
                    }));
                }
            }
        }
    }

    let schema = json!({ "entities": entities, "scenarios": scenarios });
    Ok(build(&schema, config)?)
}

/// Load the configured sources from disk and compile them.
pub fn compile_config(config: Config) -> anyhow::Result<Graph> {
    let sources = io::read_sources(&config).context("Failed to load schema sources")?;
    let graph = compile_sources(&sources, config).context("Failed to compile schema sources")?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn syntax_errors_stop_compilation() {
        let err = compile("broken.api", "entity A { field : String }").unwrap_err();
        match err {
            CompileError::Syntax { uri, count, .. } => {
                assert_eq!(uri, "broken.api");
                assert!(count >= 1);
            }
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn sources_merge_into_one_graph() {
        let sources = [
            ("person.api", "entity Person { field id: Integer }"),
            ("article.api", "entity Article { field author: Person }"),
        ];
        let graph = compile_sources(&sources, Config::default()).unwrap();
        let article = graph.root().entity("Article").unwrap();
        let author = article.field("author").unwrap();
        assert_eq!(author.referenced_entity().map(|e| e.name()), Some("Person"));
    }

    #[test]
    fn duplicates_across_sources_are_fatal() {
        let sources = [("a.api", "entity A {}"), ("b.api", "entity A {}")];
        let err = compile_sources(&sources, Config::default()).unwrap_err();
        assert!(matches!(err, CompileError::Graph(GraphError::DuplicateName { .. })));
        assert_eq!(
            err.to_string(),
            "duplicate entity `A` under <root> (already defined as entity) in a.api and b.api"
        );
    }

    #[test]
    fn nested_duplicate_names_its_source() {
        let sources = [
            ("a.api", "entity A { field x: String }"),
            ("b.api", "entity B {\n  field y: String\n  field y: Integer\n}"),
        ];
        let err = compile_sources(&sources, Config::default()).unwrap_err();
        match err {
            CompileError::Graph(GraphError::DuplicateName {
                parent,
                existing_source,
                duplicate_source,
                ..
            }) => {
                assert_eq!(parent, "B");
                assert_eq!(existing_source.as_deref(), Some("b.api"));
                assert_eq!(duplicate_source.as_deref(), Some("b.api"));
            }
            other => panic!("expected a duplicate, got {other:?}"),
        }
    }

    #[test]
    fn compile_from_config() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("blog.api"), "entity Article {}").unwrap();
        let config = Config {
            sources: vec![temp_dir.path().join("*.api")],
            ..Config::default()
        };

        let graph = compile_config(config).unwrap();

        assert_eq!(graph.root().entities().len(), 1);
        assert_eq!(graph.config().sources.len(), 1);
    }
}
