use apidsl_syntax::TypeError;
use thiserror::Error;

use crate::graph::NodeKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error(
        "duplicate {duplicate} `{name}` under {parent} (already defined as {existing}){}",
        sources(.existing_source, .duplicate_source)
    )]
    DuplicateName {
        parent: String,
        name: String,
        id: Option<String>,
        existing: NodeKind,
        duplicate: NodeKind,
        /// Source file of the node already in the graph
        existing_source: Option<String>,
        /// Source file of the rejected record
        duplicate_source: Option<String>,
    },

    #[error("invalid type `{type_string}` on {node}: {source}")]
    InvalidType {
        node: String,
        type_string: String,
        source: TypeError,
    },
}

fn sources(existing: &Option<String>, duplicate: &Option<String>) -> String {
    match (existing, duplicate) {
        (None, None) => String::new(),
        (Some(a), Some(b)) if a == b => format!(" in {a}"),
        (a, b) => format!(
            " in {} and {}",
            a.as_deref().unwrap_or("<unknown>"),
            b.as_deref().unwrap_or("<unknown>")
        ),
    }
}

/// A value disagreed with its declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct AssertionError {
    /// Dotted path of the mismatch, list indices in brackets
    pub path: String,
    pub message: String,
}

impl AssertionError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{count} problem(s) in {uri}, first at {first}")]
    Syntax {
        uri: String,
        count: usize,
        first: String,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}
