use serde_json::{Map, Value};

use super::Endpoint;

node_view!(
    /// A named sequence of commands and requests.
    Scenario
);

impl<'g> Scenario<'g> {
    pub fn steps(&self) -> Vec<Step<'g>> {
        self.schema()
            .get("steps")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|record| match record.get("kind").and_then(Value::as_str) {
                Some("command") => Some(Step::Command(CommandStep { record })),
                Some("request") => Some(Step::Request(RequestStep {
                    scenario: *self,
                    record,
                })),
                other => {
                    log::debug!("skipping step of kind {other:?} in {}", self.name());
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step<'g> {
    Command(CommandStep<'g>),
    Request(RequestStep<'g>),
}

/// `@name(args, key = value)` or `@name args`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandStep<'g> {
    record: &'g Value,
}

impl<'g> CommandStep<'g> {
    pub fn name(&self) -> &'g str {
        text(self.record, "name").unwrap_or_default()
    }

    pub fn arguments(&self) -> &'g [Value] {
        self.record
            .get("arguments")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn options(&self) -> Option<&'g Map<String, Value>> {
        self.record.get("options").and_then(Value::as_object)
    }

    pub fn option(&self, name: &str) -> Option<&'g Value> {
        self.options()?.get(name)
    }
}

/// `METHOD /path { ... }` or `$Entity.endpoint { ... }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestStep<'g> {
    scenario: Scenario<'g>,
    record: &'g Value,
}

impl<'g> RequestStep<'g> {
    pub fn method(&self) -> Option<&'g str> {
        text(self.record, "method")
    }

    pub fn path(&self) -> Option<&'g str> {
        text(self.record, "path")
    }

    /// Dotted endpoint reference, without the `$`.
    pub fn reference(&self) -> Option<&'g str> {
        text(self.record, "endpoint")
    }

    pub fn setup(&self) -> Option<&'g Map<String, Value>> {
        self.record.get("setup").and_then(Value::as_object)
    }

    pub fn receive(&self) -> Option<&'g Map<String, Value>> {
        self.record.get("receive").and_then(Value::as_object)
    }

    /// Bare `name = value` overrides in the step block.
    pub fn assign(&self) -> Option<&'g Map<String, Value>> {
        self.record.get("assign").and_then(Value::as_object)
    }

    /// The endpoint this step calls, if it can be found.
    pub fn endpoint(&self) -> Option<Endpoint<'g>> {
        let root = self.scenario.graph().root();
        if let (Some(method), Some(path)) = (self.method(), self.path()) {
            return root.find_endpoint(method, path);
        }
        root.resolve(self.reference()?)?.as_endpoint()
    }
}

fn text<'v>(record: &'v Value, key: &str) -> Option<&'v str> {
    record.get(key).and_then(Value::as_str)
}
