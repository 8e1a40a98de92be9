use std::fmt;
use std::str::FromStr;

use apidsl_syntax::{TypeError, TypeExpr};
use serde_json::{Value, json};

/// Built-in scalar type names.
pub const PRIMITIVES: &[&str] = &[
    "String", "Integer", "Long", "Float", "Double", "Decimal", "Number", "Boolean", "Date",
    "DateTime", "Time", "Uuid", "Url", "Email", "Binary", "Any",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Primitive,
    /// `*` or `Enum`, shape declared inline
    SelfDefined,
    /// Dotted path to another node
    Reference,
}

/// A parsed type-string.
///
/// Classification looks through list and optional wrappers: `List<Person>?`
/// is an optional list whose base is the reference `Person`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    expr: TypeExpr,
}

impl Type {
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        TypeExpr::parse(input).map(Self::from_expr)
    }

    pub fn from_expr(expr: TypeExpr) -> Self {
        Self { expr }
    }

    pub fn string() -> Self {
        Self::from_expr(TypeExpr::Named("String".to_string()))
    }

    pub fn expr(&self) -> &TypeExpr {
        &self.expr
    }

    pub fn class(&self) -> TypeClass {
        match self.expr.base() {
            TypeExpr::Named(name) if name == "Enum" => TypeClass::SelfDefined,
            TypeExpr::Named(name) if PRIMITIVES.contains(&name.as_str()) => TypeClass::Primitive,
            TypeExpr::Named(_) => TypeClass::Reference,
            _ => TypeClass::SelfDefined,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.class() == TypeClass::Primitive
    }

    pub fn is_self_defined(&self) -> bool {
        self.class() == TypeClass::SelfDefined
    }

    pub fn is_self_defined_enum(&self) -> bool {
        matches!(self.expr.base(), TypeExpr::Named(name) if name == "Enum")
    }

    pub fn is_reference(&self) -> bool {
        self.class() == TypeClass::Reference
    }

    pub fn is_list(&self) -> bool {
        self.expr.is_list()
    }

    pub fn is_optional(&self) -> bool {
        self.expr.is_optional()
    }

    /// The dotted path a reference type points at.
    pub fn reference(&self) -> Option<&str> {
        match self.expr.base() {
            TypeExpr::Named(name) if self.is_reference() => Some(name),
            _ => None,
        }
    }

    /// Base name a renderer emits for the definition, `*` for self-defined.
    pub fn definition_body(&self) -> &str {
        self.expr.definition_body()
    }

    pub fn to_optional(&self) -> Self {
        Self::from_expr(self.expr.clone().to_optional())
    }

    pub fn to_required(&self) -> Self {
        Self::from_expr(self.expr.to_required().clone())
    }

    /// Element type of a list, looking through optionality.
    pub fn element(&self) -> Option<Self> {
        self.expr.element().cloned().map(Self::from_expr)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expr.fmt(f)
    }
}

impl FromStr for Type {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Representative value for a primitive name, `None` for anything else.
pub fn primitive_mock(name: &str) -> Option<Value> {
    let value = match name {
        "String" => json!("string"),
        "Integer" | "Long" => json!(1),
        "Float" | "Double" | "Decimal" | "Number" => json!(1.5),
        "Boolean" => json!(true),
        "Date" => json!("2024-01-01"),
        "DateTime" => json!("2024-01-01T00:00:00Z"),
        "Time" => json!("00:00:00"),
        "Uuid" => json!("00000000-0000-0000-0000-000000000000"),
        "Url" => json!("https://example.com"),
        "Email" => json!("user@example.com"),
        "Binary" => json!(""),
        "Any" => Value::Null,
        _ => return None,
    };
    Some(value)
}

/// Whether `value` has the shape of primitive `name`; `None` for non-primitives.
pub fn primitive_accepts(name: &str, value: &Value) -> Option<bool> {
    let accepted = match name {
        "Integer" | "Long" => value.is_i64() || value.is_u64(),
        "Float" | "Double" | "Decimal" | "Number" => value.is_number(),
        "Boolean" => value.is_boolean(),
        "String" | "Date" | "DateTime" | "Time" | "Uuid" | "Url" | "Email" | "Binary" => {
            value.is_string()
        }
        "Any" => true,
        _ => return None,
    };
    Some(accepted)
}
