//! Type-string grammar.
//!
//! ```text
//! type := base "?"*
//! base := "List" "<" type ">" | "*" | NAME ("." NAME)*
//! ```
//!
//! Optionality and list-wrapping compose: `List<String?>` is a list of
//! optional strings, `List<String>?` an optional list. Repeated `?` collapse
//! into one, so making an optional type optional again is a no-op.

use std::fmt;

use logos::Logos;
use thiserror::Error;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
enum TypeToken {
    #[token("List")]
    List,

    #[token("<")]
    LAngle,

    #[token(">")]
    RAngle,

    #[token("?")]
    Question,

    #[token("*")]
    Star,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*")]
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("empty type")]
    Empty,
    #[error("unexpected `{found}` at {position} in type")]
    Unexpected { found: String, position: usize },
    #[error("unexpected end of type, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
}

/// A parsed type-string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// Primitive, `Enum`, or a dotted reference
    Named(String),
    /// `*`: shape declared inline
    SelfDefined,
    List(Box<TypeExpr>),
    Optional(Box<TypeExpr>),
}

struct TypeParser<'a> {
    source: &'a str,
    tokens: Vec<(TypeToken, std::ops::Range<usize>)>,
    pos: usize,
}

impl TypeParser<'_> {
    fn peek(&self) -> Option<TypeToken> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn unexpected(&self) -> TypeError {
        match self.tokens.get(self.pos) {
            Some((_, span)) => TypeError::Unexpected {
                found: self.source[span.clone()].to_string(),
                position: span.start,
            },
            None => TypeError::UnexpectedEnd { expected: "a type" },
        }
    }

    fn expect(&mut self, token: TypeToken, expected: &'static str) -> Result<(), TypeError> {
        match self.peek() {
            Some(t) if t == token => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.unexpected()),
            None => Err(TypeError::UnexpectedEnd { expected }),
        }
    }

    fn ty(&mut self) -> Result<TypeExpr, TypeError> {
        let base = self.base()?;
        let mut optional = false;
        while self.peek() == Some(TypeToken::Question) {
            self.pos += 1;
            optional = true;
        }
        Ok(if optional { base.to_optional() } else { base })
    }

    fn base(&mut self) -> Result<TypeExpr, TypeError> {
        match self.peek() {
            Some(TypeToken::List) => {
                self.pos += 1;
                self.expect(TypeToken::LAngle, "`<`")?;
                let inner = self.ty()?;
                self.expect(TypeToken::RAngle, "`>`")?;
                Ok(TypeExpr::List(Box::new(inner)))
            }
            Some(TypeToken::Star) => {
                self.pos += 1;
                Ok(TypeExpr::SelfDefined)
            }
            Some(TypeToken::Name) => {
                let span = self.tokens[self.pos].1.clone();
                self.pos += 1;
                Ok(TypeExpr::Named(self.source[span].to_string()))
            }
            _ => Err(self.unexpected()),
        }
    }
}

impl TypeExpr {
    /// Parse a type-string.
    pub fn parse(source: &str) -> Result<TypeExpr, TypeError> {
        let mut lexer = TypeToken::lexer(source);
        let mut tokens = Vec::new();
        while let Some(result) = lexer.next() {
            match result {
                Ok(token) => tokens.push((token, lexer.span())),
                Err(()) => {
                    return Err(TypeError::Unexpected {
                        found: lexer.slice().to_string(),
                        position: lexer.span().start,
                    });
                }
            }
        }
        if tokens.is_empty() {
            return Err(TypeError::Empty);
        }

        let mut parser = TypeParser {
            source,
            tokens,
            pos: 0,
        };
        let ty = parser.ty()?;
        if parser.pos < parser.tokens.len() {
            return Err(parser.unexpected());
        }
        Ok(ty)
    }

    /// Wrap in `Optional` unless already optional.
    pub fn to_optional(self) -> TypeExpr {
        match self {
            TypeExpr::Optional(_) => self,
            other => TypeExpr::Optional(Box::new(other)),
        }
    }

    /// Strip one level of optionality.
    pub fn to_required(&self) -> &TypeExpr {
        match self {
            TypeExpr::Optional(inner) => inner,
            other => other,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeExpr::Optional(_))
    }

    /// True for `List<..>` and `List<..>?`.
    pub fn is_list(&self) -> bool {
        matches!(self.to_required(), TypeExpr::List(_))
    }

    /// Element type of a list (optional list included).
    pub fn element(&self) -> Option<&TypeExpr> {
        match self.to_required() {
            TypeExpr::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Innermost type with every list and optional wrapper removed.
    pub fn base(&self) -> &TypeExpr {
        match self {
            TypeExpr::List(inner) | TypeExpr::Optional(inner) => inner.base(),
            other => other,
        }
    }

    /// Text of the innermost type: a name, or `*`.
    pub fn definition_body(&self) -> &str {
        match self.base() {
            TypeExpr::Named(name) => name,
            _ => "*",
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::SelfDefined => f.write_str("*"),
            TypeExpr::List(inner) => write!(f, "List<{inner}>"),
            TypeExpr::Optional(inner) => write!(f, "{inner}?"),
        }
    }
}

impl std::str::FromStr for TypeExpr {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeExpr::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn named(name: &str) -> TypeExpr {
        TypeExpr::Named(name.to_string())
    }

    #[test]
    fn parse_primitive() {
        assert_eq!(TypeExpr::parse("String"), Ok(named("String")));
    }

    #[test]
    fn parse_list_of_optional_vs_optional_list() {
        let list_of_optional = TypeExpr::parse("List<String?>").unwrap();
        let optional_list = TypeExpr::parse("List<String>?").unwrap();

        assert_eq!(
            list_of_optional,
            TypeExpr::List(Box::new(TypeExpr::Optional(Box::new(named("String")))))
        );
        assert!(!list_of_optional.is_optional());
        assert!(list_of_optional.is_list());
        assert!(list_of_optional.element().unwrap().is_optional());

        assert!(optional_list.is_optional());
        assert!(optional_list.is_list());
        assert!(!optional_list.element().unwrap().is_optional());
        assert_ne!(list_of_optional, optional_list);
    }

    #[test]
    fn list_prefix_is_still_a_name() {
        assert_eq!(TypeExpr::parse("ListItem"), Ok(named("ListItem")));
    }

    #[test]
    fn dotted_reference() {
        let ty = TypeExpr::parse("List<Person.id>?").unwrap();
        assert_eq!(ty.definition_body(), "Person.id");
    }

    #[test]
    fn self_defined() {
        assert_eq!(TypeExpr::parse("*"), Ok(TypeExpr::SelfDefined));
        assert_eq!(TypeExpr::parse("List<*>").unwrap().definition_body(), "*");
    }

    #[rstest]
    #[case("String")]
    #[case("String?")]
    #[case("List<Person?>?")]
    #[case("List<List<*>>")]
    fn to_optional_is_idempotent(#[case] source: &str) {
        let once = TypeExpr::parse(source).unwrap().to_optional();
        let reparsed = TypeExpr::parse(&once.to_string()).unwrap();
        assert_eq!(reparsed.clone().to_optional(), reparsed);
        assert_eq!(reparsed, once);
    }

    #[test]
    fn repeated_question_marks_collapse() {
        assert_eq!(TypeExpr::parse("String??"), TypeExpr::parse("String?"));
    }

    #[rstest]
    #[case("List<String", TypeError::UnexpectedEnd { expected: "`>`" })]
    #[case("List", TypeError::UnexpectedEnd { expected: "`<`" })]
    #[case("", TypeError::Empty)]
    #[case("?", TypeError::Unexpected { found: "?".into(), position: 0 })]
    #[case("String>", TypeError::Unexpected { found: ">".into(), position: 6 })]
    #[case("Str-ing", TypeError::Unexpected { found: "-".into(), position: 3 })]
    fn parse_errors(#[case] source: &str, #[case] expected: TypeError) {
        assert_eq!(TypeExpr::parse(source), Err(expected));
    }

    #[test]
    fn display_round_trips() {
        for source in ["String", "List<String?>?", "*", "Enum?", "List<A.b>"] {
            assert_eq!(TypeExpr::parse(source).unwrap().to_string(), source);
        }
    }
}
