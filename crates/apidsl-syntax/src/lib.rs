//! # apidsl-syntax
//!
//! Front end of the apidsl schema language: source text in, schema records
//! out.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Scanner → Tokens → strip comments → Parser → Schema Records
//!               (regex rule table)                 (directive parsers)
//! ```
//!
//! ### 1. Scanner ([`scanner`] module)
//!
//! An ordered table of anchored regex rules tags every piece of the input.
//! Scanning is total: text no rule claims becomes an `UNQUOTED` token.
//!
//! ```text
//! "entity BlankEntity {}" → [ENTITY, ENTITY_NAME, BLOCK_OPEN, BLOCK_CLOSE]
//! ```
//!
//! ### 2. Parser ([`parser`] module)
//!
//! A family of mutually recursive directive parsers walks the tokens through
//! a [`parser::cursor::TokenCursor`] and builds `serde_json::Value` records.
//! Problems are attached to the offending token; a parse always returns a
//! complete root record.
//!
//! ### 3. Types ([`types`] module)
//!
//! A small [Logos] grammar for type-strings (`List<Person?>?`, `*`,
//! `Person.id`), shared by the parser (validation) and the engine
//! (classification).
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Module Structure
//!
//! ```text
//! apidsl-syntax/
//! ├── lib.rs           # This file - public API and integration tests
//! ├── token.rs         # TokenKind, Token, Diagnostic
//! ├── scanner.rs       # Rule table and the scan loop
//! ├── types.rs         # Type-string grammar
//! └── parser/
//!     ├── mod.rs       # parse(), Document
//!     ├── cursor.rs    # TokenCursor
//!     ├── builder.rs   # SchemaBuilder
//!     └── grammar/
//!         ├── mod.rs       # Root loop, shared value rules, classify()
//!         ├── entity.rs    # entity, field, subschema
//!         ├── endpoint.rs  # endpoint, parameter, query, bodies
//!         └── scenario.rs  # scenario, command, shorthand requests
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use apidsl_syntax::{TokenKind, parse_document, scan};
//!
//! let tokens = scan("blog.api", "entity BlankEntity {}");
//! assert_eq!(tokens[0].kind, TokenKind::ENTITY);
//!
//! let document = parse_document("blog.api", "entity Article { mutable field title: String }");
//! let field = &document.schema["entities"][0]["fields"][0];
//! assert_eq!(field["mutable"], true);
//! ```

pub mod parser;
pub mod scanner;
pub mod token;
pub mod types;

pub use parser::{Document, classify, parse, parse_document, path_parameters};
pub use scanner::scan;
pub use token::{Diagnostic, Token, TokenKind, diagnostics, strip_line_comments};
pub use types::{TypeError, TypeExpr};
