//! AST engine module for syntax tree intake and declaration discovery.
//!
//! This module provides:
//! - A position-aware model of PHP-Parser syntax trees
//! - Syntax tree sources (external parser command, pre-dumped JSON)
//! - Namespace scoping for qualified names
//! - The declaration walker that builds a file's signature

pub mod entity_extractor;
pub mod node;
pub mod parser;
pub mod scope;

pub use entity_extractor::EntityExtractor;
pub use node::{identifier, name_parts, Attributes, Node, NodeKind, Value};
pub use parser::{from_json_unbounded, parse_json_ast, AstSource, CommandSource, JsonDumpSource};
pub use scope::NamespaceScope;
