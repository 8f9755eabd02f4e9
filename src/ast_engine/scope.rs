//! Namespace scope for qualifying declaration and class reference names.
//!
//! The walker passes a scope value down explicitly instead of keeping a
//! mutable "current namespace" register. A scope is captured when a
//! declaration is discovered and never applied after the fact.

use crate::ast_engine::node::{name_parts, Node, NodeKind};
use crate::types::{SignatureError, SignatureResult};

/// Separator between namespace segments.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// The namespace a declaration was discovered in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceScope {
    namespace: Option<String>,
}

impl NamespaceScope {
    /// The global namespace.
    pub fn global() -> Self {
        Self::default()
    }

    /// A named namespace; an empty name is the global namespace.
    pub fn named(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: (!namespace.is_empty()).then_some(namespace),
        }
    }

    /// Scope for a `Stmt_Namespace` node.
    pub fn for_namespace(node: &Node) -> Self {
        match node.node("name") {
            Some(name) => Self::named(name_parts(name).join("\\")),
            None => Self::global(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Qualify a name relative to this scope: `\Ns\Name` or `\Name`.
    pub fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{sep}{ns}{sep}{name}", sep = NAMESPACE_SEPARATOR),
            None => format!("{}{}", NAMESPACE_SEPARATOR, name),
        }
    }

    /// Resolve a class reference (extends, implements, `Class::CONST`).
    ///
    /// Bare and `namespace\`-relative names are qualified against this scope,
    /// fully-qualified names are kept absolute, and a variable in class
    /// position renders as `$name`.
    pub fn resolve_class_reference(&self, node: &Node) -> SignatureResult<String> {
        match node.kind() {
            NodeKind::Name | NodeKind::RelativeName => Ok(self.qualify(&name_parts(node).join("\\"))),
            NodeKind::FullyQualifiedName => Ok(format!(
                "{}{}",
                NAMESPACE_SEPARATOR,
                name_parts(node).join("\\")
            )),
            NodeKind::Variable => match node.str_field("name") {
                Some(name) => Ok(format!("${}", name)),
                None => Err(SignatureError::unsupported("variable class reference", node)),
            },
            _ => Err(SignatureError::unsupported("class reference", node)),
        }
    }
}
