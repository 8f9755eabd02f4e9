//! Declaration walker.
//!
//! Walks the statements of one file, tracks the active namespace and routes
//! each declaration-bearing node to its builder. Declarations are found at
//! any block depth (inside `if`, loops, `try`, ...) but never inside function
//! or method bodies.

use tracing::trace;

use crate::ast_engine::node::{identifier, name_parts, Node, NodeKind};
use crate::ast_engine::scope::NamespaceScope;
use crate::canonical::{canonical_literal, resolve_parameters, Digest};
use crate::signature::{ClassLike, Define, FunctionSig, Kind, Modifiers, SourceSignature};
use crate::types::{SignatureError, SignatureResult};

/// Function name that introduces constants.
const DEFINE_FUNCTION: &str = "define";

/// Extracts the structural signature of one file.
pub struct EntityExtractor {
    signature: SourceSignature,
}

impl EntityExtractor {
    /// Walk the root statements of a file and build its signature.
    pub fn extract(statements: &[Node]) -> SignatureResult<SourceSignature> {
        let mut extractor = Self {
            signature: SourceSignature::new(),
        };
        let scope = NamespaceScope::global();
        for statement in statements {
            extractor.dispatch(statement, &scope)?;
        }
        Ok(extractor.signature)
    }

    fn dispatch(&mut self, node: &Node, scope: &NamespaceScope) -> SignatureResult<()> {
        match node.kind() {
            NodeKind::Namespace => {
                let inner = NamespaceScope::for_namespace(node);
                trace!(namespace = ?inner.namespace(), "Entering namespace");
                self.walk_nested(node, &inner)
            }
            NodeKind::Function => self.add_function(node, scope),
            NodeKind::Interface => self.add_interface(node, scope),
            NodeKind::Class => self.add_class(node, scope),
            NodeKind::Trait => self.add_trait(node, scope),
            NodeKind::Expression => match node.node("expr") {
                Some(expr) if expr.kind() == NodeKind::FuncCall => self.add_function_call(expr, scope),
                _ => Ok(()),
            },
            NodeKind::FuncCall => self.add_function_call(node, scope),
            // Method bodies are opaque, even inside containers (enums) that
            // are otherwise searched.
            NodeKind::ClassMethod => Ok(()),
            _ => self.walk_nested(node, scope),
        }
    }

    /// Dispatch every nested statement of a container node: its `stmts`
    /// list and any statement-kind children (`else`, `elseifs`, `cases`,
    /// `catches`, `finally`, ...).
    fn walk_nested(&mut self, node: &Node, scope: &NamespaceScope) -> SignatureResult<()> {
        for (field, value) in node.fields() {
            for child in value.nodes() {
                if field == "stmts" || child.node_type().starts_with("Stmt_") {
                    self.dispatch(child, scope)?;
                }
            }
        }
        Ok(())
    }

    fn add_function(&mut self, node: &Node, scope: &NamespaceScope) -> SignatureResult<()> {
        let Some(name) = node.field("name").and_then(identifier).filter(|n| !n.is_empty()) else {
            return Ok(());
        };

        let function = FunctionSig {
            name: scope.qualify(&name),
            params: resolve_parameters(node.list("params"), scope)?,
            body: Digest::of_value(node.field("stmts")),
        };
        trace!(function = %function.name, "Discovered function");
        self.signature.push_function(function);
        Ok(())
    }

    fn add_interface(&mut self, node: &Node, scope: &NamespaceScope) -> SignatureResult<()> {
        let Some(name) = declared_name(node) else {
            return Ok(());
        };
        let extends = node
            .child_nodes("extends")
            .map(|parent| scope.resolve_class_reference(parent))
            .collect::<SignatureResult<Vec<_>>>()?;

        let interface = ClassLike::new(Kind::Interface, scope.qualify(&name), extends, Vec::new());
        self.finish_class_like(interface, node, scope)
    }

    fn add_class(&mut self, node: &Node, scope: &NamespaceScope) -> SignatureResult<()> {
        let Some(name) = declared_name(node) else {
            return Ok(());
        };
        let extends = match node.node("extends") {
            Some(parent) => vec![scope.resolve_class_reference(parent)?],
            None => Vec::new(),
        };
        let implements = node
            .child_nodes("implements")
            .map(|iface| scope.resolve_class_reference(iface))
            .collect::<SignatureResult<Vec<_>>>()?;

        let kind = if modifiers(node).is_abstract() {
            Kind::AbstractClass
        } else {
            Kind::Class
        };
        let class = ClassLike::new(kind, scope.qualify(&name), extends, implements);
        self.finish_class_like(class, node, scope)
    }

    fn add_trait(&mut self, node: &Node, scope: &NamespaceScope) -> SignatureResult<()> {
        let Some(name) = declared_name(node) else {
            return Ok(());
        };
        let tr = ClassLike::new(Kind::Trait, scope.qualify(&name), Vec::new(), Vec::new());
        self.finish_class_like(tr, node, scope)
    }

    /// Populate a class-like from its body and append it to the signature.
    fn finish_class_like(
        &mut self,
        mut class_like: ClassLike,
        node: &Node,
        scope: &NamespaceScope,
    ) -> SignatureResult<()> {
        for member in node.child_nodes("stmts") {
            add_member(&mut class_like, member, scope)?;
        }
        trace!(
            kind = class_like.kind().keyword(),
            name = class_like.name(),
            "Discovered class-like"
        );
        self.signature.push_class_like(class_like);
        Ok(())
    }

    /// Record a `define('NAME', value)` call; any other call is ignored.
    fn add_function_call(&mut self, call: &Node, scope: &NamespaceScope) -> SignatureResult<()> {
        let is_define = call
            .node("name")
            .filter(|name| name.kind().is_name())
            .map(|name| {
                let parts = name_parts(name);
                parts.len() == 1 && parts[0].eq_ignore_ascii_case(DEFINE_FUNCTION)
            })
            .unwrap_or(false);
        if !is_define {
            return Ok(());
        }

        let mut args = call.child_nodes("args").filter(|arg| arg.kind() == NodeKind::Arg);
        let Some(constant) = args
            .next()
            .and_then(|arg| arg.node("value"))
            .filter(|value| value.kind() == NodeKind::StringLiteral)
            .and_then(|value| value.str_field("value"))
            .map(str::to_string)
        else {
            return Ok(());
        };

        let value = canonical_literal(args.next().and_then(|arg| arg.node("value")), scope)?;
        self.signature.push_define(Define {
            name: constant,
            value,
        });
        Ok(())
    }
}

/// Add one body statement of a class-like to it.
fn add_member(class_like: &mut ClassLike, member: &Node, scope: &NamespaceScope) -> SignatureResult<()> {
    match member.kind() {
        NodeKind::ClassMethod => {
            let name = member
                .field("name")
                .and_then(identifier)
                .ok_or_else(|| SignatureError::unsupported("method name", member))?;
            let params = resolve_parameters(member.list("params"), scope)?;
            let body = member
                .field("stmts")
                .map(|stmts| Digest::of_value(Some(stmts)));
            class_like.add_method(modifiers(member), name, params, body);
        }
        NodeKind::ClassConst => {
            for constant in member.child_nodes("consts") {
                let name = constant
                    .field("name")
                    .and_then(identifier)
                    .ok_or_else(|| SignatureError::unsupported("constant name", constant))?;
                let value = canonical_literal(constant.node("value"), scope)?;
                class_like.add_constant(name, value);
            }
        }
        NodeKind::Property => {
            let flags = modifiers(member);
            for property in member.child_nodes("props") {
                let name = property
                    .field("name")
                    .and_then(identifier)
                    .ok_or_else(|| SignatureError::unsupported("property name", property))?;
                let default = canonical_literal(property.node("default"), scope)?;
                class_like.add_property(flags, name, Some(default));
            }
        }
        NodeKind::Nop => {}
        _ => return Err(SignatureError::unsupported("class member", member)),
    }
    Ok(())
}

/// Declared name of a class-like node, `None` for anonymous ones.
fn declared_name(node: &Node) -> Option<String> {
    node.field("name")
        .and_then(identifier)
        .filter(|name| !name.is_empty())
}

/// Modifier bitmask: `flags` in current parser output, `type` in older dumps.
fn modifiers(node: &Node) -> Modifiers {
    let code = node
        .int_field("flags")
        .or_else(|| node.int_field("type"))
        .unwrap_or(0);
    Modifiers(code)
}
