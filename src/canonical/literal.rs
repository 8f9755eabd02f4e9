//! Canonical text for constant-valued expressions.

use crate::ast_engine::{identifier, name_parts, NamespaceScope, Node, NodeKind, Value};
use crate::canonical::digest::Digest;
use crate::types::SignatureResult;

/// Separator for constant-reference name parts. Cannot collide with `\`.
pub const CONST_PART_SEPARATOR: &str = "??";

/// Map a constant-valued expression to a stable token.
///
/// Absent expressions become the empty string. Expression kinds without a
/// dedicated rendering (arrays, closures, operators, ...) become an opaque
/// `<Kind digest>` token instead of an error.
pub fn canonical_literal(node: Option<&Node>, scope: &NamespaceScope) -> SignatureResult<String> {
    let Some(node) = node else {
        return Ok(String::new());
    };

    match node.kind() {
        NodeKind::IntLiteral | NodeKind::FloatLiteral | NodeKind::StringLiteral => {
            Ok(json_scalar(node.field("value")))
        }
        NodeKind::ConstFetch => {
            let parts = node.node("name").map(name_parts).unwrap_or_default();
            Ok(parts.join(CONST_PART_SEPARATOR))
        }
        NodeKind::ClassConstFetch => {
            let class = match node.node("class") {
                Some(class) => scope.resolve_class_reference(class)?,
                None => String::new(),
            };
            let constant = node.field("name").and_then(identifier).unwrap_or_default();
            Ok(format!("{}::{}", class, constant))
        }
        _ => Ok(opaque_token(node)),
    }
}

/// Fallback token for expressions that are not decoded.
pub fn opaque_token(node: &Node) -> String {
    format!("<{} {}>", node.node_type(), Digest::of_node(node))
}

/// JSON-style rendering of a scalar literal value.
fn json_scalar(value: Option<&Value>) -> String {
    let json = match value {
        Some(Value::Int(i)) => serde_json::Value::from(*i),
        Some(Value::Float(x)) => serde_json::Value::from(*x),
        Some(Value::Str(s)) => serde_json::Value::from(s.as_str()),
        Some(Value::Bool(b)) => serde_json::Value::from(*b),
        _ => serde_json::Value::Null,
    };
    json.to_string()
}
