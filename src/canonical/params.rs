//! Parameter records for functions and methods.

use std::fmt;

use crate::ast_engine::{name_parts, NamespaceScope, Node, NodeKind, Value};
use crate::canonical::literal::canonical_literal;
use crate::types::{SignatureError, SignatureResult};

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// Declared type text, verbatim.
    pub type_hint: Option<String>,
    /// Canonical default value.
    pub default: Option<String>,
    pub by_ref: bool,
    pub variadic: bool,
}

impl Parameter {
    /// Build a parameter from a `Param` node.
    pub fn from_node(param: &Node, scope: &NamespaceScope) -> SignatureResult<Self> {
        if param.kind() != NodeKind::Param {
            return Err(SignatureError::unsupported("parameter", param));
        }

        let name = match (param.node("var"), param.str_field("name")) {
            (Some(var), _) => match var.str_field("name") {
                Some(name) => name.to_string(),
                None => return Err(SignatureError::unsupported("parameter variable", var)),
            },
            (None, Some(name)) => name.to_string(),
            (None, None) => return Err(SignatureError::unsupported("parameter without name", param)),
        };

        let type_hint = resolve_type(param.field("type"))?;
        let default = canonical_literal(param.node("default"), scope)?;

        Ok(Self {
            name,
            type_hint,
            default: (!default.is_empty()).then_some(default),
            by_ref: param.bool_field("byRef"),
            variadic: param.bool_field("variadic"),
        })
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(type_hint) = &self.type_hint {
            write!(f, "{} ", type_hint)?;
        }
        if self.by_ref {
            f.write_str("&")?;
        }
        if self.variadic {
            f.write_str("...")?;
        }
        write!(f, "${}", self.name)?;
        if let Some(default) = &self.default {
            write!(f, " = {}", default)?;
        }
        Ok(())
    }
}

/// Resolve every entry of a `params` list.
pub fn resolve_parameters(params: &[Value], scope: &NamespaceScope) -> SignatureResult<Vec<Parameter>> {
    params
        .iter()
        .filter_map(Value::as_node)
        .map(|param| Parameter::from_node(param, scope))
        .collect()
}

/// Render a parameter list as `a, b, c`.
pub fn render_parameters(params: &[Parameter]) -> String {
    params
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Declared type text of a parameter type field.
///
/// Types are part of the signature contract, so an unrecognised type node
/// is an error rather than an approximation.
pub fn resolve_type(value: Option<&Value>) -> SignatureResult<Option<String>> {
    let node = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Str(s)) => return Ok((!s.is_empty()).then(|| s.clone())),
        Some(Value::Node(node)) => node,
        Some(_) => return Ok(None),
    };

    let text = match node.kind() {
        NodeKind::Identifier => node.str_field("name").unwrap_or_default().to_string(),
        NodeKind::Name => name_parts(node).join("\\"),
        NodeKind::FullyQualifiedName => format!("\\{}", name_parts(node).join("\\")),
        NodeKind::RelativeName => format!("namespace\\{}", name_parts(node).join("\\")),
        NodeKind::NullableType => match resolve_type(node.field("type"))? {
            Some(inner) => format!("?{}", inner),
            None => return Err(SignatureError::unsupported("nullable type", node)),
        },
        NodeKind::UnionType => join_types(node, "|")?,
        NodeKind::IntersectionType => join_types(node, "&")?,
        NodeKind::Param => return resolve_type(node.field("type")),
        _ => return Err(SignatureError::unsupported("parameter type", node)),
    };

    Ok((!text.is_empty()).then_some(text))
}

fn join_types(node: &Node, separator: &str) -> SignatureResult<String> {
    let mut parts = Vec::new();
    for member in node.list("types") {
        if let Some(text) = resolve_type(Some(member))? {
            parts.push(text);
        }
    }
    Ok(parts.join(separator))
}
