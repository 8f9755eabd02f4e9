//! Syntax tree model for PHP-Parser JSON dumps.
//!
//! Every node keeps its kind tag and its named sub-fields in declared order.
//! Position metadata (the `attributes` object) is split off so that nothing
//! downstream can accidentally fold it into a digest.

use std::fmt;

use serde::{de, Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// JSON key carrying the node kind tag.
const NODE_TYPE_KEY: &str = "nodeType";

/// JSON key carrying position metadata and comments.
const ATTRIBUTES_KEY: &str = "attributes";

/// Node kinds the signature engine dispatches on.
///
/// Anything the engine has no dedicated handling for is `Other`; the walker
/// treats it as a possible container of nested statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Namespace,
    Function,
    Interface,
    Class,
    Trait,
    Expression,
    FuncCall,
    Arg,
    ClassMethod,
    ClassConst,
    Property,
    Nop,
    Name,
    FullyQualifiedName,
    RelativeName,
    Identifier,
    Variable,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    ConstFetch,
    ClassConstFetch,
    Param,
    NullableType,
    UnionType,
    IntersectionType,
    Other,
}

impl NodeKind {
    /// Classify a PHP-Parser `nodeType` tag.
    pub fn from_type(node_type: &str) -> Self {
        match node_type {
            "Stmt_Namespace" => NodeKind::Namespace,
            "Stmt_Function" => NodeKind::Function,
            "Stmt_Interface" => NodeKind::Interface,
            "Stmt_Class" => NodeKind::Class,
            "Stmt_Trait" => NodeKind::Trait,
            "Stmt_Expression" => NodeKind::Expression,
            "Expr_FuncCall" => NodeKind::FuncCall,
            "Arg" => NodeKind::Arg,
            "Stmt_ClassMethod" => NodeKind::ClassMethod,
            "Stmt_ClassConst" => NodeKind::ClassConst,
            "Stmt_Property" => NodeKind::Property,
            "Stmt_Nop" => NodeKind::Nop,
            "Name" => NodeKind::Name,
            "Name_FullyQualified" => NodeKind::FullyQualifiedName,
            "Name_Relative" => NodeKind::RelativeName,
            "Identifier" | "VarLikeIdentifier" => NodeKind::Identifier,
            "Expr_Variable" => NodeKind::Variable,
            "Scalar_LNumber" | "Scalar_Int" => NodeKind::IntLiteral,
            "Scalar_DNumber" | "Scalar_Float" => NodeKind::FloatLiteral,
            "Scalar_String" => NodeKind::StringLiteral,
            "Expr_ConstFetch" => NodeKind::ConstFetch,
            "Expr_ClassConstFetch" => NodeKind::ClassConstFetch,
            "Param" => NodeKind::Param,
            "NullableType" => NodeKind::NullableType,
            "UnionType" => NodeKind::UnionType,
            "IntersectionType" => NodeKind::IntersectionType,
            _ => NodeKind::Other,
        }
    }

    /// Whether this kind is one of the name node flavours.
    pub fn is_name(&self) -> bool {
        matches!(
            self,
            NodeKind::Name | NodeKind::FullyQualifiedName | NodeKind::RelativeName
        )
    }
}

/// Source position metadata attached to a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attributes {
    /// Start line (1-indexed).
    pub start_line: Option<u32>,
    /// End line (1-indexed).
    pub end_line: Option<u32>,
}

/// A sub-field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Node(Box<Node>),
    /// A positional array.
    List(Vec<Value>),
    /// A keyed array (a JSON object without a kind tag).
    Map(Vec<(String, Value)>),
}

impl Value {
    /// The node behind this value, if it is one.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The string behind this value, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Iterate over the nodes held by this value: the node itself, or every
    /// node element of a list.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        let items: &[Value] = match self {
            Value::List(items) => items,
            other => std::slice::from_ref(other),
        };
        items.iter().filter_map(Value::as_node)
    }

    fn from_json(value: JsonValue) -> Result<Self, String> {
        Ok(match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::Str(s),
            JsonValue::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            JsonValue::Object(map) if map.contains_key(NODE_TYPE_KEY) => {
                Value::Node(Box::new(Node::from_json(JsonValue::Object(map))?))
            }
            JsonValue::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| Ok((key, Value::from_json(value)?)))
                    .collect::<Result<_, String>>()?,
            ),
        })
    }
}

/// A syntax tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    node_type: String,
    fields: Vec<(String, Value)>,
    attributes: Attributes,
}

impl Node {
    /// Create a node from its kind tag and sub-fields.
    pub fn new(node_type: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Self {
            node_type: node_type.into(),
            fields,
            attributes: Attributes::default(),
        }
    }

    /// Attach position metadata.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// The raw kind tag, e.g. `Stmt_Function`.
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::from_type(&self.node_type)
    }

    /// Sub-fields in declared order, position metadata excluded.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Best-effort source line for diagnostics.
    pub fn line(&self) -> Option<u32> {
        self.attributes.start_line
    }

    /// A sub-field, with explicit `null` treated as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.field(name).and_then(Value::as_node)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn int_field(&self, name: &str) -> Option<i64> {
        match self.field(name) {
            Some(Value::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// A boolean sub-field; absent means `false`.
    pub fn bool_field(&self, name: &str) -> bool {
        matches!(self.field(name), Some(Value::Bool(true)))
    }

    /// The elements of a list sub-field; absent means empty.
    pub fn list(&self, name: &str) -> &[Value] {
        match self.field(name) {
            Some(Value::List(items)) => items,
            _ => &[],
        }
    }

    /// The nodes of a list sub-field.
    pub fn child_nodes(&self, name: &str) -> impl Iterator<Item = &Node> {
        self.list(name).iter().filter_map(Value::as_node)
    }

    /// Build a node from a decoded JSON object.
    pub fn from_json(value: JsonValue) -> Result<Self, String> {
        let map = match value {
            JsonValue::Object(map) => map,
            other => return Err(format!("expected a node object, got {}", json_kind(&other))),
        };

        let mut node_type = None;
        let mut attributes = Attributes::default();
        let mut fields = Vec::with_capacity(map.len());

        for (key, value) in map {
            match key.as_str() {
                NODE_TYPE_KEY => match value {
                    JsonValue::String(s) => node_type = Some(s),
                    other => {
                        return Err(format!("nodeType must be a string, got {}", json_kind(&other)))
                    }
                },
                ATTRIBUTES_KEY => attributes = parse_attributes(&value),
                _ => fields.push((key, Value::from_json(value)?)),
            }
        }

        let node_type = node_type.ok_or_else(|| "node object without nodeType".to_string())?;

        Ok(Self {
            node_type,
            fields,
            attributes,
        })
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node_type)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = JsonValue::deserialize(deserializer)?;
        Node::from_json(raw).map_err(de::Error::custom)
    }
}

fn parse_attributes(value: &JsonValue) -> Attributes {
    let line = |key: &str| {
        value
            .get(key)
            .and_then(JsonValue::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    };
    Attributes {
        start_line: line("startLine"),
        end_line: line("endLine"),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Parts of a name node (`Name`, `Name_FullyQualified`, `Name_Relative`).
///
/// Accepts both the `parts` array and the single `name` string layouts.
pub fn name_parts(node: &Node) -> Vec<String> {
    if let Some(Value::List(parts)) = node.field("parts") {
        return parts
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }
    node.str_field("name")
        .map(|name| {
            name.trim_start_matches('\\')
                .split('\\')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Plain identifier text of a value: a bare string, an `Identifier` node, or
/// a name node joined with `\`.
pub fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.clone()),
        Value::Node(node) => match node.kind() {
            NodeKind::Identifier => node.str_field("name").map(str::to_string),
            kind if kind.is_name() => Some(name_parts(node).join("\\")),
            _ => None,
        },
        _ => None,
    }
}
