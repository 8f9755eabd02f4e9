//! Body digests.
//!
//! A statement list is serialized into a fixed textual form and reduced with
//! SHA-256. The serialization skips position metadata entirely, so two bodies
//! that only differ in line numbers, offsets or comments share a digest.
//!
//! ## Serialization format (version 2)
//!
//! ```text
//! node   := KIND "(" { "\n    " FIELD ": " value } ")"
//! list   := "[" { KEY ":" value } ")"
//! value  := "null" | "false" | "true" | NUMBER | STRING | node | list
//! ```
//!
//! Strings and keyed-array keys are JSON-quoted, so string content can never
//! be read back as structure.
//!
//! Fields appear in the parser's declared sub-node order. Changing any part
//! of this format or the hash algorithm changes every persisted signature, so
//! bump [`DIGEST_FORMAT_VERSION`] when doing so.

use std::fmt::{self, Write};

use sha2::{Digest as _, Sha256};

use crate::ast_engine::{Node, Value};

/// Format version mixed into every digest.
pub const DIGEST_FORMAT_VERSION: u8 = 2;

/// A 256-bit structural digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Digest of a pre-serialized text.
    pub fn of_text(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([DIGEST_FORMAT_VERSION]);
        hasher.update(text.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    /// Digest of an optional sub-field value; absent hashes as `null`.
    pub fn of_value(value: Option<&Value>) -> Self {
        let mut text = String::new();
        match value {
            Some(value) => serialize_value(value, &mut text),
            None => text.push_str("null"),
        }
        Self::of_text(&text)
    }

    /// Digest of a single node and everything below it.
    pub fn of_node(node: &Node) -> Self {
        let mut text = String::new();
        serialize_node(node, &mut text);
        Self::of_text(&text)
    }

    /// Digest of a statement list.
    pub fn of_statements(statements: &[Value]) -> Self {
        let mut text = String::new();
        serialize_list(statements.iter().enumerate(), &mut text);
        Self::of_text(&text)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Serialize a node in the versioned digest format.
pub fn serialize_node(node: &Node, out: &mut String) {
    out.push_str(node.node_type());
    out.push('(');
    for (name, value) in node.fields() {
        out.push_str("\n    ");
        out.push_str(name);
        out.push_str(": ");
        serialize_value(value, out);
    }
    out.push(')');
}

/// Serialize a sub-field value in the versioned digest format.
pub fn serialize_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(false) => out.push_str("false"),
        Value::Bool(true) => out.push_str("true"),
        Value::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        Value::Float(x) => {
            let _ = write!(out, "{:?}", x);
        }
        Value::Str(s) => push_quoted(s, out),
        Value::Node(node) => serialize_node(node, out),
        Value::List(items) => serialize_list(items.iter().enumerate(), out),
        Value::Map(entries) => {
            out.push('[');
            for (key, value) in entries {
                push_quoted(key, out);
                out.push(':');
                serialize_value(value, out);
            }
            out.push(')');
        }
    }
}

fn push_quoted(s: &str, out: &mut String) {
    out.push_str(&serde_json::Value::from(s).to_string());
}

fn serialize_list<'a, K, I>(entries: I, out: &mut String)
where
    K: fmt::Display,
    I: Iterator<Item = (K, &'a Value)>,
{
    out.push('[');
    for (key, value) in entries {
        let _ = write!(out, "{}:", key);
        serialize_value(value, out);
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stmts(value: serde_json::Value) -> Vec<Value> {
        serde_json::from_value::<Vec<Node>>(value)
            .unwrap()
            .into_iter()
            .map(|node| Value::Node(Box::new(node)))
            .collect()
    }

    fn echo(text: &str, line: u32) -> serde_json::Value {
        json!({
            "nodeType": "Stmt_Echo",
            "attributes": { "startLine": line, "endLine": line },
            "exprs": [{
                "nodeType": "Scalar_String",
                "attributes": { "startLine": line, "endLine": line },
                "value": text
            }]
        })
    }

    #[test]
    fn test_serialization_format() {
        let node = Node::from_json(json!({
            "nodeType": "Expr_Variable",
            "attributes": { "startLine": 1 },
            "name": "a"
        }))
        .unwrap();

        let mut text = String::new();
        serialize_value(
            &Value::List(vec![Value::Node(Box::new(node)), Value::Null, Value::Bool(true)]),
            &mut text,
        );

        assert_eq!(text, "[0:Expr_Variable(\n    name: \"a\")1:null2:true)");
    }

    #[test]
    fn test_string_content_cannot_mimic_structure() {
        let scalar = |value: &str| json!({ "nodeType": "Scalar_String", "value": value });
        let two_items = stmts(json!([{
            "nodeType": "Stmt_Echo",
            "exprs": [scalar("a"), scalar("b")]
        }]));
        let one_item = stmts(json!([{
            "nodeType": "Stmt_Echo",
            "exprs": [scalar("a\")1:Scalar_String(\n    value: b")]
        }]));

        assert_ne!(Digest::of_statements(&two_items), Digest::of_statements(&one_item));
    }

    #[test]
    fn test_keyed_array_keys_are_quoted() {
        let mut text = String::new();
        serialize_value(
            &Value::Map(vec![("k:1".to_string(), Value::Int(1))]),
            &mut text,
        );
        assert_eq!(text, "[\"k:1\":1)");
    }

    #[test]
    fn test_position_insensitive() {
        let a = stmts(json!([echo("hi", 3)]));
        let b = stmts(json!([echo("hi", 30)]));

        assert_eq!(Digest::of_statements(&a), Digest::of_statements(&b));
    }

    #[test]
    fn test_literal_sensitive() {
        let a = stmts(json!([echo("hi", 3)]));
        let b = stmts(json!([echo("ho", 3)]));

        assert_ne!(Digest::of_statements(&a), Digest::of_statements(&b));
    }

    #[test]
    fn test_variable_and_operator_sensitive() {
        let assign = |op: &str, var: &str| {
            json!([{
                "nodeType": "Stmt_Expression",
                "expr": {
                    "nodeType": op,
                    "var": { "nodeType": "Expr_Variable", "name": var },
                    "expr": { "nodeType": "Scalar_LNumber", "value": 1 }
                }
            }])
        };

        let base = Digest::of_statements(&stmts(assign("Expr_AssignOp_Plus", "a")));
        let other_var = Digest::of_statements(&stmts(assign("Expr_AssignOp_Plus", "b")));
        let other_op = Digest::of_statements(&stmts(assign("Expr_AssignOp_Minus", "a")));

        assert_ne!(base, other_var);
        assert_ne!(base, other_op);
    }

    #[test]
    fn test_absent_and_empty_bodies_differ() {
        assert_ne!(Digest::of_value(None), Digest::of_statements(&[]));
        assert_eq!(Digest::of_value(Some(&Value::List(vec![]))), Digest::of_statements(&[]));
    }

    #[test]
    fn test_hex_display() {
        let digest = Digest::of_text("");
        assert_eq!(digest.to_string().len(), 64);
        assert!(digest.to_string().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
