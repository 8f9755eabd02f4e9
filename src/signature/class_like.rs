//! Class-like entities (interfaces, classes, abstract classes, traits) and
//! their deterministic rendering.
//!
//! Members are accepted in any order. Each group (constants, properties,
//! methods) is sorted by the bytes of its rendered lines, so the output
//! never depends on source layout.

use std::fmt;

use crate::canonical::{render_parameters, Digest, Parameter};

/// Indentation for member lines.
const INDENT: &str = "    ";

/// Marker for property modifier codes missing from the table.
pub const UNKNOWN_PROPERTY: &str = "<unknown_property>";

/// Marker for method modifier codes missing from the table.
pub const UNKNOWN_METHOD: &str = "<unknown_method>";

/// The flavour of a class-like entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Interface,
    Class,
    AbstractClass,
    Trait,
}

impl Kind {
    pub fn keyword(&self) -> &'static str {
        match self {
            Kind::Interface => "interface",
            Kind::Class => "class",
            Kind::AbstractClass => "abstract class",
            Kind::Trait => "trait",
        }
    }

    /// Whether concrete methods carry a body digest.
    pub fn renders_bodies(&self) -> bool {
        !matches!(self, Kind::Interface)
    }

    /// Whether the header may carry an `implements` line.
    pub fn allows_implements(&self) -> bool {
        matches!(self, Kind::Class | Kind::AbstractClass)
    }

    /// Whether the header may carry an `extends` line.
    pub fn allows_extends(&self) -> bool {
        !matches!(self, Kind::Trait)
    }
}

/// Visibility/modifier bitmask as produced by the parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(pub i64);

impl Modifiers {
    pub const PUBLIC: i64 = 1;
    pub const PROTECTED: i64 = 2;
    pub const PRIVATE: i64 = 4;
    pub const STATIC: i64 = 8;
    pub const ABSTRACT: i64 = 16;
    pub const FINAL: i64 = 32;

    pub fn is_static(&self) -> bool {
        self.0 & Self::STATIC != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.0 & Self::ABSTRACT != 0
    }

    /// Keyword phrase for a property, `None` for codes outside the table.
    pub fn property_phrase(&self) -> Option<&'static str> {
        Some(match self.0 {
            0 | 1 => "public",
            2 => "protected",
            4 => "private",
            8 | 9 => "public static",
            10 => "protected static",
            12 => "private static",
            _ => return None,
        })
    }

    /// Keyword phrase for a method, `None` for codes outside the table.
    pub fn method_phrase(&self) -> Option<&'static str> {
        Some(match self.0 {
            0 | 1 => "public",
            2 => "protected",
            4 => "private",
            8 | 9 => "public static",
            10 => "protected static",
            12 => "private static",
            16 | 17 => "public abstract",
            18 => "protected abstract",
            20 => "private abstract",
            24 | 25 => "public static abstract",
            26 => "protected static abstract",
            28 => "private static abstract",
            _ => return None,
        })
    }
}

/// A member of a class-like entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Constant {
        name: String,
        value: String,
    },
    Property {
        modifiers: Modifiers,
        name: String,
        default: Option<String>,
    },
    Method {
        modifiers: Modifiers,
        name: String,
        params: Vec<Parameter>,
        body: Option<Digest>,
    },
}

impl Member {
    /// The member's rendered line(s), without the trailing terminator.
    pub fn render(&self) -> String {
        match self {
            Member::Constant { name, value } => format!("{INDENT}const {} = {}", name, value),
            Member::Property {
                modifiers,
                name,
                default,
            } => {
                let phrase = modifiers.property_phrase().unwrap_or(UNKNOWN_PROPERTY);
                let mut line = format!("{INDENT}{} ${}", phrase, name);
                if let Some(default) = default {
                    line.push_str(" = ");
                    line.push_str(default);
                }
                line
            }
            Member::Method {
                modifiers,
                name,
                params,
                body,
            } => {
                let phrase = modifiers.method_phrase().unwrap_or(UNKNOWN_METHOD);
                let mut line = format!(
                    "{INDENT}{} function {}({})",
                    phrase,
                    name,
                    render_parameters(params)
                );
                if let Some(body) = body {
                    line.push_str(&format!("\n{INDENT}{{ /* {} */ }}", body));
                }
                line
            }
        }
    }
}

/// An interface, class, abstract class or trait with its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLike {
    kind: Kind,
    name: String,
    extends: Vec<String>,
    implements: Vec<String>,
    constants: Vec<Member>,
    properties: Vec<Member>,
    methods: Vec<Member>,
}

impl ClassLike {
    /// Create an empty entity. Header lists the kind does not allow are dropped.
    pub fn new(kind: Kind, name: impl Into<String>, extends: Vec<String>, implements: Vec<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            extends: if kind.allows_extends() { extends } else { Vec::new() },
            implements: if kind.allows_implements() { implements } else { Vec::new() },
            constants: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Fully qualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extends(&self) -> &[String] {
        &self.extends
    }

    pub fn implements(&self) -> &[String] {
        &self.implements
    }

    pub fn add_constant(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.constants.push(Member::Constant {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn add_property(&mut self, modifiers: Modifiers, name: impl Into<String>, default: Option<String>) {
        self.properties.push(Member::Property {
            modifiers,
            name: name.into(),
            default: default.filter(|d| !d.is_empty()),
        });
    }

    /// Add a method. The body digest is dropped for interfaces and for
    /// abstract methods.
    pub fn add_method(
        &mut self,
        modifiers: Modifiers,
        name: impl Into<String>,
        params: Vec<Parameter>,
        body: Option<Digest>,
    ) {
        let body = body.filter(|_| self.kind.renders_bodies() && !modifiers.is_abstract());
        self.methods.push(Member::Method {
            modifiers,
            name: name.into(),
            params,
            body,
        });
    }

    /// All members: constants, then properties, then methods.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.constants
            .iter()
            .chain(self.properties.iter())
            .chain(self.methods.iter())
    }
}

fn sorted_lines(members: &[Member]) -> Vec<String> {
    let mut lines: Vec<String> = members.iter().map(Member::render).collect();
    lines.sort();
    lines
}

impl fmt::Display for ClassLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header = format!("{} {}", self.kind.keyword(), self.name);
        if !self.extends.is_empty() {
            header.push_str(&format!("\n{INDENT}extends {}", self.extends.join(", ")));
        }
        if !self.implements.is_empty() {
            header.push_str(&format!("\n{INDENT}implements {}", self.implements.join(", ")));
        }
        header.push_str("\n{");

        let mut out = vec![header];

        for line in sorted_lines(&self.constants) {
            out.push(line + ";");
        }
        if !self.constants.is_empty() {
            out.push(String::new());
        }

        for line in sorted_lines(&self.properties) {
            out.push(line + ";");
        }
        if !self.properties.is_empty() {
            out.push(String::new());
        }

        for mut line in sorted_lines(&self.methods) {
            if !line.ends_with('}') {
                line.push(';');
            }
            line.push('\n');
            out.push(line);
        }

        out.push("}".to_string());
        f.write_str(&out.join("\n"))
    }
}
