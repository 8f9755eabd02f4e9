//! Per-file signature: defines, functions and class-like entities.

use std::fmt;

use crate::canonical::{render_parameters, Digest, Parameter};
use crate::signature::class_like::{ClassLike, Kind};

/// A `define('NAME', value)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    pub value: String,
}

impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {}  = {};", self.name, self.value)
    }
}

/// A top-level (or block-nested) function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Digest,
}

impl fmt::Display for FunctionSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "function {} ({})\n{{ /* {} */ }}",
            self.name,
            render_parameters(&self.params),
            self.body
        )
    }
}

/// The structural signature of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSignature {
    defines: Vec<Define>,
    functions: Vec<FunctionSig>,
    class_likes: Vec<ClassLike>,
}

impl SourceSignature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_define(&mut self, define: Define) {
        self.defines.push(define);
    }

    pub fn push_function(&mut self, function: FunctionSig) {
        self.functions.push(function);
    }

    /// Append a finished class-like entity. It is not reachable mutably
    /// afterwards.
    pub fn push_class_like(&mut self, class_like: ClassLike) {
        self.class_likes.push(class_like);
    }

    pub fn defines(&self) -> &[Define] {
        &self.defines
    }

    pub fn functions(&self) -> &[FunctionSig] {
        &self.functions
    }

    /// Class-like entities in discovery order.
    pub fn class_likes(&self) -> &[ClassLike] {
        &self.class_likes
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty() && self.functions.is_empty() && self.class_likes.is_empty()
    }

    /// Rendered sections in output order: defines, functions, then
    /// interfaces, traits and classes, each group in discovery order.
    pub fn sections(&self) -> Vec<String> {
        let mut out: Vec<String> = self.defines.iter().map(ToString::to_string).collect();
        out.extend(self.functions.iter().map(ToString::to_string));

        let groups: [&[Kind]; 3] = [
            &[Kind::Interface],
            &[Kind::Trait],
            &[Kind::Class, Kind::AbstractClass],
        ];
        for kinds in groups {
            out.extend(
                self.class_likes
                    .iter()
                    .filter(|c| kinds.contains(&c.kind()))
                    .map(ToString::to_string),
            );
        }
        out
    }
}

impl fmt::Display for SourceSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sections().join("\n\n"))
    }
}
