//! Signature model and rendering.

pub mod class_like;
pub mod source;

pub use class_like::{ClassLike, Kind, Member, Modifiers, UNKNOWN_METHOD, UNKNOWN_PROPERTY};
pub use source::{Define, FunctionSig, SourceSignature};
