//! Canonicalization of expressions, bodies and parameter lists.
//!
//! This module provides:
//! - Stable text tokens for constant-valued expressions
//! - Position-insensitive body digests
//! - Parameter records with resolved types and defaults

pub mod digest;
pub mod literal;
pub mod params;

pub use digest::{Digest, DIGEST_FORMAT_VERSION};
pub use literal::{canonical_literal, opaque_token, CONST_PART_SEPARATOR};
pub use params::{render_parameters, resolve_parameters, resolve_type, Parameter};
