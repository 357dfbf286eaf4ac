//! gotyper
//!
//! Generates Go type declarations from a JSON Schema document, keeping
//! generated types in sync with an external schema contract.
//!
//! ## Pipeline
//!
//! ```text
//! schema JSON --> SchemaNode tree
//!                   |
//!                   v
//!             TypeGraph builder  (recursive, registers one descriptor
//!                   |             per schema path)
//!                   v
//!             deferred fixpoint  (retries unresolved references until
//!                   |             the pending set drains or sticks)
//!                   v
//!             name deduplication (ancestor-prefixed renames until
//!                   |             names are injective)
//!                   v
//!             Go source emission (descriptors ordered by name)
//! ```
//!
//! Resolution is single-threaded and deterministic: the same document and
//! configuration always produce byte-identical output.

pub mod codegen;
pub mod error;
pub mod graph;
pub mod schema;

pub use codegen::config::{GeneratorConfig, NamingConfig};
pub use codegen::{generate, resolve};
pub use error::{GeneratorError, Result};
pub use graph::{FieldDescriptor, FieldType, Primitive, TypeDescriptor, TypeGraph, TypeKind, TypePath};
pub use schema::SchemaNode;
