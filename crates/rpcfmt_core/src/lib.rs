//! Chain-extensible formatter composition for JSON-RPC entities.
//!
//! A generic base formatter defines the chain-agnostic shape of each entity
//! kind (block, transaction, outbound transaction request). A chain declares
//! its delta as a [`FormatterDescriptor`] per kind: fields to exclude and a
//! function injecting chain-specific fields. The [`registry`] merges both
//! into one effective formatter per kind with fixed precedence, validated at
//! registration time against the canonical field registry.
//!
//! All formatting is pure and synchronous. The registry is immutable after
//! construction, so concurrent formatting calls share it freely.

mod descriptor;
mod error;
mod field;
pub mod registry;
pub mod spec;

pub use self::{
    descriptor::{
        BaseFormatters, EntityFormatter, EntityKind, FormatFn, FormatterDescriptor, RawEntity,
    },
    error::{FormatError, RegistrationError},
    field::{FieldDef, FieldKind, FieldMap, FieldValue},
};
