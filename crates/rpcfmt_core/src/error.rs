use crate::{descriptor::EntityKind, field::FieldKind};

/// Error that occurs while formatting a single entity.
///
/// Formatting is pure and deterministic, so none of these are retried; a
/// failure fails the enclosing client action and no partially formatted
/// entity escapes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// A present raw field failed scalar decoding. Never silently defaulted.
    #[error("malformed value for field `{field}`: expected {expected}, got `{value}`")]
    MalformedField {
        /// Wire name of the field.
        field: &'static str,
        /// Value class the field must decode to.
        expected: FieldKind,
        /// The offending raw value.
        value: serde_json::Value,
    },
    /// A field required by the selected transaction variant, or by a typed
    /// conversion, is absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// The transaction type tag has no mapped variant.
    #[error("unknown transaction type: {0:#04x}")]
    UnknownTransactionType(u8),
    /// An outbound request sets mutually exclusive fields.
    #[error("conflicting fields: `{first}` cannot be combined with `{second}`")]
    ConflictingFields {
        /// The first of the two fields.
        first: &'static str,
        /// The field it cannot be combined with.
        second: &'static str,
    },
    /// The outbound request could not be serialized into a raw object.
    #[error("failed to serialize transaction request: {0}")]
    RequestSerialization(String),
}

/// Error that occurs when registering a chain's formatter descriptors.
/// Detected at client construction time, never per formatting call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// An `exclude` entry names a field that is not part of the canonical
    /// field registry for the entity kind.
    #[error("chain override for {kind} excludes unknown field `{field}`")]
    UnknownExcludedField {
        /// Entity kind the descriptor was registered for.
        kind: EntityKind,
        /// The unknown field name.
        field: &'static str,
    },
    /// A `provides` entry collides with a canonical field of a different
    /// value class without excluding it first.
    #[error(
        "chain override for {kind} provides field `{field}` as {declared}, \
         conflicting with canonical kind {canonical}"
    )]
    ConflictingOverride {
        /// Entity kind the descriptor was registered for.
        kind: EntityKind,
        /// The conflicting field name.
        field: &'static str,
        /// Value class declared by the override.
        declared: FieldKind,
        /// Canonical value class of the field.
        canonical: FieldKind,
    },
}
