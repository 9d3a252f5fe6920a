use crate::{
    error::FormatError,
    field::{FieldDef, FieldMap},
};

/// A raw, loosely typed JSON-RPC entity as received from (or sent to) the
/// transport. Unknown fields are carried along and ignored.
pub type RawEntity = serde_json::Map<String, serde_json::Value>;

/// A pure formatting function: raw entity in, formatted fields out.
pub type FormatFn = fn(&RawEntity) -> Result<FieldMap, FormatError>;

/// The entity kinds a chain may customize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// A block returned by `eth_getBlockBy*`.
    Block,
    /// A transaction returned by `eth_getTransactionBy*`.
    Transaction,
    /// An outbound `eth_sendTransaction`-style request.
    TransactionRequest,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Block => "block",
            EntityKind::Transaction => "transaction",
            EntityKind::TransactionRequest => "transaction request",
        };
        f.write_str(name)
    }
}

/// A chain's declared delta from the generic entity shape, for one entity
/// kind.
///
/// `exclude` names base fields that do not exist on this chain; they are
/// removed from the base formatter's output unconditionally, even when the
/// raw payload carries a value for them. `format` receives the same raw
/// entity the base formatter received (never the base output), so it can
/// read chain-specific raw fields the base formatter does not know about.
/// `provides` declares the fields `format` may emit together with their
/// value classes; it is validated against the canonical field registry at
/// registration time.
///
/// An override may provide a field it also excludes: exclusion filters only
/// the base output, so the override's value survives the merge. This
/// reinstates the field under new semantics and is allowed, but flagged with
/// a warning at registration time.
#[derive(Clone, Copy, Debug)]
pub struct FormatterDescriptor {
    /// Base fields removed from both the runtime output and the chain's
    /// domain type.
    pub exclude: &'static [&'static str],
    /// Fields the override's `format` may emit.
    pub provides: &'static [FieldDef],
    /// Chain-specific formatting function.
    pub format: FormatFn,
}

impl FormatterDescriptor {
    /// The identity override: nothing excluded, nothing provided. Used for
    /// entity kinds a chain does not customize.
    pub const IDENTITY: Self = Self {
        exclude: &[],
        provides: &[],
        format: identity_format,
    };
}

impl Default for FormatterDescriptor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn identity_format(_raw: &RawEntity) -> Result<FieldMap, FormatError> {
    Ok(FieldMap::new())
}

/// A base formatter for one entity kind: the canonical field registry that
/// defines the generic shape, and the generic formatting function.
#[derive(Clone, Copy, Debug)]
pub struct EntityFormatter {
    /// Canonical fields of the generic entity shape.
    pub fields: &'static [FieldDef],
    /// Generic formatting function.
    pub format: FormatFn,
}

/// The full base formatter set: one [`EntityFormatter`] per entity kind.
#[derive(Clone, Copy, Debug)]
pub struct BaseFormatters {
    /// Base formatter for blocks.
    pub block: EntityFormatter,
    /// Base formatter for transactions.
    pub transaction: EntityFormatter,
    /// Base formatter for outbound transaction requests.
    pub transaction_request: EntityFormatter,
}
