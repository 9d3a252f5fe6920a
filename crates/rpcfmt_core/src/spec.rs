use serde::Serialize;

use crate::{
    descriptor::RawEntity,
    error::{FormatError, RegistrationError},
    field::FieldMap,
    registry::ChainFormatters,
};

/// Trait for specifying a chain's formatter layer: the domain types each
/// entity kind formats into, and the registry wiring the chain's overrides
/// onto the base formatter set.
pub trait ChainFormatterSpec {
    /// The chain's domain block type.
    type Block: TryFrom<FieldMap, Error = FormatError>;

    /// The chain's domain transaction type.
    type Transaction: TryFrom<FieldMap, Error = FormatError>;

    /// The chain's outbound transaction request type.
    type TransactionRequest: Serialize;

    /// Builds the chain's formatter registry. Called once per client;
    /// registration errors surface here, at construction time.
    fn formatters() -> Result<ChainFormatters, RegistrationError>;
}

/// Formats a raw block into the chain's domain block type.
pub fn format_block<SpecT: ChainFormatterSpec>(
    formatters: &ChainFormatters,
    raw: &RawEntity,
) -> Result<SpecT::Block, FormatError> {
    formatters.block().format(raw).and_then(SpecT::Block::try_from)
}

/// Formats a raw transaction into the chain's domain transaction type.
pub fn format_transaction<SpecT: ChainFormatterSpec>(
    formatters: &ChainFormatters,
    raw: &RawEntity,
) -> Result<SpecT::Transaction, FormatError> {
    formatters
        .transaction()
        .format(raw)
        .and_then(SpecT::Transaction::try_from)
}

/// Formats the full transaction objects embedded in a raw block retrieved
/// with `includeTransactions`. Each transaction is an independent formatting
/// call; hash-only entries are skipped.
pub fn format_block_transactions<SpecT: ChainFormatterSpec>(
    formatters: &ChainFormatters,
    raw_block: &RawEntity,
) -> Result<Vec<SpecT::Transaction>, FormatError> {
    raw_block
        .get("transactions")
        .and_then(serde_json::Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(serde_json::Value::as_object)
        .map(|raw| format_transaction::<SpecT>(formatters, raw))
        .collect()
}

/// Formats an outbound transaction request into the exact raw shape the
/// transport must send. Runs in the reverse direction: the typed request is
/// serialized into a raw entity, then passed through the same exclusion and
/// override pipeline as inbound entities.
pub fn format_transaction_request<SpecT: ChainFormatterSpec>(
    formatters: &ChainFormatters,
    request: &SpecT::TransactionRequest,
) -> Result<FieldMap, FormatError> {
    let value = serde_json::to_value(request)
        .map_err(|error| FormatError::RequestSerialization(error.to_string()))?;

    let serde_json::Value::Object(raw) = value else {
        return Err(FormatError::RequestSerialization(
            "expected the request to serialize into an object".to_string(),
        ));
    };

    formatters.transaction_request().format(&raw)
}
