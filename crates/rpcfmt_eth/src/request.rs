use alloy_primitives::{Address, Bytes, B256, U256};
use rpcfmt_core::{FieldDef, FieldKind, FieldMap, FieldValue, FormatError, RawEntity};
use serde::{Deserialize, Serialize};

use crate::{decode, transaction::AccessListItem};

/// Canonical fields of the generic outbound transaction request shape, in
/// wire order.
pub const TRANSACTION_REQUEST_FIELDS: &[FieldDef] = &[
    FieldDef::new("from", FieldKind::Address),
    FieldDef::new("to", FieldKind::Address),
    FieldDef::new("gas", FieldKind::Quantity),
    FieldDef::new("gasPrice", FieldKind::Quantity),
    FieldDef::new("maxFeePerGas", FieldKind::Quantity),
    FieldDef::new("maxPriorityFeePerGas", FieldKind::Quantity),
    FieldDef::new("maxFeePerBlobGas", FieldKind::Quantity),
    FieldDef::new("value", FieldKind::Quantity),
    FieldDef::new("data", FieldKind::Bytes),
    FieldDef::new("nonce", FieldKind::Quantity),
    FieldDef::new("chainId", FieldKind::Quantity),
    FieldDef::new("accessList", FieldKind::AccessList),
    FieldDef::new("type", FieldKind::Quantity),
    FieldDef::new("blobVersionedHashes", FieldKind::HashArray),
];

/// Base outbound request formatter. Runs in the reverse direction: the
/// input is a serialized user request, the output is the exact raw shape
/// the transport must send. `input` is accepted as an alias of `data`.
pub fn format_transaction_request(raw: &RawEntity) -> Result<FieldMap, FormatError> {
    let mut result = decode::format_canonical(TRANSACTION_REQUEST_FIELDS, raw)?;

    if !result.contains("data") {
        if let Some(value) = raw.get("input") {
            if value.is_null() {
                result.insert("data", FieldValue::Null);
            } else {
                result.insert(
                    "data",
                    decode::field(FieldDef::new("data", FieldKind::Bytes), value)?,
                );
            }
        }
    }

    Ok(result)
}

/// A user-constructed transaction request for the generic L1 chain. Every
/// field is optional; what is absent stays absent on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// From address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// To address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Gas.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub gas: Option<u64>,
    /// Legacy gas price.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub gas_price: Option<u128>,
    /// Max base fee per gas the sender is willing to pay.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub max_fee_per_gas: Option<u128>,
    /// Miner tip.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub max_priority_fee_per_gas: Option<u128>,
    /// Max fee per blob gas (EIP-4844).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub max_fee_per_blob_gas: Option<u128>,
    /// Value of the transaction in wei.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Any additional data sent.
    #[serde(alias = "input", skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Transaction nonce.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub nonce: Option<u64>,
    /// Chain id.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub chain_id: Option<u64>,
    /// Warm storage access pre-payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListItem>>,
    /// EIP-2718 type.
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub transaction_type: Option<u8>,
    /// Blob versioned hashes (EIP-4844).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_versioned_hashes: Option<Vec<B256>>,
}
