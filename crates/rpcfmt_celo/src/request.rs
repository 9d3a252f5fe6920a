use alloy_primitives::{Address, Bytes, U256};
use rpcfmt_core::{FieldMap, FormatError, FormatterDescriptor, RawEntity};
use rpcfmt_eth::{
    decode,
    request::TransactionRequest,
    transaction::AccessListItem,
};
use serde::{Deserialize, Serialize, Serializer};

use crate::transaction::{CeloTransactionType, PROVIDED_TRANSACTION_FIELDS};

/// The Celo outbound request descriptor: injects the fee abstraction fields
/// and rejects requests that pay a legacy gas price in a fee currency.
pub const TRANSACTION_REQUEST_DESCRIPTOR: FormatterDescriptor = FormatterDescriptor {
    exclude: &[],
    provides: PROVIDED_TRANSACTION_FIELDS,
    format: format_transaction_request_fields,
};

fn format_transaction_request_fields(raw: &RawEntity) -> Result<FieldMap, FormatError> {
    let has = |name: &str| raw.get(name).is_some_and(|value| !value.is_null());

    // A fee currency only exists for the dynamic fee variants; a legacy gas
    // price cannot be denominated in it.
    if has("gasPrice") && has("feeCurrency") {
        return Err(FormatError::ConflictingFields {
            first: "gasPrice",
            second: "feeCurrency",
        });
    }

    decode::format_canonical(PROVIDED_TRANSACTION_FIELDS, raw)
}

/// A user-constructed CIP-64 transaction request. The fee currency is the
/// variant's defining field and therefore required; a legacy gas price is
/// unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cip64TransactionRequest {
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
    /// ERC-20 token the fees are paid in.
    pub fee_currency: Address,
}

/// A user-constructed CIP-42 transaction request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cip42TransactionRequest {
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
    /// ERC-20 token the fees are paid in. `None` means the native token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_currency: Option<Address>,
    /// Fee paid to the gateway full node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_fee: Option<U256>,
    /// Recipient of the gateway fee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_fee_recipient: Option<Address>,
}

/// A user-constructed Celo transaction request: the generic L1 request or
/// one of the fee abstraction variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CeloTransactionRequest {
    /// Any generic L1 request, legacy gas price included.
    L1(TransactionRequest),
    /// CIP-64 fee currency request.
    Cip64(Cip64TransactionRequest),
    /// CIP-42 gateway fee request.
    Cip42(Cip42TransactionRequest),
}

impl CeloTransactionRequest {
    /// The type tag the request serializes with, when one is determined.
    pub fn transaction_type(&self) -> Option<CeloTransactionType> {
        match self {
            CeloTransactionRequest::L1(request) => request
                .transaction_type
                .and_then(|tag| CeloTransactionType::try_from(tag).ok()),
            CeloTransactionRequest::Cip64(_) => Some(CeloTransactionType::Cip64),
            CeloTransactionRequest::Cip42(_) => Some(CeloTransactionType::Cip42),
        }
    }
}

impl Serialize for CeloTransactionRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;

        let (value, tag) = match self {
            CeloTransactionRequest::L1(request) => (serde_json::to_value(request), None),
            CeloTransactionRequest::Cip64(request) => {
                (serde_json::to_value(request), Some(CeloTransactionType::Cip64))
            }
            CeloTransactionRequest::Cip42(request) => {
                (serde_json::to_value(request), Some(CeloTransactionType::Cip42))
            }
        };

        let mut value = value.map_err(S::Error::custom)?;
        if let (Some(tag), serde_json::Value::Object(object)) = (tag, &mut value) {
            object.insert(
                "type".to_string(),
                serde_json::Value::String(format!("{:#x}", u8::from(tag))),
            );
        }

        value.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn conflicting_gas_price_and_fee_currency_are_rejected() -> anyhow::Result<()> {
        let raw: RawEntity = serde_json::from_str(
            r#"{
                "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
                "gasPrice": "0x3b9aca00",
                "feeCurrency": "0x765de816845861e75a25fca122bb6898b8b1282a"
            }"#,
        )?;

        assert_eq!(
            format_transaction_request_fields(&raw),
            Err(FormatError::ConflictingFields {
                first: "gasPrice",
                second: "feeCurrency",
            })
        );

        Ok(())
    }

    #[test]
    fn null_fee_currency_does_not_conflict() -> anyhow::Result<()> {
        let raw: RawEntity = serde_json::from_str(
            r#"{"gasPrice": "0x3b9aca00", "feeCurrency": null}"#,
        )?;

        assert!(format_transaction_request_fields(&raw).is_ok());

        Ok(())
    }

    #[test]
    fn cip64_request_serializes_with_type_tag() -> anyhow::Result<()> {
        let request = CeloTransactionRequest::Cip64(Cip64TransactionRequest {
            from: Some(Address::from_str(
                "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            )?),
            to: Some(Address::from_str(
                "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            )?),
            gas: Some(21_000),
            max_fee_per_gas: Some(2_000_000_000),
            max_priority_fee_per_gas: Some(1_000_000_000),
            value: Some(U256::from(1_u64)),
            data: None,
            nonce: None,
            chain_id: None,
            access_list: None,
            fee_currency: Address::from_str("0x765de816845861e75a25fca122bb6898b8b1282a")?,
        });

        let raw = serde_json::to_value(&request)?;
        assert_eq!(raw["type"], serde_json::json!("0x7b"));
        assert_eq!(
            raw["feeCurrency"],
            serde_json::json!("0x765de816845861e75a25fca122bb6898b8b1282a")
        );
        assert_eq!(raw["gas"], serde_json::json!("0x5208"));

        Ok(())
    }
}
