use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256, U256};
use rpcfmt_core::{FieldDef, FieldKind, FieldMap, FieldValue, FormatError, RawEntity};
use serde::{Deserialize, Serialize};

use crate::decode;

/// Canonical fields of the generic transaction shape, in wire order.
pub const TRANSACTION_FIELDS: &[FieldDef] = &[
    FieldDef::new("hash", FieldKind::Hash),
    FieldDef::new("nonce", FieldKind::Quantity),
    FieldDef::new("blockHash", FieldKind::Hash),
    FieldDef::new("blockNumber", FieldKind::Quantity),
    FieldDef::new("transactionIndex", FieldKind::Quantity),
    FieldDef::new("from", FieldKind::Address),
    FieldDef::new("to", FieldKind::Address),
    FieldDef::new("value", FieldKind::Quantity),
    FieldDef::new("gasPrice", FieldKind::Quantity),
    FieldDef::new("gas", FieldKind::Quantity),
    FieldDef::new("input", FieldKind::Bytes),
    FieldDef::new("v", FieldKind::Quantity),
    FieldDef::new("yParity", FieldKind::Quantity),
    FieldDef::new("r", FieldKind::Quantity),
    FieldDef::new("s", FieldKind::Quantity),
    FieldDef::new("chainId", FieldKind::Quantity),
    FieldDef::new("type", FieldKind::Quantity),
    FieldDef::new("accessList", FieldKind::AccessList),
    FieldDef::new("maxFeePerGas", FieldKind::Quantity),
    FieldDef::new("maxPriorityFeePerGas", FieldKind::Quantity),
    FieldDef::new("maxFeePerBlobGas", FieldKind::Quantity),
    FieldDef::new("blobVersionedHashes", FieldKind::HashArray),
];

/// Base transaction formatter: decodes every canonical field present in the
/// raw payload.
pub fn format_transaction(raw: &RawEntity) -> Result<FieldMap, FormatError> {
    decode::format_canonical(TRANSACTION_FIELDS, raw)
}

/// The EIP-2718 type tags of the generic L1 transaction variants. Exactly
/// one tag maps to exactly one variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum L1TransactionType {
    /// Pre-EIP-2718 legacy transaction.
    Legacy = 0,
    /// EIP-2930 access list transaction.
    Eip2930 = 1,
    /// EIP-1559 fee market transaction.
    Eip1559 = 2,
    /// EIP-4844 blob-carrying transaction.
    Eip4844 = 3,
}

impl From<L1TransactionType> for u8 {
    fn from(value: L1TransactionType) -> u8 {
        value as u8
    }
}

impl TryFrom<u8> for L1TransactionType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Legacy),
            1 => Ok(Self::Eip2930),
            2 => Ok(Self::Eip1559),
            3 => Ok(Self::Eip4844),
            value => Err(value),
        }
    }
}

impl FromStr for L1TransactionType {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_type_tag(s).and_then(|tag| {
            Self::try_from(tag).map_err(FormatError::UnknownTransactionType)
        })
    }
}

/// Parses the `0x`-hex wire form of an EIP-2718 type tag.
pub fn parse_type_tag(s: &str) -> Result<u8, FormatError> {
    s.strip_prefix("0x")
        .and_then(|digits| u8::from_str_radix(digits, 16).ok())
        .ok_or_else(|| FormatError::MalformedField {
            field: "type",
            expected: FieldKind::Quantity,
            value: serde_json::Value::String(s.to_string()),
        })
}

/// The type of a transaction formatted with a fallback policy: either a
/// recognized variant tag, or the unrecognized tag that was interpreted as a
/// legacy transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Type {
    /// Pre-EIP-2718 legacy transaction.
    Legacy,
    /// EIP-2930 access list transaction.
    Eip2930,
    /// EIP-1559 fee market transaction.
    Eip1559,
    /// EIP-4844 blob-carrying transaction.
    Eip4844,
    /// Unrecognized tag, interpreted as a legacy transaction.
    Unrecognized(u8),
}

impl From<L1TransactionType> for Type {
    fn from(value: L1TransactionType) -> Self {
        match value {
            L1TransactionType::Legacy => Type::Legacy,
            L1TransactionType::Eip2930 => Type::Eip2930,
            L1TransactionType::Eip1559 => Type::Eip1559,
            L1TransactionType::Eip4844 => Type::Eip4844,
        }
    }
}

/// One entry of an EIP-2930 access list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    /// Account whose storage is pre-warmed.
    pub address: Address,
    /// Pre-warmed storage keys.
    pub storage_keys: Vec<B256>,
}

/// The fields shared by every transaction variant.
///
/// `block_hash`, `block_number` and `transaction_index` are `None` while the
/// transaction is pending; the merge engine forces them to `null` before the
/// typed conversion runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionBase {
    /// Hash of the transaction.
    pub hash: B256,
    /// Number of transactions made by the sender prior to this one.
    pub nonce: u64,
    /// Hash of the enclosing block. `None` when pending.
    pub block_hash: Option<B256>,
    /// Number of the enclosing block. `None` when pending.
    pub block_number: Option<u64>,
    /// Index position in the enclosing block. `None` when pending.
    pub transaction_index: Option<u64>,
    /// Address of the sender.
    pub from: Address,
    /// Address of the receiver. `None` for a contract creation.
    pub to: Option<Address>,
    /// Value transferred in wei.
    pub value: U256,
    /// Gas provided by the sender.
    pub gas: u64,
    /// Data sent along with the transaction.
    pub input: Bytes,
    /// ECDSA recovery id.
    pub v: Option<u64>,
    /// ECDSA signature r.
    pub r: Option<U256>,
    /// ECDSA signature s.
    pub s: Option<U256>,
}

impl TransactionBase {
    /// Extracts the shared fields from a formatted transaction.
    pub fn from_fields(map: &FieldMap) -> Result<Self, FormatError> {
        Ok(Self {
            hash: map.required_hash("hash")?,
            nonce: map.required_quantity_u64("nonce")?,
            block_hash: map.optional_hash("blockHash")?,
            block_number: map.optional_quantity_u64("blockNumber")?,
            transaction_index: map.optional_quantity_u64("transactionIndex")?,
            from: map.required_address("from")?,
            to: map.optional_address("to")?,
            value: map.required_quantity("value")?,
            gas: map.required_quantity_u64("gas")?,
            input: map.required_bytes("input")?,
            v: map.optional_quantity_u64("v")?,
            r: map.optional_quantity("r")?,
            s: map.optional_quantity("s")?,
        })
    }
}

/// Legacy transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Legacy {
    /// Fields shared by every variant.
    pub base: TransactionBase,
    /// Gas price provided by the sender in wei.
    pub gas_price: u128,
    /// Chain id. `None` for pre-EIP-155 transactions.
    pub chain_id: Option<u64>,
}

/// EIP-2930 access list transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eip2930 {
    /// Fields shared by every variant.
    pub base: TransactionBase,
    /// Chain id.
    pub chain_id: u64,
    /// Gas price provided by the sender in wei.
    pub gas_price: u128,
    /// Pre-warmed addresses and storage keys.
    pub access_list: Vec<AccessListItem>,
}

/// EIP-1559 fee market transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eip1559 {
    /// Fields shared by every variant.
    pub base: TransactionBase,
    /// Chain id.
    pub chain_id: u64,
    /// Maximum total fee per gas.
    pub max_fee_per_gas: u128,
    /// Maximum priority fee per gas.
    pub max_priority_fee_per_gas: u128,
    /// Pre-warmed addresses and storage keys.
    pub access_list: Vec<AccessListItem>,
}

/// EIP-4844 blob-carrying transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eip4844 {
    /// Fields shared by every variant.
    pub base: TransactionBase,
    /// Chain id.
    pub chain_id: u64,
    /// Maximum total fee per gas.
    pub max_fee_per_gas: u128,
    /// Maximum priority fee per gas.
    pub max_priority_fee_per_gas: u128,
    /// Maximum total fee per blob gas.
    pub max_fee_per_blob_gas: u128,
    /// Versioned hashes of the transaction's data blobs.
    pub blob_versioned_hashes: Vec<B256>,
    /// Pre-warmed addresses and storage keys.
    pub access_list: Vec<AccessListItem>,
}

/// A formatted generic L1 transaction: exactly one variant per type tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum L1Transaction {
    /// Legacy transaction.
    Legacy(Legacy),
    /// EIP-2930 access list transaction.
    Eip2930(Eip2930),
    /// EIP-1559 fee market transaction.
    Eip1559(Eip1559),
    /// EIP-4844 blob-carrying transaction.
    Eip4844(Eip4844),
}

impl L1Transaction {
    /// The variant's type tag.
    pub fn transaction_type(&self) -> L1TransactionType {
        match self {
            L1Transaction::Legacy(_) => L1TransactionType::Legacy,
            L1Transaction::Eip2930(_) => L1TransactionType::Eip2930,
            L1Transaction::Eip1559(_) => L1TransactionType::Eip1559,
            L1Transaction::Eip4844(_) => L1TransactionType::Eip4844,
        }
    }

    /// The fields shared by every variant.
    pub fn base(&self) -> &TransactionBase {
        match self {
            L1Transaction::Legacy(transaction) => &transaction.base,
            L1Transaction::Eip2930(transaction) => &transaction.base,
            L1Transaction::Eip1559(transaction) => &transaction.base,
            L1Transaction::Eip4844(transaction) => &transaction.base,
        }
    }
}

/// Reads the type tag of a formatted transaction. A missing tag means
/// legacy; an out-of-range tag is malformed.
pub fn transaction_type_tag(map: &FieldMap) -> Result<Option<u8>, FormatError> {
    map.optional_quantity("type")?
        .map(|tag| {
            u8::try_from(tag).map_err(|_error| FormatError::MalformedField {
                field: "type",
                expected: FieldKind::Quantity,
                value: serde_json::to_value(FieldValue::Quantity(tag))
                    .unwrap_or(serde_json::Value::Null),
            })
        })
        .transpose()
}

/// Extracts a formatted access list into its typed form.
pub fn access_list_from(map: &FieldMap) -> Result<Option<Vec<AccessListItem>>, FormatError> {
    let malformed = |value: &FieldValue| FormatError::MalformedField {
        field: "accessList",
        expected: FieldKind::AccessList,
        value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
    };

    map.present("accessList")
        .map(|value| {
            value
                .as_array()
                .ok_or_else(|| malformed(value))?
                .iter()
                .map(|item| {
                    let entry = item.as_object().ok_or_else(|| malformed(item))?;

                    let address = entry
                        .get("address")
                        .and_then(FieldValue::as_address)
                        .copied()
                        .ok_or_else(|| malformed(item))?;

                    let storage_keys = entry
                        .get("storageKeys")
                        .and_then(FieldValue::as_array)
                        .map(|keys| {
                            keys.iter()
                                .map(|key| key.as_hash().copied().ok_or_else(|| malformed(key)))
                                .collect::<Result<Vec<_>, _>>()
                        })
                        .transpose()?
                        .unwrap_or_default();

                    Ok(AccessListItem {
                        address,
                        storage_keys,
                    })
                })
                .collect()
        })
        .transpose()
}

impl TryFrom<FieldMap> for L1Transaction {
    type Error = FormatError;

    fn try_from(map: FieldMap) -> Result<Self, Self::Error> {
        let r#type = match transaction_type_tag(&map)? {
            None => L1TransactionType::Legacy,
            Some(tag) => L1TransactionType::try_from(tag)
                .map_err(FormatError::UnknownTransactionType)?,
        };

        build_variant(r#type, &map)
    }
}

/// Builds the typed variant a recognized L1 tag selects. Chain crates
/// reuse this for the generic members of their own variant set.
pub fn build_variant(
    r#type: L1TransactionType,
    map: &FieldMap,
) -> Result<L1Transaction, FormatError> {
    let base = TransactionBase::from_fields(map)?;

    let transaction = match r#type {
        L1TransactionType::Legacy => L1Transaction::Legacy(Legacy {
            base,
            gas_price: map.required_quantity_u128("gasPrice")?,
            chain_id: map.optional_quantity_u64("chainId")?,
        }),
        L1TransactionType::Eip2930 => L1Transaction::Eip2930(Eip2930 {
            base,
            chain_id: map.required_quantity_u64("chainId")?,
            gas_price: map.required_quantity_u128("gasPrice")?,
            access_list: access_list_from(map)?.ok_or(FormatError::MissingField("accessList"))?,
        }),
        L1TransactionType::Eip1559 => L1Transaction::Eip1559(Eip1559 {
            base,
            chain_id: map.required_quantity_u64("chainId")?,
            max_fee_per_gas: map.required_quantity_u128("maxFeePerGas")?,
            max_priority_fee_per_gas: map.required_quantity_u128("maxPriorityFeePerGas")?,
            access_list: access_list_from(map)?.unwrap_or_default(),
        }),
        L1TransactionType::Eip4844 => L1Transaction::Eip4844(Eip4844 {
            base,
            chain_id: map.required_quantity_u64("chainId")?,
            max_fee_per_gas: map.required_quantity_u128("maxFeePerGas")?,
            max_priority_fee_per_gas: map.required_quantity_u128("maxPriorityFeePerGas")?,
            max_fee_per_blob_gas: map.required_quantity_u128("maxFeePerBlobGas")?,
            blob_versioned_hashes: map
                .optional_hash_array("blobVersionedHashes")?
                .ok_or(FormatError::MissingField("blobVersionedHashes"))?,
            access_list: access_list_from(map)?.unwrap_or_default(),
        }),
    };

    Ok(transaction)
}

/// A transaction formatted with an explicit fallback policy: an
/// unrecognized type tag is interpreted as a legacy transaction instead of
/// failing. Opt-in; plain [`L1Transaction`] surfaces the error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithFallbackToLegacy {
    /// The formatted transaction.
    pub transaction: L1Transaction,
    /// The type that was read from the payload, unrecognized tags included.
    pub r#type: Type,
}

impl WithFallbackToLegacy {
    /// Creates an instance from a transaction and its detected type.
    pub fn with_type(transaction: L1Transaction, r#type: Type) -> Self {
        Self {
            transaction,
            r#type,
        }
    }
}

impl TryFrom<FieldMap> for WithFallbackToLegacy {
    type Error = FormatError;

    fn try_from(map: FieldMap) -> Result<Self, Self::Error> {
        let r#type = match transaction_type_tag(&map)?.map(L1TransactionType::try_from) {
            None => Type::Legacy,
            Some(Ok(r#type)) => r#type.into(),
            Some(Err(tag)) => {
                log::warn!("Unsupported transaction type: {tag}. Reverting to legacy transaction");

                Type::Unrecognized(tag)
            }
        };

        let variant = match r#type {
            Type::Legacy | Type::Unrecognized(_) => L1TransactionType::Legacy,
            Type::Eip2930 => L1TransactionType::Eip2930,
            Type::Eip1559 => L1TransactionType::Eip1559,
            Type::Eip4844 => L1TransactionType::Eip4844,
        };

        Ok(Self::with_type(build_variant(variant, &map)?, r#type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_conversion(expected_conversion: L1TransactionType) {
        let value: u8 = expected_conversion.into();
        assert_eq!(L1TransactionType::try_from(value), Ok(expected_conversion));
    }

    #[test]
    fn test_transaction_type_conversion() {
        let possible_values = [
            L1TransactionType::Legacy,
            L1TransactionType::Eip2930,
            L1TransactionType::Eip1559,
            L1TransactionType::Eip4844,
        ];
        for transaction_type in possible_values {
            // using match to ensure we are covering all variants
            match transaction_type {
                L1TransactionType::Legacy => assert_conversion(L1TransactionType::Legacy),
                L1TransactionType::Eip2930 => assert_conversion(L1TransactionType::Eip2930),
                L1TransactionType::Eip1559 => assert_conversion(L1TransactionType::Eip1559),
                L1TransactionType::Eip4844 => assert_conversion(L1TransactionType::Eip4844),
            }
        }
    }

    #[test]
    fn unknown_type_tag_falls_back_to_legacy() -> anyhow::Result<()> {
        let raw: RawEntity = serde_json::from_str(
            r#"{
                "hash": "0x1a2b621655bf9a4e1e21e5f9bed13d8a9dcb62ba3e3ae6d10792d2e2ffa4c6a1",
                "nonce": "0x2",
                "blockHash": null,
                "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
                "to": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                "value": "0x0",
                "gas": "0x5208",
                "gasPrice": "0x3b9aca00",
                "input": "0x",
                "type": "0x7f"
            }"#,
        )?;
        let formatted = format_transaction(&raw)?;

        assert_eq!(
            L1Transaction::try_from(formatted.clone()),
            Err(FormatError::UnknownTransactionType(0x7f))
        );

        let fallback = WithFallbackToLegacy::try_from(formatted)?;
        assert_eq!(fallback.r#type, Type::Unrecognized(0x7f));
        assert!(matches!(fallback.transaction, L1Transaction::Legacy(_)));

        Ok(())
    }

    #[test]
    fn type_tag_wire_form() -> anyhow::Result<()> {
        assert_eq!(L1TransactionType::from_str("0x0")?, L1TransactionType::Legacy);
        assert_eq!(L1TransactionType::from_str("0x2")?, L1TransactionType::Eip1559);
        assert_eq!(
            L1TransactionType::from_str("0x7f"),
            Err(FormatError::UnknownTransactionType(0x7f))
        );
        assert!(L1TransactionType::from_str("2").is_err());

        Ok(())
    }
}
