use std::str::FromStr;

use alloy_primitives::Address;
use rpcfmt_core::{
    FieldDef, FieldKind, FieldMap, FormatError, FormatterDescriptor, RawEntity,
};
use rpcfmt_eth::{
    decode,
    transaction::{
        build_variant, parse_type_tag, transaction_type_tag, AccessListItem, Eip1559, Eip2930,
        Eip4844, L1Transaction, L1TransactionType, Legacy, TransactionBase,
    },
};

/// Fee abstraction fields Celo transactions carry on top of the generic
/// shape.
pub const PROVIDED_TRANSACTION_FIELDS: &[FieldDef] = &[
    FieldDef::new("feeCurrency", FieldKind::Address),
    FieldDef::new("gatewayFee", FieldKind::Quantity),
    FieldDef::new("gatewayFeeRecipient", FieldKind::Address),
];

/// The Celo transaction descriptor: injects the fee abstraction fields. A
/// missing field stays absent; a wire `null` passes through as `null`.
pub const TRANSACTION_DESCRIPTOR: FormatterDescriptor = FormatterDescriptor {
    exclude: &[],
    provides: PROVIDED_TRANSACTION_FIELDS,
    format: format_transaction_fields,
};

fn format_transaction_fields(raw: &RawEntity) -> Result<FieldMap, FormatError> {
    decode::format_canonical(PROVIDED_TRANSACTION_FIELDS, raw)
}

/// The EIP-2718 type tags of the Celo transaction variants: the generic L1
/// tags plus the CIP-64 and CIP-42 fee abstraction variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CeloTransactionType {
    /// Pre-EIP-2718 legacy transaction.
    Legacy = 0,
    /// EIP-2930 access list transaction.
    Eip2930 = 1,
    /// EIP-1559 fee market transaction.
    Eip1559 = 2,
    /// EIP-4844 blob-carrying transaction.
    Eip4844 = 3,
    /// CIP-64 fee currency transaction.
    Cip64 = 0x7b,
    /// CIP-42 gateway fee transaction (deprecated on-chain, still returned
    /// for historical blocks).
    Cip42 = 0x7c,
}

impl From<CeloTransactionType> for u8 {
    fn from(value: CeloTransactionType) -> u8 {
        value as u8
    }
}

impl TryFrom<u8> for CeloTransactionType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Legacy),
            1 => Ok(Self::Eip2930),
            2 => Ok(Self::Eip1559),
            3 => Ok(Self::Eip4844),
            0x7b => Ok(Self::Cip64),
            0x7c => Ok(Self::Cip42),
            value => Err(value),
        }
    }
}

impl FromStr for CeloTransactionType {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_type_tag(s)
            .and_then(|tag| Self::try_from(tag).map_err(FormatError::UnknownTransactionType))
    }
}

/// CIP-42 gateway fee transaction: an EIP-1559 transaction extended with an
/// optional fee currency and a gateway fee paid to a full node operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cip42 {
    /// Fields shared by every variant.
    pub base: TransactionBase,
    /// Chain id.
    pub chain_id: u64,
    /// Maximum total fee per gas.
    pub max_fee_per_gas: u128,
    /// Maximum priority fee per gas.
    pub max_priority_fee_per_gas: u128,
    /// ERC-20 token the fees are paid in. `None` means the native token.
    pub fee_currency: Option<Address>,
    /// Fee paid to the gateway full node. `None` when no gateway is used.
    pub gateway_fee: Option<u128>,
    /// Recipient of the gateway fee.
    pub gateway_fee_recipient: Option<Address>,
    /// Pre-warmed addresses and storage keys.
    pub access_list: Vec<AccessListItem>,
}

/// CIP-64 fee currency transaction: an EIP-1559 transaction whose fees are
/// paid in an ERC-20 token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cip64 {
    /// Fields shared by every variant.
    pub base: TransactionBase,
    /// Chain id.
    pub chain_id: u64,
    /// Maximum total fee per gas.
    pub max_fee_per_gas: u128,
    /// Maximum priority fee per gas.
    pub max_priority_fee_per_gas: u128,
    /// ERC-20 token the fees are paid in.
    pub fee_currency: Address,
    /// Pre-warmed addresses and storage keys.
    pub access_list: Vec<AccessListItem>,
}

/// A formatted Celo transaction: the generic L1 variants plus the fee
/// abstraction variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CeloTransaction {
    /// Legacy transaction.
    Legacy(Legacy),
    /// EIP-2930 access list transaction.
    Eip2930(Eip2930),
    /// EIP-1559 fee market transaction.
    Eip1559(Eip1559),
    /// EIP-4844 blob-carrying transaction.
    Eip4844(Eip4844),
    /// CIP-64 fee currency transaction.
    Cip64(Cip64),
    /// CIP-42 gateway fee transaction.
    Cip42(Cip42),
}

impl CeloTransaction {
    /// The variant's type tag.
    pub fn transaction_type(&self) -> CeloTransactionType {
        match self {
            CeloTransaction::Legacy(_) => CeloTransactionType::Legacy,
            CeloTransaction::Eip2930(_) => CeloTransactionType::Eip2930,
            CeloTransaction::Eip1559(_) => CeloTransactionType::Eip1559,
            CeloTransaction::Eip4844(_) => CeloTransactionType::Eip4844,
            CeloTransaction::Cip64(_) => CeloTransactionType::Cip64,
            CeloTransaction::Cip42(_) => CeloTransactionType::Cip42,
        }
    }

    /// The fields shared by every variant.
    pub fn base(&self) -> &TransactionBase {
        match self {
            CeloTransaction::Legacy(transaction) => &transaction.base,
            CeloTransaction::Eip2930(transaction) => &transaction.base,
            CeloTransaction::Eip1559(transaction) => &transaction.base,
            CeloTransaction::Eip4844(transaction) => &transaction.base,
            CeloTransaction::Cip64(transaction) => &transaction.base,
            CeloTransaction::Cip42(transaction) => &transaction.base,
        }
    }

    /// The fee currency, for the variants that have one.
    pub fn fee_currency(&self) -> Option<Address> {
        match self {
            CeloTransaction::Legacy(_)
            | CeloTransaction::Eip2930(_)
            | CeloTransaction::Eip1559(_)
            | CeloTransaction::Eip4844(_) => None,
            CeloTransaction::Cip64(transaction) => Some(transaction.fee_currency),
            CeloTransaction::Cip42(transaction) => transaction.fee_currency,
        }
    }
}

impl From<L1Transaction> for CeloTransaction {
    fn from(value: L1Transaction) -> Self {
        match value {
            L1Transaction::Legacy(transaction) => CeloTransaction::Legacy(transaction),
            L1Transaction::Eip2930(transaction) => CeloTransaction::Eip2930(transaction),
            L1Transaction::Eip1559(transaction) => CeloTransaction::Eip1559(transaction),
            L1Transaction::Eip4844(transaction) => CeloTransaction::Eip4844(transaction),
        }
    }
}

impl TryFrom<FieldMap> for CeloTransaction {
    type Error = FormatError;

    fn try_from(map: FieldMap) -> Result<Self, Self::Error> {
        let r#type = match transaction_type_tag(&map)? {
            None => CeloTransactionType::Legacy,
            Some(tag) => CeloTransactionType::try_from(tag)
                .map_err(FormatError::UnknownTransactionType)?,
        };

        build_celo_variant(r#type, &map)
    }
}

/// Builds the typed variant a recognized Celo tag selects.
pub fn build_celo_variant(
    r#type: CeloTransactionType,
    map: &FieldMap,
) -> Result<CeloTransaction, FormatError> {
    use rpcfmt_eth::transaction::access_list_from;

    let transaction = match r#type {
        CeloTransactionType::Legacy => {
            build_variant(L1TransactionType::Legacy, map)?.into()
        }
        CeloTransactionType::Eip2930 => {
            build_variant(L1TransactionType::Eip2930, map)?.into()
        }
        CeloTransactionType::Eip1559 => {
            build_variant(L1TransactionType::Eip1559, map)?.into()
        }
        CeloTransactionType::Eip4844 => {
            build_variant(L1TransactionType::Eip4844, map)?.into()
        }
        CeloTransactionType::Cip64 => CeloTransaction::Cip64(Cip64 {
            base: TransactionBase::from_fields(map)?,
            chain_id: map.required_quantity_u64("chainId")?,
            max_fee_per_gas: map.required_quantity_u128("maxFeePerGas")?,
            max_priority_fee_per_gas: map.required_quantity_u128("maxPriorityFeePerGas")?,
            fee_currency: map.required_address("feeCurrency")?,
            access_list: access_list_from(map)?.unwrap_or_default(),
        }),
        CeloTransactionType::Cip42 => CeloTransaction::Cip42(Cip42 {
            base: TransactionBase::from_fields(map)?,
            chain_id: map.required_quantity_u64("chainId")?,
            max_fee_per_gas: map.required_quantity_u128("maxFeePerGas")?,
            max_priority_fee_per_gas: map.required_quantity_u128("maxPriorityFeePerGas")?,
            fee_currency: map.optional_address("feeCurrency")?,
            gateway_fee: map.optional_quantity_u128("gatewayFee")?,
            gateway_fee_recipient: map.optional_address("gatewayFeeRecipient")?,
            access_list: access_list_from(map)?.unwrap_or_default(),
        }),
    };

    Ok(transaction)
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
    /// CIP-64 fee currency transaction.
    Cip64,
    /// CIP-42 gateway fee transaction.
    Cip42,
    /// Unrecognized tag, interpreted as a legacy transaction.
    Unrecognized(u8),
}

impl From<CeloTransactionType> for Type {
    fn from(value: CeloTransactionType) -> Self {
        match value {
            CeloTransactionType::Legacy => Type::Legacy,
            CeloTransactionType::Eip2930 => Type::Eip2930,
            CeloTransactionType::Eip1559 => Type::Eip1559,
            CeloTransactionType::Eip4844 => Type::Eip4844,
            CeloTransactionType::Cip64 => Type::Cip64,
            CeloTransactionType::Cip42 => Type::Cip42,
        }
    }
}

/// A Celo transaction formatted with an explicit fallback policy: an
/// unrecognized type tag is interpreted as a legacy transaction instead of
/// failing. Opt-in; plain [`CeloTransaction`] surfaces the error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithFallbackToLegacy {
    /// The formatted transaction.
    pub transaction: CeloTransaction,
    /// The type that was read from the payload, unrecognized tags included.
    pub r#type: Type,
}

impl TryFrom<FieldMap> for WithFallbackToLegacy {
    type Error = FormatError;

    fn try_from(map: FieldMap) -> Result<Self, Self::Error> {
        let r#type = match transaction_type_tag(&map)?.map(CeloTransactionType::try_from) {
            None => Type::Legacy,
            Some(Ok(r#type)) => r#type.into(),
            Some(Err(tag)) => {
                log::warn!("Unsupported transaction type: {tag}. Reverting to legacy transaction");

                Type::Unrecognized(tag)
            }
        };

        let variant = match r#type {
            Type::Legacy | Type::Unrecognized(_) => CeloTransactionType::Legacy,
            Type::Eip2930 => CeloTransactionType::Eip2930,
            Type::Eip1559 => CeloTransactionType::Eip1559,
            Type::Eip4844 => CeloTransactionType::Eip4844,
            Type::Cip64 => CeloTransactionType::Cip64,
            Type::Cip42 => CeloTransactionType::Cip42,
        };

        Ok(Self {
            transaction: build_celo_variant(variant, &map)?,
            r#type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_conversion(expected_conversion: CeloTransactionType) {
        let value: u8 = expected_conversion.into();
        assert_eq!(
            CeloTransactionType::try_from(value),
            Ok(expected_conversion)
        );
    }

    #[test]
    fn test_transaction_type_conversion() {
        let possible_values = [
            CeloTransactionType::Legacy,
            CeloTransactionType::Eip2930,
            CeloTransactionType::Eip1559,
            CeloTransactionType::Eip4844,
            CeloTransactionType::Cip64,
            CeloTransactionType::Cip42,
        ];
        for transaction_type in possible_values {
            // using match to ensure we are covering all variants
            match transaction_type {
                CeloTransactionType::Legacy => assert_conversion(CeloTransactionType::Legacy),
                CeloTransactionType::Eip2930 => assert_conversion(CeloTransactionType::Eip2930),
                CeloTransactionType::Eip1559 => assert_conversion(CeloTransactionType::Eip1559),
                CeloTransactionType::Eip4844 => assert_conversion(CeloTransactionType::Eip4844),
                CeloTransactionType::Cip64 => assert_conversion(CeloTransactionType::Cip64),
                CeloTransactionType::Cip42 => assert_conversion(CeloTransactionType::Cip42),
            }
        }
    }

    #[test]
    fn absent_fee_fields_stay_absent() -> anyhow::Result<()> {
        let raw: RawEntity = serde_json::from_str(
            r#"{"gatewayFee": null, "gasPrice": "0x3b9aca00"}"#,
        )?;
        let fields = format_transaction_fields(&raw)?;

        assert!(!fields.contains("feeCurrency"));
        assert!(!fields.contains("gatewayFeeRecipient"));
        assert_eq!(
            fields.get("gatewayFee"),
            Some(&rpcfmt_core::FieldValue::Null)
        );

        Ok(())
    }

    #[test]
    fn type_tag_wire_form() -> anyhow::Result<()> {
        assert_eq!(
            CeloTransactionType::from_str("0x7b")?,
            CeloTransactionType::Cip64
        );
        assert_eq!(
            CeloTransactionType::from_str("0x7c")?,
            CeloTransactionType::Cip42
        );
        assert_eq!(
            CeloTransactionType::from_str("0x7f"),
            Err(FormatError::UnknownTransactionType(0x7f))
        );

        Ok(())
    }
}
