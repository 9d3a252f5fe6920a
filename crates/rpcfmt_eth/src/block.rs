use alloy_primitives::{Address, Bloom, Bytes, B256, B64, U256};
use rpcfmt_core::{FieldDef, FieldKind, FieldMap, FieldValue, FormatError, RawEntity};

use crate::decode;

/// Canonical fields of the generic block shape, in wire order.
pub const BLOCK_FIELDS: &[FieldDef] = &[
    FieldDef::new("hash", FieldKind::Hash),
    FieldDef::new("parentHash", FieldKind::Hash),
    FieldDef::new("sha3Uncles", FieldKind::Hash),
    FieldDef::new("stateRoot", FieldKind::Hash),
    FieldDef::new("transactionsRoot", FieldKind::Hash),
    FieldDef::new("receiptsRoot", FieldKind::Hash),
    FieldDef::new("number", FieldKind::Quantity),
    FieldDef::new("gasUsed", FieldKind::Quantity),
    FieldDef::new("gasLimit", FieldKind::Quantity),
    FieldDef::new("extraData", FieldKind::Bytes),
    FieldDef::new("logsBloom", FieldKind::Bloom),
    FieldDef::new("timestamp", FieldKind::Quantity),
    FieldDef::new("difficulty", FieldKind::Quantity),
    FieldDef::new("totalDifficulty", FieldKind::Quantity),
    FieldDef::new("uncles", FieldKind::HashArray),
    FieldDef::new("transactions", FieldKind::TransactionList),
    FieldDef::new("size", FieldKind::Quantity),
    FieldDef::new("mixHash", FieldKind::Hash),
    FieldDef::new("nonce", FieldKind::PowNonce),
    FieldDef::new("baseFeePerGas", FieldKind::Quantity),
    FieldDef::new("miner", FieldKind::Address),
    FieldDef::new("blobGasUsed", FieldKind::Quantity),
    FieldDef::new("excessBlobGas", FieldKind::Quantity),
];

/// Base block formatter: decodes every canonical field present in the raw
/// payload. Missing fields stay absent; wire `null` passes through.
pub fn format_block(raw: &RawEntity) -> Result<FieldMap, FormatError> {
    decode::format_canonical(BLOCK_FIELDS, raw)
}

/// Generic domain block returned by `eth_getBlockBy*`.
///
/// `hash`, `number` and `logsBloom` are `None` while the block is pending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Hash of the block. `None` when pending.
    pub hash: Option<B256>,
    /// Hash of the parent block.
    pub parent_hash: B256,
    /// SHA3 of the uncles data in the block.
    pub sha3_uncles: B256,
    /// Root of the final state trie of the block.
    pub state_root: B256,
    /// Root of the transaction trie of the block.
    pub transactions_root: B256,
    /// Root of the receipts trie of the block.
    pub receipts_root: B256,
    /// Block number. `None` when pending.
    pub number: Option<u64>,
    /// Total gas used by all transactions in this block.
    pub gas_used: u64,
    /// Maximum gas allowed in this block.
    pub gas_limit: u64,
    /// The "extra data" field of this block.
    pub extra_data: Bytes,
    /// Bloom filter for the logs of the block. `None` when pending.
    pub logs_bloom: Option<Bloom>,
    /// Unix timestamp for when the block was collated.
    pub timestamp: u64,
    /// Proof-of-work difficulty of this block.
    pub difficulty: U256,
    /// Total difficulty of the chain until this block.
    pub total_difficulty: Option<U256>,
    /// Uncle hashes.
    pub uncles: Vec<B256>,
    /// Hashes of the transactions in this block.
    pub transactions: Vec<B256>,
    /// Length of the RLP encoding of this block in bytes.
    pub size: u64,
    /// Mix hash. `None` when pending.
    pub mix_hash: Option<B256>,
    /// Hash of the generated proof-of-work. `None` when pending.
    pub nonce: Option<B64>,
    /// Base fee per gas.
    pub base_fee_per_gas: Option<u128>,
    /// Address of the beneficiary to whom the mining rewards were given.
    pub miner: Option<Address>,
    /// Total amount of blob gas consumed by the transactions.
    pub blob_gas_used: Option<u64>,
    /// Running total of blob gas consumed in excess of the target.
    pub excess_blob_gas: Option<u64>,
}

impl TryFrom<FieldMap> for Block {
    type Error = FormatError;

    fn try_from(map: FieldMap) -> Result<Self, Self::Error> {
        Ok(Self {
            hash: map.optional_hash("hash")?,
            parent_hash: map.required_hash("parentHash")?,
            sha3_uncles: map.required_hash("sha3Uncles")?,
            state_root: map.required_hash("stateRoot")?,
            transactions_root: map.required_hash("transactionsRoot")?,
            receipts_root: map.required_hash("receiptsRoot")?,
            number: map.optional_quantity_u64("number")?,
            gas_used: map.required_quantity_u64("gasUsed")?,
            gas_limit: map.required_quantity_u64("gasLimit")?,
            extra_data: map.required_bytes("extraData")?,
            logs_bloom: map.optional_bloom("logsBloom")?,
            timestamp: map.required_quantity_u64("timestamp")?,
            difficulty: map.required_quantity("difficulty")?,
            total_difficulty: map.optional_quantity("totalDifficulty")?,
            uncles: map.optional_hash_array("uncles")?.unwrap_or_default(),
            transactions: transaction_hashes(&map)?,
            size: map.required_quantity_u64("size")?,
            mix_hash: map.optional_hash("mixHash")?,
            nonce: map.optional_pow_nonce("nonce")?,
            base_fee_per_gas: map.optional_quantity_u128("baseFeePerGas")?,
            miner: map.optional_address("miner")?,
            blob_gas_used: map.optional_quantity_u64("blobGasUsed")?,
            excess_blob_gas: map.optional_quantity_u64("excessBlobGas")?,
        })
    }
}

/// Extracts the transaction hashes of a formatted block. Full transaction
/// objects contribute their `hash` field.
pub fn transaction_hashes(map: &FieldMap) -> Result<Vec<B256>, FormatError> {
    use std::str::FromStr;

    let Some(value) = map.present("transactions") else {
        return Ok(Vec::new());
    };

    let elements = value.as_array().ok_or_else(|| FormatError::MalformedField {
        field: "transactions",
        expected: FieldKind::TransactionList,
        value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
    })?;

    elements
        .iter()
        .map(|element| {
            if let Some(hash) = element.as_hash() {
                return Ok(*hash);
            }

            element
                .as_object()
                .and_then(|object| object.get("hash"))
                .and_then(|hash| {
                    if let FieldValue::String(encoded) = hash {
                        B256::from_str(encoded).ok()
                    } else {
                        None
                    }
                })
                .ok_or_else(|| FormatError::MalformedField {
                    field: "transactions",
                    expected: FieldKind::TransactionList,
                    value: serde_json::to_value(element).unwrap_or(serde_json::Value::Null),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mined_block_json() -> serde_json::Value {
        serde_json::json!({
            "hash": "0xac5c61edb087a51279674fe01d5c1f65eac3fd8597f9bea215058e745df8088e",
            "parentHash": "0xe99e022112df268087ea7eafaf4790497fd21dbeeb6bd7a1721df161a6657a54",
            "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
            "stateRoot": "0x0ccf7e62d231c8f24d123ebdd1a1fa066d8c608f7e3a1fa669d94369b5f9dcff",
            "transactionsRoot": "0x8e3251c8c162b2b2b1b6e90cbd8e48f76ab633bd88e80cbc8a60a1a7a54ffbc2",
            "receiptsRoot": "0xc32a7cf86b539b7e313e4bc4d775407698b6c603e6d42fd256e59c081883e52d",
            "number": "0xfdfe0f",
            "gasUsed": "0x18d3a1",
            "gasLimit": "0x1312d00",
            "extraData": "0xd983010700846765746889676f312e31372e3133856c696e7578",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "timestamp": "0x63e1fce8",
            "difficulty": "0x0",
            "totalDifficulty": "0x1c83c05",
            "uncles": [],
            "transactions": [
                "0x1a2b621655bf9a4e1e21e5f9bed13d8a9dcb62ba3e3ae6d10792d2e2ffa4c6a1"
            ],
            "size": "0x2b9",
            "mixHash": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "nonce": "0x0000000000000000",
            "baseFeePerGas": "0x12a05f200",
            "miner": "0x2a65aca4d5fc5b5c859090a6c34d164135398226"
        })
    }

    #[test]
    fn mined_block() -> anyhow::Result<()> {
        let serde_json::Value::Object(raw) = mined_block_json() else {
            unreachable!("json! literal is an object");
        };

        let block = Block::try_from(format_block(&raw)?)?;

        assert!(block.hash.is_some());
        assert_eq!(block.number, Some(0xfd_fe0f));
        assert_eq!(block.gas_limit, 0x1312_d00);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.base_fee_per_gas, Some(0x1_2a05_f200));

        Ok(())
    }

    #[test]
    fn pending_block_has_null_state_fields() -> anyhow::Result<()> {
        let mut json = mined_block_json();
        json["hash"] = serde_json::Value::Null;
        json["number"] = serde_json::Value::Null;
        json["logsBloom"] = serde_json::Value::Null;
        json["nonce"] = serde_json::Value::Null;

        let serde_json::Value::Object(raw) = json else {
            unreachable!("json! literal is an object");
        };

        let block = Block::try_from(format_block(&raw)?)?;

        assert_eq!(block.hash, None);
        assert_eq!(block.number, None);
        assert_eq!(block.logs_bloom, None);
        assert_eq!(block.nonce, None);

        Ok(())
    }

    #[test]
    fn malformed_field_is_surfaced() -> anyhow::Result<()> {
        let mut json = mined_block_json();
        json["gasUsed"] = serde_json::Value::String("not-hex".to_string());

        let serde_json::Value::Object(raw) = json else {
            unreachable!("json! literal is an object");
        };

        let error = format_block(&raw).expect_err("decoding should fail");
        assert!(matches!(
            error,
            FormatError::MalformedField {
                field: "gasUsed",
                ..
            }
        ));

        Ok(())
    }
}
