use alloy_primitives::{Address, Bloom, Bytes, B256, U256};
use indexmap::IndexMap;
use rpcfmt_core::{
    FieldDef, FieldKind, FieldMap, FieldValue, FormatError, FormatterDescriptor, RawEntity,
};
use rpcfmt_eth::decode;

/// Proof-of-work fields the generic block shape carries but Celo blocks do
/// not. Dropped from the formatted output even when a node echoes them.
pub const EXCLUDED_BLOCK_FIELDS: &[&str] =
    &["difficulty", "gasLimit", "mixHash", "nonce", "uncles"];

const PROVIDED_BLOCK_FIELDS: &[FieldDef] = &[FieldDef::new("randomness", FieldKind::Object)];

/// The Celo block descriptor: drops the proof-of-work fields and injects the
/// randomness beacon commitment.
pub const BLOCK_DESCRIPTOR: FormatterDescriptor = FormatterDescriptor {
    exclude: EXCLUDED_BLOCK_FIELDS,
    provides: PROVIDED_BLOCK_FIELDS,
    format: format_block_fields,
};

fn format_block_fields(raw: &RawEntity) -> Result<FieldMap, FormatError> {
    let mut result = FieldMap::new();

    match raw.get("randomness") {
        None => {}
        Some(serde_json::Value::Null) => result.insert("randomness", FieldValue::Null),
        Some(value) => result.insert("randomness", decode_randomness(value)?),
    }

    Ok(result)
}

fn decode_randomness(value: &serde_json::Value) -> Result<FieldValue, FormatError> {
    let malformed = || FormatError::MalformedField {
        field: "randomness",
        expected: FieldKind::Object,
        value: value.clone(),
    };

    let object = value.as_object().ok_or_else(malformed)?;

    let hash = |name: &str| {
        let entry = object.get(name).ok_or_else(malformed)?;
        decode::from_hex_str::<B256>("randomness", FieldKind::Hash, entry)
    };

    let mut fields = IndexMap::new();
    fields.insert("committed".to_string(), FieldValue::Hash(hash("committed")?));
    fields.insert("revealed".to_string(), FieldValue::Hash(hash("revealed")?));

    Ok(FieldValue::Object(fields))
}

/// The randomness beacon commitment carried by every Celo block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Randomness {
    /// Commitment to the random value revealed in a later block.
    pub committed: B256,
    /// Random value revealed for an earlier commitment.
    pub revealed: B256,
}

impl Randomness {
    fn from_fields(map: &FieldMap) -> Result<Self, FormatError> {
        let object = map
            .optional_object("randomness")?
            .ok_or(FormatError::MissingField("randomness"))?;

        let hash = |name: &'static str| {
            let value = object.get(name).ok_or(FormatError::MissingField(name))?;
            value
                .as_hash()
                .copied()
                .ok_or_else(|| FormatError::MalformedField {
                    field: name,
                    expected: FieldKind::Hash,
                    value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                })
        };

        Ok(Self {
            committed: hash("committed")?,
            revealed: hash("revealed")?,
        })
    }
}

/// Celo domain block: no proof-of-work fields, randomness always present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CeloBlock {
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
    /// The "extra data" field of this block.
    pub extra_data: Bytes,
    /// Bloom filter for the logs of the block. `None` when pending.
    pub logs_bloom: Option<Bloom>,
    /// Unix timestamp for when the block was collated.
    pub timestamp: u64,
    /// Total difficulty of the chain until this block.
    pub total_difficulty: Option<U256>,
    /// Hashes of the transactions in this block.
    pub transactions: Vec<B256>,
    /// Length of the RLP encoding of this block in bytes.
    pub size: u64,
    /// Base fee per gas.
    pub base_fee_per_gas: Option<u128>,
    /// Address of the beneficiary to whom the block rewards were given.
    pub miner: Option<Address>,
    /// Total amount of blob gas consumed by the transactions.
    pub blob_gas_used: Option<u64>,
    /// Running total of blob gas consumed in excess of the target.
    pub excess_blob_gas: Option<u64>,
    /// Randomness beacon commitment.
    pub randomness: Randomness,
}

impl TryFrom<FieldMap> for CeloBlock {
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
            extra_data: map.required_bytes("extraData")?,
            logs_bloom: map.optional_bloom("logsBloom")?,
            timestamp: map.required_quantity_u64("timestamp")?,
            total_difficulty: map.optional_quantity("totalDifficulty")?,
            transactions: rpcfmt_eth::block::transaction_hashes(&map)?,
            size: map.required_quantity_u64("size")?,
            base_fee_per_gas: map.optional_quantity_u128("baseFeePerGas")?,
            miner: map.optional_address("miner")?,
            blob_gas_used: map.optional_quantity_u64("blobGasUsed")?,
            excess_blob_gas: map.optional_quantity_u64("excessBlobGas")?,
            randomness: Randomness::from_fields(&map)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn celo_block_json() -> serde_json::Value {
        serde_json::json!({
            "hash": "0xac5c61edb087a51279674fe01d5c1f65eac3fd8597f9bea215058e745df8088e",
            "parentHash": "0xe99e022112df268087ea7eafaf4790497fd21dbeeb6bd7a1721df161a6657a54",
            "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
            "stateRoot": "0x0ccf7e62d231c8f24d123ebdd1a1fa066d8c608f7e3a1fa669d94369b5f9dcff",
            "transactionsRoot": "0x8e3251c8c162b2b2b1b6e90cbd8e48f76ab633bd88e80cbc8a60a1a7a54ffbc2",
            "receiptsRoot": "0xc32a7cf86b539b7e313e4bc4d775407698b6c603e6d42fd256e59c081883e52d",
            "number": "0xfdfe0f",
            "gasUsed": "0x18d3a1",
            "extraData": "0xd983010700846765746889676f312e31372e3133856c696e7578",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "timestamp": "0x63e1fce8",
            "totalDifficulty": "0x1c83c05",
            "transactions": [
                "0x1a2b621655bf9a4e1e21e5f9bed13d8a9dcb62ba3e3ae6d10792d2e2ffa4c6a1"
            ],
            "size": "0x2b9",
            "baseFeePerGas": "0x12a05f200",
            "miner": "0x2a65aca4d5fc5b5c859090a6c34d164135398226",
            "randomness": {
                "committed": "0x339f1fe67961d335d025eb2d2b20cd935ce78cbe70025eff7ca86d13d5c23fcb",
                "revealed": "0xe10b5f01b0376fdc9151f66992f8c1b990083acabc14ec1b04f6a53ad1db0f34"
            }
        })
    }

    #[test]
    fn randomness_is_decoded() -> anyhow::Result<()> {
        let serde_json::Value::Object(raw) = celo_block_json() else {
            unreachable!("json! literal is an object");
        };

        let fields = format_block_fields(&raw)?;
        let randomness = fields
            .get("randomness")
            .and_then(FieldValue::as_object)
            .expect("randomness should be an object");

        assert_eq!(
            randomness.get("committed").and_then(FieldValue::as_hash),
            Some(&B256::from_str(
                "0x339f1fe67961d335d025eb2d2b20cd935ce78cbe70025eff7ca86d13d5c23fcb"
            )?)
        );

        Ok(())
    }

    #[test]
    fn missing_randomness_commitment_is_malformed() {
        let raw: RawEntity = serde_json::Map::from_iter([(
            "randomness".to_string(),
            serde_json::json!({"committed": "0x01"}),
        )]);

        assert!(format_block_fields(&raw).is_err());
    }
}
