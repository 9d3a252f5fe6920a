use alloy_primitives::{Address, Bloom, Bytes, B256, B64, U256};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::FormatError;

/// The value class of a formatted field, as declared by a canonical field
/// registry or by a chain override's `provides` list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// A hex-encoded quantity, e.g. `0x1b4`.
    Quantity,
    /// A 32-byte hash.
    Hash,
    /// An 8-byte proof-of-work nonce.
    PowNonce,
    /// A 20-byte address.
    Address,
    /// Arbitrary-length hex-encoded data.
    Bytes,
    /// A 256-byte logs bloom filter.
    Bloom,
    /// A boolean.
    Bool,
    /// An unstructured string.
    String,
    /// A nested object.
    Object,
    /// An array of 32-byte hashes.
    HashArray,
    /// An EIP-2930 access list.
    AccessList,
    /// A block's transactions: either hashes or full transaction objects.
    TransactionList,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::Quantity => "quantity",
            FieldKind::Hash => "hash",
            FieldKind::PowNonce => "pow nonce",
            FieldKind::Address => "address",
            FieldKind::Bytes => "bytes",
            FieldKind::Bloom => "bloom",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Object => "object",
            FieldKind::HashArray => "hash array",
            FieldKind::AccessList => "access list",
            FieldKind::TransactionList => "transaction list",
        };
        f.write_str(name)
    }
}

/// One entry of a canonical field registry: the wire name of a field and the
/// value class it must decode to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDef {
    /// Wire (camelCase) name of the field.
    pub name: &'static str,
    /// Value class of the field.
    pub kind: FieldKind,
}

impl FieldDef {
    /// Creates a new field definition.
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// A single formatted field value.
///
/// `Null` is the wire `null`: the field exists but is semantically absent
/// (e.g. the hash of a pending block). A field that is merely missing is not
/// represented here at all; it is absent from the enclosing [`FieldMap`].
///
/// Serialization produces the exact wire encoding, so the outbound request
/// direction reuses this type unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Hex-encoded quantity.
    Quantity(U256),
    /// 32-byte hash.
    Hash(B256),
    /// 8-byte proof-of-work nonce.
    PowNonce(B64),
    /// 20-byte address.
    Address(Address),
    /// Arbitrary-length data.
    Bytes(Bytes),
    /// Logs bloom filter.
    Bloom(Bloom),
    /// Boolean.
    Bool(bool),
    /// Unstructured string.
    String(String),
    /// Array of nested values.
    Array(Vec<FieldValue>),
    /// Nested object.
    Object(IndexMap<String, FieldValue>),
    /// Wire `null`.
    Null,
}

impl FieldValue {
    /// Converts a raw JSON value without decoding scalars, preserving its
    /// structure. Used for passthrough of values whose shape the caller does
    /// not interpret, such as full transaction objects inside a block.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(value) => FieldValue::Bool(*value),
            serde_json::Value::Number(value) => value
                .as_u64()
                .map_or_else(|| FieldValue::String(value.to_string()), |value| {
                    FieldValue::Quantity(U256::from(value))
                }),
            serde_json::Value::String(value) => FieldValue::String(value.clone()),
            serde_json::Value::Array(values) => {
                FieldValue::Array(values.iter().map(FieldValue::from_json).collect())
            }
            serde_json::Value::Object(values) => FieldValue::Object(
                values
                    .iter()
                    .map(|(name, value)| (name.clone(), FieldValue::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Returns the quantity value, if this is a quantity.
    pub fn as_quantity(&self) -> Option<&U256> {
        if let FieldValue::Quantity(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Returns the hash value, if this is a hash.
    pub fn as_hash(&self) -> Option<&B256> {
        if let FieldValue::Hash(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Returns the proof-of-work nonce, if this is one.
    pub fn as_pow_nonce(&self) -> Option<&B64> {
        if let FieldValue::PowNonce(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Returns the address value, if this is an address.
    pub fn as_address(&self) -> Option<&Address> {
        if let FieldValue::Address(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Returns the data value, if this is data.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        if let FieldValue::Bytes(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Returns the bloom filter, if this is one.
    pub fn as_bloom(&self) -> Option<&Bloom> {
        if let FieldValue::Bloom(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Returns the boolean value, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let FieldValue::Bool(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Returns the nested values, if this is an array.
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        if let FieldValue::Array(values) = self {
            Some(values)
        } else {
            None
        }
    }

    /// Returns the nested object, if this is an object.
    pub fn as_object(&self) -> Option<&IndexMap<String, FieldValue>> {
        if let FieldValue::Object(values) = self {
            Some(values)
        } else {
            None
        }
    }

    /// Whether this is the wire `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// An insertion-ordered map from field name to formatted value: the runtime
/// carrier of a partially or fully formatted entity.
///
/// Serializing a `FieldMap` yields the exact wire JSON, which is what the
/// outbound transaction request direction sends to the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldMap(IndexMap<&'static str, FieldValue>);

impl FieldMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Inserts a field, replacing any previous value under the same name.
    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.0.insert(name, value);
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.shift_remove(name)
    }

    /// Returns the value of a field, `Null` included.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Whether the map contains a field under this name, `Null` included.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of fields in the map.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map holds no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (*name, value))
    }

    /// Merges `other` into `self`. Every field of `other` replaces a
    /// same-named field of `self`; all other fields pass through unchanged.
    pub fn merge_from(&mut self, other: FieldMap) {
        self.0.extend(other.0);
    }

    /// Returns the value of a field, treating wire `null` as absent.
    pub fn present(&self, name: &str) -> Option<&FieldValue> {
        self.get(name).filter(|value| !value.is_null())
    }

    /// Returns an optional hash field. Absent and `null` are both `None`.
    pub fn optional_hash(&self, name: &'static str) -> Result<Option<B256>, FormatError> {
        self.present(name)
            .map(|value| {
                value
                    .as_hash()
                    .copied()
                    .ok_or_else(|| wrong_kind(name, FieldKind::Hash, value))
            })
            .transpose()
    }

    /// Returns a required hash field.
    pub fn required_hash(&self, name: &'static str) -> Result<B256, FormatError> {
        self.optional_hash(name)?
            .ok_or(FormatError::MissingField(name))
    }

    /// Returns an optional proof-of-work nonce field.
    pub fn optional_pow_nonce(&self, name: &'static str) -> Result<Option<B64>, FormatError> {
        self.present(name)
            .map(|value| {
                value
                    .as_pow_nonce()
                    .copied()
                    .ok_or_else(|| wrong_kind(name, FieldKind::PowNonce, value))
            })
            .transpose()
    }

    /// Returns an optional address field.
    pub fn optional_address(&self, name: &'static str) -> Result<Option<Address>, FormatError> {
        self.present(name)
            .map(|value| {
                value
                    .as_address()
                    .copied()
                    .ok_or_else(|| wrong_kind(name, FieldKind::Address, value))
            })
            .transpose()
    }

    /// Returns a required address field.
    pub fn required_address(&self, name: &'static str) -> Result<Address, FormatError> {
        self.optional_address(name)?
            .ok_or(FormatError::MissingField(name))
    }

    /// Returns an optional quantity field as a `U256`.
    pub fn optional_quantity(&self, name: &'static str) -> Result<Option<U256>, FormatError> {
        self.present(name)
            .map(|value| {
                value
                    .as_quantity()
                    .copied()
                    .ok_or_else(|| wrong_kind(name, FieldKind::Quantity, value))
            })
            .transpose()
    }

    /// Returns a required quantity field as a `U256`.
    pub fn required_quantity(&self, name: &'static str) -> Result<U256, FormatError> {
        self.optional_quantity(name)?
            .ok_or(FormatError::MissingField(name))
    }

    /// Returns an optional quantity field narrowed to `u64`.
    pub fn optional_quantity_u64(&self, name: &'static str) -> Result<Option<u64>, FormatError> {
        self.optional_quantity(name)?
            .map(|value| {
                u64::try_from(value).map_err(|_error| {
                    wrong_kind(name, FieldKind::Quantity, &FieldValue::Quantity(value))
                })
            })
            .transpose()
    }

    /// Returns a required quantity field narrowed to `u64`.
    pub fn required_quantity_u64(&self, name: &'static str) -> Result<u64, FormatError> {
        self.optional_quantity_u64(name)?
            .ok_or(FormatError::MissingField(name))
    }

    /// Returns an optional quantity field narrowed to `u128`.
    pub fn optional_quantity_u128(&self, name: &'static str) -> Result<Option<u128>, FormatError> {
        self.optional_quantity(name)?
            .map(|value| {
                u128::try_from(value).map_err(|_error| {
                    wrong_kind(name, FieldKind::Quantity, &FieldValue::Quantity(value))
                })
            })
            .transpose()
    }

    /// Returns a required quantity field narrowed to `u128`.
    pub fn required_quantity_u128(&self, name: &'static str) -> Result<u128, FormatError> {
        self.optional_quantity_u128(name)?
            .ok_or(FormatError::MissingField(name))
    }

    /// Returns an optional data field.
    pub fn optional_bytes(&self, name: &'static str) -> Result<Option<Bytes>, FormatError> {
        self.present(name)
            .map(|value| {
                value
                    .as_bytes()
                    .cloned()
                    .ok_or_else(|| wrong_kind(name, FieldKind::Bytes, value))
            })
            .transpose()
    }

    /// Returns a required data field.
    pub fn required_bytes(&self, name: &'static str) -> Result<Bytes, FormatError> {
        self.optional_bytes(name)?
            .ok_or(FormatError::MissingField(name))
    }

    /// Returns an optional bloom filter field.
    pub fn optional_bloom(&self, name: &'static str) -> Result<Option<Bloom>, FormatError> {
        self.present(name)
            .map(|value| {
                value
                    .as_bloom()
                    .copied()
                    .ok_or_else(|| wrong_kind(name, FieldKind::Bloom, value))
            })
            .transpose()
    }

    /// Returns an optional array of hashes. Absent and `null` are both
    /// `None`.
    pub fn optional_hash_array(&self, name: &'static str) -> Result<Option<Vec<B256>>, FormatError> {
        self.present(name)
            .map(|value| {
                value
                    .as_array()
                    .ok_or_else(|| wrong_kind(name, FieldKind::HashArray, value))?
                    .iter()
                    .map(|element| {
                        element
                            .as_hash()
                            .copied()
                            .ok_or_else(|| wrong_kind(name, FieldKind::HashArray, element))
                    })
                    .collect()
            })
            .transpose()
    }

    /// Returns an optional nested object field.
    pub fn optional_object(
        &self,
        name: &'static str,
    ) -> Result<Option<&IndexMap<String, FieldValue>>, FormatError> {
        self.present(name)
            .map(|value| {
                value
                    .as_object()
                    .ok_or_else(|| wrong_kind(name, FieldKind::Object, value))
            })
            .transpose()
    }
}

impl FromIterator<(&'static str, FieldValue)> for FieldMap {
    fn from_iter<IterT: IntoIterator<Item = (&'static str, FieldValue)>>(iter: IterT) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn wrong_kind(field: &'static str, expected: FieldKind, value: &FieldValue) -> FormatError {
    FormatError::MalformedField {
        field,
        expected,
        value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn null_is_absent_for_accessors() -> anyhow::Result<()> {
        let mut map = FieldMap::new();
        map.insert("blockHash", FieldValue::Null);

        assert!(map.contains("blockHash"));
        assert!(map.present("blockHash").is_none());
        assert_eq!(map.optional_hash("blockHash")?, None);
        assert_eq!(
            map.required_hash("blockHash"),
            Err(FormatError::MissingField("blockHash"))
        );

        Ok(())
    }

    #[test]
    fn wire_serialization() -> anyhow::Result<()> {
        let mut map = FieldMap::new();
        map.insert("gas", FieldValue::Quantity(U256::from(0x5208_u64)));
        map.insert(
            "to",
            FieldValue::Address(Address::from_str(
                "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            )?),
        );
        map.insert("blockHash", FieldValue::Null);

        assert_eq!(
            serde_json::to_value(&map)?,
            serde_json::json!({
                "gas": "0x5208",
                "to": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                "blockHash": null,
            })
        );

        Ok(())
    }

    #[test]
    fn merge_replaces_and_appends() {
        let mut base: FieldMap = [
            ("gasPrice", FieldValue::Quantity(U256::from(1_u64))),
            ("nonce", FieldValue::Quantity(U256::from(7_u64))),
        ]
        .into_iter()
        .collect();

        let overrides: FieldMap = [
            ("gasPrice", FieldValue::Quantity(U256::from(2_u64))),
            ("feeCurrency", FieldValue::Null),
        ]
        .into_iter()
        .collect();

        base.merge_from(overrides);

        assert_eq!(
            base.get("gasPrice"),
            Some(&FieldValue::Quantity(U256::from(2_u64)))
        );
        assert_eq!(
            base.get("nonce"),
            Some(&FieldValue::Quantity(U256::from(7_u64)))
        );
        assert_eq!(base.get("feeCurrency"), Some(&FieldValue::Null));
    }
}
