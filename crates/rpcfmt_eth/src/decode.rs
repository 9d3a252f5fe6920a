//! Raw field decoding on top of the `alloy-primitives` scalar codec.
//!
//! Decoding is driven by a canonical field list: every known field that is
//! present in the raw payload is decoded according to its declared kind,
//! wire `null` passes through as `FieldValue::Null`, missing fields stay
//! absent, and unknown raw fields are ignored for forward compatibility.

use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};
use indexmap::IndexMap;
use rpcfmt_core::{FieldDef, FieldKind, FieldMap, FieldValue, FormatError, RawEntity};
use serde_json::Value;

/// Formats every canonical field present in the raw entity.
pub fn format_canonical(
    fields: &'static [FieldDef],
    raw: &RawEntity,
) -> Result<FieldMap, FormatError> {
    let mut result = FieldMap::new();

    for def in fields {
        match raw.get(def.name) {
            None => {}
            Some(Value::Null) => result.insert(def.name, FieldValue::Null),
            Some(value) => result.insert(def.name, field(*def, value)?),
        }
    }

    Ok(result)
}

/// Decodes one present raw value according to its canonical kind.
pub fn field(def: FieldDef, value: &Value) -> Result<FieldValue, FormatError> {
    match def.kind {
        FieldKind::Quantity => quantity(def.name, value).map(FieldValue::Quantity),
        FieldKind::Hash => {
            from_hex_str(def.name, FieldKind::Hash, value).map(FieldValue::Hash)
        }
        FieldKind::PowNonce => {
            from_hex_str(def.name, FieldKind::PowNonce, value).map(FieldValue::PowNonce)
        }
        FieldKind::Address => {
            from_hex_str(def.name, FieldKind::Address, value).map(FieldValue::Address)
        }
        FieldKind::Bytes => {
            from_hex_str(def.name, FieldKind::Bytes, value).map(FieldValue::Bytes)
        }
        FieldKind::Bloom => {
            from_hex_str(def.name, FieldKind::Bloom, value).map(FieldValue::Bloom)
        }
        FieldKind::Bool => value
            .as_bool()
            .map(FieldValue::Bool)
            .ok_or_else(|| malformed(def.name, FieldKind::Bool, value)),
        FieldKind::String => value
            .as_str()
            .map(|value| FieldValue::String(value.to_string()))
            .ok_or_else(|| malformed(def.name, FieldKind::String, value)),
        FieldKind::Object => value
            .as_object()
            .map(|_object| FieldValue::from_json(value))
            .ok_or_else(|| malformed(def.name, FieldKind::Object, value)),
        FieldKind::HashArray => hash_array(def.name, value),
        FieldKind::AccessList => access_list(def.name, value),
        FieldKind::TransactionList => transaction_list(def.name, value),
    }
}

/// Decodes a hex-encoded quantity. JSON numbers are tolerated, as some
/// providers emit them for small values.
pub fn quantity(field: &'static str, value: &Value) -> Result<U256, FormatError> {
    match value {
        Value::String(encoded) => encoded
            .strip_prefix("0x")
            .and_then(|digits| U256::from_str_radix(digits, 16).ok())
            .ok_or_else(|| malformed(field, FieldKind::Quantity, value)),
        Value::Number(number) => number
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| malformed(field, FieldKind::Quantity, value)),
        _ => Err(malformed(field, FieldKind::Quantity, value)),
    }
}

/// Decodes a fixed-length or arbitrary-length hex value via its `FromStr`
/// implementation.
pub fn from_hex_str<T: FromStr>(
    field: &'static str,
    kind: FieldKind,
    value: &Value,
) -> Result<T, FormatError> {
    value
        .as_str()
        .and_then(|encoded| T::from_str(encoded).ok())
        .ok_or_else(|| malformed(field, kind, value))
}

fn hash_array(field: &'static str, value: &Value) -> Result<FieldValue, FormatError> {
    let elements = value
        .as_array()
        .ok_or_else(|| malformed(field, FieldKind::HashArray, value))?;

    elements
        .iter()
        .map(|element| from_hex_str::<B256>(field, FieldKind::HashArray, element).map(FieldValue::Hash))
        .collect::<Result<Vec<_>, _>>()
        .map(FieldValue::Array)
}

fn access_list(field: &'static str, value: &Value) -> Result<FieldValue, FormatError> {
    let items = value
        .as_array()
        .ok_or_else(|| malformed(field, FieldKind::AccessList, value))?;

    items
        .iter()
        .map(|item| {
            let entry = item
                .as_object()
                .ok_or_else(|| malformed(field, FieldKind::AccessList, item))?;

            let address = entry
                .get("address")
                .map(|value| from_hex_str::<Address>(field, FieldKind::AccessList, value))
                .transpose()?
                .ok_or_else(|| malformed(field, FieldKind::AccessList, item))?;

            let storage_keys = entry
                .get("storageKeys")
                .map(|value| hash_array(field, value))
                .transpose()?
                .unwrap_or_else(|| FieldValue::Array(Vec::new()));

            let mut object = IndexMap::new();
            object.insert("address".to_string(), FieldValue::Address(address));
            object.insert("storageKeys".to_string(), storage_keys);
            Ok(FieldValue::Object(object))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(FieldValue::Array)
}

/// A block's transactions are either hashes or full transaction objects.
/// Objects pass through structurally; they are formatted per chain by a
/// separate transaction formatting call each.
fn transaction_list(field: &'static str, value: &Value) -> Result<FieldValue, FormatError> {
    let elements = value
        .as_array()
        .ok_or_else(|| malformed(field, FieldKind::TransactionList, value))?;

    elements
        .iter()
        .map(|element| match element {
            Value::String(_) => {
                from_hex_str::<B256>(field, FieldKind::TransactionList, element).map(FieldValue::Hash)
            }
            Value::Object(_) => Ok(FieldValue::from_json(element)),
            _ => Err(malformed(field, FieldKind::TransactionList, element)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(FieldValue::Array)
}

pub(crate) fn malformed(field: &'static str, expected: FieldKind, value: &Value) -> FormatError {
    FormatError::MalformedField {
        field,
        expected,
        value: value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_rejects_non_hex() {
        let value = Value::String("12ab".to_string());
        let error = quantity("gasPrice", &value).expect_err("should be malformed");

        assert_eq!(
            error,
            FormatError::MalformedField {
                field: "gasPrice",
                expected: FieldKind::Quantity,
                value,
            }
        );
    }

    #[test]
    fn quantity_accepts_hex_and_numbers() -> anyhow::Result<()> {
        assert_eq!(
            quantity("gas", &Value::String("0x5208".to_string()))?,
            U256::from(21_000_u64)
        );
        assert_eq!(quantity("gas", &serde_json::json!(21_000))?, U256::from(21_000_u64));

        Ok(())
    }

    #[test]
    fn hash_rejects_wrong_length() {
        let value = Value::String("0xabcd".to_string());
        assert!(from_hex_str::<B256>("hash", FieldKind::Hash, &value).is_err());
    }

    #[test]
    fn unknown_raw_fields_are_ignored() -> anyhow::Result<()> {
        const FIELDS: &[FieldDef] = &[FieldDef::new("gas", FieldKind::Quantity)];

        let raw: RawEntity =
            serde_json::from_str(r#"{"gas": "0x1", "someFutureField": "0x2"}"#)?;
        let formatted = format_canonical(FIELDS, &raw)?;

        assert_eq!(formatted.len(), 1);
        assert!(formatted.contains("gas"));

        Ok(())
    }

    #[test]
    fn null_passes_through() -> anyhow::Result<()> {
        const FIELDS: &[FieldDef] = &[FieldDef::new("to", FieldKind::Address)];

        let raw: RawEntity = serde_json::from_str(r#"{"to": null}"#)?;
        let formatted = format_canonical(FIELDS, &raw)?;

        assert_eq!(formatted.get("to"), Some(&FieldValue::Null));

        Ok(())
    }
}
