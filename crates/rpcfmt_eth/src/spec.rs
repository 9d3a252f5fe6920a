use rpcfmt_core::{
    registry::ChainFormatters, spec::ChainFormatterSpec, BaseFormatters, EntityFormatter,
    RegistrationError,
};

use crate::{block, request, transaction};

/// The generic L1 base formatter set: one entity formatter per kind, each
/// pairing a canonical field registry with its formatting function.
pub fn base_formatters() -> BaseFormatters {
    BaseFormatters {
        block: EntityFormatter {
            fields: block::BLOCK_FIELDS,
            format: block::format_block,
        },
        transaction: EntityFormatter {
            fields: transaction::TRANSACTION_FIELDS,
            format: transaction::format_transaction,
        },
        transaction_request: EntityFormatter {
            fields: request::TRANSACTION_REQUEST_FIELDS,
            format: request::format_transaction_request,
        },
    }
}

/// The generic L1 chain: base formatters with identity overrides.
#[derive(Clone, Copy, Debug)]
pub struct L1ChainSpec;

impl ChainFormatterSpec for L1ChainSpec {
    type Block = block::Block;
    type Transaction = transaction::L1Transaction;
    type TransactionRequest = request::TransactionRequest;

    fn formatters() -> Result<ChainFormatters, RegistrationError> {
        Ok(ChainFormatters::builder(base_formatters()).build())
    }
}

#[cfg(test)]
mod tests {
    use rpcfmt_core::spec::format_transaction;

    use super::*;
    use crate::transaction::{L1Transaction, L1TransactionType};

    #[test]
    fn legacy_transaction_through_the_identity_registry() -> anyhow::Result<()> {
        let formatters = L1ChainSpec::formatters()?;

        let raw: rpcfmt_core::RawEntity = serde_json::from_str(
            r#"{
                "hash": "0x1a2b621655bf9a4e1e21e5f9bed13d8a9dcb62ba3e3ae6d10792d2e2ffa4c6a1",
                "nonce": "0x2",
                "blockHash": "0xac5c61edb087a51279674fe01d5c1f65eac3fd8597f9bea215058e745df8088e",
                "blockNumber": "0xfdfe0f",
                "transactionIndex": "0x0",
                "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
                "to": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                "value": "0x0",
                "gas": "0x5208",
                "gasPrice": "0x3b9aca00",
                "input": "0x"
            }"#,
        )?;

        let transaction = format_transaction::<L1ChainSpec>(&formatters, &raw)?;
        assert_eq!(transaction.transaction_type(), L1TransactionType::Legacy);

        let L1Transaction::Legacy(legacy) = transaction else {
            panic!("a missing tag should select the legacy variant");
        };
        assert_eq!(legacy.gas_price, 1_000_000_000);
        assert_eq!(legacy.chain_id, None);

        Ok(())
    }
}
