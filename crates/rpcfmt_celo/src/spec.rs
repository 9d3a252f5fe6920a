use rpcfmt_core::{
    registry::ChainFormatters, spec::ChainFormatterSpec, RegistrationError,
};

use crate::{block, request, transaction};

/// The Celo chain: the generic base formatters composed with the Celo
/// descriptors for every entity kind.
#[derive(Clone, Copy, Debug)]
pub struct CeloChainSpec;

impl ChainFormatterSpec for CeloChainSpec {
    type Block = block::CeloBlock;
    type Transaction = transaction::CeloTransaction;
    type TransactionRequest = request::CeloTransactionRequest;

    fn formatters() -> Result<ChainFormatters, RegistrationError> {
        Ok(ChainFormatters::builder(rpcfmt_eth::base_formatters())
            .with_block(block::BLOCK_DESCRIPTOR)?
            .with_transaction(transaction::TRANSACTION_DESCRIPTOR)?
            .with_transaction_request(request::TRANSACTION_REQUEST_DESCRIPTOR)?
            .build())
    }
}
