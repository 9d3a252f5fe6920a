//! Celo chain formatters.
//!
//! Celo blocks carry no proof-of-work fields and add a randomness beacon
//! commitment; transactions add fee abstraction fields and the CIP-64 and
//! CIP-42 variants on top of the generic L1 set. This crate declares those
//! deltas as descriptors over the `rpcfmt_eth` base formatters and exposes
//! the composed registry through [`CeloChainSpec`].

/// Celo block formatting.
pub mod block;
/// Celo outbound transaction request formatting.
pub mod request;
/// Celo transaction formatting and the extended type discriminator.
pub mod transaction;

mod spec;

pub use self::spec::CeloChainSpec;
