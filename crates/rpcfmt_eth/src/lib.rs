//! Generic L1 Ethereum base formatters.
//!
//! Defines the chain-agnostic shape of each JSON-RPC entity kind as a
//! canonical field registry plus a pure formatting function, the typed
//! domain entities those fields convert into, and the transaction type
//! discriminator for the generic variants. Chain crates build on top of
//! this via `rpcfmt_core`'s descriptor mechanism.

/// Block formatting.
pub mod block;
/// Raw field decoding.
pub mod decode;
/// Outbound transaction request formatting.
pub mod request;
/// Transaction formatting and the type discriminator.
pub mod transaction;

mod spec;

pub use self::spec::{base_formatters, L1ChainSpec};
