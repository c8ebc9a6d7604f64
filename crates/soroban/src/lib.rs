// Module declarations
pub mod address;
pub mod decode;
pub mod error;
pub mod fixed;
pub mod ledger;
pub mod resolver;
pub mod rpc;
pub mod scval;

// Stellar XDR types
pub use stellar_xdr::curr as xdr;

// Re-export commonly used types
pub use error::{Error, Result, TransportError};
pub use fixed::SCALAR_7;
pub use ledger::{LedgerEntry, StorageKey};
pub use resolver::resolve_entries;
pub use rpc::{LedgerReader, RawLedgerEntry, RpcClient};
pub use xdr::{ScAddress, ScVal};
