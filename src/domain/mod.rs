//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    AppError, ConfigError, RpcError, RpcFailure, SignerRejection, TransferError, ValidationError,
};
pub use traits::{NodeClient, PriceFeed, StaticPriceFeed, TransferSigner};
pub use types::{
    ConfirmationStatus, Endpoint, LAMPORTS_PER_SOL, RecencyToken, SignedTransaction,
    TransferPhase, TransferRequest, TransferResult, TransferStatus, WalletBalance,
    lamports_to_sol,
};
