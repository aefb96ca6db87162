use anchor_lang::prelude::*;

/// Custom error codes for the Asset Vault program
///
/// Every failure aborts the whole transaction; nothing is retried on-chain.
#[error_code]
pub enum VaultError {
    // Dispatch
    #[msg("Invalid handler batch - empty, duplicated, or contradicts current bindings")]
    InvalidBatch,

    #[msg("No handler bound for this operation selector")]
    NoHandler,

    #[msg("Nested vault call rejected")]
    Reentrancy,

    #[msg("Handler call data could not be decoded")]
    InvalidCalldata,

    // Authorization
    #[msg("Unauthorized - only the governance principal can perform this action")]
    NotGovernance,

    #[msg("Unauthorized - only the vault owner can perform this action")]
    NotOwner,

    #[msg("Unauthorized - signer is not a whitelisted keeper")]
    NotWhitelistedKeeper,

    #[msg("Unauthorized - only the timelock admin can perform this action")]
    NotAdmin,

    #[msg("Unauthorized - signer is not the pending admin")]
    NotPendingAdmin,

    #[msg("Pending admin has not accepted the role yet")]
    AdminNotAccepted,

    #[msg("Module is not enabled for this position")]
    ModuleNotAuthorized,

    // Registry
    #[msg("Module already exists in registry")]
    ModuleExists,

    #[msg("Module is inactive")]
    ModuleInactive,

    #[msg("Module not found in registry")]
    ModuleNotFound,

    #[msg("Module config too long")]
    ConfigTooLong,

    // Timelock
    #[msg("Delay is outside the allowed timelock bounds")]
    DelayOutOfRange,

    #[msg("Transaction has not reached its eta")]
    TooEarly,

    #[msg("Transaction is past its grace period")]
    StaleTransaction,

    #[msg("Transaction is not queued")]
    TransactionNotQueued,

    #[msg("Transaction is already queued")]
    TransactionAlreadyQueued,

    // Ledger and positions
    #[msg("Position not found")]
    PositionNotFound,

    #[msg("Insufficient shares for this operation")]
    InsufficientShares,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Insufficient vault balance")]
    InsufficientBalance,

    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Capacity exceeded for this vault list")]
    CapacityExceeded,

    #[msg("Invalid tick range")]
    InvalidRange,

    #[msg("Position is in range - nothing to rebalance")]
    PositionInRange,

    // Venue
    #[msg("Venue program does not match the registry")]
    InvalidVenue,

    #[msg("Venue returned malformed data")]
    InvalidReturnData,

    // Custody
    #[msg("Invalid mint - token account mint does not match")]
    InvalidMint,

    #[msg("Invalid owner - token account owner does not match")]
    InvalidOwner,

    #[msg("Vault token account for a moved mint was not supplied")]
    MissingCustodyAccount,

    #[msg("Vault token balance does not match the amounts the venue reported")]
    CustodyMismatch,
}
