use anchor_lang::prelude::*;

use crate::constants::Selector;
use crate::state::HandlerAction;

/// Event emitted when a vault is created for an owner
#[event]
pub struct VaultCreated {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub registry: Pubkey,
    pub bootstrap_handler: Pubkey,
    pub timestamp: i64,
}

/// Event emitted once per successful dispatch mutation batch
#[event]
pub struct HandlerBound {
    pub vault: Pubkey,
    pub selectors: Vec<Selector>,
    pub handler: Pubkey,
    pub kind: HandlerAction,
}

/// Event emitted when a module is added to the registry
#[event]
pub struct ModuleAdded {
    pub module_id: [u8; 32],
    pub address: Pubkey,
    pub default_active: bool,
}

#[event]
pub struct ModuleAddressChanged {
    pub module_id: [u8; 32],
    pub address: Pubkey,
}

#[event]
pub struct ModuleStateChanged {
    pub module_id: [u8; 32],
    pub active: bool,
}

#[event]
pub struct ModuleDefaultsChanged {
    pub module_id: [u8; 32],
    pub default_config: Vec<u8>,
    pub default_active: bool,
}

#[event]
pub struct KeeperWhitelisted {
    pub keeper: Pubkey,
    pub whitelisted: bool,
}

#[event]
pub struct GovernanceChanged {
    pub governance: Pubkey,
}

#[event]
pub struct TimelockQueued {
    pub hash: [u8; 32],
    pub target: Pubkey,
    pub value: u64,
    pub signature: String,
    pub data: Vec<u8>,
    pub eta: i64,
}

#[event]
pub struct TimelockCancelled {
    pub hash: [u8; 32],
}

#[event]
pub struct TimelockExecuted {
    pub hash: [u8; 32],
    pub target: Pubkey,
    pub value: u64,
}

#[event]
pub struct NewPendingAdmin {
    pub pending_admin: Pubkey,
}

#[event]
pub struct PendingAdminAccepted {
    pub pending_admin: Pubkey,
}

#[event]
pub struct NewAdmin {
    pub admin: Pubkey,
}

#[event]
pub struct NewDelay {
    pub delay: i64,
}

/// Event emitted when the owner edits a module authorization
#[event]
pub struct ModuleAuthorized {
    pub vault: Pubkey,
    pub position_id: u64,
    pub module: Pubkey,
    pub enabled: bool,
}

#[event]
pub struct AssetDeposited {
    pub vault: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct AssetWithdrawn {
    pub vault: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Event emitted when principal enters the yield ledger
#[event]
pub struct YieldDeposited {
    pub vault: Pubkey,
    pub asset: Pubkey,
    pub entry_id: u64,
    pub shares: u64,
    pub total_shares: u64,
    pub total_underlying: u64,
}

/// Event emitted when a yield entry is redeemed
#[event]
pub struct YieldWithdrawn {
    pub vault: Pubkey,
    pub asset: Pubkey,
    pub entry_id: u64,
    pub amount_out: u64,
    pub total_shares: u64,
    pub total_underlying: u64,
}

#[event]
pub struct PositionOpened {
    pub vault: Pubkey,
    pub position_id: u64,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
}

#[event]
pub struct PositionClosed {
    pub vault: Pubkey,
    pub position_id: u64,
    pub amount0: u64,
    pub amount1: u64,
}

#[event]
pub struct PositionRebalanced {
    pub vault: Pubkey,
    pub old_position_id: u64,
    pub new_position_id: u64,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

#[event]
pub struct FeesCollected {
    pub vault: Pubkey,
    pub position_id: u64,
    pub amount0: u64,
    pub amount1: u64,
}

#[event]
pub struct FeesCompounded {
    pub vault: Pubkey,
    pub position_id: u64,
    pub amount0: u64,
    pub amount1: u64,
    pub reinvested: bool,
}
