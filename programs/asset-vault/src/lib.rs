// Asset Vault - per-owner vault with pluggable handlers on Solana
// Governance: timelocked module registry with a two-phase admin handoff
// Automation: whitelisted keepers drive owner-enabled modules per position

use anchor_lang::prelude::*;

pub mod automation;
pub mod constants;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod instructions;
pub mod state;
pub mod venue;

use instructions::*;
use state::{HandlerAction, TransactionFields};

declare_id!("E1PFsm6GtexgujhJJqGc83wnf8K7mjZkApFgWTQJcah7");

#[program]
pub mod asset_vault {
    use super::*;

    /// Create the timelock (signer becomes admin) and the module registry
    /// it governs
    ///
    /// Security considerations:
    /// - Both accounts are singleton PDAs, so this runs once
    /// - Delay must fall within the timelock bounds
    /// - Registry governance is the timelock PDA from the start
    pub fn initialize(
        ctx: Context<Initialize>,
        delay: i64,
        liquidity_venue: Pubkey,
        yield_venue: Pubkey,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, delay, liquidity_venue, yield_venue)
    }

    // ---------------------------------------------------------------------
    // Timelock
    // ---------------------------------------------------------------------

    /// Queue a call; `eta` must be at least `delay` seconds away
    ///
    /// Security considerations:
    /// - Admin-only function
    /// - Record keyed by the hash of every call field
    /// - Emits event for tracking
    pub fn queue_transaction(
        ctx: Context<TimelockAdmin>,
        target: Pubkey,
        value: u64,
        signature: String,
        data: Vec<u8>,
        eta: i64,
    ) -> Result<()> {
        let fields = TransactionFields {
            target,
            value,
            signature,
            data,
            eta,
        };
        instructions::timelock::queue_transaction(ctx, fields)
    }

    /// Drop a queued call before it executes
    ///
    /// Security considerations:
    /// - Admin-only function
    /// - Fields must match the queued call exactly
    /// - Emits event for tracking
    pub fn cancel_transaction(
        ctx: Context<TimelockAdmin>,
        target: Pubkey,
        value: u64,
        signature: String,
        data: Vec<u8>,
        eta: i64,
    ) -> Result<()> {
        let fields = TransactionFields {
            target,
            value,
            signature,
            data,
            eta,
        };
        instructions::timelock::cancel_transaction(ctx, fields)
    }

    /// Execute a queued call within `[eta, eta + GRACE_PERIOD]`
    ///
    /// Security considerations:
    /// - Record is consumed and persisted before the target is invoked
    /// - Target program must match the queued target
    /// - Timelock keeps its rent-exempt minimum when paying `value`
    pub fn execute_transaction<'info>(
        ctx: Context<'_, '_, 'info, 'info, ExecuteTransaction<'info>>,
        target: Pubkey,
        value: u64,
        signature: String,
        data: Vec<u8>,
        eta: i64,
    ) -> Result<()> {
        let fields = TransactionFields {
            target,
            value,
            signature,
            data,
            eta,
        };
        instructions::timelock::execute_transaction(ctx, fields)
    }

    /// Nominate the next admin
    ///
    /// Security considerations:
    /// - Admin-only function
    /// - Clears any earlier acceptance
    /// - Control stays with the current admin until confirmed
    pub fn set_pending_admin(ctx: Context<TimelockAdmin>, pending_admin: Pubkey) -> Result<()> {
        instructions::timelock::set_pending_admin(ctx, pending_admin)
    }

    /// Candidate acknowledges the admin role; control does not move yet
    pub fn accept_admin_role(ctx: Context<TimelockAdmin>) -> Result<()> {
        instructions::timelock::accept_admin_role(ctx)
    }

    /// Current admin completes a handoff the candidate already accepted
    pub fn confirm_new_admin(ctx: Context<TimelockAdmin>) -> Result<()> {
        instructions::timelock::confirm_new_admin(ctx)
    }

    /// Change the minimum queue delay
    ///
    /// Security considerations:
    /// - Admin-only function
    /// - Delay must fall within the timelock bounds
    /// - Emits event for tracking
    pub fn set_delay(ctx: Context<TimelockAdmin>, delay: i64) -> Result<()> {
        instructions::timelock::set_delay(ctx, delay)
    }

    // ---------------------------------------------------------------------
    // Module registry (governance only)
    // ---------------------------------------------------------------------

    /// Register a new automation module
    ///
    /// Security considerations:
    /// - Governance-only function
    /// - Validates module id doesn't already exist
    /// - Enforces registry size and default-on limits
    /// - Emits event for tracking
    pub fn add_new_contract(
        ctx: Context<GovernRegistry>,
        module_id: [u8; 32],
        address: Pubkey,
        default_config: Vec<u8>,
        default_active: bool,
    ) -> Result<()> {
        instructions::registry::add_new_contract(ctx, module_id, address, default_config, default_active)
    }

    /// Point a module at a new address
    ///
    /// Security considerations:
    /// - Governance-only function
    /// - Config and flags are preserved
    /// - Emits event for tracking
    pub fn change_contract(ctx: Context<GovernRegistry>, module_id: [u8; 32], address: Pubkey) -> Result<()> {
        instructions::registry::change_contract(ctx, module_id, address)
    }

    /// Activate or deactivate a module for every vault
    ///
    /// Security considerations:
    /// - Governance-only function
    /// - Emergency shutdown capability per module
    pub fn switch_module_state(ctx: Context<GovernRegistry>, module_id: [u8; 32], active: bool) -> Result<()> {
        instructions::registry::switch_module_state(ctx, module_id, active)
    }

    /// Governance-only: config handed to newly authorized positions
    pub fn set_default_config(
        ctx: Context<GovernRegistry>,
        module_id: [u8; 32],
        default_config: Vec<u8>,
    ) -> Result<()> {
        instructions::registry::set_default_config(ctx, module_id, default_config)
    }

    /// Governance-only: whether new positions enable the module automatically
    pub fn set_default_activation(
        ctx: Context<GovernRegistry>,
        module_id: [u8; 32],
        default_active: bool,
    ) -> Result<()> {
        instructions::registry::set_default_activation(ctx, module_id, default_active)
    }

    /// Whitelist a keeper
    ///
    /// Security considerations:
    /// - Governance-only function
    /// - Enforces whitelist size limit
    pub fn add_keeper(ctx: Context<GovernRegistry>, keeper: Pubkey) -> Result<()> {
        instructions::registry::add_keeper(ctx, keeper)
    }

    /// Governance-only: remove a keeper from the whitelist
    pub fn remove_keeper(ctx: Context<GovernRegistry>, keeper: Pubkey) -> Result<()> {
        instructions::registry::remove_keeper(ctx, keeper)
    }

    /// Hand registry control to a new governance principal
    ///
    /// Security considerations:
    /// - Governance-only function
    /// - Takes effect immediately; queue it through the timelock
    pub fn change_governance(ctx: Context<GovernRegistry>, governance: Pubkey) -> Result<()> {
        instructions::registry::change_governance(ctx, governance)
    }

    /// Governance-only: venue programs every vault CPIs into
    pub fn set_venues(ctx: Context<GovernRegistry>, liquidity_venue: Pubkey, yield_venue: Pubkey) -> Result<()> {
        instructions::registry::set_venues(ctx, liquidity_venue, yield_venue)
    }

    /// Return data: Borsh `ModuleInfo`
    pub fn get_module_info(ctx: Context<ReadRegistry>, module_id: [u8; 32]) -> Result<()> {
        instructions::registry::get_module_info(ctx, module_id)
    }

    // ---------------------------------------------------------------------
    // Vault
    // ---------------------------------------------------------------------

    /// Create the signer's vault, binding every selector of `bootstrap_handler`
    pub fn create_vault(ctx: Context<CreateVault>, bootstrap_handler: Pubkey) -> Result<()> {
        instructions::create_vault::handler(ctx, bootstrap_handler)
    }

    /// Add, replace or remove selector bindings as one atomic batch
    ///
    /// Security considerations:
    /// - Owner-only function (has_one constraint)
    /// - Built-in instruction selectors can never be bound
    /// - A rejected batch leaves the table untouched
    pub fn update_handler(
        ctx: Context<UpdateDispatch>,
        handler_id: Pubkey,
        action: HandlerAction,
        selectors: Vec<[u8; 4]>,
    ) -> Result<()> {
        instructions::dispatch::update_handler(ctx, handler_id, action, selectors)
    }

    /// Alias of `update_handler(handler_id, Add, selectors)`
    pub fn push_handler(ctx: Context<UpdateDispatch>, handler_id: Pubkey, selectors: Vec<[u8; 4]>) -> Result<()> {
        instructions::dispatch::push_handler(ctx, handler_id, selectors)
    }

    /// Route `selector` to its bound handler. Return data: the handler's
    /// Borsh-encoded result.
    pub fn invoke<'info>(
        ctx: Context<'_, '_, 'info, 'info, Invoke<'info>>,
        selector: [u8; 4],
        data: Vec<u8>,
    ) -> Result<()> {
        instructions::invoke::handler(ctx, selector, data)
    }

    /// Move owner tokens into vault custody
    ///
    /// Security considerations:
    /// - Validates owner token account (mint, owner)
    /// - Vault token account is the vault's associated account
    /// - Follows checks-effects-interactions pattern
    /// - Emits event for tracking
    pub fn deposit_asset(ctx: Context<DepositAsset>, amount: u64) -> Result<()> {
        instructions::custody::deposit_asset(ctx, amount)
    }

    /// Return idle vault tokens to the owner
    ///
    /// Security considerations:
    /// - Owner-only function (has_one constraint)
    /// - Internal balance debited before the transfer
    /// - Vault PDA signs the transfer
    pub fn withdraw_asset(ctx: Context<WithdrawAsset>, amount: u64) -> Result<()> {
        instructions::custody::withdraw_asset(ctx, amount)
    }

    /// Enable or disable a registered module for one position
    ///
    /// Security considerations:
    /// - Owner-only function
    /// - Enabling requires the module to be active
    /// - Position must be managed by this vault
    pub fn toggle_module(
        ctx: Context<ManageModules>,
        position_id: u64,
        module_id: [u8; 32],
        enabled: bool,
    ) -> Result<()> {
        instructions::authorization::toggle_module(ctx, position_id, module_id, enabled)
    }

    /// Owner-only: per-position module config, bounded in length
    pub fn set_module_config(
        ctx: Context<ManageModules>,
        position_id: u64,
        module_id: [u8; 32],
        config: Vec<u8>,
    ) -> Result<()> {
        instructions::authorization::set_module_config(ctx, position_id, module_id, config)
    }

    // ---------------------------------------------------------------------
    // Automation (whitelisted keepers)
    // ---------------------------------------------------------------------

    /// Idle-liquidity module: move an out-of-range position around the
    /// current tick
    ///
    /// Security considerations:
    /// - Keeper must be whitelisted and the module enabled for the position
    /// - Every swap carries a slippage floor
    /// - Venue transfers settle against vault token accounts
    pub fn rebalance<'info>(ctx: Context<'_, '_, 'info, 'info, RunModule<'info>>, position_id: u64) -> Result<()> {
        instructions::automation::rebalance(ctx, position_id)
    }

    /// Auto-compound module: collect fees, reinvest when they clear the threshold
    pub fn auto_compound_fees<'info>(
        ctx: Context<'_, '_, 'info, 'info, RunModule<'info>>,
        position_id: u64,
        min_amount_threshold: u64,
    ) -> Result<()> {
        instructions::automation::auto_compound_fees(ctx, position_id, min_amount_threshold)
    }

    /// Return data: Borsh `TokenAmounts`
    pub fn check_uncollected_fees<'info>(
        ctx: Context<'_, '_, 'info, 'info, InspectPosition<'info>>,
        position_id: u64,
    ) -> Result<()> {
        instructions::automation::check_uncollected_fees(ctx, position_id)
    }
}
