use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::set_return_data;

use crate::{
    automation::{self, AutoCompoundConfig, IdleLiquidityConfig},
    constants::*,
    errors::*,
    handlers::{self, Caller, HandlerCall},
    instructions::VaultSigner,
    state::*,
    venue::*,
};

/// Keeper-triggered module run against any vault
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Keeper must be signer and whitelisted
/// ✅ 2. ACCOUNT OWNERSHIP: Vault and registry PDAs validated with seeds
/// ✅ 4. AUTHORIZATION: Module active and enabled by the owner for the position
/// ✅ 5. CPI SAFETY: Venue programs must match the registry
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Venue transfers settle against the vault's
///    associated token accounts, which must be among the remaining accounts
#[derive(Accounts)]
pub struct RunModule<'info> {
    pub keeper: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault.owner.as_ref()],
        bump = vault.bump,
        has_one = registry,
    )]
    pub vault: Account<'info, Vault>,

    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Account<'info, ModuleRegistry>,

    /// CHECK: Must be the registry's liquidity venue program
    #[account(
        address = registry.liquidity_venue @ VaultError::InvalidVenue,
        executable,
    )]
    pub liquidity_venue: UncheckedAccount<'info>,

    /// CHECK: Must be the registry's yield venue program
    #[account(
        address = registry.yield_venue @ VaultError::InvalidVenue,
        executable,
    )]
    pub yield_venue: UncheckedAccount<'info>,
}

/// Read-only position inspection
#[derive(Accounts)]
pub struct InspectPosition<'info> {
    #[account(
        seeds = [VAULT_SEED, vault.owner.as_ref()],
        bump = vault.bump,
        has_one = registry,
    )]
    pub vault: Account<'info, Vault>,

    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Account<'info, ModuleRegistry>,

    /// CHECK: Must be the registry's liquidity venue program
    #[account(
        address = registry.liquidity_venue @ VaultError::InvalidVenue,
        executable,
    )]
    pub liquidity_venue: UncheckedAccount<'info>,
}

pub fn rebalance<'info>(ctx: Context<'_, '_, 'info, 'info, RunModule<'info>>, position_id: u64) -> Result<()> {
    let grant = automation::authorize_keeper(
        &ctx.accounts.registry,
        &ctx.accounts.vault,
        &ctx.accounts.keeper.key(),
        IDLE_LIQUIDITY_MODULE,
        position_id,
    )?;
    let config = IdleLiquidityConfig::from_bytes(&grant.config)?;

    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();
    let vault_info = ctx.accounts.vault.to_account_info();
    let signer = VaultSigner::new(&ctx.accounts.vault);
    let seeds = signer.seeds();
    let signer_seeds: &[&[&[u8]]] = &[&seeds];

    let mut liquidity = CpiLiquidityVenue::new(VenueCpi::new(
        ctx.accounts.liquidity_venue.to_account_info(),
        vault_info.clone(),
        ctx.remaining_accounts,
        signer_seeds,
    ));
    let mut lending = CpiYieldVenue::new(VenueCpi::new(
        ctx.accounts.yield_venue.to_account_info(),
        vault_info,
        ctx.remaining_accounts,
        signer_seeds,
    ));

    let accounts = &mut *ctx.accounts;
    let mut call = HandlerCall {
        vault_key,
        vault: &mut accounts.vault,
        registry: &accounts.registry,
        liquidity: &mut liquidity,
        lending: &mut lending,
        caller: Caller::Module(grant.module),
        now,
    };

    let outcome = automation::rebalance(&mut call, position_id, &config)?;

    msg!(
        "Rebalanced position {} into {} [{}, {})",
        outcome.old_position_id,
        outcome.new_position_id,
        outcome.range.lower,
        outcome.range.upper
    );

    Ok(())
}

pub fn auto_compound_fees<'info>(
    ctx: Context<'_, '_, 'info, 'info, RunModule<'info>>,
    position_id: u64,
    min_amount_threshold: u64,
) -> Result<()> {
    let grant = automation::authorize_keeper(
        &ctx.accounts.registry,
        &ctx.accounts.vault,
        &ctx.accounts.keeper.key(),
        AUTO_COMPOUND_MODULE,
        position_id,
    )?;
    let config = AutoCompoundConfig::from_bytes(&grant.config)?;

    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();
    let vault_info = ctx.accounts.vault.to_account_info();
    let signer = VaultSigner::new(&ctx.accounts.vault);
    let seeds = signer.seeds();
    let signer_seeds: &[&[&[u8]]] = &[&seeds];

    let mut liquidity = CpiLiquidityVenue::new(VenueCpi::new(
        ctx.accounts.liquidity_venue.to_account_info(),
        vault_info.clone(),
        ctx.remaining_accounts,
        signer_seeds,
    ));
    let mut lending = CpiYieldVenue::new(VenueCpi::new(
        ctx.accounts.yield_venue.to_account_info(),
        vault_info,
        ctx.remaining_accounts,
        signer_seeds,
    ));

    let accounts = &mut *ctx.accounts;
    let mut call = HandlerCall {
        vault_key,
        vault: &mut accounts.vault,
        registry: &accounts.registry,
        liquidity: &mut liquidity,
        lending: &mut lending,
        caller: Caller::Module(grant.module),
        now,
    };

    let outcome =
        automation::auto_compound_fees(&mut call, position_id, min_amount_threshold, &config)?;

    msg!(
        "Position {}: collected {}/{} worth {}, reinvested: {}",
        position_id,
        outcome.collected.amount0,
        outcome.collected.amount1,
        outcome.value,
        outcome.reinvested
    );

    Ok(())
}

/// Publishes the Borsh-encoded uncollected `TokenAmounts` as return data
pub fn check_uncollected_fees<'info>(
    ctx: Context<'_, '_, 'info, 'info, InspectPosition<'info>>,
    position_id: u64,
) -> Result<()> {
    // Anyone may call this, so the vault never signs here
    let liquidity = CpiLiquidityVenue::new(VenueCpi::unsigned(
        ctx.accounts.liquidity_venue.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.remaining_accounts,
    ));

    let fees = automation::check_uncollected_fees(&liquidity, &ctx.accounts.vault, position_id)?;
    set_return_data(&handlers::encode(&fees)?);

    Ok(())
}
