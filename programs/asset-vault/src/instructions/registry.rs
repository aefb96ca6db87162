use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::set_return_data;

use crate::{constants::*, events::*, handlers, state::*};

/// Governance-only registry mutation
///
/// In production `governance` is the timelock PDA, which signs through
/// `execute_transaction`.
#[derive(Accounts)]
pub struct GovernRegistry<'info> {
    pub governance: Signer<'info>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Account<'info, ModuleRegistry>,
}

/// Read-only registry access
#[derive(Accounts)]
pub struct ReadRegistry<'info> {
    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Account<'info, ModuleRegistry>,
}

pub fn add_new_contract(
    ctx: Context<GovernRegistry>,
    module_id: [u8; 32],
    address: Pubkey,
    default_config: Vec<u8>,
    default_active: bool,
) -> Result<()> {
    let signer = ctx.accounts.governance.key();
    ctx.accounts.registry.add_new_contract(
        &signer,
        module_id,
        address,
        default_config,
        default_active,
    )?;

    emit!(ModuleAdded {
        module_id,
        address,
        default_active,
    });

    Ok(())
}

pub fn change_contract(ctx: Context<GovernRegistry>, module_id: [u8; 32], address: Pubkey) -> Result<()> {
    let signer = ctx.accounts.governance.key();
    ctx.accounts
        .registry
        .change_contract(&signer, &module_id, address)?;

    emit!(ModuleAddressChanged { module_id, address });

    Ok(())
}

pub fn switch_module_state(ctx: Context<GovernRegistry>, module_id: [u8; 32], active: bool) -> Result<()> {
    let signer = ctx.accounts.governance.key();
    ctx.accounts
        .registry
        .switch_module_state(&signer, &module_id, active)?;

    emit!(ModuleStateChanged { module_id, active });

    Ok(())
}

pub fn set_default_config(
    ctx: Context<GovernRegistry>,
    module_id: [u8; 32],
    default_config: Vec<u8>,
) -> Result<()> {
    let signer = ctx.accounts.governance.key();
    let registry = &mut ctx.accounts.registry;
    registry.set_default_config(&signer, &module_id, default_config)?;
    emit_defaults(registry, module_id)
}

pub fn set_default_activation(
    ctx: Context<GovernRegistry>,
    module_id: [u8; 32],
    default_active: bool,
) -> Result<()> {
    let signer = ctx.accounts.governance.key();
    let registry = &mut ctx.accounts.registry;
    registry.set_default_activation(&signer, &module_id, default_active)?;
    emit_defaults(registry, module_id)
}

fn emit_defaults(registry: &ModuleRegistry, module_id: [u8; 32]) -> Result<()> {
    let info = registry.get_module_info(&module_id)?;
    emit!(ModuleDefaultsChanged {
        module_id,
        default_config: info.default_config,
        default_active: info.default_active,
    });
    Ok(())
}

pub fn add_keeper(ctx: Context<GovernRegistry>, keeper: Pubkey) -> Result<()> {
    let signer = ctx.accounts.governance.key();
    ctx.accounts.registry.add_keeper(&signer, keeper)?;

    emit!(KeeperWhitelisted {
        keeper,
        whitelisted: true,
    });

    Ok(())
}

pub fn remove_keeper(ctx: Context<GovernRegistry>, keeper: Pubkey) -> Result<()> {
    let signer = ctx.accounts.governance.key();
    ctx.accounts.registry.remove_keeper(&signer, &keeper)?;

    emit!(KeeperWhitelisted {
        keeper,
        whitelisted: false,
    });

    Ok(())
}

pub fn change_governance(ctx: Context<GovernRegistry>, governance: Pubkey) -> Result<()> {
    let signer = ctx.accounts.governance.key();
    ctx.accounts
        .registry
        .change_governance(&signer, governance)?;

    emit!(GovernanceChanged { governance });

    Ok(())
}

pub fn set_venues(ctx: Context<GovernRegistry>, liquidity_venue: Pubkey, yield_venue: Pubkey) -> Result<()> {
    let signer = ctx.accounts.governance.key();
    ctx.accounts
        .registry
        .set_venues(&signer, liquidity_venue, yield_venue)?;

    msg!("Venues set: liquidity {} yield {}", liquidity_venue, yield_venue);

    Ok(())
}

/// Publishes the Borsh-encoded `ModuleInfo` as return data
pub fn get_module_info(ctx: Context<ReadRegistry>, module_id: [u8; 32]) -> Result<()> {
    let info = ctx.accounts.registry.get_module_info(&module_id)?;
    set_return_data(&handlers::encode(&info)?);
    Ok(())
}
