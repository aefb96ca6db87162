use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

/// Owner edits which modules may act on a position
#[derive(Accounts)]
pub struct ManageModules<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, owner.key().as_ref()],
        bump = vault.bump,
        has_one = owner @ VaultError::NotOwner,
        has_one = registry,
    )]
    pub vault: Account<'info, Vault>,

    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Account<'info, ModuleRegistry>,
}

pub fn toggle_module(
    ctx: Context<ManageModules>,
    position_id: u64,
    module_id: [u8; 32],
    enabled: bool,
) -> Result<()> {
    let registry = &ctx.accounts.registry;
    let vault = &mut ctx.accounts.vault;

    let module = vault.toggle_module(registry, position_id, &module_id, enabled)?;

    emit!(ModuleAuthorized {
        vault: vault.key(),
        position_id,
        module,
        enabled,
    });

    Ok(())
}

pub fn set_module_config(
    ctx: Context<ManageModules>,
    position_id: u64,
    module_id: [u8; 32],
    config: Vec<u8>,
) -> Result<()> {
    let registry = &ctx.accounts.registry;
    let vault = &mut ctx.accounts.vault;

    let module = vault.set_module_config(registry, position_id, &module_id, config)?;
    let enabled = vault
        .authorization(position_id, &module)
        .map(|a| a.enabled)
        .unwrap_or(false);

    emit!(ModuleAuthorized {
        vault: vault.key(),
        position_id,
        module,
        enabled,
    });

    Ok(())
}
