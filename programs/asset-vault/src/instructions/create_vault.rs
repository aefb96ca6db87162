use anchor_lang::prelude::*;

use crate::{constants::*, events::*, handlers, state::*};

/// Create the caller's vault
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Owner must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Registry PDA validated with seeds
/// ✅ 3. ONE PER OWNER: Vault PDA is derived from the owner key
/// ✅ 10. EVENTS: Emits VaultCreated and HandlerBound
#[derive(Accounts)]
pub struct CreateVault<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Module registry the vault will trust
    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
    )]
    pub registry: Account<'info, ModuleRegistry>,

    #[account(
        init,
        payer = owner,
        space = Vault::SPACE,
        seeds = [VAULT_SEED, owner.key().as_ref()],
        bump
    )]
    pub vault: Account<'info, Vault>,

    pub system_program: Program<'info, System>,
}

/// `bootstrap_handler` may be `Pubkey::default()` for an empty dispatch table
pub fn handler(ctx: Context<CreateVault>, bootstrap_handler: Pubkey) -> Result<()> {
    let mut vault = Vault::new(
        ctx.accounts.owner.key(),
        ctx.accounts.registry.key(),
        ctx.bumps.vault,
    );
    handlers::bootstrap_dispatch(&mut vault.dispatch, bootstrap_handler)?;
    let bound = vault.dispatch.selectors_of(&bootstrap_handler).to_vec();
    ctx.accounts.vault.set_inner(vault);

    let vault_key = ctx.accounts.vault.key();
    if !bound.is_empty() {
        emit!(HandlerBound {
            vault: vault_key,
            selectors: bound,
            handler: bootstrap_handler,
            kind: HandlerAction::Add,
        });
    }

    emit!(VaultCreated {
        vault: vault_key,
        owner: ctx.accounts.owner.key(),
        registry: ctx.accounts.registry.key(),
        bootstrap_handler,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
