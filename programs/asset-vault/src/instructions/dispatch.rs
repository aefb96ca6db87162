use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, handlers, state::*};

/// Owner edits the vault's selector -> handler table
#[derive(Accounts)]
pub struct UpdateDispatch<'info> {
    pub owner: Signer<'info>,

    /// Security: has_one ties the signer to the vault
    #[account(
        mut,
        seeds = [VAULT_SEED, owner.key().as_ref()],
        bump = vault.bump,
        has_one = owner @ VaultError::NotOwner,
    )]
    pub vault: Account<'info, Vault>,
}

pub fn update_handler(
    ctx: Context<UpdateDispatch>,
    handler_id: Pubkey,
    action: HandlerAction,
    selectors: Vec<Selector>,
) -> Result<()> {
    let vault = &mut ctx.accounts.vault;
    handlers::update_dispatch(&mut vault.dispatch, handler_id, action, &selectors)?;

    emit!(HandlerBound {
        vault: vault.key(),
        selectors,
        handler: handler_id,
        kind: action,
    });

    Ok(())
}

/// Bootstrap path: identical to `update_handler(handler_id, Add, selectors)`
pub fn push_handler(
    ctx: Context<UpdateDispatch>,
    handler_id: Pubkey,
    selectors: Vec<Selector>,
) -> Result<()> {
    update_handler(ctx, handler_id, HandlerAction::Add, selectors)
}
