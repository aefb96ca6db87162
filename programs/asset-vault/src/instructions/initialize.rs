use anchor_lang::prelude::*;

use crate::{constants::*, state::*};

/// Create the timelock and the module registry it governs
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// First timelock admin
    /// Security: Must be signer, pays for both accounts
    #[account(mut)]
    pub admin: Signer<'info>,

    /// Timelock PDA, the registry's governance principal
    #[account(
        init,
        payer = admin,
        space = Timelock::SPACE,
        seeds = [TIMELOCK_SEED],
        bump
    )]
    pub timelock: Account<'info, Timelock>,

    /// Module registry PDA
    #[account(
        init,
        payer = admin,
        space = ModuleRegistry::SPACE,
        seeds = [REGISTRY_SEED],
        bump
    )]
    pub registry: Account<'info, ModuleRegistry>,

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<Initialize>,
    delay: i64,
    liquidity_venue: Pubkey,
    yield_venue: Pubkey,
) -> Result<()> {
    let timelock = Timelock::new(ctx.accounts.admin.key(), delay, ctx.bumps.timelock)?;
    ctx.accounts.timelock.set_inner(timelock);

    let governance = ctx.accounts.timelock.key();
    ctx.accounts.registry.set_inner(ModuleRegistry::new(
        governance,
        liquidity_venue,
        yield_venue,
        ctx.bumps.registry,
    ));

    msg!(
        "Initialized timelock {} (delay {}s) governing registry {}",
        governance,
        delay,
        ctx.accounts.registry.key()
    );

    Ok(())
}
