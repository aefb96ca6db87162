use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::set_return_data;

use crate::{
    constants::*,
    errors::*,
    handlers::{self, Caller, HandlerCall},
    state::*,
    venue::*,
};

/// Route a non-builtin operation to the handler bound for its selector
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Owner must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Vault and registry PDAs validated with seeds
/// ✅ 5. CPI SAFETY: Venue programs must match the registry
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Venue transfers settle against the vault's
///    associated token accounts
/// ✅ 8. BUSINESS LOGIC: Handlers follow checks-effects-interactions
///
/// Venue accounts the handler needs are passed as remaining accounts and
/// forwarded to the venue unchanged. They must include the vault's
/// associated token account for every mint the operation moves.
#[derive(Accounts)]
pub struct Invoke<'info> {
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

/// Seeds the vault PDA signs venue calls with
pub struct VaultSigner {
    owner: Pubkey,
    bump: [u8; 1],
}

impl VaultSigner {
    pub fn new(vault: &Vault) -> Self {
        Self {
            owner: vault.owner,
            bump: [vault.bump],
        }
    }

    pub fn seeds(&self) -> [&[u8]; 3] {
        [VAULT_SEED, self.owner.as_ref(), &self.bump]
    }
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Invoke<'info>>,
    selector: Selector,
    data: Vec<u8>,
) -> Result<()> {
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
        caller: Caller::Owner,
        now,
    };

    let output = handlers::route(&mut call, selector, &data)?;
    set_return_data(&output);

    msg!(
        "Routed selector {:?} for vault {} ({} bytes returned)",
        selector,
        vault_key,
        output.len()
    );

    Ok(())
}
