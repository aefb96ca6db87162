use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{constants::*, errors::*, events::*, instructions::VaultSigner, state::*};

/// Move owner tokens into vault custody
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Owner must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Vault PDA validated with seeds and has_one
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Validates mint and owner
/// ✅ 8. BUSINESS LOGIC: Checks-effects-interactions pattern
/// ✅ 10. EVENTS: Emits AssetDeposited event
#[derive(Accounts)]
pub struct DepositAsset<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, owner.key().as_ref()],
        bump = vault.bump,
        has_one = owner @ VaultError::NotOwner,
    )]
    pub vault: Account<'info, Vault>,

    pub mint: Account<'info, Mint>,

    /// Owner's token account (source)
    #[account(
        mut,
        constraint = owner_token_account.mint == mint.key() @ VaultError::InvalidMint,
        constraint = owner_token_account.owner == owner.key() @ VaultError::InvalidOwner,
    )]
    pub owner_token_account: Account<'info, TokenAccount>,

    /// Vault's token account for this mint, created on first deposit
    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = mint,
        associated_token::authority = vault,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn deposit_asset(ctx: Context<DepositAsset>, amount: u64) -> Result<()> {
    // CHECKS
    require!(amount > 0, VaultError::ZeroAmount);
    let mint = ctx.accounts.mint.key();

    // EFFECTS
    ctx.accounts.vault.credit(&mint, amount)?;

    // INTERACTIONS
    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.owner_token_account.to_account_info(),
            to: ctx.accounts.vault_token_account.to_account_info(),
            authority: ctx.accounts.owner.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;

    emit!(AssetDeposited {
        vault: ctx.accounts.vault.key(),
        mint,
        amount,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

/// Return tokens from vault custody to the owner
#[derive(Accounts)]
pub struct WithdrawAsset<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, owner.key().as_ref()],
        bump = vault.bump,
        has_one = owner @ VaultError::NotOwner,
    )]
    pub vault: Account<'info, Vault>,

    pub mint: Account<'info, Mint>,

    /// Owner's token account (destination)
    #[account(
        mut,
        constraint = owner_token_account.mint == mint.key() @ VaultError::InvalidMint,
        constraint = owner_token_account.owner == owner.key() @ VaultError::InvalidOwner,
    )]
    pub owner_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        associated_token::mint = mint,
        associated_token::authority = vault,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn withdraw_asset(ctx: Context<WithdrawAsset>, amount: u64) -> Result<()> {
    // CHECKS
    require!(amount > 0, VaultError::ZeroAmount);
    let mint = ctx.accounts.mint.key();

    // EFFECTS: fails with InsufficientBalance before any tokens move
    ctx.accounts.vault.debit(&mint, amount)?;

    // INTERACTIONS
    let signer = VaultSigner::new(&ctx.accounts.vault);
    let seeds = signer.seeds();
    let signer_seeds = &[&seeds[..]];

    let transfer_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.vault_token_account.to_account_info(),
            to: ctx.accounts.owner_token_account.to_account_info(),
            authority: ctx.accounts.vault.to_account_info(),
        },
        signer_seeds,
    );
    token::transfer(transfer_ctx, amount)?;

    emit!(AssetWithdrawn {
        vault: ctx.accounts.vault.key(),
        mint,
        amount,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
