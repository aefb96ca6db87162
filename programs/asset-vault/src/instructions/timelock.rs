use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::invoke_signed;

use crate::{constants::*, errors::*, events::*, state::*};

/// Timelock call made by its admin (or, for `accept_admin_role`, the candidate)
#[derive(Accounts)]
pub struct TimelockAdmin<'info> {
    pub signer: Signer<'info>,

    #[account(
        mut,
        seeds = [TIMELOCK_SEED],
        bump = timelock.bump,
    )]
    pub timelock: Account<'info, Timelock>,
}

/// Execute a queued call with the timelock PDA as signer
///
/// Remaining accounts are the target instruction's accounts, in order. The
/// timelock PDA is marked as a signer wherever it appears among them.
#[derive(Accounts)]
pub struct ExecuteTransaction<'info> {
    pub signer: Signer<'info>,

    #[account(
        mut,
        seeds = [TIMELOCK_SEED],
        bump = timelock.bump,
    )]
    pub timelock: Account<'info, Timelock>,

    /// CHECK: Must equal the queued target
    #[account(executable)]
    pub target_program: UncheckedAccount<'info>,
}

pub fn queue_transaction(ctx: Context<TimelockAdmin>, fields: TransactionFields) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let signer = ctx.accounts.signer.key();
    let hash = ctx
        .accounts
        .timelock
        .queue_transaction(&signer, &fields, now)?;

    emit!(TimelockQueued {
        hash,
        target: fields.target,
        value: fields.value,
        signature: fields.signature,
        data: fields.data,
        eta: fields.eta,
    });

    Ok(())
}

pub fn cancel_transaction(ctx: Context<TimelockAdmin>, fields: TransactionFields) -> Result<()> {
    let signer = ctx.accounts.signer.key();
    let hash = fields.hash()?;
    ctx.accounts.timelock.cancel_transaction(&signer, &hash)?;

    emit!(TimelockCancelled { hash });

    Ok(())
}

pub fn execute_transaction<'info>(
    ctx: Context<'_, '_, 'info, 'info, ExecuteTransaction<'info>>,
    fields: TransactionFields,
) -> Result<()> {
    // CHECKS
    let now = Clock::get()?.unix_timestamp;
    require_keys_eq!(
        ctx.accounts.target_program.key(),
        fields.target,
        VaultError::InvalidCalldata
    );

    // EFFECTS: consume the record and persist it before the call goes out
    let signer = ctx.accounts.signer.key();
    let hash = ctx
        .accounts
        .timelock
        .execute_transaction(&signer, &fields, now)?;
    ctx.accounts.timelock.exit(&crate::ID)?;

    let timelock_info = ctx.accounts.timelock.to_account_info();
    if fields.value > 0 {
        let recipient = ctx
            .remaining_accounts
            .first()
            .ok_or(VaultError::InvalidCalldata)?;
        let rent_floor = Rent::get()?.minimum_balance(timelock_info.data_len());
        let remaining = timelock_info
            .lamports()
            .checked_sub(fields.value)
            .ok_or(VaultError::InsufficientBalance)?;
        require!(remaining >= rent_floor, VaultError::InsufficientBalance);

        **timelock_info.try_borrow_mut_lamports()? = remaining;
        let credited = recipient
            .lamports()
            .checked_add(fields.value)
            .ok_or(VaultError::MathOverflow)?;
        **recipient.try_borrow_mut_lamports()? = credited;
    }

    // INTERACTIONS
    let timelock_key = timelock_info.key();
    let metas = ctx
        .remaining_accounts
        .iter()
        .map(|acc| AccountMeta {
            pubkey: *acc.key,
            is_signer: acc.is_signer || *acc.key == timelock_key,
            is_writable: acc.is_writable,
        })
        .collect();
    let ix = Instruction {
        program_id: fields.target,
        accounts: metas,
        data: fields.instruction_data(),
    };

    let mut infos = ctx.remaining_accounts.to_vec();
    infos.push(ctx.accounts.target_program.to_account_info());
    infos.push(timelock_info);

    let bump = [ctx.accounts.timelock.bump];
    let seeds: &[&[u8]] = &[TIMELOCK_SEED, &bump];
    invoke_signed(&ix, &infos, &[seeds])?;

    // The target may have written to the timelock account
    ctx.accounts.timelock.reload()?;

    emit!(TimelockExecuted {
        hash,
        target: fields.target,
        value: fields.value,
    });

    Ok(())
}

pub fn set_pending_admin(ctx: Context<TimelockAdmin>, pending_admin: Pubkey) -> Result<()> {
    let signer = ctx.accounts.signer.key();
    ctx.accounts
        .timelock
        .set_pending_admin(&signer, pending_admin)?;

    emit!(NewPendingAdmin { pending_admin });

    Ok(())
}

pub fn accept_admin_role(ctx: Context<TimelockAdmin>) -> Result<()> {
    let signer = ctx.accounts.signer.key();
    ctx.accounts.timelock.accept_admin_role(&signer)?;

    emit!(PendingAdminAccepted {
        pending_admin: signer,
    });

    Ok(())
}

pub fn confirm_new_admin(ctx: Context<TimelockAdmin>) -> Result<()> {
    let signer = ctx.accounts.signer.key();
    let admin = ctx.accounts.timelock.confirm_new_admin(&signer)?;

    emit!(NewAdmin { admin });

    Ok(())
}

pub fn set_delay(ctx: Context<TimelockAdmin>, delay: i64) -> Result<()> {
    let signer = ctx.accounts.signer.key();
    ctx.accounts.timelock.set_delay(&signer, delay)?;

    emit!(NewDelay { delay });

    Ok(())
}
