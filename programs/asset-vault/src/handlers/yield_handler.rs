use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;
use crate::events::*;
use crate::handlers::{decode, encode, Caller, Handler, HandlerCall};
use crate::state::YieldEntry;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct DepositToYieldArgs {
    pub asset: Pubkey,
    pub amount: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct WithdrawFromYieldArgs {
    pub asset: Pubkey,
    pub entry_id: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct YieldPositionsArgs {
    pub asset: Pubkey,
}

/// Pooled deposits into the lending venue, tracked as shares per asset.
/// Only the owner moves funds in or out; modules never touch yield entries.
pub struct YieldHandler;

impl Handler for YieldHandler {
    fn id(&self) -> Pubkey {
        YIELD_HANDLER_ID
    }

    fn selectors(&self) -> &'static [Selector] {
        &[
            SEL_DEPOSIT_TO_YIELD,
            SEL_WITHDRAW_FROM_YIELD,
            SEL_YIELD_POSITIONS,
        ]
    }

    fn execute(&self, call: &mut HandlerCall<'_>, selector: Selector, data: &[u8]) -> Result<Vec<u8>> {
        match selector {
            SEL_DEPOSIT_TO_YIELD => {
                let args: DepositToYieldArgs = decode(data)?;
                encode(&deposit_to_yield(call, &args.asset, args.amount)?)
            }
            SEL_WITHDRAW_FROM_YIELD => {
                let args: WithdrawFromYieldArgs = decode(data)?;
                encode(&withdraw_from_yield(call, &args.asset, args.entry_id)?)
            }
            SEL_YIELD_POSITIONS => {
                let args: YieldPositionsArgs = decode(data)?;
                encode(&yield_positions(call, &args.asset))
            }
            _ => err!(VaultError::NoHandler),
        }
    }
}

/// Move `amount` of the vault's `asset` balance into the lending venue.
/// Returns the new entry id.
pub fn deposit_to_yield(call: &mut HandlerCall<'_>, asset: &Pubkey, amount: u64) -> Result<u64> {
    // CHECKS: price shares against interest accrued since the last sync
    require!(call.caller == Caller::Owner, VaultError::NotOwner);
    require!(amount > 0, VaultError::ZeroAmount);
    let redeemable = call.lending.redeemable_balance(asset)?;

    // EFFECTS: ledger and custody balance settle before the venue is called
    call.vault.debit(asset, amount)?;
    let entry_id = call.vault.allocate_yield_entry_id()?;
    let ledger = call.vault.yield_ledger_or_insert(asset)?;
    ledger.sync(redeemable);
    let shares = ledger.push_position(entry_id, amount, call.now)?;
    let (total_shares, total_underlying) = (ledger.total_shares, ledger.total_underlying);

    // INTERACTIONS
    call.lending.deposit(asset, amount)?;

    emit!(YieldDeposited {
        vault: call.vault_key,
        asset: *asset,
        entry_id,
        shares,
        total_shares,
        total_underlying,
    });

    Ok(entry_id)
}

/// Redeem one entry in full. The payout is credited to the vault balance.
pub fn withdraw_from_yield(call: &mut HandlerCall<'_>, asset: &Pubkey, entry_id: u64) -> Result<u64> {
    // CHECKS
    require!(call.caller == Caller::Owner, VaultError::NotOwner);
    let redeemable = call.lending.redeemable_balance(asset)?;

    // EFFECTS
    let ledger = call.vault.yield_ledger_mut(asset)?;
    ledger.sync(redeemable);
    let (_, owed) = ledger.remove_position(entry_id)?;
    let (total_shares, total_underlying) = (ledger.total_shares, ledger.total_underlying);
    call.vault.credit(asset, owed)?;

    // INTERACTIONS
    if owed > 0 {
        let received = call.lending.withdraw(asset, owed)?;
        require!(received >= owed, VaultError::InsufficientBalance);
    }

    emit!(YieldWithdrawn {
        vault: call.vault_key,
        asset: *asset,
        entry_id,
        amount_out: owed,
        total_shares,
        total_underlying,
    });

    Ok(owed)
}

/// Entries for `asset` in insertion order
pub fn yield_positions(call: &HandlerCall<'_>, asset: &Pubkey) -> Vec<YieldEntry> {
    call.vault
        .yield_ledger(asset)
        .map(|ledger| ledger.positions().to_vec())
        .unwrap_or_default()
}
