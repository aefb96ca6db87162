use anchor_lang::prelude::*;

use crate::automation::TickRange;
use crate::constants::*;
use crate::errors::VaultError;
use crate::events::*;
use crate::handlers::{decode, encode, Handler, HandlerCall};
use crate::venue::{LiquidityReceipt, MintParams, TokenAmounts};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct OpenPositionArgs {
    pub pool: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: u64,
    pub amount1_desired: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct IncreaseLiquidityArgs {
    pub position_id: u64,
    pub amount0: u64,
    pub amount1: u64,
}

/// Argument of `collect_fees` and `close_position`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct PositionArgs {
    pub position_id: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct SwapExactInputArgs {
    pub pool: Pubkey,
    pub zero_for_one: bool,
    pub amount_in: u64,
    pub min_amount_out: u64,
}

/// Managed ticked-range positions in the liquidity venue
pub struct PositionHandler;

impl Handler for PositionHandler {
    fn id(&self) -> Pubkey {
        POSITION_HANDLER_ID
    }

    fn selectors(&self) -> &'static [Selector] {
        &[
            SEL_OPEN_POSITION,
            SEL_INCREASE_LIQUIDITY,
            SEL_COLLECT_FEES,
            SEL_CLOSE_POSITION,
            SEL_SWAP_EXACT_INPUT,
            SEL_MANAGED_POSITIONS,
        ]
    }

    fn execute(&self, call: &mut HandlerCall<'_>, selector: Selector, data: &[u8]) -> Result<Vec<u8>> {
        match selector {
            SEL_OPEN_POSITION => encode(&open_position(call, &decode(data)?)?),
            SEL_INCREASE_LIQUIDITY => encode(&increase_liquidity(call, &decode(data)?)?),
            SEL_COLLECT_FEES => {
                let args: PositionArgs = decode(data)?;
                encode(&collect_fees(call, args.position_id)?)
            }
            SEL_CLOSE_POSITION => {
                let args: PositionArgs = decode(data)?;
                encode(&close_position(call, args.position_id)?)
            }
            SEL_SWAP_EXACT_INPUT => encode(&swap_exact_input(call, &decode(data)?)?),
            SEL_MANAGED_POSITIONS => encode(&call.vault.positions),
            _ => err!(VaultError::NoHandler),
        }
    }
}

/// Mint a new position from vault balances.
///
/// The desired amounts are reserved up front and whatever the venue does
/// not consume is credited back. Every active default-on module is
/// authorized on the new position with its default config.
pub fn open_position(call: &mut HandlerCall<'_>, args: &OpenPositionArgs) -> Result<LiquidityReceipt> {
    // CHECKS
    let pool = call.liquidity.pool_state(&args.pool)?;
    TickRange::new(args.tick_lower, args.tick_upper, pool.tick_spacing)?;
    require!(
        args.amount0_desired > 0 || args.amount1_desired > 0,
        VaultError::ZeroAmount
    );
    require!(
        call.vault.positions.len() < MAX_POSITIONS,
        VaultError::CapacityExceeded
    );

    // EFFECTS: reserve
    call.vault.debit(&pool.token0, args.amount0_desired)?;
    call.vault.debit(&pool.token1, args.amount1_desired)?;

    // INTERACTIONS
    let receipt = call.liquidity.mint(&MintParams {
        pool: args.pool,
        tick_lower: args.tick_lower,
        tick_upper: args.tick_upper,
        amount0_desired: args.amount0_desired,
        amount1_desired: args.amount1_desired,
    })?;
    require!(
        receipt.amount0 <= args.amount0_desired && receipt.amount1 <= args.amount1_desired,
        VaultError::InvalidReturnData
    );

    call.vault
        .credit(&pool.token0, args.amount0_desired - receipt.amount0)?;
    call.vault
        .credit(&pool.token1, args.amount1_desired - receipt.amount1)?;
    call.vault.track_position(receipt.position_id)?;

    for module in call.registry.default_modules() {
        call.vault.set_authorization(
            receipt.position_id,
            module.address,
            true,
            Some(module.default_config.clone()),
        )?;
    }

    emit!(PositionOpened {
        vault: call.vault_key,
        position_id: receipt.position_id,
        tick_lower: args.tick_lower,
        tick_upper: args.tick_upper,
        liquidity: receipt.liquidity,
    });

    Ok(receipt)
}

pub fn increase_liquidity(
    call: &mut HandlerCall<'_>,
    args: &IncreaseLiquidityArgs,
) -> Result<LiquidityReceipt> {
    call.vault.require_position(args.position_id)?;
    require!(args.amount0 > 0 || args.amount1 > 0, VaultError::ZeroAmount);
    let info = call.liquidity.position(args.position_id)?;
    let pool = call.liquidity.pool_state(&info.pool)?;

    call.vault.debit(&pool.token0, args.amount0)?;
    call.vault.debit(&pool.token1, args.amount1)?;

    let receipt = call
        .liquidity
        .increase_liquidity(args.position_id, args.amount0, args.amount1)?;
    require!(
        receipt.amount0 <= args.amount0 && receipt.amount1 <= args.amount1,
        VaultError::InvalidReturnData
    );

    call.vault.credit(&pool.token0, args.amount0 - receipt.amount0)?;
    call.vault.credit(&pool.token1, args.amount1 - receipt.amount1)?;

    Ok(receipt)
}

/// Collect accrued fees into the vault balance
pub fn collect_fees(call: &mut HandlerCall<'_>, position_id: u64) -> Result<TokenAmounts> {
    call.vault.require_position(position_id)?;
    let info = call.liquidity.position(position_id)?;
    let pool = call.liquidity.pool_state(&info.pool)?;

    let collected = call.liquidity.collect(position_id, u64::MAX, u64::MAX)?;
    call.vault.credit(&pool.token0, collected.amount0)?;
    call.vault.credit(&pool.token1, collected.amount1)?;

    emit!(FeesCollected {
        vault: call.vault_key,
        position_id,
        amount0: collected.amount0,
        amount1: collected.amount1,
    });

    Ok(collected)
}

/// Withdraw everything from a position and burn it.
///
/// The vault stops tracking the position (and its module authorizations)
/// before the venue is touched.
pub fn close_position(call: &mut HandlerCall<'_>, position_id: u64) -> Result<TokenAmounts> {
    // CHECKS
    call.vault.require_position(position_id)?;
    let info = call.liquidity.position(position_id)?;
    let pool = call.liquidity.pool_state(&info.pool)?;

    // EFFECTS
    call.vault.untrack_position(position_id)?;

    // INTERACTIONS
    if info.liquidity > 0 {
        call.liquidity
            .decrease_liquidity(position_id, info.liquidity)?;
    }
    let recovered = call.liquidity.collect(position_id, u64::MAX, u64::MAX)?;
    call.liquidity.burn(position_id)?;

    call.vault.credit(&pool.token0, recovered.amount0)?;
    call.vault.credit(&pool.token1, recovered.amount1)?;

    emit!(PositionClosed {
        vault: call.vault_key,
        position_id,
        amount0: recovered.amount0,
        amount1: recovered.amount1,
    });

    Ok(recovered)
}

/// Swap vault balance through a pool. Returns the output amount.
pub fn swap_exact_input(call: &mut HandlerCall<'_>, args: &SwapExactInputArgs) -> Result<u64> {
    require!(args.amount_in > 0, VaultError::ZeroAmount);
    let pool = call.liquidity.pool_state(&args.pool)?;
    let (token_in, token_out) = if args.zero_for_one {
        (pool.token0, pool.token1)
    } else {
        (pool.token1, pool.token0)
    };

    call.vault.debit(&token_in, args.amount_in)?;

    let amount_out = call.liquidity.swap_exact_input(
        &args.pool,
        args.zero_for_one,
        args.amount_in,
        args.min_amount_out,
    )?;
    require!(
        amount_out >= args.min_amount_out,
        VaultError::InvalidReturnData
    );

    call.vault.credit(&token_out, amount_out)?;
    Ok(amount_out)
}
