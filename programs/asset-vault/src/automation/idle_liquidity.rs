use anchor_lang::prelude::*;

use crate::automation::{range::*, swap_into_range};
use crate::constants::*;
use crate::errors::VaultError;
use crate::events::PositionRebalanced;
use crate::handlers::{route_typed, HandlerCall, OpenPositionArgs, PositionArgs};
use crate::venue::{LiquidityReceipt, TokenAmounts};

/// Per-position settings of the idle-liquidity module
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct IdleLiquidityConfig {
    /// Ticks past the range edge before a rebalance is allowed
    pub rebalance_distance: u32,
    /// Width of the new range in ticks; 0 keeps the old width
    pub range_width: u32,
    pub max_slippage_bps: u16,
}

impl Default for IdleLiquidityConfig {
    fn default() -> Self {
        Self {
            rebalance_distance: 0,
            range_width: 0,
            max_slippage_bps: DEFAULT_MAX_SLIPPAGE_BPS,
        }
    }
}

impl IdleLiquidityConfig {
    /// Empty bytes mean defaults
    pub fn from_bytes(config: &[u8]) -> Result<Self> {
        if config.is_empty() {
            return Ok(Self::default());
        }
        Self::try_from_slice(config).map_err(|_| error!(VaultError::InvalidCalldata))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RebalanceOutcome {
    pub old_position_id: u64,
    pub new_position_id: u64,
    pub range: TickRange,
    pub recovered: TokenAmounts,
    pub receipt: LiquidityReceipt,
}

/// Move an out-of-range position to a fresh range around the current tick.
///
/// Close, swap to the new range's ratio, then reopen, all through the
/// vault's dispatch table. Module authorizations of the old position carry
/// over to the new one.
pub fn rebalance(
    call: &mut HandlerCall<'_>,
    position_id: u64,
    config: &IdleLiquidityConfig,
) -> Result<RebalanceOutcome> {
    call.vault.require_position(position_id)?;
    let info = call.liquidity.position(position_id)?;
    let pool = call.liquidity.pool_state(&info.pool)?;

    let current = TickRange {
        lower: info.tick_lower,
        upper: info.tick_upper,
    };
    let distance = current.distance_outside(pool.tick);
    require!(
        distance > 0 && distance as i64 >= config.rebalance_distance as i64,
        VaultError::PositionInRange
    );

    let authorizations = call.vault.authorizations_of(position_id);

    let recovered: TokenAmounts =
        route_typed(call, SEL_CLOSE_POSITION, &PositionArgs { position_id })?;

    let width = if config.range_width > 0 {
        i32::try_from(config.range_width).map_err(|_| error!(VaultError::InvalidRange))?
    } else {
        current.width()
    };
    let range = TickRange::centered(pool.tick, width, pool.tick_spacing)?;

    let TokenAmounts { amount0, amount1 } = swap_into_range(
        call,
        info.pool,
        pool.tick,
        &range,
        recovered,
        config.max_slippage_bps,
    )?;

    let receipt: LiquidityReceipt = route_typed(
        call,
        SEL_OPEN_POSITION,
        &OpenPositionArgs {
            pool: info.pool,
            tick_lower: range.lower,
            tick_upper: range.upper,
            amount0_desired: amount0,
            amount1_desired: amount1,
        },
    )?;

    call.vault
        .restore_authorizations(receipt.position_id, authorizations)?;

    emit!(PositionRebalanced {
        vault: call.vault_key,
        old_position_id: position_id,
        new_position_id: receipt.position_id,
        tick_lower: range.lower,
        tick_upper: range.upper,
    });

    Ok(RebalanceOutcome {
        old_position_id: position_id,
        new_position_id: receipt.position_id,
        range,
        recovered,
        receipt,
    })
}
