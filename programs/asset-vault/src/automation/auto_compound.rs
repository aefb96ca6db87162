use anchor_lang::prelude::*;

use crate::automation::{range::*, swap_into_range};
use crate::constants::*;
use crate::errors::VaultError;
use crate::events::FeesCompounded;
use crate::handlers::{route_typed, HandlerCall, IncreaseLiquidityArgs, PositionArgs};
use crate::state::Vault;
use crate::venue::{LiquidityReceipt, LiquidityVenue, TokenAmounts};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct AutoCompoundConfig {
    pub max_slippage_bps: u16,
}

impl Default for AutoCompoundConfig {
    fn default() -> Self {
        Self {
            max_slippage_bps: DEFAULT_MAX_SLIPPAGE_BPS,
        }
    }
}

impl AutoCompoundConfig {
    pub fn from_bytes(config: &[u8]) -> Result<Self> {
        if config.is_empty() {
            return Ok(Self::default());
        }
        Self::try_from_slice(config).map_err(|_| error!(VaultError::InvalidCalldata))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompoundOutcome {
    pub collected: TokenAmounts,
    /// Collected value in token1 units at the pool price
    pub value: u64,
    pub reinvested: bool,
    pub receipt: Option<LiquidityReceipt>,
}

/// Fees accrued on a vault-owned position and not yet collected
pub fn check_uncollected_fees(
    venue: &dyn LiquidityVenue,
    vault: &Vault,
    position_id: u64,
) -> Result<TokenAmounts> {
    vault.require_position(position_id)?;
    let info = venue.position(position_id)?;
    Ok(TokenAmounts {
        amount0: info.fees_owed0,
        amount1: info.fees_owed1,
    })
}

/// Collect fees and reinvest them when they are worth at least
/// `min_amount_threshold` (token1 units). Below the threshold the fees stay
/// in the vault balance.
pub fn auto_compound_fees(
    call: &mut HandlerCall<'_>,
    position_id: u64,
    min_amount_threshold: u64,
    config: &AutoCompoundConfig,
) -> Result<CompoundOutcome> {
    call.vault.require_position(position_id)?;
    let info = call.liquidity.position(position_id)?;
    let pool = call.liquidity.pool_state(&info.pool)?;

    let collected: TokenAmounts =
        route_typed(call, SEL_COLLECT_FEES, &PositionArgs { position_id })?;
    let value = value_in_token1(collected.amount0, collected.amount1, pool.tick);

    if value == 0 || value < min_amount_threshold {
        emit!(FeesCompounded {
            vault: call.vault_key,
            position_id,
            amount0: collected.amount0,
            amount1: collected.amount1,
            reinvested: false,
        });
        return Ok(CompoundOutcome {
            collected,
            value,
            reinvested: false,
            receipt: None,
        });
    }

    let range = TickRange {
        lower: info.tick_lower,
        upper: info.tick_upper,
    };
    let TokenAmounts { amount0, amount1 } = swap_into_range(
        call,
        info.pool,
        pool.tick,
        &range,
        collected,
        config.max_slippage_bps,
    )?;

    let receipt: LiquidityReceipt = route_typed(
        call,
        SEL_INCREASE_LIQUIDITY,
        &IncreaseLiquidityArgs {
            position_id,
            amount0,
            amount1,
        },
    )?;

    emit!(FeesCompounded {
        vault: call.vault_key,
        position_id,
        amount0: collected.amount0,
        amount1: collected.amount1,
        reinvested: true,
    });

    Ok(CompoundOutcome {
        collected,
        value,
        reinvested: true,
        receipt: Some(receipt),
    })
}
