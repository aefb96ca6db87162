use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;

/// Half-open tick range `[lower, upper)`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeStatus {
    BelowRange,
    InRange,
    AboveRange,
}

impl TickRange {
    /// Validated range: ordered, aligned to `spacing`, inside the venue's tick bounds
    pub fn new(lower: i32, upper: i32, spacing: i32) -> Result<Self> {
        require!(spacing > 0, VaultError::InvalidRange);
        require!(lower < upper, VaultError::InvalidRange);
        require!(
            lower % spacing == 0 && upper % spacing == 0,
            VaultError::InvalidRange
        );
        require!(lower >= MIN_TICK && upper <= MAX_TICK, VaultError::InvalidRange);
        Ok(Self { lower, upper })
    }

    /// Range of roughly `width` ticks around `tick`, always containing it.
    /// The width is rounded up to a whole number of spacings.
    pub fn centered(tick: i32, width: i32, spacing: i32) -> Result<Self> {
        require!(spacing > 0, VaultError::InvalidRange);
        let units = width.max(spacing).saturating_add(spacing - 1) / spacing;
        let base = tick.div_euclid(spacing) * spacing;
        let lower = base - (units / 2) * spacing;
        let upper = lower
            .checked_add(units * spacing)
            .ok_or(VaultError::MathOverflow)?;
        Self::new(lower, upper, spacing)
    }

    pub fn width(&self) -> i32 {
        self.upper - self.lower
    }

    pub fn status(&self, tick: i32) -> RangeStatus {
        if tick < self.lower {
            RangeStatus::BelowRange
        } else if tick >= self.upper {
            RangeStatus::AboveRange
        } else {
            RangeStatus::InRange
        }
    }

    pub fn contains(&self, tick: i32) -> bool {
        self.status(tick) == RangeStatus::InRange
    }

    /// Ticks between `tick` and the nearest edge, 0 when inside
    pub fn distance_outside(&self, tick: i32) -> i32 {
        match self.status(tick) {
            RangeStatus::BelowRange => self.lower - tick,
            RangeStatus::AboveRange => tick - self.upper + 1,
            RangeStatus::InRange => 0,
        }
    }
}

/// sqrt(1.0001^tick)
pub fn sqrt_price_at_tick(tick: i32) -> f64 {
    1.0001f64.powf(tick as f64 / 2.0)
}

/// Token1 per token0 at `tick`
pub fn price_at_tick(tick: i32) -> f64 {
    1.0001f64.powf(tick as f64)
}

/// Swap that converts held amounts into the ratio a range needs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapPlan {
    /// true: token0 in, token1 out
    pub zero_for_one: bool,
    pub amount_in: u64,
}

/// Plan the swap that leaves `amount0`/`amount1` in the proportion `range`
/// takes at `tick`.
///
/// Below the range the position is all token0, above it all token1. Inside,
/// per unit of liquidity the range holds `(spu - sp) / (sp * spu)` token0 and
/// `sp - spl` token1; the token1 share of value follows from those at the
/// current price. Returns `None` when nothing needs swapping.
pub fn plan_swap(tick: i32, range: &TickRange, amount0: u64, amount1: u64) -> Option<SwapPlan> {
    let plan = match range.status(tick) {
        RangeStatus::BelowRange => SwapPlan {
            zero_for_one: false,
            amount_in: amount1,
        },
        RangeStatus::AboveRange => SwapPlan {
            zero_for_one: true,
            amount_in: amount0,
        },
        RangeStatus::InRange => {
            let sp = sqrt_price_at_tick(tick);
            let spl = sqrt_price_at_tick(range.lower);
            let spu = sqrt_price_at_tick(range.upper);
            let price = sp * sp;

            let amount0_per_liquidity = (spu - sp) / (sp * spu);
            let amount1_per_liquidity = sp - spl;
            let share1 =
                amount1_per_liquidity / (amount0_per_liquidity * price + amount1_per_liquidity);

            let held1 = amount1 as f64;
            let target1 = (amount0 as f64 * price + held1) * share1;

            if held1 > target1 {
                SwapPlan {
                    zero_for_one: false,
                    amount_in: ((held1 - target1).floor() as u64).min(amount1),
                }
            } else {
                SwapPlan {
                    zero_for_one: true,
                    amount_in: (((target1 - held1) / price).floor() as u64).min(amount0),
                }
            }
        }
    };

    (plan.amount_in > 0).then_some(plan)
}

/// Output expected from a swap at the `tick` price, ignoring fees and impact
pub fn expected_output(zero_for_one: bool, amount_in: u64, tick: i32) -> u64 {
    let price = price_at_tick(tick);
    let out = if zero_for_one {
        amount_in as f64 * price
    } else {
        amount_in as f64 / price
    };
    out.floor() as u64
}

/// Lowest acceptable output for `plan` under `max_slippage_bps`
pub fn min_amount_out(plan: &SwapPlan, tick: i32, max_slippage_bps: u16) -> u64 {
    let expected = expected_output(plan.zero_for_one, plan.amount_in, tick) as u128;
    let keep = BPS_DENOMINATOR.saturating_sub(max_slippage_bps as u64) as u128;
    (expected * keep / BPS_DENOMINATOR as u128) as u64
}

/// Value of both amounts in token1 units at the `tick` price
pub fn value_in_token1(amount0: u64, amount1: u64, tick: i32) -> u64 {
    let value0 = (amount0 as f64 * price_at_tick(tick)).floor() as u64;
    value0.saturating_add(amount1)
}
