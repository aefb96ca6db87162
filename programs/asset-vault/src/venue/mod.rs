//! Collaborator surfaces consumed by handlers and modules.
//!
//! The vault treats both venues as black boxes: the liquidity venue exposes
//! price/tick queries and position primitives, the lending venue exposes a
//! redeemable balance that grows with interest. On-chain the traits are
//! backed by CPI adapters (`cpi`); tests back them with in-memory fakes.

use anchor_lang::prelude::*;

pub mod cpi;

pub use cpi::*;

/// Snapshot of a liquidity pool
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct PoolState {
    pub token0: Pubkey,
    pub token1: Pubkey,
    pub tick: i32,
    pub tick_spacing: i32,
}

/// Snapshot of one ticked-range position
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct PositionInfo {
    pub pool: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    /// Fees accrued but not yet collected
    pub fees_owed0: u64,
    pub fees_owed1: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct MintParams {
    pub pool: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: u64,
    pub amount1_desired: u64,
}

/// Liquidity added and the token amounts actually consumed
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq)]
pub struct LiquidityReceipt {
    pub position_id: u64,
    pub liquidity: u128,
    pub amount0: u64,
    pub amount1: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct TokenAmounts {
    pub amount0: u64,
    pub amount1: u64,
}

/// Concentrated-liquidity trading venue
pub trait LiquidityVenue {
    fn pool_state(&self, pool: &Pubkey) -> Result<PoolState>;

    fn position(&self, position_id: u64) -> Result<PositionInfo>;

    fn mint(&mut self, params: &MintParams) -> Result<LiquidityReceipt>;

    fn increase_liquidity(&mut self, position_id: u64, amount0: u64, amount1: u64) -> Result<LiquidityReceipt>;

    /// Moves principal for `liquidity` into the position's owed balance
    fn decrease_liquidity(&mut self, position_id: u64, liquidity: u128) -> Result<TokenAmounts>;

    /// Pays out owed principal and fees, capped by the maxima
    fn collect(&mut self, position_id: u64, amount0_max: u64, amount1_max: u64) -> Result<TokenAmounts>;

    fn burn(&mut self, position_id: u64) -> Result<()>;

    /// Returns the output amount
    fn swap_exact_input(
        &mut self,
        pool: &Pubkey,
        zero_for_one: bool,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<u64>;
}

/// Interest-bearing lending venue; the holder is always the calling vault
pub trait YieldVenue {
    fn deposit(&mut self, asset: &Pubkey, amount: u64) -> Result<()>;

    /// Returns the amount actually withdrawn
    fn withdraw(&mut self, asset: &Pubkey, amount: u64) -> Result<u64>;

    fn redeemable_balance(&self, asset: &Pubkey) -> Result<u64>;
}
