//! Shared fixtures for the Asset Vault scenario tests
//!
//! In-memory venues stand in for the CPI-backed ones so vault logic runs
//! without a validator: a ticked-range pool with positions and fees, and a
//! lending venue whose balances grow when `accrue` is called.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use anchor_lang::prelude::*;
use asset_vault::{
    automation::price_at_tick,
    constants::*,
    errors::VaultError,
    handlers::{self, Caller, HandlerCall},
    state::{ModuleRegistry, Vault},
    venue::*,
};

// =============================================================================
// Liquidity venue
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct MockPosition {
    pub pool: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    /// Principal backing `liquidity`
    pub amount0: u64,
    pub amount1: u64,
    /// Principal released by `decrease_liquidity`, waiting for `collect`
    pub owed0: u64,
    pub owed1: u64,
    pub fees0: u64,
    pub fees1: u64,
}

/// Ticked-range venue with a linear liquidity model
///
/// A position consumes only token0 below its range, only token1 above it,
/// and both inside. Swaps fill at exactly the pool price.
#[derive(Default)]
pub struct MockLiquidityVenue {
    pub pools: HashMap<Pubkey, PoolState>,
    pub positions: BTreeMap<u64, MockPosition>,
    pub next_position_id: u64,
    pub swaps: Vec<(bool, u64, u64)>,
}

impl MockLiquidityVenue {
    pub fn with_pool(pool: Pubkey, state: PoolState) -> Self {
        let mut venue = Self {
            next_position_id: 1,
            ..Self::default()
        };
        venue.pools.insert(pool, state);
        venue
    }

    pub fn set_tick(&mut self, pool: &Pubkey, tick: i32) {
        if let Some(state) = self.pools.get_mut(pool) {
            state.tick = tick;
        }
    }

    pub fn accrue_fees(&mut self, position_id: u64, fees0: u64, fees1: u64) {
        if let Some(position) = self.positions.get_mut(&position_id) {
            position.fees0 += fees0;
            position.fees1 += fees1;
        }
    }

    fn consumed(&self, pool: &Pubkey, lower: i32, upper: i32, amount0: u64, amount1: u64) -> Result<(u64, u64)> {
        let state = self.pools.get(pool).ok_or(VaultError::InvalidVenue)?;
        Ok(if state.tick < lower {
            (amount0, 0)
        } else if state.tick >= upper {
            (0, amount1)
        } else {
            (amount0, amount1)
        })
    }
}

impl LiquidityVenue for MockLiquidityVenue {
    fn pool_state(&self, pool: &Pubkey) -> Result<PoolState> {
        self.pools
            .get(pool)
            .cloned()
            .ok_or_else(|| error!(VaultError::InvalidVenue))
    }

    fn position(&self, position_id: u64) -> Result<PositionInfo> {
        let position = self
            .positions
            .get(&position_id)
            .ok_or(VaultError::PositionNotFound)?;
        Ok(PositionInfo {
            pool: position.pool,
            tick_lower: position.tick_lower,
            tick_upper: position.tick_upper,
            liquidity: position.liquidity,
            fees_owed0: position.fees0,
            fees_owed1: position.fees1,
        })
    }

    fn mint(&mut self, params: &MintParams) -> Result<LiquidityReceipt> {
        let (amount0, amount1) = self.consumed(
            &params.pool,
            params.tick_lower,
            params.tick_upper,
            params.amount0_desired,
            params.amount1_desired,
        )?;
        let liquidity = amount0 as u128 + amount1 as u128;
        require!(liquidity > 0, VaultError::ZeroAmount);

        let position_id = self.next_position_id;
        self.next_position_id += 1;
        self.positions.insert(
            position_id,
            MockPosition {
                pool: params.pool,
                tick_lower: params.tick_lower,
                tick_upper: params.tick_upper,
                liquidity,
                amount0,
                amount1,
                ..MockPosition::default()
            },
        );

        Ok(LiquidityReceipt {
            position_id,
            liquidity,
            amount0,
            amount1,
        })
    }

    fn increase_liquidity(&mut self, position_id: u64, amount0: u64, amount1: u64) -> Result<LiquidityReceipt> {
        let position = self
            .positions
            .get(&position_id)
            .cloned()
            .ok_or(VaultError::PositionNotFound)?;
        let (used0, used1) = self.consumed(
            &position.pool,
            position.tick_lower,
            position.tick_upper,
            amount0,
            amount1,
        )?;
        let added = used0 as u128 + used1 as u128;

        let stored = self
            .positions
            .get_mut(&position_id)
            .ok_or(VaultError::PositionNotFound)?;
        stored.liquidity += added;
        stored.amount0 += used0;
        stored.amount1 += used1;

        Ok(LiquidityReceipt {
            position_id,
            liquidity: added,
            amount0: used0,
            amount1: used1,
        })
    }

    fn decrease_liquidity(&mut self, position_id: u64, liquidity: u128) -> Result<TokenAmounts> {
        let position = self
            .positions
            .get_mut(&position_id)
            .ok_or(VaultError::PositionNotFound)?;
        require!(
            liquidity > 0 && liquidity <= position.liquidity,
            VaultError::InsufficientShares
        );

        let released0 = (position.amount0 as u128 * liquidity / position.liquidity) as u64;
        let released1 = (position.amount1 as u128 * liquidity / position.liquidity) as u64;
        position.liquidity -= liquidity;
        position.amount0 -= released0;
        position.amount1 -= released1;
        position.owed0 += released0;
        position.owed1 += released1;

        Ok(TokenAmounts {
            amount0: released0,
            amount1: released1,
        })
    }

    fn collect(&mut self, position_id: u64, amount0_max: u64, amount1_max: u64) -> Result<TokenAmounts> {
        let position = self
            .positions
            .get_mut(&position_id)
            .ok_or(VaultError::PositionNotFound)?;

        let amount0 = (position.owed0 + position.fees0).min(amount0_max);
        let amount1 = (position.owed1 + position.fees1).min(amount1_max);
        position.owed0 = 0;
        position.owed1 = 0;
        position.fees0 = 0;
        position.fees1 = 0;

        Ok(TokenAmounts { amount0, amount1 })
    }

    fn burn(&mut self, position_id: u64) -> Result<()> {
        let position = self
            .positions
            .get(&position_id)
            .ok_or(VaultError::PositionNotFound)?;
        require!(
            position.liquidity == 0 && position.owed0 == 0 && position.owed1 == 0,
            VaultError::InvalidReturnData
        );
        self.positions.remove(&position_id);
        Ok(())
    }

    fn swap_exact_input(
        &mut self,
        pool: &Pubkey,
        zero_for_one: bool,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<u64> {
        let state = self.pools.get(pool).ok_or(VaultError::InvalidVenue)?;
        let price = price_at_tick(state.tick);
        let amount_out = if zero_for_one {
            (amount_in as f64 * price).floor() as u64
        } else {
            (amount_in as f64 / price).floor() as u64
        };
        require!(amount_out >= min_amount_out, VaultError::InsufficientBalance);
        self.swaps.push((zero_for_one, amount_in, amount_out));
        Ok(amount_out)
    }
}

// =============================================================================
// Lending venue
// =============================================================================

#[derive(Default)]
pub struct MockYieldVenue {
    pub balances: HashMap<Pubkey, u64>,
}

impl MockYieldVenue {
    /// Interest credited to the vault's redeemable balance
    pub fn accrue(&mut self, asset: &Pubkey, interest: u64) {
        *self.balances.entry(*asset).or_default() += interest;
    }
}

impl YieldVenue for MockYieldVenue {
    fn deposit(&mut self, asset: &Pubkey, amount: u64) -> Result<()> {
        *self.balances.entry(*asset).or_default() += amount;
        Ok(())
    }

    fn withdraw(&mut self, asset: &Pubkey, amount: u64) -> Result<u64> {
        let balance = self.balances.entry(*asset).or_default();
        *balance = balance
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientBalance)?;
        Ok(amount)
    }

    fn redeemable_balance(&self, asset: &Pubkey) -> Result<u64> {
        Ok(self.balances.get(asset).copied().unwrap_or(0))
    }
}

// =============================================================================
// Harness
// =============================================================================

pub const TICK_SPACING: i32 = 60;

/// One vault with both built-in handlers bound, one pool, empty registry
pub struct Harness {
    pub vault_key: Pubkey,
    pub vault: Vault,
    pub governance: Pubkey,
    pub registry: ModuleRegistry,
    pub pool: Pubkey,
    pub token0: Pubkey,
    pub token1: Pubkey,
    pub liquidity: MockLiquidityVenue,
    pub lending: MockYieldVenue,
    pub now: i64,
}

impl Harness {
    pub fn new() -> Self {
        let governance = Pubkey::new_unique();
        let registry = ModuleRegistry::new(governance, Pubkey::new_unique(), Pubkey::new_unique(), 254);

        let mut vault = Vault::new(Pubkey::new_unique(), Pubkey::new_unique(), 255);
        handlers::bootstrap_dispatch(&mut vault.dispatch, YIELD_HANDLER_ID).unwrap();
        vault
            .dispatch
            .push(POSITION_HANDLER_ID, handlers::lookup(&POSITION_HANDLER_ID).unwrap().selectors())
            .unwrap();

        let pool = Pubkey::new_unique();
        let token0 = Pubkey::new_unique();
        let token1 = Pubkey::new_unique();
        let liquidity = MockLiquidityVenue::with_pool(
            pool,
            PoolState {
                token0,
                token1,
                tick: 0,
                tick_spacing: TICK_SPACING,
            },
        );

        Self {
            vault_key: Pubkey::new_unique(),
            vault,
            governance,
            registry,
            pool,
            token0,
            token1,
            liquidity,
            lending: MockYieldVenue::default(),
            now: 1_700_000_000,
        }
    }

    pub fn call(&mut self, caller: Caller) -> HandlerCall<'_> {
        HandlerCall {
            vault_key: self.vault_key,
            vault: &mut self.vault,
            registry: &self.registry,
            liquidity: &mut self.liquidity,
            lending: &mut self.lending,
            caller,
            now: self.now,
        }
    }

    /// Owner-routed call through the vault's dispatch table
    pub fn invoke<A: AnchorSerialize, R: AnchorDeserialize>(&mut self, selector: Selector, args: &A) -> Result<R> {
        let mut call = self.call(Caller::Owner);
        handlers::route_typed(&mut call, selector, args)
    }

    pub fn fund(&mut self, token0: u64, token1: u64) {
        let (t0, t1) = (self.token0, self.token1);
        self.vault.credit(&t0, token0).unwrap();
        self.vault.credit(&t1, token1).unwrap();
    }

    /// Register a module under `name`; returns its address
    pub fn register_module(&mut self, name: &str, default_config: Vec<u8>, default_active: bool) -> Pubkey {
        let address = Pubkey::new_unique();
        self.registry
            .add_new_contract(&self.governance, module_id(name), address, default_config, default_active)
            .unwrap();
        address
    }
}

pub fn assert_vault_error<T: std::fmt::Debug>(result: Result<T>, expected: VaultError) {
    assert_eq!(result.unwrap_err(), anchor_lang::error::Error::from(expected));
}
