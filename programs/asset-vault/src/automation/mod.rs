//! Keeper-driven modules
//!
//! Modules act on a vault's positions through the same dispatch surface the
//! owner uses. A keeper may trigger one only when the registry lists the
//! module as active and the vault owner enabled it for that position.

use anchor_lang::prelude::*;

use crate::constants::{module_id, SEL_SWAP_EXACT_INPUT};
use crate::errors::VaultError;
use crate::handlers::{route_typed, HandlerCall, SwapExactInputArgs};
use crate::state::{ModuleRegistry, Vault};
use crate::venue::TokenAmounts;

pub mod auto_compound;
pub mod idle_liquidity;
pub mod range;

pub use auto_compound::*;
pub use idle_liquidity::*;
pub use range::*;

/// A module cleared to act on one position
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleGrant {
    pub module: Pubkey,
    /// Per-position config, or the registry default when none was set
    pub config: Vec<u8>,
}

/// Keeper whitelisted, module active, position owned, authorization enabled
pub fn authorize_keeper(
    registry: &ModuleRegistry,
    vault: &Vault,
    keeper: &Pubkey,
    module_name: &str,
    position_id: u64,
) -> Result<ModuleGrant> {
    registry.require_keeper(keeper)?;
    let record = registry.active_module(&module_id(module_name))?;
    vault.require_position(position_id)?;

    let authorization = vault
        .authorization(position_id, &record.address)
        .filter(|a| a.enabled)
        .ok_or(VaultError::ModuleNotAuthorized)?;

    let config = if authorization.config.is_empty() {
        record.default_config.clone()
    } else {
        authorization.config.clone()
    };

    Ok(ModuleGrant {
        module: record.address,
        config,
    })
}

/// Swap `amounts` (already in the vault balance) into the proportion
/// `range` takes at `tick`. Returns the amounts held afterwards.
pub(crate) fn swap_into_range(
    call: &mut HandlerCall<'_>,
    pool: Pubkey,
    tick: i32,
    range: &TickRange,
    amounts: TokenAmounts,
    max_slippage_bps: u16,
) -> Result<TokenAmounts> {
    let TokenAmounts {
        mut amount0,
        mut amount1,
    } = amounts;

    if let Some(plan) = plan_swap(tick, range, amount0, amount1) {
        let amount_out: u64 = route_typed(
            call,
            SEL_SWAP_EXACT_INPUT,
            &SwapExactInputArgs {
                pool,
                zero_for_one: plan.zero_for_one,
                amount_in: plan.amount_in,
                min_amount_out: min_amount_out(&plan, tick, max_slippage_bps),
            },
        )?;
        if plan.zero_for_one {
            amount0 -= plan.amount_in;
            amount1 = amount1.checked_add(amount_out).ok_or(VaultError::MathOverflow)?;
        } else {
            amount1 -= plan.amount_in;
            amount0 = amount0.checked_add(amount_out).ok_or(VaultError::MathOverflow)?;
        }
    }

    Ok(TokenAmounts { amount0, amount1 })
}
