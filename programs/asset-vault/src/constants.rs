// Constants for the Asset Vault program

use anchor_lang::prelude::*;
use sha2::{Digest, Sha256};

/// Operation selector: first 4 bytes of `sha256(operation_name)`
pub type Selector = [u8; 4];

/// Seed for the timelock PDA (the governance principal)
pub const TIMELOCK_SEED: &[u8] = b"timelock";

/// Seed for the module registry PDA
pub const REGISTRY_SEED: &[u8] = b"registry";

/// Seed for per-owner vault PDAs
pub const VAULT_SEED: &[u8] = b"vault";

// Timelock bounds, in seconds

pub const MINIMUM_DELAY: i64 = 6 * 60 * 60;
pub const MAXIMUM_DELAY: i64 = 30 * 24 * 60 * 60;
pub const GRACE_PERIOD: i64 = 14 * 24 * 60 * 60;

// Capacity limits. Accounts are allocated once at their maximum size.

pub const MAX_SELECTORS: usize = 32;
pub const MAX_HANDLERS: usize = 8;
pub const MAX_POSITIONS: usize = 16;
pub const MAX_ASSETS: usize = 8;
pub const MAX_YIELD_ASSETS: usize = 4;
pub const MAX_YIELD_ENTRIES: usize = 16;
/// Modules one position can carry; also caps the registry's default-on set
pub const MAX_MODULES_PER_POSITION: usize = 4;
pub const MAX_AUTHORIZATIONS: usize = MAX_POSITIONS * MAX_MODULES_PER_POSITION;
pub const MAX_CONFIG_LEN: usize = 32;
pub const MAX_MODULES: usize = 16;
pub const MAX_KEEPERS: usize = 16;
pub const MAX_TIMELOCK_TRANSACTIONS: usize = 32;

pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default slippage tolerance for module-driven swaps
pub const DEFAULT_MAX_SLIPPAGE_BPS: u16 = 100;

// Tick bounds of the liquidity venue
pub const MIN_TICK: i32 = -443_636;
pub const MAX_TICK: i32 = 443_636;

/// Built-in handler: yield ledger operations
pub const YIELD_HANDLER_ID: Pubkey = pubkey!("6ygBKsKnuFthNtsmMSkebq4YSuSvjLNTM2fjCfjBsEd3");

/// Built-in handler: managed liquidity position operations
pub const POSITION_HANDLER_ID: Pubkey = pubkey!("6FBwT8pcJjnnegzT4aiuq8W9dEPxRKSupgqLyVjjxJui");

/// Human names hashed into registry module ids
pub const IDLE_LIQUIDITY_MODULE: &str = "IdleLiquidityModule";
pub const AUTO_COMPOUND_MODULE: &str = "AutoCompoundModule";

// Handler operation selectors

pub const SEL_DEPOSIT_TO_YIELD: Selector = [0x08, 0xcf, 0x6f, 0xf6];
pub const SEL_WITHDRAW_FROM_YIELD: Selector = [0x52, 0x2d, 0xf9, 0x13];
pub const SEL_YIELD_POSITIONS: Selector = [0x41, 0x27, 0xfd, 0x6b];

pub const SEL_OPEN_POSITION: Selector = [0x87, 0x67, 0x8e, 0xea];
pub const SEL_INCREASE_LIQUIDITY: Selector = [0x83, 0x72, 0x1c, 0xc0];
pub const SEL_COLLECT_FEES: Selector = [0x7a, 0xf8, 0x19, 0x42];
pub const SEL_CLOSE_POSITION: Selector = [0x0c, 0x37, 0xbd, 0x9c];
pub const SEL_SWAP_EXACT_INPUT: Selector = [0xfc, 0x6c, 0xac, 0xf4];
pub const SEL_MANAGED_POSITIONS: Selector = [0x82, 0x4b, 0x69, 0x20];

/// Selectors of the vault's own instructions. These are never routed.
pub const BUILTIN_SELECTORS: [Selector; 8] = [
    [0x20, 0x78, 0xda, 0x05], // create_vault
    [0xfe, 0x4e, 0xa1, 0xff], // update_handler
    [0x5e, 0x34, 0x32, 0xf3], // push_handler
    [0xe7, 0x7f, 0x5b, 0x9f], // invoke
    [0xf1, 0x37, 0x8c, 0x64], // deposit_asset
    [0x94, 0xa4, 0xdd, 0x2d], // withdraw_asset
    [0x9c, 0x43, 0x16, 0x77], // toggle_module
    [0x27, 0xb1, 0x09, 0x4a], // set_module_config
];

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Anchor discriminator of a global instruction: `sha256("global:<name>")[..8]`
pub fn sighash(name: &str) -> [u8; 8] {
    let digest = sha256(format!("global:{}", name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Compute the selector of an operation name
pub fn selector_of(name: &str) -> Selector {
    let digest = sha256(name.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Registry module id: content hash of the module's human name
pub fn module_id(name: &str) -> [u8; 32] {
    sha256(name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_constants_match_names() {
        assert_eq!(selector_of("deposit_to_yield"), SEL_DEPOSIT_TO_YIELD);
        assert_eq!(selector_of("withdraw_from_yield"), SEL_WITHDRAW_FROM_YIELD);
        assert_eq!(selector_of("yield_positions"), SEL_YIELD_POSITIONS);
        assert_eq!(selector_of("open_position"), SEL_OPEN_POSITION);
        assert_eq!(selector_of("increase_liquidity"), SEL_INCREASE_LIQUIDITY);
        assert_eq!(selector_of("collect_fees"), SEL_COLLECT_FEES);
        assert_eq!(selector_of("close_position"), SEL_CLOSE_POSITION);
        assert_eq!(selector_of("swap_exact_input"), SEL_SWAP_EXACT_INPUT);
        assert_eq!(selector_of("managed_positions"), SEL_MANAGED_POSITIONS);
    }

    #[test]
    fn test_builtin_selectors_match_instruction_names() {
        let names = [
            "create_vault",
            "update_handler",
            "push_handler",
            "invoke",
            "deposit_asset",
            "withdraw_asset",
            "toggle_module",
            "set_module_config",
        ];
        for (name, expected) in names.iter().zip(BUILTIN_SELECTORS.iter()) {
            assert_eq!(selector_of(name), *expected, "{}", name);
        }
    }

    #[test]
    fn test_timelock_bounds_are_ordered() {
        assert!(MINIMUM_DELAY < MAXIMUM_DELAY);
        assert!(GRACE_PERIOD > 0);
    }
}
