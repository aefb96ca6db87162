use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;
use crate::state::{DispatchTable, ModuleRegistry, YieldLedger};

/// Internal custody balance for one mint
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct AssetBalance {
    pub mint: Pubkey,
    pub amount: u64,
}

/// Owner-granted permission for a module to act on one managed position
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct ModuleAuthorization {
    pub position_id: u64,
    pub module: Pubkey,
    pub enabled: bool,
    pub config: Vec<u8>,
}

impl ModuleAuthorization {
    pub const SPACE: usize = 8 + 32 + 1 + 4 + MAX_CONFIG_LEN;
}

/// Per-owner vault
///
/// Handlers bound in `dispatch` run against this account's state; they
/// bring logic, never storage of their own.
#[account]
#[derive(Debug)]
pub struct Vault {
    /// Owner who controls dispatch, custody and module authorizations
    pub owner: Pubkey,          // 32 bytes

    /// Module registry this vault trusts for modules, keepers and venues
    pub registry: Pubkey,       // 32 bytes

    /// Bump seed for vault PDA
    pub bump: u8,               // 1 byte

    /// Set while a routed handler call is in flight
    pub locked: bool,           // 1 byte

    /// Next yield entry id (monotonic per vault)
    pub next_yield_entry_id: u64, // 8 bytes

    pub dispatch: DispatchTable,

    /// Managed venue positions, in the order they were opened
    pub positions: Vec<u64>,

    pub balances: Vec<AssetBalance>,

    pub yield_ledgers: Vec<YieldLedger>,

    pub authorizations: Vec<ModuleAuthorization>,

    // Padding for future upgrades
    pub _reserved: [u8; 64],
}

impl Vault {
    pub const SPACE: usize = 8 // discriminator
        + 32 + 32 + 1 + 1 + 8
        + DispatchTable::SPACE
        + 4 + MAX_POSITIONS * 8
        + 4 + MAX_ASSETS * (32 + 8)
        + 4 + MAX_YIELD_ASSETS * YieldLedger::SPACE
        + 4 + MAX_AUTHORIZATIONS * ModuleAuthorization::SPACE
        + 64;

    pub fn new(owner: Pubkey, registry: Pubkey, bump: u8) -> Self {
        Self {
            owner,
            registry,
            bump,
            locked: false,
            next_yield_entry_id: 0,
            dispatch: DispatchTable::default(),
            positions: Vec::new(),
            balances: Vec::new(),
            yield_ledgers: Vec::new(),
            authorizations: Vec::new(),
            _reserved: [0; 64],
        }
    }

    pub fn require_owner(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(*signer, self.owner, VaultError::NotOwner);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reentrancy guard
    // ---------------------------------------------------------------------

    pub fn lock(&mut self) -> Result<()> {
        require!(!self.locked, VaultError::Reentrancy);
        self.locked = true;
        Ok(())
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    // ---------------------------------------------------------------------
    // Custody balances
    // ---------------------------------------------------------------------

    pub fn balance_of(&self, mint: &Pubkey) -> u64 {
        self.balances
            .iter()
            .find(|b| b.mint == *mint)
            .map(|b| b.amount)
            .unwrap_or(0)
    }

    pub fn credit(&mut self, mint: &Pubkey, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        match self.balances.iter_mut().find(|b| b.mint == *mint) {
            Some(balance) => {
                balance.amount = balance
                    .amount
                    .checked_add(amount)
                    .ok_or(VaultError::MathOverflow)?;
            }
            None => {
                require!(self.balances.len() < MAX_ASSETS, VaultError::CapacityExceeded);
                self.balances.push(AssetBalance {
                    mint: *mint,
                    amount,
                });
            }
        }
        Ok(())
    }

    pub fn debit(&mut self, mint: &Pubkey, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self
            .balances
            .iter_mut()
            .find(|b| b.mint == *mint)
            .ok_or(VaultError::InsufficientBalance)?;
        balance.amount = balance
            .amount
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientBalance)?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Managed positions
    // ---------------------------------------------------------------------

    pub fn owns_position(&self, position_id: u64) -> bool {
        self.positions.contains(&position_id)
    }

    pub fn require_position(&self, position_id: u64) -> Result<()> {
        require!(self.owns_position(position_id), VaultError::PositionNotFound);
        Ok(())
    }

    pub fn track_position(&mut self, position_id: u64) -> Result<()> {
        if self.owns_position(position_id) {
            return Ok(());
        }
        require!(
            self.positions.len() < MAX_POSITIONS,
            VaultError::CapacityExceeded
        );
        self.positions.push(position_id);
        Ok(())
    }

    /// Forget a position and every module authorization attached to it
    pub fn untrack_position(&mut self, position_id: u64) -> Result<()> {
        let index = self
            .positions
            .iter()
            .position(|id| *id == position_id)
            .ok_or(VaultError::PositionNotFound)?;
        self.positions.remove(index);
        self.authorizations.retain(|a| a.position_id != position_id);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Module authorizations
    // ---------------------------------------------------------------------

    pub fn authorization(&self, position_id: u64, module: &Pubkey) -> Option<&ModuleAuthorization> {
        self.authorizations
            .iter()
            .find(|a| a.position_id == position_id && a.module == *module)
    }

    /// Insert or update an authorization. `config = None` keeps the stored
    /// config (or empty bytes for a new entry).
    pub fn set_authorization(
        &mut self,
        position_id: u64,
        module: Pubkey,
        enabled: bool,
        config: Option<Vec<u8>>,
    ) -> Result<()> {
        if let Some(config) = &config {
            require!(config.len() <= MAX_CONFIG_LEN, VaultError::ConfigTooLong);
        }

        match self
            .authorizations
            .iter_mut()
            .find(|a| a.position_id == position_id && a.module == module)
        {
            Some(existing) => {
                existing.enabled = enabled;
                if let Some(config) = config {
                    existing.config = config;
                }
            }
            None => {
                let held = self
                    .authorizations
                    .iter()
                    .filter(|a| a.position_id == position_id)
                    .count();
                require!(
                    held < MAX_MODULES_PER_POSITION
                        && self.authorizations.len() < MAX_AUTHORIZATIONS,
                    VaultError::CapacityExceeded
                );
                self.authorizations.push(ModuleAuthorization {
                    position_id,
                    module,
                    enabled,
                    config: config.unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    pub fn authorizations_of(&self, position_id: u64) -> Vec<ModuleAuthorization> {
        self.authorizations
            .iter()
            .filter(|a| a.position_id == position_id)
            .cloned()
            .collect()
    }

    /// Re-attach a snapshot of authorizations to `position_id`, overriding
    /// whatever the position was given on open
    pub fn restore_authorizations(
        &mut self,
        position_id: u64,
        snapshot: Vec<ModuleAuthorization>,
    ) -> Result<()> {
        for authorization in snapshot {
            self.set_authorization(
                position_id,
                authorization.module,
                authorization.enabled,
                Some(authorization.config),
            )?;
        }
        Ok(())
    }

    /// Owner enables or disables a registered module for one position.
    /// A first-time grant starts from the module's default config.
    pub fn toggle_module(
        &mut self,
        registry: &ModuleRegistry,
        position_id: u64,
        module_id: &[u8; 32],
        enabled: bool,
    ) -> Result<Pubkey> {
        let record = registry.module(module_id).ok_or(VaultError::ModuleNotFound)?;
        if enabled {
            require!(record.active, VaultError::ModuleInactive);
        }
        self.require_position(position_id)?;

        let config = match self.authorization(position_id, &record.address) {
            Some(_) => None,
            None => Some(record.default_config.clone()),
        };
        self.set_authorization(position_id, record.address, enabled, config)?;
        Ok(record.address)
    }

    pub fn set_module_config(
        &mut self,
        registry: &ModuleRegistry,
        position_id: u64,
        module_id: &[u8; 32],
        config: Vec<u8>,
    ) -> Result<Pubkey> {
        let record = registry.module(module_id).ok_or(VaultError::ModuleNotFound)?;
        self.require_position(position_id)?;

        let enabled = self
            .authorization(position_id, &record.address)
            .map(|a| a.enabled)
            .unwrap_or(false);
        self.set_authorization(position_id, record.address, enabled, Some(config))?;
        Ok(record.address)
    }

    // ---------------------------------------------------------------------
    // Yield ledgers
    // ---------------------------------------------------------------------

    pub fn yield_ledger(&self, asset: &Pubkey) -> Option<&YieldLedger> {
        self.yield_ledgers.iter().find(|l| l.asset == *asset)
    }

    pub fn yield_ledger_mut(&mut self, asset: &Pubkey) -> Result<&mut YieldLedger> {
        self.yield_ledgers
            .iter_mut()
            .find(|l| l.asset == *asset)
            .ok_or_else(|| error!(VaultError::PositionNotFound))
    }

    pub fn yield_ledger_or_insert(&mut self, asset: &Pubkey) -> Result<&mut YieldLedger> {
        if self.yield_ledger(asset).is_none() {
            require!(
                self.yield_ledgers.len() < MAX_YIELD_ASSETS,
                VaultError::CapacityExceeded
            );
            self.yield_ledgers.push(YieldLedger::new(*asset));
        }
        self.yield_ledger_mut(asset)
    }

    pub fn allocate_yield_entry_id(&mut self) -> Result<u64> {
        let id = self.next_yield_entry_id;
        self.next_yield_entry_id = id.checked_add(1).ok_or(VaultError::MathOverflow)?;
        Ok(id)
    }
}
