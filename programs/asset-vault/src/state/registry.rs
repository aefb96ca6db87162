use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;

/// Registry entry for one automation module
///
/// `id` never changes once created; address, config and flags may.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct ModuleRecord {
    /// Content hash of the module's human name
    pub id: [u8; 32],               // 32 bytes

    pub address: Pubkey,            // 32 bytes

    /// Config handed to positions the module is enabled on by default
    pub default_config: Vec<u8>,    // 4 + up to MAX_CONFIG_LEN bytes

    /// Whether keepers may currently drive this module
    pub active: bool,               // 1 byte

    /// Whether newly opened positions enable this module automatically
    pub default_active: bool,       // 1 byte
}

impl ModuleRecord {
    pub const SPACE: usize = 32 + 32 + 4 + MAX_CONFIG_LEN + 1 + 1;
}

/// Read-only view returned by `get_module_info`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct ModuleInfo {
    pub address: Pubkey,
    pub active: bool,
    pub default_config: Vec<u8>,
    pub default_active: bool,
}

/// Global module directory, keeper whitelist and venue addresses
///
/// Every mutation is gated by `governance`, which is the timelock PDA in
/// production so that changes go through the queued-delay process.
#[account]
#[derive(Debug)]
pub struct ModuleRegistry {
    pub governance: Pubkey,             // 32 bytes

    /// Concentrated-liquidity venue program
    pub liquidity_venue: Pubkey,        // 32 bytes

    /// Lending venue program backing the yield ledgers
    pub yield_venue: Pubkey,            // 32 bytes

    pub modules: Vec<ModuleRecord>,     // 4 + (n * ModuleRecord::SPACE)

    pub keepers: Vec<Pubkey>,           // 4 + (n * 32)

    pub bump: u8,                       // 1 byte
}

impl ModuleRegistry {
    pub const SPACE: usize = 8
        + 32 + 32 + 32
        + 4 + MAX_MODULES * ModuleRecord::SPACE
        + 4 + MAX_KEEPERS * 32
        + 1;

    pub fn new(governance: Pubkey, liquidity_venue: Pubkey, yield_venue: Pubkey, bump: u8) -> Self {
        Self {
            governance,
            liquidity_venue,
            yield_venue,
            modules: Vec::new(),
            keepers: Vec::new(),
            bump,
        }
    }

    pub fn require_governance(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(*signer, self.governance, VaultError::NotGovernance);
        Ok(())
    }

    pub fn module(&self, id: &[u8; 32]) -> Option<&ModuleRecord> {
        self.modules.iter().find(|m| m.id == *id)
    }

    fn module_mut(&mut self, id: &[u8; 32]) -> Result<&mut ModuleRecord> {
        self.modules
            .iter_mut()
            .find(|m| m.id == *id)
            .ok_or_else(|| error!(VaultError::ModuleNotFound))
    }

    /// Module that exists and is currently active
    pub fn active_module(&self, id: &[u8; 32]) -> Result<&ModuleRecord> {
        let module = self.module(id).ok_or(VaultError::ModuleNotFound)?;
        require!(module.active, VaultError::ModuleInactive);
        Ok(module)
    }

    /// Add a module. New records start active.
    pub fn add_new_contract(
        &mut self,
        signer: &Pubkey,
        id: [u8; 32],
        address: Pubkey,
        default_config: Vec<u8>,
        default_active: bool,
    ) -> Result<()> {
        self.require_governance(signer)?;
        require!(self.module(&id).is_none(), VaultError::ModuleExists);
        require!(
            default_config.len() <= MAX_CONFIG_LEN,
            VaultError::ConfigTooLong
        );
        require!(self.modules.len() < MAX_MODULES, VaultError::CapacityExceeded);
        if default_active {
            self.require_default_slot(&id)?;
        }

        self.modules.push(ModuleRecord {
            id,
            address,
            default_config,
            active: true,
            default_active,
        });
        Ok(())
    }

    /// Point a module at a new address, preserving config and flags
    pub fn change_contract(&mut self, signer: &Pubkey, id: &[u8; 32], address: Pubkey) -> Result<()> {
        self.require_governance(signer)?;
        self.module_mut(id)?.address = address;
        Ok(())
    }

    pub fn switch_module_state(&mut self, signer: &Pubkey, id: &[u8; 32], active: bool) -> Result<()> {
        self.require_governance(signer)?;
        if active && self.module(id).is_some_and(|m| m.default_active) {
            self.require_default_slot(id)?;
        }
        self.module_mut(id)?.active = active;
        Ok(())
    }

    pub fn set_default_config(
        &mut self,
        signer: &Pubkey,
        id: &[u8; 32],
        default_config: Vec<u8>,
    ) -> Result<()> {
        self.require_governance(signer)?;
        require!(
            default_config.len() <= MAX_CONFIG_LEN,
            VaultError::ConfigTooLong
        );
        self.module_mut(id)?.default_config = default_config;
        Ok(())
    }

    pub fn set_default_activation(
        &mut self,
        signer: &Pubkey,
        id: &[u8; 32],
        default_active: bool,
    ) -> Result<()> {
        self.require_governance(signer)?;
        if default_active && self.module(id).is_some_and(|m| m.active) {
            self.require_default_slot(id)?;
        }
        self.module_mut(id)?.default_active = default_active;
        Ok(())
    }

    pub fn get_module_info(&self, id: &[u8; 32]) -> Result<ModuleInfo> {
        let module = self.module(id).ok_or(VaultError::ModuleNotFound)?;
        Ok(ModuleInfo {
            address: module.address,
            active: module.active,
            default_config: module.default_config.clone(),
            default_active: module.default_active,
        })
    }

    /// Modules that newly opened positions enable automatically
    pub fn default_modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.iter().filter(|m| m.active && m.default_active)
    }

    /// Newly opened positions must have room for every default-on module
    fn require_default_slot(&self, id: &[u8; 32]) -> Result<()> {
        let others = self.default_modules().filter(|m| m.id != *id).count();
        require!(
            others < MAX_MODULES_PER_POSITION,
            VaultError::CapacityExceeded
        );
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Keepers
    // ---------------------------------------------------------------------

    pub fn is_keeper(&self, keeper: &Pubkey) -> bool {
        self.keepers.contains(keeper)
    }

    pub fn require_keeper(&self, keeper: &Pubkey) -> Result<()> {
        require!(self.is_keeper(keeper), VaultError::NotWhitelistedKeeper);
        Ok(())
    }

    pub fn add_keeper(&mut self, signer: &Pubkey, keeper: Pubkey) -> Result<()> {
        self.require_governance(signer)?;
        if self.is_keeper(&keeper) {
            return Ok(());
        }
        require!(self.keepers.len() < MAX_KEEPERS, VaultError::CapacityExceeded);
        self.keepers.push(keeper);
        Ok(())
    }

    pub fn remove_keeper(&mut self, signer: &Pubkey, keeper: &Pubkey) -> Result<()> {
        self.require_governance(signer)?;
        self.keepers.retain(|k| k != keeper);
        Ok(())
    }

    pub fn change_governance(&mut self, signer: &Pubkey, governance: Pubkey) -> Result<()> {
        self.require_governance(signer)?;
        self.governance = governance;
        Ok(())
    }

    pub fn set_venues(
        &mut self,
        signer: &Pubkey,
        liquidity_venue: Pubkey,
        yield_venue: Pubkey,
    ) -> Result<()> {
        self.require_governance(signer)?;
        self.liquidity_venue = liquidity_venue;
        self.yield_venue = yield_venue;
        Ok(())
    }
}
