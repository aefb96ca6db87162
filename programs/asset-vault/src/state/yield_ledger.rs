use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;

/// One pooled deposit into the lending venue
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct YieldEntry {
    pub id: u64,
    pub shares: u64,
    pub created_at: i64,
}

impl YieldEntry {
    pub const SPACE: usize = 8 + 8 + 8;
}

/// Shares ledger for a single asset deposited into the lending venue
///
/// Share price is `total_underlying / total_shares`. Interest accrues in the
/// venue, so `total_underlying` must be reconciled with the venue's
/// redeemable balance (`sync`) before shares or payouts are priced.
///
/// Invariants:
/// - sum of `entries[..].shares` == `total_shares`
/// - entries stay in insertion order
/// - share and payout math round down, in favour of the ledger
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct YieldLedger {
    pub asset: Pubkey,
    pub total_shares: u64,
    pub total_underlying: u64,
    pub entries: Vec<YieldEntry>,
}

impl YieldLedger {
    /// 32 asset + 8 total_shares + 8 total_underlying + 4 (vec len) + entries
    pub const SPACE: usize = 32 + 8 + 8 + 4 + MAX_YIELD_ENTRIES * YieldEntry::SPACE;

    pub fn new(asset: Pubkey) -> Self {
        Self {
            asset,
            total_shares: 0,
            total_underlying: 0,
            entries: Vec::new(),
        }
    }

    /// Reconcile with the venue's redeemable balance for this asset
    pub fn sync(&mut self, redeemable: u64) {
        self.total_underlying = redeemable;
    }

    /// Shares minted for `principal`
    ///
    /// Formula:
    /// - Empty ledger: shares = principal (1:1 bootstrap)
    /// - Otherwise: shares = floor(principal * total_shares / total_underlying)
    pub fn calculate_shares(&self, principal: u64) -> Result<u64> {
        if self.total_shares == 0 || self.total_underlying == 0 {
            return Ok(principal);
        }

        let shares_u128 = (principal as u128)
            .checked_mul(self.total_shares as u128)
            .ok_or(error!(VaultError::MathOverflow))?
            .checked_div(self.total_underlying as u128)
            .ok_or(error!(VaultError::MathOverflow))?;

        u64::try_from(shares_u128).map_err(|_| error!(VaultError::MathOverflow))
    }

    /// Underlying owed for `shares`: floor(shares * total_underlying / total_shares)
    pub fn calculate_underlying(&self, shares: u64) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(0);
        }

        let owed_u128 = (shares as u128)
            .checked_mul(self.total_underlying as u128)
            .ok_or(error!(VaultError::MathOverflow))?
            .checked_div(self.total_shares as u128)
            .ok_or(error!(VaultError::MathOverflow))?;

        u64::try_from(owed_u128).map_err(|_| error!(VaultError::MathOverflow))
    }

    /// Record a new deposit of `principal`. Returns the minted shares.
    pub fn push_position(&mut self, id: u64, principal: u64, now: i64) -> Result<u64> {
        require!(principal > 0, VaultError::ZeroAmount);
        require!(
            self.entries.len() < MAX_YIELD_ENTRIES,
            VaultError::CapacityExceeded
        );

        let shares = self.calculate_shares(principal)?;
        require!(shares > 0, VaultError::InsufficientShares);

        let total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;
        let total_underlying = self
            .total_underlying
            .checked_add(principal)
            .ok_or(VaultError::MathOverflow)?;

        self.total_shares = total_shares;
        self.total_underlying = total_underlying;
        self.entries.push(YieldEntry {
            id,
            shares,
            created_at: now,
        });

        Ok(shares)
    }

    /// Remove entry `id`. Returns the removed entry and the underlying owed.
    pub fn remove_position(&mut self, id: u64) -> Result<(YieldEntry, u64)> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(VaultError::PositionNotFound)?;

        let shares = self.entries[index].shares;
        require!(shares <= self.total_shares, VaultError::InsufficientShares);

        let owed = self.calculate_underlying(shares)?;

        self.total_shares -= shares;
        self.total_underlying = self
            .total_underlying
            .checked_sub(owed)
            .ok_or(VaultError::InsufficientShares)?;

        // Vec::remove keeps the relative order of the remaining entries
        let entry = self.entries.remove(index);
        Ok((entry, owed))
    }

    pub fn positions(&self) -> &[YieldEntry] {
        &self.entries
    }
}
