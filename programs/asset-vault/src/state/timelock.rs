use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;

/// Lifecycle of a queued governance transaction
///
/// A `Queued` transaction whose grace window has passed stays `Queued` but
/// can no longer execute; only `cancel` moves it on.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    Queued { eta: i64 },
    Executed,
    Cancelled,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct TimelockTransaction {
    pub hash: [u8; 32],
    pub state: TransactionState,
}

impl TimelockTransaction {
    /// 32 hash + 1 variant tag + 8 eta
    pub const SPACE: usize = 32 + 1 + 8;
}

/// The fields that identify a timelock transaction
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct TransactionFields {
    /// Program invoked on execution
    pub target: Pubkey,
    /// Lamports moved from the timelock to the first forwarded account
    pub value: u64,
    /// Anchor instruction name; empty means `data` is the raw instruction data
    pub signature: String,
    pub data: Vec<u8>,
    pub eta: i64,
}

impl TransactionFields {
    /// Deterministic id: sha256 of the Borsh encoding of every field
    pub fn hash(&self) -> Result<[u8; 32]> {
        let mut encoded = Vec::new();
        self.serialize(&mut encoded)
            .map_err(|_| error!(VaultError::InvalidCalldata))?;
        Ok(sha256(&encoded))
    }

    /// Instruction data sent to `target` on execution
    pub fn instruction_data(&self) -> Vec<u8> {
        if self.signature.is_empty() {
            return self.data.clone();
        }
        let mut data = sighash(&self.signature).to_vec();
        data.extend_from_slice(&self.data);
        data
    }
}

/// Delayed-execution queue and admin of the governance principal
///
/// The timelock PDA itself is the registry's governance key: registry
/// mutations happen by queuing a call, waiting `delay`, then executing it
/// within the grace window.
#[account]
#[derive(Debug)]
pub struct Timelock {
    pub admin: Pubkey,                          // 32 bytes

    /// Candidate set by the admin during a handoff
    pub pending_admin: Option<Pubkey>,          // 1 + 32 bytes

    /// Candidate has signed `accept_admin_role`
    pub pending_admin_accepted: bool,           // 1 byte

    /// Enforced minimum delay, within [MINIMUM_DELAY, MAXIMUM_DELAY]
    pub delay: i64,                             // 8 bytes

    pub transactions: Vec<TimelockTransaction>, // 4 + (n * 41) bytes

    pub bump: u8,                               // 1 byte
}

impl Timelock {
    pub const SPACE: usize = 8
        + 32
        + 1 + 32
        + 1
        + 8
        + 4 + MAX_TIMELOCK_TRANSACTIONS * TimelockTransaction::SPACE
        + 1;

    pub fn new(admin: Pubkey, delay: i64, bump: u8) -> Result<Self> {
        Self::require_delay_in_bounds(delay)?;
        Ok(Self {
            admin,
            pending_admin: None,
            pending_admin_accepted: false,
            delay,
            transactions: Vec::new(),
            bump,
        })
    }

    fn require_delay_in_bounds(delay: i64) -> Result<()> {
        require!(
            (MINIMUM_DELAY..=MAXIMUM_DELAY).contains(&delay),
            VaultError::DelayOutOfRange
        );
        Ok(())
    }

    pub fn require_admin(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(*signer, self.admin, VaultError::NotAdmin);
        Ok(())
    }

    pub fn set_delay(&mut self, signer: &Pubkey, delay: i64) -> Result<()> {
        self.require_admin(signer)?;
        Self::require_delay_in_bounds(delay)?;
        self.delay = delay;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Two-phase admin handoff
    // ---------------------------------------------------------------------

    pub fn set_pending_admin(&mut self, signer: &Pubkey, candidate: Pubkey) -> Result<()> {
        self.require_admin(signer)?;
        self.pending_admin = Some(candidate);
        self.pending_admin_accepted = false;
        Ok(())
    }

    /// Candidate acknowledges the role. Control does not move yet.
    pub fn accept_admin_role(&mut self, signer: &Pubkey) -> Result<()> {
        require!(
            self.pending_admin == Some(*signer),
            VaultError::NotPendingAdmin
        );
        self.pending_admin_accepted = true;
        Ok(())
    }

    /// Current admin completes the handoff. Returns the new admin.
    pub fn confirm_new_admin(&mut self, signer: &Pubkey) -> Result<Pubkey> {
        self.require_admin(signer)?;
        let candidate = self.pending_admin.ok_or(VaultError::AdminNotAccepted)?;
        require!(self.pending_admin_accepted, VaultError::AdminNotAccepted);

        self.admin = candidate;
        self.pending_admin = None;
        self.pending_admin_accepted = false;
        Ok(candidate)
    }

    // ---------------------------------------------------------------------
    // Queue
    // ---------------------------------------------------------------------

    pub fn state_of(&self, hash: &[u8; 32]) -> Option<TransactionState> {
        self.transactions
            .iter()
            .find(|t| t.hash == *hash)
            .map(|t| t.state)
    }

    pub fn queue_transaction(
        &mut self,
        signer: &Pubkey,
        fields: &TransactionFields,
        now: i64,
    ) -> Result<[u8; 32]> {
        self.require_admin(signer)?;
        let earliest = now.checked_add(self.delay).ok_or(VaultError::MathOverflow)?;
        require!(fields.eta >= earliest, VaultError::DelayOutOfRange);

        let tx_hash = fields.hash()?;
        let queued = TransactionState::Queued { eta: fields.eta };

        if let Some(existing) = self.transactions.iter_mut().find(|t| t.hash == tx_hash) {
            require!(
                !matches!(existing.state, TransactionState::Queued { .. }),
                VaultError::TransactionAlreadyQueued
            );
            existing.state = queued;
            return Ok(tx_hash);
        }

        if self.transactions.len() >= MAX_TIMELOCK_TRANSACTIONS {
            // Finished records are only kept while there is room for them
            self.transactions
                .retain(|t| matches!(t.state, TransactionState::Queued { .. }));
        }
        require!(
            self.transactions.len() < MAX_TIMELOCK_TRANSACTIONS,
            VaultError::CapacityExceeded
        );

        self.transactions.push(TimelockTransaction {
            hash: tx_hash,
            state: queued,
        });
        Ok(tx_hash)
    }

    pub fn cancel_transaction(&mut self, signer: &Pubkey, tx_hash: &[u8; 32]) -> Result<()> {
        self.require_admin(signer)?;
        let record = self
            .transactions
            .iter_mut()
            .find(|t| t.hash == *tx_hash)
            .ok_or(VaultError::TransactionNotQueued)?;
        require!(
            matches!(record.state, TransactionState::Queued { .. }),
            VaultError::TransactionNotQueued
        );
        record.state = TransactionState::Cancelled;
        Ok(())
    }

    /// Validate timing and consume the queued record.
    ///
    /// The caller performs the target invocation only after this returns,
    /// so a re-entrant execution of the same transaction finds it consumed.
    pub fn execute_transaction(
        &mut self,
        signer: &Pubkey,
        fields: &TransactionFields,
        now: i64,
    ) -> Result<[u8; 32]> {
        self.require_admin(signer)?;
        let tx_hash = fields.hash()?;

        let record = self
            .transactions
            .iter_mut()
            .find(|t| t.hash == tx_hash)
            .ok_or(VaultError::TransactionNotQueued)?;
        let eta = match record.state {
            TransactionState::Queued { eta } => eta,
            _ => return err!(VaultError::TransactionNotQueued),
        };

        require!(now >= eta, VaultError::TooEarly);
        let deadline = eta.checked_add(GRACE_PERIOD).ok_or(VaultError::MathOverflow)?;
        require!(now <= deadline, VaultError::StaleTransaction);

        record.state = TransactionState::Executed;
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timelock_fits_in_single_allocation() {
        assert!(Timelock::SPACE <= 10_240);
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = TransactionFields {
            target: Pubkey::new_unique(),
            value: 0,
            signature: "switch_module_state".to_string(),
            data: vec![1, 2, 3],
            eta: 1_000,
        };
        let mut later = base.clone();
        later.eta += 1;
        let mut other_data = base.clone();
        other_data.data.push(4);

        assert_eq!(base.hash().unwrap(), base.clone().hash().unwrap());
        assert_ne!(base.hash().unwrap(), later.hash().unwrap());
        assert_ne!(base.hash().unwrap(), other_data.hash().unwrap());
    }

    #[test]
    fn test_instruction_data_prefixes_sighash() {
        let mut fields = TransactionFields {
            target: Pubkey::new_unique(),
            value: 0,
            signature: String::new(),
            data: vec![7, 7],
            eta: 0,
        };
        assert_eq!(fields.instruction_data(), vec![7, 7]);

        fields.signature = "add_keeper".to_string();
        let data = fields.instruction_data();
        assert_eq!(data.len(), 10);
        assert_eq!(&data[8..], &[7, 7]);
    }

    #[test]
    fn test_new_rejects_out_of_range_delay() {
        assert!(Timelock::new(Pubkey::new_unique(), MINIMUM_DELAY - 1, 255).is_err());
        assert!(Timelock::new(Pubkey::new_unique(), MAXIMUM_DELAY + 1, 255).is_err());
        assert!(Timelock::new(Pubkey::new_unique(), MINIMUM_DELAY, 255).is_ok());
    }
}
