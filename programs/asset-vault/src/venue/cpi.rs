use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::{get_return_data, invoke, invoke_signed};
use anchor_spl::associated_token::get_associated_token_address;
use anchor_spl::token::{self, TokenAccount};

use crate::constants::sighash;
use crate::errors::VaultError;
use crate::venue::*;

/// CPI into an Anchor-style venue program
///
/// The vault PDA is passed first. It signs state-changing calls and is a
/// plain readonly account on queries. The instruction's remaining accounts
/// are forwarded as-is. Results come back as program return data.
pub struct VenueCpi<'a, 'info> {
    program: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    accounts: &'a [AccountInfo<'info>],
    signer_seeds: &'a [&'a [&'a [u8]]],
}

impl<'a, 'info> VenueCpi<'a, 'info> {
    pub fn new(
        program: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        accounts: &'a [AccountInfo<'info>],
        signer_seeds: &'a [&'a [&'a [u8]]],
    ) -> Self {
        Self {
            program,
            authority,
            accounts,
            signer_seeds,
        }
    }

    /// Venue access that never signs for the vault
    pub fn unsigned(
        program: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        accounts: &'a [AccountInfo<'info>],
    ) -> Self {
        Self::new(program, authority, accounts, &[])
    }

    fn instruction<A: AnchorSerialize>(&self, name: &str, args: &A, signed: bool) -> Result<Instruction> {
        let mut data = sighash(name).to_vec();
        args.serialize(&mut data)
            .map_err(|_| error!(VaultError::InvalidCalldata))?;

        let mut metas = Vec::with_capacity(self.accounts.len() + 1);
        metas.push(AccountMeta::new_readonly(*self.authority.key, signed));
        for acc in self.accounts {
            metas.push(if acc.is_writable {
                AccountMeta::new(*acc.key, acc.is_signer)
            } else {
                AccountMeta::new_readonly(*acc.key, acc.is_signer)
            });
        }

        Ok(Instruction {
            program_id: *self.program.key,
            accounts: metas,
            data,
        })
    }

    fn account_infos(&self) -> Vec<AccountInfo<'info>> {
        let mut infos = Vec::with_capacity(self.accounts.len() + 2);
        infos.push(self.authority.clone());
        infos.extend_from_slice(self.accounts);
        infos.push(self.program.clone());
        infos
    }

    /// State-changing call, signed by the vault when seeds are available
    fn execute<A: AnchorSerialize>(&self, name: &str, args: &A) -> Result<()> {
        let signed = !self.signer_seeds.is_empty();
        let ix = self.instruction(name, args, signed)?;
        invoke_signed(&ix, &self.account_infos(), self.signer_seeds)?;
        Ok(())
    }

    fn call<A: AnchorSerialize, R: AnchorDeserialize>(&self, name: &str, args: &A) -> Result<R> {
        self.execute(name, args)?;
        self.return_data()
    }

    /// Read-only call: the vault is passed but never signs
    fn query<A: AnchorSerialize, R: AnchorDeserialize>(&self, name: &str, args: &A) -> Result<R> {
        let ix = self.instruction(name, args, false)?;
        invoke(&ix, &self.account_infos())?;
        self.return_data()
    }

    fn return_data<R: AnchorDeserialize>(&self) -> Result<R> {
        let (program_id, data) = get_return_data().ok_or(VaultError::InvalidReturnData)?;
        require_keys_eq!(program_id, *self.program.key, VaultError::InvalidReturnData);
        R::try_from_slice(&data).map_err(|_| error!(VaultError::InvalidReturnData))
    }

    fn custody(&self) -> Custody<'a, 'info> {
        Custody::new(*self.authority.key, self.accounts)
    }
}

/// The vault's associated token accounts among the forwarded accounts
///
/// Venues pay into and pull from these accounts only. Balances are read
/// around every token-moving call, so the internal ledger never records an
/// amount that did not actually arrive in (or leave) vault custody.
pub struct Custody<'a, 'info> {
    vault: Pubkey,
    accounts: &'a [AccountInfo<'info>],
}

impl<'a, 'info> Custody<'a, 'info> {
    pub fn new(vault: Pubkey, accounts: &'a [AccountInfo<'info>]) -> Self {
        Self { vault, accounts }
    }

    /// Balance of the vault's associated token account for `mint`
    pub fn balance(&self, mint: &Pubkey) -> Result<u64> {
        let address = get_associated_token_address(&self.vault, mint);
        let info = self
            .accounts
            .iter()
            .find(|acc| *acc.key == address)
            .ok_or(VaultError::MissingCustodyAccount)?;
        require_keys_eq!(*info.owner, token::ID, VaultError::InvalidOwner);

        let data = info.try_borrow_data()?;
        let account = TokenAccount::try_deserialize(&mut &data[..])?;
        require_keys_eq!(account.mint, *mint, VaultError::InvalidMint);
        require_keys_eq!(account.owner, self.vault, VaultError::InvalidOwner);
        Ok(account.amount)
    }

    /// Run `op`, then require each mint's balance to have moved by at least
    /// what `reported` derives from the result. Inflows are positive.
    pub fn settle<R, const N: usize>(
        &self,
        mints: [Pubkey; N],
        op: impl FnOnce() -> Result<R>,
        reported: impl FnOnce(&R) -> [i128; N],
    ) -> Result<R> {
        let mut before = [0u64; N];
        for (slot, mint) in before.iter_mut().zip(mints.iter()) {
            *slot = self.balance(mint)?;
        }

        let result = op()?;

        let expected = reported(&result);
        for ((mint, before), expected) in mints.iter().zip(before).zip(expected) {
            check_settlement(before, self.balance(mint)?, expected)?;
        }
        Ok(result)
    }
}

/// A venue may not report a payout that never arrived, nor take more than
/// it reported consuming
pub fn check_settlement(before: u64, after: u64, expected: i128) -> Result<()> {
    let observed = after as i128 - before as i128;
    require!(observed >= expected, VaultError::CustodyMismatch);
    Ok(())
}

fn inflow(amount: u64) -> i128 {
    amount as i128
}

fn outflow(amount: u64) -> i128 {
    -(amount as i128)
}

/// `LiquidityVenue` backed by CPI into the registry's liquidity venue
pub struct CpiLiquidityVenue<'a, 'info> {
    cpi: VenueCpi<'a, 'info>,
}

impl<'a, 'info> CpiLiquidityVenue<'a, 'info> {
    pub fn new(cpi: VenueCpi<'a, 'info>) -> Self {
        Self { cpi }
    }

    fn pool_tokens_of(&self, position_id: u64) -> Result<[Pubkey; 2]> {
        let info = self.position(position_id)?;
        let pool = self.pool_state(&info.pool)?;
        Ok([pool.token0, pool.token1])
    }
}

impl<'a, 'info> LiquidityVenue for CpiLiquidityVenue<'a, 'info> {
    fn pool_state(&self, pool: &Pubkey) -> Result<PoolState> {
        self.cpi.query("pool_state", pool)
    }

    fn position(&self, position_id: u64) -> Result<PositionInfo> {
        self.cpi.query("position_info", &position_id)
    }

    fn mint(&mut self, params: &MintParams) -> Result<LiquidityReceipt> {
        let pool = self.pool_state(&params.pool)?;
        self.cpi.custody().settle(
            [pool.token0, pool.token1],
            || self.cpi.call("mint_position", params),
            |r: &LiquidityReceipt| [outflow(r.amount0), outflow(r.amount1)],
        )
    }

    fn increase_liquidity(&mut self, position_id: u64, amount0: u64, amount1: u64) -> Result<LiquidityReceipt> {
        let tokens = self.pool_tokens_of(position_id)?;
        self.cpi.custody().settle(
            tokens,
            || {
                self.cpi
                    .call("increase_liquidity", &(position_id, amount0, amount1))
            },
            |r: &LiquidityReceipt| [outflow(r.amount0), outflow(r.amount1)],
        )
    }

    fn decrease_liquidity(&mut self, position_id: u64, liquidity: u128) -> Result<TokenAmounts> {
        self.cpi.call("decrease_liquidity", &(position_id, liquidity))
    }

    fn collect(&mut self, position_id: u64, amount0_max: u64, amount1_max: u64) -> Result<TokenAmounts> {
        let tokens = self.pool_tokens_of(position_id)?;
        self.cpi.custody().settle(
            tokens,
            || {
                self.cpi
                    .call("collect", &(position_id, amount0_max, amount1_max))
            },
            |r: &TokenAmounts| [inflow(r.amount0), inflow(r.amount1)],
        )
    }

    fn burn(&mut self, position_id: u64) -> Result<()> {
        self.cpi.execute("burn_position", &position_id)
    }

    fn swap_exact_input(
        &mut self,
        pool: &Pubkey,
        zero_for_one: bool,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<u64> {
        let state = self.pool_state(pool)?;
        let (token_in, token_out) = if zero_for_one {
            (state.token0, state.token1)
        } else {
            (state.token1, state.token0)
        };
        self.cpi.custody().settle(
            [token_in, token_out],
            || {
                self.cpi.call(
                    "swap_exact_input",
                    &(*pool, zero_for_one, amount_in, min_amount_out),
                )
            },
            |out: &u64| [outflow(amount_in), inflow(*out)],
        )
    }
}

/// `YieldVenue` backed by CPI into the registry's lending venue
pub struct CpiYieldVenue<'a, 'info> {
    cpi: VenueCpi<'a, 'info>,
}

impl<'a, 'info> CpiYieldVenue<'a, 'info> {
    pub fn new(cpi: VenueCpi<'a, 'info>) -> Self {
        Self { cpi }
    }
}

impl<'a, 'info> YieldVenue for CpiYieldVenue<'a, 'info> {
    fn deposit(&mut self, asset: &Pubkey, amount: u64) -> Result<()> {
        self.cpi.custody().settle(
            [*asset],
            || self.cpi.execute("deposit", &(*asset, amount)),
            |_: &()| [outflow(amount)],
        )
    }

    fn withdraw(&mut self, asset: &Pubkey, amount: u64) -> Result<u64> {
        self.cpi.custody().settle(
            [*asset],
            || self.cpi.call("withdraw", &(*asset, amount)),
            |paid: &u64| [inflow(*paid)],
        )
    }

    fn redeemable_balance(&self, asset: &Pubkey) -> Result<u64> {
        self.cpi.query("redeemable_balance", asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::solana_program::program_pack::Pack;
    use anchor_spl::token::spl_token::state::{Account as SplAccount, AccountState};

    fn token_account_data(mint: Pubkey, owner: Pubkey, amount: u64) -> Vec<u8> {
        let mut data = vec![0u8; SplAccount::LEN];
        let account = SplAccount {
            mint,
            owner,
            amount,
            state: AccountState::Initialized,
            ..SplAccount::default()
        };
        SplAccount::pack(account, &mut data).unwrap();
        data
    }

    fn set_amount(info: &AccountInfo, amount: u64) {
        let mut data = info.try_borrow_mut_data().unwrap();
        let mut account = SplAccount::unpack(&data[..]).unwrap();
        account.amount = amount;
        SplAccount::pack(account, &mut data[..]).unwrap();
    }

    #[test]
    fn test_settlement_requires_observed_change_to_cover_reported() {
        // Payout of 100 reported and received
        assert!(check_settlement(1_000, 1_100, inflow(100)).is_ok());
        // Extra dust arriving is tolerated
        assert!(check_settlement(1_000, 1_101, inflow(100)).is_ok());
        // Reported payout that never arrived
        assert_eq!(
            check_settlement(1_000, 1_000, inflow(100)).unwrap_err(),
            error!(VaultError::CustodyMismatch)
        );
        // Venue took more than it reported consuming
        assert_eq!(
            check_settlement(1_000, 800, outflow(100)).unwrap_err(),
            error!(VaultError::CustodyMismatch)
        );
        assert!(check_settlement(1_000, 900, outflow(100)).is_ok());
    }

    #[test]
    fn test_custody_reads_only_the_vault_associated_account() {
        let vault = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let token_program = token::ID;
        let system_program = Pubkey::default();

        // A token account owned by someone else for the same mint
        let stranger_key = Pubkey::new_unique();
        let mut stranger_lamports = 0u64;
        let mut stranger_data = token_account_data(mint, Pubkey::new_unique(), 5_000);
        let stranger = AccountInfo::new(
            &stranger_key,
            false,
            true,
            &mut stranger_lamports,
            &mut stranger_data,
            &token_program,
            false,
            0,
        );

        let accounts = [stranger.clone()];
        let custody = Custody::new(vault, &accounts);
        assert_eq!(
            custody.balance(&mint).unwrap_err(),
            error!(VaultError::MissingCustodyAccount)
        );

        // The associated address, but not held by the token program
        let ata = get_associated_token_address(&vault, &mint);
        let mut fake_lamports = 0u64;
        let mut fake_data = token_account_data(mint, vault, 5_000);
        let fake = AccountInfo::new(
            &ata,
            false,
            true,
            &mut fake_lamports,
            &mut fake_data,
            &system_program,
            false,
            0,
        );
        let accounts = [stranger.clone(), fake];
        let custody = Custody::new(vault, &accounts);
        assert_eq!(
            custody.balance(&mint).unwrap_err(),
            error!(VaultError::InvalidOwner)
        );

        let mut lamports = 0u64;
        let mut data = token_account_data(mint, vault, 750);
        let real = AccountInfo::new(&ata, false, true, &mut lamports, &mut data, &token_program, false, 0);
        let accounts = [stranger, real];
        let custody = Custody::new(vault, &accounts);
        assert_eq!(custody.balance(&mint).unwrap(), 750);
    }

    #[test]
    fn test_settle_rejects_payout_routed_elsewhere() {
        // Security: a reported collect must land in the vault's own account
        let vault = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let token_program = token::ID;
        let ata = get_associated_token_address(&vault, &mint);

        let mut lamports = 0u64;
        let mut data = token_account_data(mint, vault, 1_000);
        let info = AccountInfo::new(&ata, false, true, &mut lamports, &mut data, &token_program, false, 0);
        let accounts = [info];
        let custody = Custody::new(vault, &accounts);

        // Venue reports 300 paid but the vault account never moves
        let diverted = custody.settle([mint], || Ok(300u64), |paid| [inflow(*paid)]);
        assert_eq!(diverted.unwrap_err(), error!(VaultError::CustodyMismatch));

        // Venue reports 300 and the vault account receives it
        let paid = custody
            .settle(
                [mint],
                || {
                    set_amount(&accounts[0], 1_300);
                    Ok(300u64)
                },
                |paid| [inflow(*paid)],
            )
            .unwrap();
        assert_eq!(paid, 300);
    }

    #[test]
    fn test_vault_signs_only_state_changing_calls() {
        let program_key = Pubkey::new_unique();
        let vault_key = Pubkey::new_unique();
        let owner = Pubkey::default();
        let mut program_lamports = 0u64;
        let mut program_data = vec![];
        let mut vault_lamports = 0u64;
        let mut vault_data = vec![];
        let program = AccountInfo::new(
            &program_key,
            false,
            false,
            &mut program_lamports,
            &mut program_data,
            &owner,
            true,
            0,
        );
        let vault = AccountInfo::new(&vault_key, false, true, &mut vault_lamports, &mut vault_data, &owner, false, 0);
        let seeds: &[&[u8]] = &[b"vault"];
        let signer_seeds = &[seeds];

        let signed = VenueCpi::new(program.clone(), vault.clone(), &[], signer_seeds);
        let ix = signed.instruction("collect", &7u64, !signed.signer_seeds.is_empty()).unwrap();
        assert_eq!(ix.accounts[0].pubkey, vault_key);
        assert!(ix.accounts[0].is_signer);
        assert!(!ix.accounts[0].is_writable);
        assert_eq!(&ix.data[..8], &sighash("collect"));

        // Queries never carry the vault signature, even with seeds at hand
        let ix = signed.instruction("position_info", &7u64, false).unwrap();
        assert!(!ix.accounts[0].is_signer);

        // Permissionless paths hold no seeds at all
        let unsigned = VenueCpi::unsigned(program, vault, &[]);
        assert!(unsigned.signer_seeds.is_empty());
        let ix = unsigned.instruction("collect", &7u64, !unsigned.signer_seeds.is_empty()).unwrap();
        assert!(!ix.accounts[0].is_signer);
    }
}
