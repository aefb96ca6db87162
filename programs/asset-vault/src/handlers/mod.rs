//! Dispatch strategy table
//!
//! A handler contributes logic only: it is a stateless object that runs
//! against the calling vault's account, balances and venues. Vault dispatch
//! tables bind selectors to handler ids; the ids resolve here.

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;
use crate::state::{DispatchTable, HandlerAction, ModuleRegistry, Vault};
use crate::venue::{LiquidityVenue, YieldVenue};

pub mod position_handler;
pub mod yield_handler;

pub use position_handler::*;
pub use yield_handler::*;

/// Who is driving a routed call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Caller {
    Owner,
    /// Registry module acting for a keeper
    Module(Pubkey),
}

/// Everything a handler may touch during one routed call
pub struct HandlerCall<'a> {
    pub vault_key: Pubkey,
    pub vault: &'a mut Vault,
    pub registry: &'a ModuleRegistry,
    pub liquidity: &'a mut dyn LiquidityVenue,
    pub lending: &'a mut dyn YieldVenue,
    pub caller: Caller,
    pub now: i64,
}

pub trait Handler {
    fn id(&self) -> Pubkey;

    /// Selectors bound when this handler bootstraps a vault
    fn selectors(&self) -> &'static [Selector];

    /// Run `selector` with Borsh-encoded `data`; returns the Borsh-encoded result
    fn execute(&self, call: &mut HandlerCall<'_>, selector: Selector, data: &[u8]) -> Result<Vec<u8>>;
}

static YIELD_HANDLER: YieldHandler = YieldHandler;
static POSITION_HANDLER: PositionHandler = PositionHandler;

/// Handler implementation deployed under `id`
pub fn lookup(id: &Pubkey) -> Option<&'static dyn Handler> {
    let catalogue: [&'static dyn Handler; 2] = [&YIELD_HANDLER, &POSITION_HANDLER];
    catalogue.into_iter().find(|h| h.id() == *id)
}

/// `DispatchTable::update` restricted to handlers this program can run
pub fn update_dispatch(
    table: &mut DispatchTable,
    handler: Pubkey,
    action: HandlerAction,
    selectors: &[Selector],
) -> Result<()> {
    if action != HandlerAction::Remove {
        require!(lookup(&handler).is_some(), VaultError::InvalidBatch);
    }
    table.update(handler, action, selectors)
}

/// Bind every selector of the bootstrap handler; `Pubkey::default()` binds nothing
pub fn bootstrap_dispatch(table: &mut DispatchTable, handler: Pubkey) -> Result<()> {
    if handler == Pubkey::default() {
        return Ok(());
    }
    let bootstrap = lookup(&handler).ok_or(VaultError::InvalidBatch)?;
    table.push(handler, bootstrap.selectors())
}

/// Resolve `selector` through the vault's dispatch table and run the handler.
///
/// The vault stays locked for the duration of the call, so a nested route
/// fails with `Reentrancy`. The lock is released on both outcomes.
pub fn route(call: &mut HandlerCall<'_>, selector: Selector, data: &[u8]) -> Result<Vec<u8>> {
    let handler_id = call.vault.dispatch.route(&selector)?;
    let handler = lookup(&handler_id).ok_or(VaultError::NoHandler)?;

    call.vault.lock()?;
    let result = handler.execute(call, selector, data);
    call.vault.unlock();
    result
}

pub fn encode<T: AnchorSerialize>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    value
        .serialize(&mut out)
        .map_err(|_| error!(VaultError::InvalidCalldata))?;
    Ok(out)
}

pub fn decode<T: AnchorDeserialize>(data: &[u8]) -> Result<T> {
    T::try_from_slice(data).map_err(|_| error!(VaultError::InvalidCalldata))
}

/// Encode `args`, route them, decode the result
pub fn route_typed<A: AnchorSerialize, R: AnchorDeserialize>(
    call: &mut HandlerCall<'_>,
    selector: Selector,
    args: &A,
) -> Result<R> {
    let output = route(call, selector, &encode(args)?)?;
    R::try_from_slice(&output).map_err(|_| error!(VaultError::InvalidReturnData))
}
