use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::VaultError;

/// Kind of dispatch mutation requested by `update_handler`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerAction {
    Add,
    Replace,
    Remove,
}

/// One selector routed to one handler
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct HandlerBinding {
    pub selector: Selector,
    pub handler: Pubkey,
}

/// Every selector a handler is currently registered with
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct HandlerSelectors {
    pub handler: Pubkey,
    pub selectors: Vec<Selector>,
}

/// Selector -> handler map owned by a vault
///
/// Invariants:
/// - a selector has at most one binding
/// - `handlers` mirrors `bindings` grouped by handler, with no empty groups
/// - a failed mutation leaves the table untouched
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq)]
pub struct DispatchTable {
    pub bindings: Vec<HandlerBinding>,
    pub handlers: Vec<HandlerSelectors>,
}

impl DispatchTable {
    /// 4 (vec len) + bindings + 4 (vec len) + per-handler selector sets
    pub const SPACE: usize =
        4 + MAX_SELECTORS * (4 + 32) + 4 + MAX_HANDLERS * (32 + 4 + MAX_SELECTORS * 4);

    /// Handler currently bound to `selector`, if any
    pub fn handler_for(&self, selector: &Selector) -> Option<Pubkey> {
        self.bindings
            .iter()
            .find(|b| b.selector == *selector)
            .map(|b| b.handler)
    }

    /// Resolve a routed call, failing with `NoHandler` when unbound
    pub fn route(&self, selector: &Selector) -> Result<Pubkey> {
        self.handler_for(selector)
            .ok_or_else(|| error!(VaultError::NoHandler))
    }

    /// Selectors registered for `handler`, in registration order
    pub fn selectors_of(&self, handler: &Pubkey) -> &[Selector] {
        self.handlers
            .iter()
            .find(|h| h.handler == *handler)
            .map(|h| h.selectors.as_slice())
            .unwrap_or(&[])
    }

    /// Append-only bootstrap path. Same rules as `update(handler, Add, ..)`.
    pub fn push(&mut self, handler: Pubkey, selectors: &[Selector]) -> Result<()> {
        self.update(handler, HandlerAction::Add, selectors)
    }

    /// Apply an Add/Replace/Remove batch atomically
    pub fn update(
        &mut self,
        handler: Pubkey,
        action: HandlerAction,
        selectors: &[Selector],
    ) -> Result<()> {
        // CHECKS: the whole batch is validated before anything changes
        require!(!selectors.is_empty(), VaultError::InvalidBatch);

        for (i, selector) in selectors.iter().enumerate() {
            require!(
                !selectors[..i].contains(selector),
                VaultError::InvalidBatch
            );
            require!(
                !BUILTIN_SELECTORS.contains(selector),
                VaultError::InvalidBatch
            );

            let current = self.handler_for(selector);
            let consistent = match action {
                HandlerAction::Add => current.is_none(),
                HandlerAction::Replace => {
                    matches!(current, Some(bound) if bound != Pubkey::default() && bound != handler)
                }
                HandlerAction::Remove => current.is_some(),
            };
            require!(consistent, VaultError::InvalidBatch);
        }

        match action {
            HandlerAction::Add | HandlerAction::Replace => {
                require!(handler != Pubkey::default(), VaultError::InvalidBatch)
            }
            HandlerAction::Remove => {
                require!(handler == Pubkey::default(), VaultError::InvalidBatch)
            }
        }

        // EFFECTS: mutate a copy, then commit only if it fits
        let mut next = self.clone();
        for selector in selectors {
            match action {
                HandlerAction::Add => {
                    next.bindings.push(HandlerBinding {
                        selector: *selector,
                        handler,
                    });
                    next.register(handler, *selector);
                }
                HandlerAction::Replace => {
                    if let Some(binding) = next.bindings.iter_mut().find(|b| b.selector == *selector) {
                        let previous = binding.handler;
                        binding.handler = handler;
                        next.unregister(previous, selector);
                    }
                    next.register(handler, *selector);
                }
                HandlerAction::Remove => {
                    if let Some(previous) = next.handler_for(selector) {
                        next.bindings.retain(|b| b.selector != *selector);
                        next.unregister(previous, selector);
                    }
                }
            }
        }
        next.handlers.retain(|h| !h.selectors.is_empty());

        require!(
            next.bindings.len() <= MAX_SELECTORS && next.handlers.len() <= MAX_HANDLERS,
            VaultError::CapacityExceeded
        );

        *self = next;
        Ok(())
    }

    fn register(&mut self, handler: Pubkey, selector: Selector) {
        match self.handlers.iter_mut().find(|h| h.handler == handler) {
            Some(set) => set.selectors.push(selector),
            None => self.handlers.push(HandlerSelectors {
                handler,
                selectors: vec![selector],
            }),
        }
    }

    fn unregister(&mut self, handler: Pubkey, selector: &Selector) {
        if let Some(set) = self.handlers.iter_mut().find(|h| h.handler == handler) {
            set.selectors.retain(|s| s != selector);
        }
    }
}
