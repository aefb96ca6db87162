// State module re-exports

pub mod dispatch;
pub mod registry;
pub mod timelock;
pub mod vault;
pub mod yield_ledger;

pub use dispatch::*;
pub use registry::*;
pub use timelock::*;
pub use vault::*;
pub use yield_ledger::*;
