pub mod authorization;
pub mod automation;
pub mod create_vault;
pub mod custody;
pub mod dispatch;
pub mod initialize;
pub mod invoke;
pub mod registry;
pub mod timelock;

pub use authorization::*;
pub use automation::*;
pub use create_vault::*;
pub use custody::*;
pub use dispatch::*;
pub use initialize::*;
pub use invoke::*;
pub use registry::*;
pub use timelock::*;
