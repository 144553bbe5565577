// Privileged - Contracts granted system-level capabilities
// Principle: Privilege is granted by governance, exercised at block boundaries

pub mod error;
pub mod registry;
pub mod keeper;
pub mod lifecycle;
pub mod bridge;
pub mod dispatcher;
pub mod proposal;

pub use error::PrivilegeError;
pub use registry::{PrivilegeRegistry, Registration};
pub use keeper::Keeper;
pub use bridge::{ContractMessageHandler, MessageHandlerChain};
pub use proposal::PrivilegeProposalHandler;
