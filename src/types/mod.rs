// Types fondamentaux des contrats privilégiés
// Principe: Minimal, auditable, durable

pub mod primitives;
pub mod privilege;
pub mod event;
pub mod validator;
pub mod messages;

pub use primitives::*;
pub use privilege::*;
pub use event::*;
pub use validator::*;
pub use messages::*;
