// KratOs Privileged - Privileged contract subsystem
// Principle: Untrusted code at block boundaries, isolated one contract at a time

pub mod cli;
pub mod genesis;
pub mod host;
pub mod privileged;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;

pub use cli::config::PrivilegedConfig;
pub use genesis::GenesisState;
pub use privileged::{Keeper, PrivilegeError};
