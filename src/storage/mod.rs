// Storage - Couche de persistance
// Principe: Auditabilité, Reproductibilité, isolation par branche

pub mod kv;
pub mod db;
pub mod context;
pub mod keys;

pub use kv::*;
pub use db::*;
pub use context::*;
pub use keys::*;
