//! nexus: assemble per-node provisioning scripts from an inventory, a
//! content tree, and a confined set of shell templates.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{Credentials, Engine, InventoryCache, RefreshOutcome, Settings, TaskKind, TaskScript};
pub use domain::{AppError, NodeContext};
