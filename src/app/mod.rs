pub mod cli;
pub mod config;
pub mod engine;
pub mod inventory_cache;

pub use config::{Credentials, Settings};
pub use engine::{Engine, TaskKind, TaskScript};
pub use inventory_cache::{InventoryCache, RefreshOutcome};
