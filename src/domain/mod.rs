pub mod context;
pub mod credential;
pub mod error;
pub mod inventory;
pub mod manifest;
pub mod minify;

pub use context::NodeContext;
pub use error::{AppError, ResolveError};
pub use inventory::{HostVars, InventorySnapshot, MACHINE_ID_VAR};
pub use manifest::Manifests;
pub use minify::minify_script;
