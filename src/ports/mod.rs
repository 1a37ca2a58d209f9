mod content_store;
mod inventory_source;

pub use content_store::ContentFingerprints;
pub use inventory_source::InventorySource;
