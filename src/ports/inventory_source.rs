use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::AppError;

/// Port for the external, pull-based inventory source.
pub trait InventorySource: Send + Sync {
    /// Fetch the full inventory document.
    ///
    /// The document is expected to carry `_meta.hostvars` and `all.vars`.
    /// This call may block for as long as the source takes to answer.
    fn fetch(&self) -> Result<Value, AppError>;

    /// Newest modification time across the inventory definition files.
    ///
    /// `None` when no definition file is visible.
    fn watermark(&self) -> Result<Option<DateTime<Utc>>, AppError>;
}
