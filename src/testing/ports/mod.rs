mod content_stub;
mod inventory_source_stub;

pub use self::content_stub::FakeContent;
pub use self::inventory_source_stub::FakeInventorySource;
