pub mod ports;

pub use ports::FakeContent;
pub use ports::FakeInventorySource;
