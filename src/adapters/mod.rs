pub mod filesystem;
pub mod inventory_command;
pub mod template_resolver;

pub use filesystem::{ContentCategory, ContentRoots};
pub use inventory_command::CommandInventorySource;
pub use template_resolver::{Fragment, TEMPLATE_SUFFIX, TemplateResolver};
