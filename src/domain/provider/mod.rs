//! Provider domain - Upstream provider configuration and lookup

mod entity;
mod registry;

pub use entity::{ProviderConfig, ProviderKind};
pub use registry::ProviderRegistry;
