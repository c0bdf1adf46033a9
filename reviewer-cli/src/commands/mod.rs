//! CLI command implementations

pub mod migrate;
pub mod serve;

pub use migrate::MigrateArgs;
pub use serve::ServeArgs;
