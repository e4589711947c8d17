//! Configuration Management
//!
//! Configuration record, defaults, and builder for the supervised server.

pub mod builder;
pub mod runserver;

pub use builder::RunserverConfigBuilder;
pub use runserver::RunserverConfig;
