//! Shared types for the drush runserver harness
//!
//! Holds the pieces every crate in the workspace needs: the process
//! identity used to tag log lines, the shared error type, and tracing setup.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
