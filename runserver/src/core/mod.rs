//! Core logic independent of process and socket I/O

pub mod command;
pub mod descriptors;
pub mod readiness;

pub use command::ServerCommand;
pub use descriptors::{DescriptorSpec, OpenedDescriptors};
pub use readiness::{ReadinessPolicy, wait_for_port};
