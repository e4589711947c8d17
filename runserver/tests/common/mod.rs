//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers for the runserver integration suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{TestHelpers, TestProject};
