// ABOUTME: Library root for cirrus - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod cfn;
pub mod credentials;
pub mod deploy;
pub mod error;
pub mod manifest;
pub mod output;
