// ABOUTME: Change-set orchestration: the deployer state machine and its
// ABOUTME: rendering, diffing and polling support.

mod deployer;
mod error;
mod poll;

pub mod diff;
pub mod render;

pub use deployer::{CfnClient, Deployer};
pub use error::DeployError;
pub use poll::PollSchedule;
