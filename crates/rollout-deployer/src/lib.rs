//! rollout-deployer - AMI rollout orchestration
//!
//! This crate implements the deploy pipeline: cut a new launch template
//! version for a freshly built machine image, repoint the auto scaling
//! group at it, start a managed instance refresh, and optionally watch
//! the refresh until it reaches a terminal state.

pub mod aws;
pub mod config;
pub mod error;
pub mod rollout;
pub mod wait;
