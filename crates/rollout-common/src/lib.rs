//! Shared constants and defaults for the rollout tools.

pub mod defaults;
