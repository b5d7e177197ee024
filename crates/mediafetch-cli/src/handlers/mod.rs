//! Command handlers.

pub mod install;
pub mod platform;
pub mod serve;
