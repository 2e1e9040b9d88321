//! Command handlers.

pub mod probe;
pub mod run;
