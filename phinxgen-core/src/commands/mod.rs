//! Command implementations: generate.

pub mod generate;
