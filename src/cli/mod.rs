//! Terminal subcommands that work directly against the configured vault.

pub mod doctor;
pub mod search;
