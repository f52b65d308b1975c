//! Port traits for the core's external collaborators.

pub mod config_port;
pub mod ledger_port;
pub mod price_history_port;
pub mod prompt_port;
