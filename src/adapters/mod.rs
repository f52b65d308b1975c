//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod json_ledger_adapter;
pub mod terminal_prompt;
pub mod text_archive_adapter;
