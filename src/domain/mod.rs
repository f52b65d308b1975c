//! Core domain types and logic.

pub mod bar;
pub mod position;
pub mod ledger;
pub mod settings;
pub mod analysis;
pub mod universe;
pub mod decision;
pub mod confirmation;
pub mod cycle;
pub mod config_validation;
pub mod error;
