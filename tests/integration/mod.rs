//! Integration tests for basesync

mod cli_commands;
mod config_integration;
mod orchestrator_scopes;
mod save_load_roundtrip;
mod test_utils;
mod transfer_batch;
