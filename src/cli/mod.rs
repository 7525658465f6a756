//! CLI layer - Command-line interface

pub mod commands;
pub mod output;

pub use commands::{Cli, Commands, DraftCommands};
pub use output::{format_calendar, format_draft_list, format_entry_list, format_export_report};
