//! CLI domain: parse, route, help, output, and presentation only.
//! No sync logic; the route table dispatches to the orchestrator.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_bytes, format_listing_json, format_listing_text, format_section_heading,
    format_status_json, format_status_text, format_transfers_json, format_transfers_text,
};
pub use route::{RunContext, RunOutput};
