//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name string used in log events (e.g. "save", "status").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::List { .. } => "list",
        Commands::Status { .. } => "status",
        Commands::Save { .. } => "save",
        Commands::Load { .. } => "load",
    }
}

/// Scope arguments of a command, empty for `list`.
pub fn scope_args(command: &Commands) -> &[String] {
    match command {
        Commands::List { .. } => &[],
        Commands::Status { names, .. }
        | Commands::Save { names, .. }
        | Commands::Load { names, .. } => names.as_slice(),
    }
}
