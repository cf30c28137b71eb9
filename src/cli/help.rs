//! CLI command-name contract for logging spans.

use crate::cli::parse::Commands;

/// Command name string recorded on the command span (e.g. "import", "list").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Import { .. } => "import",
        Commands::List { .. } => "list",
    }
}
