//! CLI domain: parse, route, help, output, and presentation only.
//! Collation itself lives in the library; routes only wire it to the store.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_app_list_json, format_app_list_text, format_import_summary, ImportSummary,
};
pub use route::{ImportFile, RunContext};
