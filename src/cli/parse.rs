//! CLI parse: clap types for lti-apps. No behavior; definitions only.

use crate::types::RecordId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// LTI Apps CLI - Collated view of installed LTI tools
#[derive(Parser)]
#[command(name = "lti-apps")]
#[command(about = "Browse tool proxies and external tools as one paginated app list")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load tool proxies and external tools from a JSON file into the store
    Import {
        /// File shaped as {"tool_proxies": [...], "external_tools": [...]}
        file: PathBuf,
    },
    /// Print one page of app definitions for a context
    List {
        /// Owning context type (account or course)
        #[arg(long)]
        context_type: String,
        /// Owning context id
        #[arg(long)]
        context_id: RecordId,
        /// Root account of the context (defaults to the context id for accounts)
        #[arg(long)]
        root_account_id: Option<RecordId>,
        /// Records per page
        #[arg(long, default_value = "20")]
        per_page: usize,
        /// Bookmark token from a previous page
        #[arg(long)]
        page: Option<String>,
        /// Sort key (id or name); defaults to the configured sort
        #[arg(long)]
        sort: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
