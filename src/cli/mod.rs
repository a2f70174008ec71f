//! CLI module - command-line interface for plantdesk.

use clap::{Parser, Subcommand};

/// plantdesk - manufacturing ERP back office
#[derive(Parser)]
#[command(name = "plantdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the REST API server (the default)
    #[command(alias = "-s", alias = "--serve")]
    Serve,

    /// Sweep the external HR directory into the user table
    SyncEmployees,

    /// Refresh the currency table from the external catalog
    SyncCurrencies,
}
