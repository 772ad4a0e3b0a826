//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use sl_core::RelationType;

/// Swapline - refresh warehouse relations by backup and swap
#[derive(Parser, Debug)]
#[command(name = "sl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: swapline.yml in the current directory)
    #[arg(short, long, global = true, env = "SWAPLINE_CONFIG")]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or refresh the relation a rendered model node describes
    Refresh(RefreshArgs),

    /// Print the live state of a relation
    Describe(DescribeArgs),

    /// Show the index changes a refresh would make
    Diff(DiffArgs),
}

/// Arguments for the refresh command
#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Rendered model node (YAML or JSON)
    pub node: String,

    /// Skip index maintenance after the swap
    #[arg(long)]
    pub skip_indexes: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the describe command
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Schema holding the relation
    pub schema: String,

    /// Relation name
    pub name: String,

    /// Expected relation type
    #[arg(short = 't', long = "type", value_enum, default_value = "table")]
    pub relation_type: RelationTypeArg,

    /// Database qualifier (default: database.name from config)
    #[arg(short, long)]
    pub database: Option<String>,
}

/// Arguments for the diff command
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Rendered model node (YAML or JSON)
    pub node: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Relation types that live in the warehouse
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationTypeArg {
    Table,
    View,
    MaterializedView,
}

impl From<RelationTypeArg> for RelationType {
    fn from(arg: RelationTypeArg) -> Self {
        match arg {
            RelationTypeArg::Table => RelationType::Table,
            RelationTypeArg::View => RelationType::View,
            RelationTypeArg::MaterializedView => RelationType::MaterializedView,
        }
    }
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
