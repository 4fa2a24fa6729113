use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "defmerge",
    about = "Merge analysis definitions without breaking their dataset references",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Directory holding one `<id>.json` file per document
    #[arg(long, global = true, default_value = ".")]
    pub store: PathBuf,

    /// TOML file with merge settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Settings that take precedence over the configuration file.
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigOverrides {
    #[arg(long, global = true)]
    pub region: Option<String>,
    #[arg(long, global = true)]
    pub account_id: Option<String>,
    #[arg(long, global = true)]
    pub namespace: Option<String>,
    #[arg(long, global = true)]
    pub user_name: Option<String>,
    #[arg(long, global = true)]
    pub max_alias_probes: Option<usize>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge two documents into a new one
    Create(CreateArgs),
    /// Merge a document into an existing one, in place
    Update(UpdateArgs),
    /// Show the alias renames and collection counts of a merge, without writing
    Plan(PlanArgs),
    /// Show how a merge would change the stored target, without writing
    Preview(PreviewArgs),
    /// List the documents in the store
    List,
}

#[derive(Args, Clone, Debug)]
pub struct CreateArgs {
    /// Document whose declarations are copied first
    pub first: String,
    /// Document merged into the first
    pub second: String,
    #[arg(long)]
    pub target_id: String,
    #[arg(long)]
    pub target_name: String,
}

#[derive(Args, Clone, Debug)]
pub struct UpdateArgs {
    /// Document merged into the target
    pub source: String,
    #[arg(long)]
    pub target_id: String,
    /// Defaults to the target's current name
    #[arg(long)]
    pub target_name: Option<String>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum MergeMode {
    Create(CreateArgs),
    Update(UpdateArgs),
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(subcommand)]
    pub mode: MergeMode,
}

#[derive(Args)]
pub struct PreviewArgs {
    #[command(subcommand)]
    pub mode: MergeMode,
    /// Unchanged lines shown around each change
    #[arg(short = 'U', long, default_value = "3")]
    pub context: usize,
}
