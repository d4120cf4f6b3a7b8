use clap::{Parser, Subcommand, ValueEnum};

use super::cmd_assemble_graph::AssembleGraph;
use super::cmd_build_hierarchy::BuildHierarchy;
use super::cmd_collect_mass::CollectMass;
use super::cmd_schema_graph::SchemaGraph;

#[derive(Clone, Debug, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Pretty,
    /// Un-pretty-printed JSON.
    Concise,
}

#[derive(Debug, Parser)]
pub struct ToolOpts {
    /// Path to the root of the store directory to read from.  Only the first
    /// pipeline segment's value is consulted.
    #[clap(long, default_value = ".", env = "RELVIZ_STORE")]
    pub store: String,

    #[clap(long, short, value_enum, default_value = "concise")]
    pub output_format: OutputFormat,

    #[clap(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    AssembleGraph(AssembleGraph),
    BuildHierarchy(BuildHierarchy),
    CollectMass(CollectMass),
    SchemaGraph(SchemaGraph),
}
