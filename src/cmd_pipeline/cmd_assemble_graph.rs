use async_trait::async_trait;
use clap::Args;

use super::interface::{PipelineCommand, PipelineValues};
use super::relations::lookup_converter;
use super::vis_network::{ExtendOptions, VisNetwork};

use crate::abstract_store::{AbstractStore, Result};

/// Run one or more relation converters and merge their partial graphs into
/// a single network.  A network arriving on the pipeline input is used as
/// the merge base, so assemble steps compose.
#[derive(Debug, Args)]
pub struct AssembleGraph {
    /// Relation converter names, merged in order.
    #[clap(required = true)]
    pub relations: Vec<String>,

    /// Don't sum mass/value for nodes contributed by multiple relations.
    #[clap(long)]
    pub no_combine: bool,

    /// Let later relations replace node labels/styling instead of
    /// first-seen-wins.
    #[clap(long)]
    pub overwrite_nodes: bool,

    /// Keep parallel edges for (from, to) pairs that multiple relations
    /// produce.
    #[clap(long)]
    pub allow_duplicate_edges: bool,
}

#[derive(Debug)]
pub struct AssembleGraphCommand {
    pub args: AssembleGraph,
}

#[async_trait]
impl PipelineCommand for AssembleGraphCommand {
    async fn execute(
        &self,
        store: &Box<dyn AbstractStore + Send + Sync>,
        input: PipelineValues,
    ) -> Result<PipelineValues> {
        let mut network = match input {
            PipelineValues::VisNetwork(network) => network,
            _ => VisNetwork::new(),
        };
        let options = ExtendOptions {
            combine: !self.args.no_combine,
            overwrite_nodes: self.args.overwrite_nodes,
            allow_duplicate_edges: self.args.allow_duplicate_edges,
        };

        for name in &self.args.relations {
            let converter = lookup_converter(name)?;
            let mut tables = Vec::with_capacity(converter.tables.len());
            for table in converter.tables {
                tables.push(store.fetch_table(table).await?);
            }
            let partial = (converter.build)(&tables)?;
            network.extend(partial, &options);
        }

        Ok(PipelineValues::VisNetwork(network))
    }
}
