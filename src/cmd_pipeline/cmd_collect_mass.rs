use async_trait::async_trait;
use clap::Args;

use super::interface::{PipelineCommand, PipelineValues};

use crate::abstract_store::{AbstractStore, ErrorDetails, ErrorLayer, Result, StoreError};

/// Weight the received graph's nodes by in-degree: every edge adds 1 to its
/// target node's mass.  Meant as a pipeline step after `assemble-graph` for
/// relations that don't accumulate mass while building.
#[derive(Debug, Args)]
pub struct CollectMass {
    /// Leave `value` alone instead of mirroring the collected mass into it.
    #[clap(long)]
    pub no_value: bool,
}

#[derive(Debug)]
pub struct CollectMassCommand {
    pub args: CollectMass,
}

#[async_trait]
impl PipelineCommand for CollectMassCommand {
    async fn execute(
        &self,
        _store: &Box<dyn AbstractStore + Send + Sync>,
        input: PipelineValues,
    ) -> Result<PipelineValues> {
        let mut network = match input {
            PipelineValues::VisNetwork(network) => network,
            _ => {
                return Err(StoreError::StickyProblem(ErrorDetails {
                    layer: ErrorLayer::BadInput,
                    message: "collect-mass needs a graph as its pipeline input".to_string(),
                }));
            }
        };
        network.collect_mass(!self.args.no_value);
        Ok(PipelineValues::VisNetwork(network))
    }
}
